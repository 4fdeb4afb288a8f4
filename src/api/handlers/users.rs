//! Profile request handlers.
//!
//! Each handler validates its input, performs one store operation through
//! `UserService` and maps the outcome to a response. Errors are returned as
//! `AppError` and rendered by its `IntoResponse` implementation.

use crate::api::doc::USER_TAG;
use crate::api::dto::{
    ErrorResponse, ProfilePictureForm, ProfilePictureResponse, UpdateUsernameRequest,
    UserResponse, UsernameUpdatedResponse,
};
use crate::error::{AppError, AppResult};
use crate::state::AppState;
use crate::storage::UploadStorage;
use crate::utils::validate::ValidatedJson;
use axum::{
    Json,
    extract::{
        DefaultBodyLimit, Multipart, Path, State,
        multipart::{MultipartError, MultipartRejection},
    },
    http::StatusCode,
};
use utoipa_axum::router::OpenApiRouter;
use utoipa_axum::routes;

const PICTURE_FIELD: &str = "profilePicture";
const USER_ID_FIELD: &str = "userId";

const NO_FILE_MESSAGE: &str = "No file uploaded.";
const PICTURE_UPDATE_FAILED: &str = "An error occurred while updating the picture";

/// Room for multipart boundaries and the `userId` part on top of the file.
const MULTIPART_OVERHEAD: usize = 64 * 1024;

/// Creates profile routes.
///
/// `max_file_size` bounds the profile picture request body.
pub fn user_routes(max_file_size: usize) -> OpenApiRouter<AppState> {
    let upload_routes = OpenApiRouter::new()
        .routes(routes!(update_profile_picture))
        .layer(DefaultBodyLimit::max(
            max_file_size.saturating_add(MULTIPART_OVERHEAD),
        ));

    OpenApiRouter::new()
        .routes(routes!(get_user))
        .routes(routes!(update_username))
        .merge(upload_routes)
}

/// GET /api/users/{id} - Get a user's profile
#[utoipa::path(
    get,
    path = "/{id}",
    tag = USER_TAG,
    params(
        ("id" = i32, Path, description = "User ID")
    ),
    responses(
        (status = 200, description = "User found", body = UserResponse),
        (status = 400, description = "Invalid user ID", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    )
)]
async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<UserResponse>> {
    let user = state.services.users.get_user(id).await?;
    Ok(Json(UserResponse::from(user)))
}

/// PUT /api/users/username - Change a user's username
#[utoipa::path(
    put,
    path = "/username",
    tag = USER_TAG,
    request_body = UpdateUsernameRequest,
    responses(
        (status = 200, description = "Username updated", body = UsernameUpdatedResponse),
        (status = 400, description = "Invalid request", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    )
)]
async fn update_username(
    State(state): State<AppState>,
    ValidatedJson(req): ValidatedJson<UpdateUsernameRequest>,
) -> AppResult<Json<UsernameUpdatedResponse>> {
    let username = req
        .username
        .as_deref()
        .map(str::trim)
        .filter(|name| !name.is_empty())
        .ok_or_else(|| AppError::bad_request("Username is required"))?
        .to_string();
    let user_id = req.user_id.ok_or_else(user_id_required)?;

    let user = state.services.users.update_username(user_id, username).await?;

    Ok(Json(UsernameUpdatedResponse {
        message: "Username updated successfully".to_string(),
        user: UserResponse::from(user),
    }))
}

/// PUT /api/users/profile-picture - Upload a new profile picture
#[utoipa::path(
    put,
    path = "/profile-picture",
    tag = USER_TAG,
    request_body(content = ProfilePictureForm, content_type = "multipart/form-data"),
    responses(
        (status = 200, description = "Picture stored and user updated", body = ProfilePictureResponse),
        (status = 400, description = "No file uploaded or invalid user ID", body = ErrorResponse),
        (status = 404, description = "User not found", body = ErrorResponse),
        (status = 500, description = "Server error", body = ErrorResponse)
    )
)]
async fn update_profile_picture(
    State(state): State<AppState>,
    multipart: Result<Multipart, MultipartRejection>,
) -> AppResult<Json<ProfilePictureResponse>> {
    let mut multipart = multipart.map_err(|_| AppError::bad_request(NO_FILE_MESSAGE))?;
    let form = PictureForm::read(&mut multipart, &state.uploads).await?;

    let file = form
        .file
        .ok_or_else(|| AppError::bad_request(NO_FILE_MESSAGE))?;
    let user_id = parse_user_id(form.user_id.as_deref())?;

    let upload = state
        .uploads
        .save(file.name.as_deref(), &file.data)
        .await
        .map_err(|e| e.with_server_message(PICTURE_UPDATE_FAILED))?;

    match state
        .services
        .users
        .update_profile_picture(user_id, upload.url.clone())
        .await
    {
        Ok(user) => Ok(Json(ProfilePictureResponse {
            message: "Profile picture uploaded successfully".to_string(),
            url: upload.url,
            user: UserResponse::from(user),
        })),
        Err(e) => {
            state.uploads.remove(&upload).await;
            Err(e.with_server_message(PICTURE_UPDATE_FAILED))
        }
    }
}

struct UploadedFile {
    name: Option<String>,
    data: Vec<u8>,
}

/// Parts of the profile picture form; unknown parts are skipped.
#[derive(Default)]
struct PictureForm {
    file: Option<UploadedFile>,
    user_id: Option<String>,
}

impl PictureForm {
    async fn read(multipart: &mut Multipart, uploads: &UploadStorage) -> AppResult<Self> {
        let mut form = PictureForm::default();
        let to_app_error = |e: MultipartError| multipart_error(e, uploads);

        while let Some(field) = multipart.next_field().await.map_err(to_app_error)? {
            let name = field.name().map(str::to_string);
            match name.as_deref() {
                Some(PICTURE_FIELD) => {
                    let name = field.file_name().map(str::to_string);
                    let data = field.bytes().await.map_err(to_app_error)?;
                    form.file = Some(UploadedFile {
                        name,
                        data: data.to_vec(),
                    });
                }
                Some(USER_ID_FIELD) => {
                    form.user_id = Some(field.text().await.map_err(to_app_error)?);
                }
                _ => {}
            }
        }

        Ok(form)
    }
}

/// A body cut off by the request limit reads as an oversized file.
fn multipart_error(error: MultipartError, uploads: &UploadStorage) -> AppError {
    if error.status() == StatusCode::PAYLOAD_TOO_LARGE {
        uploads.too_large()
    } else {
        AppError::bad_request(error.body_text())
    }
}

fn parse_user_id(raw: Option<&str>) -> AppResult<i32> {
    let raw = raw.map(str::trim).filter(|v| !v.is_empty());
    let raw = raw.ok_or_else(user_id_required)?;
    raw.parse::<i32>().map_err(|_| AppError::Validation {
        field: USER_ID_FIELD.to_string(),
        reason: "User id must be an integer".to_string(),
    })
}

fn user_id_required() -> AppError {
    AppError::Validation {
        field: USER_ID_FIELD.to_string(),
        reason: "User id is required".to_string(),
    }
}
