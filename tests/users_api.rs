//! Router-level tests for the profile endpoints, driven through
//! `tower::ServiceExt::oneshot` over the in-memory user store.

use std::io::Read;
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use axum::body::Body;
use axum::http::{Method, Request, StatusCode, header};
use axum::response::Response;
use flate2::read::GzDecoder;
use serde_json::{Value, json};
use tempfile::TempDir;
use tower::ServiceExt;

use profile_rs::AppState;
use profile_rs::api::routes::create_router;
use profile_rs::config::UploadConfig;
use profile_rs::error::{AppError, AppResult};
use profile_rs::models::{NewUser, UpdateUser, User};
use profile_rs::repositories::{MemoryUserRepository, UserStore};
use profile_rs::storage::UploadStorage;

const BOUNDARY: &str = "profile-test-boundary";
const MAX_FILE_SIZE: usize = 1024 * 1024;

struct TestApp {
    router: Router,
    store: Arc<MemoryUserRepository>,
    uploads_dir: TempDir,
}

impl TestApp {
    fn new() -> Self {
        let store = Arc::new(MemoryUserRepository::new());
        let uploads_dir = TempDir::new().unwrap();
        let router = create_router(AppState::with_store(
            store.clone(),
            storage_in(&uploads_dir),
        ));
        Self {
            router,
            store,
            uploads_dir,
        }
    }

    fn with_store(store: Arc<dyn UserStore>) -> (Router, TempDir) {
        let uploads_dir = TempDir::new().unwrap();
        let router = create_router(AppState::with_store(store, storage_in(&uploads_dir)));
        (router, uploads_dir)
    }

    fn seed(&self, username: &str) -> User {
        self.store.insert(NewUser {
            username: username.to_string(),
            password: "$argon2id$v=19$not-a-real-hash".to_string(),
            profile_picture: String::new(),
        })
    }

    fn stored_files(&self) -> usize {
        count_files(&self.uploads_dir.path().join("uploads"))
    }
}

fn storage_in(dir: &TempDir) -> UploadStorage {
    UploadStorage::new(&UploadConfig {
        directory: dir.path().join("uploads").to_string_lossy().into_owned(),
        public_path: "/uploads".to_string(),
        max_file_size: MAX_FILE_SIZE,
    })
}

fn count_files(dir: &Path) -> usize {
    std::fs::read_dir(dir).map(|entries| entries.count()).unwrap_or(0)
}

/// Store whose every operation fails like an unreachable database.
struct FailingStore;

#[async_trait]
impl UserStore for FailingStore {
    async fn find_by_id(&self, _user_id: i32) -> AppResult<Option<User>> {
        Err(store_down())
    }

    async fn update(&self, _user_id: i32, _changes: UpdateUser) -> AppResult<Option<User>> {
        Err(store_down())
    }

    fn name(&self) -> &'static str {
        "failing"
    }
}

fn store_down() -> AppError {
    AppError::Database {
        operation: "query users".to_string(),
        source: anyhow::anyhow!("connection refused (os error 111)"),
    }
}

async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn put_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::PUT)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

enum Part<'a> {
    Text(&'a str, &'a str),
    File(&'a str, &'a str, &'a [u8]),
}

fn put_multipart(parts: &[Part<'_>]) -> Request<Body> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n")
                        .as_bytes(),
                );
            }
            Part::File(name, filename, data) => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\n\
                         Content-Type: application/octet-stream\r\n\r\n"
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(data);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());

    Request::builder()
        .method(Method::PUT)
        .uri("/api/users/profile-picture")
        .header(
            header::CONTENT_TYPE,
            format!("multipart/form-data; boundary={BOUNDARY}"),
        )
        .body(Body::from(body))
        .unwrap()
}

// ============================================================================
// GET /api/users/{id}
// ============================================================================

#[tokio::test]
async fn get_user_returns_profile_without_password() {
    let app = TestApp::new();
    let user = app.seed("alice");

    let response = send(&app.router, get(&format!("/api/users/{}", user.id))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["id"], user.id);
    assert_eq!(body["username"], "alice");
    assert_eq!(body["profilePicture"], "");
    assert!(body.get("password").is_none());
    assert!(body["createdAt"].as_str().unwrap().ends_with('Z'));
}

#[tokio::test]
async fn get_user_unknown_id_is_404() {
    let app = TestApp::new();

    let response = send(&app.router, get("/api/users/999")).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "User not found");
}

#[tokio::test]
async fn get_user_non_numeric_id_is_400_json() {
    let app = TestApp::new();

    let response = send(&app.router, get("/api/users/abc")).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "BAD_REQUEST");
    assert!(body["request_id"].is_string());
}

#[tokio::test]
async fn get_user_store_failure_is_generic_500() {
    let (router, _dir) = TestApp::with_store(Arc::new(FailingStore));

    let response = send(&router, get("/api/users/1")).await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    let body = body_json(response).await;
    assert_eq!(body["message"], "Server error");
    assert!(!body.to_string().contains("connection refused"));
}

// ============================================================================
// PUT /api/users/username
// ============================================================================

#[tokio::test]
async fn update_username_returns_updated_user() {
    let app = TestApp::new();
    let user = app.seed("bob");

    let response = send(
        &app.router,
        put_json(
            "/api/users/username",
            json!({ "username": "robert", "userId": user.id }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Username updated successfully");
    assert_eq!(body["user"]["username"], "robert");
    assert!(body["user"].get("password").is_none());

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "robert");
}

#[tokio::test]
async fn update_username_empty_or_missing_is_400() {
    let app = TestApp::new();
    let user = app.seed("carol");

    for body in [
        json!({ "username": "", "userId": user.id }),
        json!({ "username": "   ", "userId": user.id }),
        json!({ "userId": user.id }),
        json!({ "username": "", "userId": 424242 }),
    ] {
        let response = send(&app.router, put_json("/api/users/username", body.clone())).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "body: {body}");
        assert_eq!(body_json(response).await["message"], "Username is required");
    }

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "carol");
}

#[tokio::test]
async fn update_username_validation_errors_are_listed() {
    let app = TestApp::new();
    let user = app.seed("dave");

    let response = send(
        &app.router,
        put_json("/api/users/username", json!({ "username": "dave2" })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["code"], "VALIDATION_ERROR");
    assert_eq!(body["details"].as_array().unwrap().len(), 1);

    let response = send(
        &app.router,
        put_json(
            "/api/users/username",
            json!({ "username": "d".repeat(51), "userId": user.id }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["details"][0]["field"], "username");
}

#[tokio::test]
async fn update_username_malformed_body_is_400() {
    let app = TestApp::new();

    let request = Request::builder()
        .method(Method::PUT)
        .uri("/api/users/username")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from("{\"username\":"))
        .unwrap();
    let response = send(&app.router, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(body_json(response).await["message"].is_string());
}

#[tokio::test]
async fn update_username_unknown_user_is_404() {
    let app = TestApp::new();

    let response = send(
        &app.router,
        put_json("/api/users/username", json!({ "username": "x", "userId": 77 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "User not found");
}

#[tokio::test]
async fn update_username_accepts_numeric_string_id() {
    let app = TestApp::new();
    let user = app.seed("gina");

    let response = send(
        &app.router,
        put_json(
            "/api/users/username",
            json!({ "username": "georgina", "userId": user.id.to_string() }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["user"]["username"], "georgina");

    let response = send(
        &app.router,
        put_json(
            "/api/users/username",
            json!({ "username": "gigi", "userId": "seven" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let message = body_json(response).await["message"].as_str().unwrap().to_string();
    assert!(message.contains("userId must be an integer"), "{message}");
}

#[tokio::test]
async fn update_username_taken_name_is_500() {
    let app = TestApp::new();
    app.seed("hank");
    let ivy = app.seed("ivy");

    let response = send(
        &app.router,
        put_json("/api/users/username", json!({ "username": "hank", "userId": ivy.id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], "Server error");

    let stored = app.store.find_by_id(ivy.id).await.unwrap().unwrap();
    assert_eq!(stored.username, "ivy");
}

#[tokio::test]
async fn update_username_store_failure_is_500() {
    let (router, _dir) = TestApp::with_store(Arc::new(FailingStore));

    let response = send(
        &router,
        put_json("/api/users/username", json!({ "username": "x", "userId": 1 })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body_json(response).await["message"], "Server error");
}

// ============================================================================
// PUT /api/users/profile-picture
// ============================================================================

#[tokio::test]
async fn update_picture_stores_file_and_updates_user() {
    let app = TestApp::new();
    let user = app.seed("erin");
    let image = b"\x89PNG\r\n\x1a\nfake image bytes";
    let user_id = user.id.to_string();

    let response = send(
        &app.router,
        put_multipart(&[
            Part::Text("userId", &user_id),
            Part::File("profilePicture", "me.PNG", image),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["message"], "Profile picture uploaded successfully");
    let url = body["url"].as_str().unwrap().to_string();
    assert!(url.starts_with("/uploads/"));
    assert!(url.ends_with(".png"));
    assert_eq!(body["user"]["profilePicture"], url.as_str());
    assert!(body["user"].get("password").is_none());
    assert_eq!(app.stored_files(), 1);

    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.profile_picture, url);

    let response = send(&app.router, get(&url)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let served = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    assert_eq!(&served[..], image);
}

#[tokio::test]
async fn update_picture_without_file_is_400() {
    let app = TestApp::new();
    let user = app.seed("frank");
    let user_id = user.id.to_string();

    let response = send(&app.router, put_multipart(&[Part::Text("userId", &user_id)])).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No file uploaded.");

    let response = send(
        &app.router,
        put_multipart(&[
            Part::Text("userId", &user_id),
            Part::File("profilePicture", "empty.png", b""),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No file uploaded.");

    let response = send(
        &app.router,
        put_json("/api/users/profile-picture", json!({ "userId": user.id })),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["message"], "No file uploaded.");

    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn update_picture_over_size_limit_is_400() {
    let app = TestApp::new();
    let user = app.seed("jane");
    let user_id = user.id.to_string();
    let expected = format!("File too large (limit is {MAX_FILE_SIZE} bytes)");

    // One byte over the limit still fits in the request body allowance and
    // is caught by the storage check; the second body exceeds the allowance
    // and is cut off while the form is being read.
    for size in [MAX_FILE_SIZE + 1, MAX_FILE_SIZE + 256 * 1024] {
        let image = vec![0xAB_u8; size];
        let response = send(
            &app.router,
            put_multipart(&[
                Part::Text("userId", &user_id),
                Part::File("profilePicture", "big.png", &image),
            ]),
        )
        .await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "size {size}");
        assert_eq!(body_json(response).await["message"], expected.as_str());
    }

    assert_eq!(app.stored_files(), 0);
    let stored = app.store.find_by_id(user.id).await.unwrap().unwrap();
    assert_eq!(stored.profile_picture, "");
}

#[tokio::test]
async fn update_picture_invalid_user_id_is_400() {
    let app = TestApp::new();

    for parts in [
        vec![Part::File("profilePicture", "a.png", b"data")],
        vec![
            Part::Text("userId", "seven"),
            Part::File("profilePicture", "a.png", b"data"),
        ],
    ] {
        let response = send(&app.router, put_multipart(&parts)).await;
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(body_json(response).await["code"], "VALIDATION_ERROR");
    }
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn update_picture_unknown_user_is_404_and_file_removed() {
    let app = TestApp::new();

    let response = send(
        &app.router,
        put_multipart(&[
            Part::Text("userId", "31337"),
            Part::File("profilePicture", "a.jpg", b"jpeg bytes"),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["message"], "User not found");
    assert_eq!(app.stored_files(), 0);
}

#[tokio::test]
async fn update_picture_store_failure_is_500_and_file_removed() {
    let (router, dir) = TestApp::with_store(Arc::new(FailingStore));

    let response = send(
        &router,
        put_multipart(&[
            Part::Text("userId", "1"),
            Part::File("profilePicture", "a.gif", b"gif bytes"),
        ]),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(
        body_json(response).await["message"],
        "An error occurred while updating the picture"
    );
    assert_eq!(count_files(&dir.path().join("uploads")), 0);
}

// ============================================================================
// Cross-cutting
// ============================================================================

#[tokio::test]
async fn responses_carry_request_id() {
    let app = TestApp::new();

    let response = send(&app.router, get("/api/users/1")).await;
    assert!(response.headers().contains_key("x-request-id"));

    let request = Request::builder()
        .uri("/health")
        .header("x-request-id", "trace-me")
        .body(Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;
    assert_eq!(response.headers()["x-request-id"], "trace-me");
}

#[tokio::test]
async fn rewritten_errors_are_readable_when_compressed() {
    let app = TestApp::new();

    let request = Request::builder()
        .uri("/api/users/not-a-number-at-all")
        .header(header::ACCEPT_ENCODING, "gzip")
        .body(Body::empty())
        .unwrap();
    let response = send(&app.router, request).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(response.headers()[header::CONTENT_ENCODING], "gzip");

    let compressed = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let mut decoded = String::new();
    GzDecoder::new(&compressed[..])
        .read_to_string(&mut decoded)
        .unwrap();

    let body: Value = serde_json::from_str(&decoded).unwrap();
    assert_eq!(body["code"], "BAD_REQUEST");
    let message = body["message"].as_str().unwrap();
    assert!(message.contains("Cannot parse"), "{message}");
    assert!(message.contains("not-a-number-at-all"), "{message}");
}

#[tokio::test]
async fn health_reports_store() {
    let app = TestApp::new();

    let response = send(&app.router, get("/health")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["store"], "memory");
}

#[tokio::test]
async fn openapi_document_lists_profile_routes() {
    let app = TestApp::new();

    let response = send(&app.router, get("/api-docs/openapi.json")).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let paths = body["paths"].as_object().unwrap();
    assert!(paths.contains_key("/api/users/{id}"));
    assert!(paths.contains_key("/api/users/username"));
    assert!(paths.contains_key("/api/users/profile-picture"));
}
