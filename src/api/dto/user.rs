//! Profile DTOs for API requests and responses.

use crate::models::User;
use serde::{Deserialize, Deserializer, Serialize, de};
use utoipa::ToSchema;
use validator::Validate;

/// Wire format for timestamps: UTC, millisecond precision.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S%.3fZ";

// ============================================================================
// Request DTOs
// ============================================================================

/// Request body for changing a username.
///
/// `username` is optional at the type level so a missing value reaches the
/// handler's "Username is required" check instead of failing deserialization.
/// `userId` accepts a number or a numeric string, like the multipart form.
#[derive(Debug, Deserialize, ToSchema, Validate)]
#[serde(rename_all = "camelCase")]
pub struct UpdateUsernameRequest {
    #[validate(length(max = 50, message = "Username must be at most 50 characters"))]
    #[schema(max_length = 50, example = "new_name")]
    pub username: Option<String>,
    #[validate(required(message = "User id is required"))]
    #[serde(default, deserialize_with = "int_or_numeric_string")]
    #[schema(value_type = Option<i32>, example = 1)]
    pub user_id: Option<i32>,
}

fn int_or_numeric_string<'de, D>(deserializer: D) -> Result<Option<i32>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Int(i32),
        Text(String),
    }

    let invalid = || <D::Error as de::Error>::custom("userId must be an integer");
    match Option::<RawId>::deserialize(deserializer).map_err(|_| invalid())? {
        None => Ok(None),
        Some(RawId::Int(id)) => Ok(Some(id)),
        Some(RawId::Text(text)) => text.trim().parse().map(Some).map_err(|_| invalid()),
    }
}

/// Multipart form accepted by the profile picture endpoint.
///
/// Only used for the OpenAPI document; the handler reads the parts directly.
#[derive(Debug, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ProfilePictureForm {
    /// Image file to store
    #[schema(value_type = String, format = Binary)]
    pub profile_picture: Vec<u8>,
    /// Id of the user to update
    pub user_id: i32,
}

// ============================================================================
// Response DTOs
// ============================================================================

/// Response body for user data (excludes sensitive fields like password).
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    pub id: i32,
    pub username: String,
    /// Public URL of the picture, empty when none was uploaded
    #[schema(example = "/uploads/1735689600000-3f2a.png")]
    pub profile_picture: String,
    #[schema(value_type = String, format = DateTime)]
    pub created_at: String,
    #[schema(value_type = String, format = DateTime)]
    pub updated_at: String,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            profile_picture: user.profile_picture,
            created_at: user.created_at.strftime(TIMESTAMP_FORMAT).to_string(),
            updated_at: user.updated_at.strftime(TIMESTAMP_FORMAT).to_string(),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct UsernameUpdatedResponse {
    #[schema(example = "Username updated successfully")]
    pub message: String,
    pub user: UserResponse,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ProfilePictureResponse {
    #[schema(example = "Profile picture uploaded successfully")]
    pub message: String,
    /// Public URL of the stored file
    pub url: String,
    pub user: UserResponse,
}
