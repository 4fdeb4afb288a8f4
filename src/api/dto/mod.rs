//! Data Transfer Objects for API requests and responses.
//!
//! DTOs are organized by domain:
//! - `user` - profile request/response DTOs
//! - `error` - common error response DTO

mod error;
mod user;

pub use error::ErrorResponse;
pub use user::{
    ProfilePictureForm, ProfilePictureResponse, UpdateUsernameRequest, UserResponse,
    UsernameUpdatedResponse,
};
