//! User service for business logic operations.
//!
//! Provides a higher-level API for profile operations, encapsulating
//! business rules and coordinating with the record store.

use std::sync::Arc;

use crate::error::{AppError, AppResult};
use crate::models::{UpdateUser, User};
use crate::repositories::UserStore;

/// User service for handling profile-related business logic.
///
/// Wraps the shared `UserStore`; cloning only bumps the `Arc` count.
#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn UserStore>,
}

impl UserService {
    /// Creates a new UserService with the given store.
    pub fn new(store: Arc<dyn UserStore>) -> Self {
        Self { store }
    }

    /// Gets a user by their ID.
    ///
    /// # Returns
    /// The user if found, or `NotFound` error
    pub async fn get_user(&self, id: i32) -> AppResult<User> {
        self.store
            .find_by_id(id)
            .await
            .inspect_err(|e| self.log_store_failure("find_by_id", id, e))?
            .ok_or_else(|| user_not_found(id))
    }

    /// Sets a new username.
    ///
    /// # Returns
    /// The post-update user, or `NotFound` if the id does not resolve
    pub async fn update_username(&self, id: i32, username: String) -> AppResult<User> {
        self.apply(id, UpdateUser::username(username)).await
    }

    /// Points the user's profile picture at `url`.
    ///
    /// # Returns
    /// The post-update user, or `NotFound` if the id does not resolve
    pub async fn update_profile_picture(&self, id: i32, url: String) -> AppResult<User> {
        self.apply(id, UpdateUser::profile_picture(url)).await
    }

    async fn apply(&self, id: i32, changes: UpdateUser) -> AppResult<User> {
        let user = self
            .store
            .update(id, changes)
            .await
            .inspect_err(|e| self.log_store_failure("update", id, e))?
            .ok_or_else(|| user_not_found(id))?;

        tracing::info!(user_id = id, store = self.store.name(), "User updated");
        Ok(user)
    }

    /// Name of the backing store, for logs and health output.
    pub fn store_name(&self) -> &'static str {
        self.store.name()
    }

    fn log_store_failure(&self, operation: &str, id: i32, error: &AppError) {
        if error.is_server_error() {
            tracing::error!(
                user_id = id,
                store = self.store.name(),
                operation,
                error = ?error,
                "User store operation failed"
            );
        }
    }
}

fn user_not_found(id: i32) -> AppError {
    AppError::not_found("user", "id", id)
}
