//! Record store abstraction for user records.

use async_trait::async_trait;

use crate::error::AppResult;
use crate::models::{UpdateUser, User};

/// Id-based access to persisted user records.
///
/// Uses `async_trait` so the store can be shared as `Arc<dyn UserStore>`
/// between the Postgres repository and the in-memory implementation.
///
/// # Example Implementation
/// ```ignore
/// #[async_trait]
/// impl UserStore for MyStore {
///     async fn find_by_id(&self, user_id: i32) -> AppResult<Option<User>> { ... }
///     async fn update(&self, user_id: i32, changes: UpdateUser) -> AppResult<Option<User>> { ... }
///     fn name(&self) -> &'static str { "my-store" }
/// }
/// ```
#[async_trait]
pub trait UserStore: Send + Sync {
    /// Looks up a user by id.
    ///
    /// # Returns
    /// `Some(User)` if found, `None` otherwise
    async fn find_by_id(&self, user_id: i32) -> AppResult<Option<User>>;

    /// Applies `changes` to the user with the given id.
    ///
    /// # Returns
    /// The post-update record, or `None` if no user has that id
    async fn update(&self, user_id: i32, changes: UpdateUser) -> AppResult<Option<User>>;

    /// Returns the store name for logging
    fn name(&self) -> &'static str;
}
