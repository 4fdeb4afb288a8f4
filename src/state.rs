//! Application state for Axum web framework.
//!
//! Contains shared services and resources that are accessible
//! across all request handlers.

use std::sync::Arc;

use crate::config::UploadConfig;
use crate::db::AsyncDbPool;
use crate::repositories::{Repositories, UserStore};
use crate::services::Services;
use crate::storage::UploadStorage;

/// Application state containing all shared services and resources.
///
/// Cloning is cheap: the store sits behind an `Arc` and the upload storage
/// only holds its configuration.
#[derive(Clone)]
pub struct AppState {
    /// All business logic services
    pub services: Services,
    /// Where uploaded profile pictures are written and served from
    pub uploads: UploadStorage,
}

impl AppState {
    /// Creates a new AppState backed by Postgres.
    ///
    /// # Example
    /// ```ignore
    /// let pool = establish_async_connection_pool(&settings.database).await?;
    /// let state = AppState::new(pool, &settings.upload);
    /// ```
    pub fn new(pool: AsyncDbPool, upload: &UploadConfig) -> Self {
        Self::from_repositories(Repositories::new(pool), UploadStorage::new(upload))
    }

    /// Creates an AppState over any user store, e.g. `MemoryUserRepository`.
    pub fn with_store(store: Arc<dyn UserStore>, uploads: UploadStorage) -> Self {
        Self::from_repositories(Repositories::from_store(store), uploads)
    }

    fn from_repositories(repos: Repositories, uploads: UploadStorage) -> Self {
        Self {
            services: Services::new(repos),
            uploads,
        }
    }
}
