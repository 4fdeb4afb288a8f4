//! Repository layer for data access operations.
//!
//! Provides the `UserStore` abstraction with Postgres and in-memory backends.

mod memory_repo;
mod store;
mod user_repo;

pub use memory_repo::MemoryUserRepository;
pub use store::UserStore;
pub use user_repo::UserRepository;

use std::sync::Arc;

use crate::db::AsyncDbPool;

/// Aggregates all repositories for convenient access.
///
/// Cloning is cheap since the store is shared behind an `Arc`.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserStore>,
}

impl Repositories {
    /// Creates a new Repositories instance backed by Postgres.
    ///
    /// # Arguments
    /// * `pool` - The async database connection pool
    pub fn new(pool: AsyncDbPool) -> Self {
        Self::from_store(Arc::new(UserRepository::new(pool)))
    }

    /// Creates a Repositories instance over an arbitrary user store.
    pub fn from_store(users: Arc<dyn UserStore>) -> Self {
        Self { users }
    }
}
