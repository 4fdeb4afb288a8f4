//! In-memory user store backed by a `DashMap`.
//!
//! Lets the router run without Postgres; the router tests build on it.
//! Usernames are unique, as in the `users` table.

use std::sync::atomic::{AtomicI32, Ordering};

use async_trait::async_trait;
use dashmap::DashMap;
use jiff::Timestamp;
use jiff::civil::DateTime;
use jiff::tz::TimeZone;

use crate::error::{AppError, AppResult};
use crate::models::{NewUser, UpdateUser, User};
use crate::repositories::UserStore;

#[derive(Debug)]
pub struct MemoryUserRepository {
    users: DashMap<i32, User>,
    next_id: AtomicI32,
}

impl MemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: DashMap::new(),
            next_id: AtomicI32::new(1),
        }
    }

    /// Inserts a record and returns it with its assigned id.
    pub fn insert(&self, new_user: NewUser) -> User {
        let id = self.next_id.fetch_add(1, Ordering::SeqCst);
        let now = utc_now();
        let user = User {
            id,
            username: new_user.username,
            password: new_user.password,
            profile_picture: new_user.profile_picture,
            created_at: now,
            updated_at: now,
        };
        self.users.insert(id, user.clone());
        user
    }

    fn ensure_username_free(&self, user_id: i32, username: &str) -> AppResult<()> {
        let taken = self
            .users
            .iter()
            .any(|entry| *entry.key() != user_id && entry.value().username == username);
        if taken {
            return Err(AppError::Database {
                operation: "update user".to_string(),
                source: anyhow::anyhow!(
                    "duplicate key value violates unique constraint (unique violation, constraint users_username_key)"
                ),
            });
        }
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.users.len()
    }

    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }
}

impl Default for MemoryUserRepository {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UserStore for MemoryUserRepository {
    async fn find_by_id(&self, user_id: i32) -> AppResult<Option<User>> {
        Ok(self.users.get(&user_id).map(|entry| entry.value().clone()))
    }

    async fn update(&self, user_id: i32, changes: UpdateUser) -> AppResult<Option<User>> {
        if let Some(username) = &changes.username {
            self.ensure_username_free(user_id, username)?;
        }

        Ok(self.users.get_mut(&user_id).map(|mut entry| {
            let user = entry.value_mut();
            changes.apply_to(user);
            user.updated_at = utc_now();
            user.clone()
        }))
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}

fn utc_now() -> DateTime {
    Timestamp::now().to_zoned(TimeZone::UTC).datetime()
}
