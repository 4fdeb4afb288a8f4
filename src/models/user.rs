use diesel::prelude::*;
use jiff::civil::DateTime;

/// User record as seen by the rest of the application.
///
/// `password` is an opaque value owned by whoever created the record. It is
/// never serialized; responses are built from `UserResponse` instead.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub id: i32,
    pub username: String,
    pub password: String,
    pub profile_picture: String,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

/// Row model for reading from the `users` table
/// Derives Queryable for SELECT operations and Selectable for type-safe column selection
#[derive(Debug, Queryable, Selectable, Clone)]
#[diesel(table_name = crate::schema::users)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct UserRow {
    pub id: i32,
    pub username: String,
    pub password: String,
    pub profile_picture: String,
    pub created_at: jiff_diesel::DateTime,
    pub updated_at: jiff_diesel::DateTime,
}

impl From<UserRow> for User {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            username: row.username,
            password: row.password,
            profile_picture: row.profile_picture,
            created_at: row.created_at.to_jiff(),
            updated_at: row.updated_at.to_jiff(),
        }
    }
}

/// Data for a user record created outside the HTTP surface
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub profile_picture: String,
}

/// UpdateUser model for partial updates
/// Derives AsChangeset for UPDATE operations with optional fields
#[derive(Debug, AsChangeset, Clone, Default, PartialEq, Eq)]
#[diesel(table_name = crate::schema::users)]
pub struct UpdateUser {
    pub username: Option<String>,
    pub profile_picture: Option<String>,
}

impl UpdateUser {
    pub fn username(username: impl Into<String>) -> Self {
        Self {
            username: Some(username.into()),
            ..Default::default()
        }
    }

    pub fn profile_picture(url: impl Into<String>) -> Self {
        Self {
            profile_picture: Some(url.into()),
            ..Default::default()
        }
    }

    /// Applies the changeset to an in-memory record.
    pub fn apply_to(&self, user: &mut User) {
        if let Some(username) = &self.username {
            user.username = username.clone();
        }
        if let Some(profile_picture) = &self.profile_picture {
            user.profile_picture = profile_picture.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn sample_user() -> User {
        let ts = date(2025, 1, 1).at(12, 0, 0, 0);
        User {
            id: 1,
            username: "alice".to_string(),
            password: "secret".to_string(),
            profile_picture: String::new(),
            created_at: ts,
            updated_at: ts,
        }
    }

    #[test]
    fn test_apply_username_only() {
        let mut user = sample_user();
        UpdateUser::username("bob").apply_to(&mut user);
        assert_eq!(user.username, "bob");
        assert_eq!(user.profile_picture, "");
        assert_eq!(user.password, "secret");
    }

    #[test]
    fn test_apply_profile_picture_only() {
        let mut user = sample_user();
        UpdateUser::profile_picture("/uploads/a.png").apply_to(&mut user);
        assert_eq!(user.username, "alice");
        assert_eq!(user.profile_picture, "/uploads/a.png");
    }

    #[test]
    fn test_empty_changeset_is_noop() {
        let mut user = sample_user();
        UpdateUser::default().apply_to(&mut user);
        assert_eq!(user, sample_user());
    }
}
