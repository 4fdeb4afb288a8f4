use crate::error::AppError;
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// Utility for converting database errors to AppError variants.
///
/// Every failure except a missing row becomes `AppError::Database`. The
/// constraint name and database message are kept in the source so they show
/// up in logs, never in responses.
pub struct DatabaseErrorConverter;

impl DatabaseErrorConverter {
    /// Converts a Diesel error to an appropriate AppError variant.
    ///
    /// # Arguments
    /// * `error` - The Diesel error to convert
    /// * `operation` - Description of the database operation that failed
    pub fn convert_diesel_error(error: DieselError, operation: &str) -> AppError {
        match error {
            DieselError::NotFound => AppError::NotFound {
                entity: "resource".to_string(),
                field: "id".to_string(),
                value: "unknown".to_string(),
            },
            DieselError::DatabaseError(kind, info) => {
                let source = match info.constraint_name() {
                    Some(constraint) => anyhow::anyhow!(
                        "{} ({}, constraint {})",
                        info.message(),
                        Self::kind_label(&kind),
                        constraint
                    ),
                    None => anyhow::anyhow!("{} ({})", info.message(), Self::kind_label(&kind)),
                };
                AppError::Database {
                    operation: operation.to_string(),
                    source,
                }
            }
            other => AppError::Database {
                operation: operation.to_string(),
                source: anyhow::Error::from(other),
            },
        }
    }

    fn kind_label(kind: &DatabaseErrorKind) -> &'static str {
        match kind {
            DatabaseErrorKind::UniqueViolation => "unique violation",
            DatabaseErrorKind::ForeignKeyViolation => "foreign key violation",
            DatabaseErrorKind::NotNullViolation => "not null violation",
            DatabaseErrorKind::CheckViolation => "check violation",
            DatabaseErrorKind::SerializationFailure => "serialization failure",
            DatabaseErrorKind::ClosedConnection => "closed connection",
            _ => "database error",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_not_found() {
        let err = DatabaseErrorConverter::convert_diesel_error(DieselError::NotFound, "find user");
        assert!(matches!(err, AppError::NotFound { .. }));
    }

    #[test]
    fn test_other_errors_are_database_errors() {
        let err = DatabaseErrorConverter::convert_diesel_error(
            DieselError::RollbackTransaction,
            "update user",
        );
        match err {
            AppError::Database { operation, .. } => assert_eq!(operation, "update user"),
            other => panic!("Expected Database, got {:?}", other),
        }
    }

    #[test]
    fn test_unique_violation_is_not_classified() {
        let info = Box::new("duplicate key value violates unique constraint".to_string());
        let err = DatabaseErrorConverter::convert_diesel_error(
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info),
            "update user",
        );
        assert!(err.is_server_error());
    }
}
