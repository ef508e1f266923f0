use sea_orm::error::{DbErr, SqlErr};
use serde::Serialize;

/// Errors raised at the persistence boundary or by request validation.
///
/// The pure generators never produce these; they degrade gracefully instead.
#[derive(Debug, thiserror::Error, Serialize)]
pub enum ServiceError {
    #[error("Database error: {0}")]
    DatabaseError(
        #[from]
        #[serde(skip)]
        DbErr,
    ),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    /// A single insert hit the store's unique constraint.
    #[error("Duplicate identifier: {identifier}")]
    DuplicateIdentifier { identifier: String },

    /// Uniqueness conflicts persisted after every permitted retry.
    #[error("Conflict: {0}")]
    Conflict(String),

    /// Configuration that passed validation but still cannot be applied.
    #[error("Internal error: {0}")]
    InternalError(String),
}

impl From<validator::ValidationErrors> for ServiceError {
    fn from(err: validator::ValidationErrors) -> Self {
        ServiceError::ValidationError(err.to_string())
    }
}

impl ServiceError {
    /// Maps an insert failure, turning unique-constraint violations into
    /// [`ServiceError::DuplicateIdentifier`] for `identifier`.
    pub fn from_insert(error: DbErr, identifier: &str) -> Self {
        match error.sql_err() {
            Some(SqlErr::UniqueConstraintViolation(_)) => ServiceError::DuplicateIdentifier {
                identifier: identifier.to_string(),
            },
            _ => ServiceError::DatabaseError(error),
        }
    }

    /// True for the per-insert duplicate-key signal that callers may retry.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, Self::DuplicateIdentifier { .. })
    }

    /// True when repeating the whole operation later may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::DuplicateIdentifier { .. } | Self::Conflict(_) | Self::DatabaseError(_)
        )
    }

    /// Message suitable for end users; storage internals are not exposed.
    pub fn user_message(&self) -> String {
        match self {
            Self::DatabaseError(_) | Self::InternalError(_) => {
                "Internal server error".to_string()
            }
            Self::Conflict(_) | Self::DuplicateIdentifier { .. } => {
                format!("{}. Please retry", self)
            }
            _ => self.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn duplicate_is_retryable_and_transient() {
        let err = ServiceError::DuplicateIdentifier {
            identifier: "BBA-T-CASA-0001".into(),
        };
        assert!(err.is_duplicate());
        assert!(err.is_transient());
        assert_eq!(
            err.user_message(),
            "Duplicate identifier: BBA-T-CASA-0001. Please retry"
        );
    }

    #[test]
    fn resolution_and_validation_are_not_transient() {
        assert!(!ServiceError::NotFound("contract ACME".into()).is_transient());
        assert!(!ServiceError::ValidationError("empty name".into()).is_transient());
    }

    #[test]
    fn internal_details_are_hidden() {
        assert_eq!(
            ServiceError::DatabaseError(DbErr::Custom("connection reset".into())).user_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::InternalError("order code pattern for contract ACME".into()).user_message(),
            "Internal server error"
        );
        assert_eq!(
            ServiceError::NotFound("contract XYZ".into()).user_message(),
            "Not found: contract XYZ"
        );
    }

    #[test]
    fn non_unique_insert_failures_stay_database_errors() {
        let err = ServiceError::from_insert(DbErr::Custom("disk full".into()), "OMP-ACME-00001");
        assert!(matches!(err, ServiceError::DatabaseError(_)));
    }
}
