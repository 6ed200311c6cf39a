use diesel::result::{DatabaseErrorKind, Error as DieselError};
use std::fmt::Display;
use thiserror::Error;

use rebal_engine::EngineError;

/// Error type for database pool initialization
#[derive(Debug, Error)]
pub enum ErrorKind {
    #[error("cannot init database pool : {0}")]
    Pool(String),
    #[error("invalid database url : {0}")]
    Url(String),
    #[error("cannot run database migrations : {0}")]
    Migration(String),
}

/// Unified database error type with context for runtime operations
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Failed to get connection from pool for operation '{operation}': {message}")]
    PoolError { operation: String, message: String },

    #[error("Database interaction failed for operation '{operation}': {message}")]
    InteractionError { operation: String, message: String },

    #[error("Record not found in operation '{operation}'")]
    NotFound { operation: String },

    #[error("Database query error in operation '{operation}': {message}")]
    QueryError { operation: String, message: String },

    #[error("Unique constraint violation in operation '{operation}': {message}")]
    UniqueViolation { operation: String, message: String },

    #[error("Foreign key constraint violation in operation '{operation}': {message}")]
    ForeignKeyViolation { operation: String, message: String },

    #[error("Concurrent write conflict in operation '{operation}': {message}")]
    SerializationFailure { operation: String, message: String },

    #[error("Invalid stored data in operation '{operation}': {message}")]
    InvalidData { operation: String, message: String },
}

const UNKNOWN_OPERATION: &str = "unknown";

impl DatabaseError {
    /// Create a `NotFound` error with operation context
    pub fn not_found(operation: impl Display) -> Self {
        Self::NotFound {
            operation: operation.to_string(),
        }
    }

    /// Create a `QueryError` with operation context
    pub fn query_error(operation: impl Display, message: impl Display) -> Self {
        Self::QueryError {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    pub fn invalid_data(operation: impl Display, message: impl Display) -> Self {
        Self::InvalidData {
            operation: operation.to_string(),
            message: message.to_string(),
        }
    }

    /// Check if this error is a `NotFound` variant
    pub const fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Another writer touched the same rows; retrying the whole operation may succeed.
    pub const fn is_conflict(&self) -> bool {
        matches!(
            self,
            Self::UniqueViolation { .. } | Self::SerializationFailure { .. }
        )
    }

    /// Extract the operation context from the error
    pub fn operation(&self) -> &str {
        match self {
            Self::PoolError { operation, .. }
            | Self::InteractionError { operation, .. }
            | Self::NotFound { operation }
            | Self::QueryError { operation, .. }
            | Self::UniqueViolation { operation, .. }
            | Self::ForeignKeyViolation { operation, .. }
            | Self::SerializationFailure { operation, .. }
            | Self::InvalidData { operation, .. } => operation,
        }
    }

    /// Fill in the operation of an error converted without context.
    #[must_use]
    pub fn with_operation(mut self, context: &str) -> Self {
        match &mut self {
            Self::PoolError { operation, .. }
            | Self::InteractionError { operation, .. }
            | Self::NotFound { operation }
            | Self::QueryError { operation, .. }
            | Self::UniqueViolation { operation, .. }
            | Self::ForeignKeyViolation { operation, .. }
            | Self::SerializationFailure { operation, .. }
            | Self::InvalidData { operation, .. } => {
                if operation == UNKNOWN_OPERATION {
                    *operation = context.to_string();
                }
            }
        }
        self
    }
}

impl From<DieselError> for DatabaseError {
    fn from(err: DieselError) -> Self {
        let operation = UNKNOWN_OPERATION.to_string();
        match err {
            DieselError::NotFound => Self::NotFound { operation },
            DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, info) => {
                Self::UniqueViolation {
                    operation,
                    message: info.message().to_string(),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::ForeignKeyViolation, info) => {
                Self::ForeignKeyViolation {
                    operation,
                    message: info.message().to_string(),
                }
            }
            DieselError::DatabaseError(DatabaseErrorKind::SerializationFailure, info) => {
                Self::SerializationFailure {
                    operation,
                    message: info.message().to_string(),
                }
            }
            other => Self::QueryError {
                operation,
                message: other.to_string(),
            },
        }
    }
}

impl From<DatabaseError> for EngineError {
    fn from(err: DatabaseError) -> Self {
        if err.is_conflict() {
            Self::PersistenceConflict(err.to_string())
        } else {
            Self::Persistence(err.to_string())
        }
    }
}
