//! Error types for pgtab

use thiserror::Error;

/// Result type alias for pgtab operations
pub type TabResult<T> = Result<T, TabError>;

/// Error types for table access and value coding
#[derive(Debug, Error)]
pub enum TabError {
    /// A structured value could not be serialized into its envelope
    #[error("Encode error: {0}")]
    Encode(String),

    /// Stored text could not be turned back into a value
    #[error("Decode error: {0}")]
    Decode(String),

    /// An envelope named a type the codec's registry does not know
    #[error("Unknown type '{0}': not registered with the codec")]
    UnknownType(String),

    /// Statement execution failed
    #[error("Query error: {message}")]
    Query {
        message: String,
        #[source]
        source: Option<tokio_postgres::Error>,
    },

    /// Unique constraint violation
    #[error("Unique constraint violation: {0}")]
    UniqueViolation(String),

    /// Foreign key constraint violation
    #[error("Foreign key violation: {0}")]
    ForeignKeyViolation(String),

    /// Check constraint violation
    #[error("Check constraint violation: {0}")]
    CheckViolation(String),

    /// Positional column/value counts disagree
    #[error("Argument mismatch: expected {expected} values, got {got}")]
    ArgumentMismatch { expected: usize, got: usize },

    /// The connection source is not running
    #[error("Connection source is unavailable")]
    Unavailable,

    /// Invalid input (identifiers, unknown columns, missing demapper)
    #[error("Validation error: {0}")]
    Validation(String),

    /// Database connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// Pool error
    #[cfg(feature = "pool")]
    #[error("Pool error: {0}")]
    Pool(String),
}

impl TabError {
    /// Create an encode error
    pub fn encode(message: impl Into<String>) -> Self {
        Self::Encode(message.into())
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode(message.into())
    }

    /// Create a query error that has no driver error behind it
    pub fn query(message: impl Into<String>) -> Self {
        Self::Query {
            message: message.into(),
            source: None,
        }
    }

    /// Create a validation error
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    /// Create an argument mismatch error
    pub fn mismatch(expected: usize, got: usize) -> Self {
        Self::ArgumentMismatch { expected, got }
    }

    /// Check if this is a statement execution failure (including constraint violations).
    ///
    /// These are the only errors a caller-side retry policy may reasonably retry.
    pub fn is_query_error(&self) -> bool {
        matches!(
            self,
            Self::Query { .. }
                | Self::UniqueViolation(_)
                | Self::ForeignKeyViolation(_)
                | Self::CheckViolation(_)
        )
    }

    /// Check if this is a unique violation error
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation(_))
    }

    /// Check if this is an argument mismatch error
    pub fn is_argument_mismatch(&self) -> bool {
        matches!(self, Self::ArgumentMismatch { .. })
    }

    /// Check if the connection source was unavailable
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Self::Unavailable)
    }

    /// Check if an envelope named an unregistered type
    pub fn is_unknown_type(&self) -> bool {
        matches!(self, Self::UnknownType(_))
    }

    /// Parse a tokio_postgres error into a more specific TabError
    pub fn from_db_error(err: tokio_postgres::Error) -> Self {
        if let Some(db_err) = err.as_db_error() {
            let constraint = db_err.constraint().unwrap_or("unknown");
            let message = db_err.message();

            match db_err.code().code() {
                "23505" => return Self::UniqueViolation(format!("{}: {}", constraint, message)),
                "23503" => {
                    return Self::ForeignKeyViolation(format!("{}: {}", constraint, message));
                }
                "23514" => return Self::CheckViolation(format!("{}: {}", constraint, message)),
                _ => {}
            }
        }
        Self::Query {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<tokio_postgres::Error> for TabError {
    fn from(err: tokio_postgres::Error) -> Self {
        Self::from_db_error(err)
    }
}

#[cfg(feature = "pool")]
impl From<deadpool_postgres::PoolError> for TabError {
    fn from(err: deadpool_postgres::PoolError) -> Self {
        Self::Pool(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mismatch_reports_both_counts() {
        let err = TabError::mismatch(2, 1);
        assert!(err.is_argument_mismatch());
        assert_eq!(err.to_string(), "Argument mismatch: expected 2 values, got 1");
    }

    #[test]
    fn only_execution_failures_are_query_errors() {
        assert!(TabError::query("boom").is_query_error());
        assert!(TabError::UniqueViolation("users_pkey: dup".into()).is_query_error());
        assert!(!TabError::Unavailable.is_query_error());
        assert!(!TabError::mismatch(1, 0).is_query_error());
    }
}
