//! Error types for SQLite operations.

use thiserror::Error;

use quarry_query::error::QueryError;

/// Result type for SQLite operations.
pub type SqliteResult<T> = Result<T, SqliteError>;

/// Error type for SQLite operations.
#[derive(Debug, Error)]
pub enum SqliteError {
    /// Error reported by SQLite.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// Invalid connection settings.
    #[error("Configuration error: {0}")]
    Config(String),
    /// A parameter could not be bound as its category.
    #[error("Type conversion error: {0}")]
    TypeConversion(String),
    /// The statement's placeholder count does not match the parameters.
    #[error("Statement expects {expected} parameter(s), got {got}")]
    ParameterCount {
        /// Placeholders in the statement.
        expected: usize,
        /// Parameters supplied.
        got: usize,
    },
}

impl SqliteError {
    /// Create a configuration error.
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a type conversion error.
    pub fn type_conversion(msg: impl Into<String>) -> Self {
        Self::TypeConversion(msg.into())
    }
}

impl From<SqliteError> for QueryError {
    fn from(err: SqliteError) -> Self {
        match err {
            SqliteError::TypeConversion(ref msg) => {
                QueryError::conversion_failure("parameter", "sqlite value", msg.clone()).with_source(err)
            }
            other => QueryError::database(other.to_string()).with_source(other),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SqliteError::config("invalid path");
        assert_eq!(err.to_string(), "Configuration error: invalid path");

        let err = SqliteError::ParameterCount { expected: 2, got: 1 };
        assert!(err.to_string().contains("expects 2"));
    }

    #[test]
    fn test_error_conversion() {
        let query_err: QueryError = SqliteError::type_conversion("list").into();
        assert!(query_err.is_conversion_failure());

        let query_err: QueryError = SqliteError::from(rusqlite::Error::InvalidQuery).into();
        assert!(query_err.is_database_error());
        assert!(std::error::Error::source(&query_err).is_some());
    }
}
