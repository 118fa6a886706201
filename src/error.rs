use thiserror::Error;

#[cfg(feature = "sqlite")]
use rusqlite;

#[derive(Debug, Error)]
pub enum SqlConduitError {
    #[cfg(feature = "sqlite")]
    #[error(transparent)]
    SqliteError(#[from] rusqlite::Error),

    #[error(transparent)]
    IoError(#[from] std::io::Error),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Type mismatch: expected {expected}, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },

    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("SQL execution error: {0}")]
    ExecutionError(String),

    #[error("Unimplemented feature: {0}")]
    Unimplemented(String),
}

impl SqlConduitError {
    pub(crate) fn invalid_argument(message: impl Into<String>) -> Self {
        SqlConduitError::InvalidArgument(message.into())
    }

    /// True for registry and lookup misses, so callers can branch without matching strings.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, SqlConduitError::NotFound(_))
    }
}

impl From<serde_json::Error> for SqlConduitError {
    fn from(err: serde_json::Error) -> Self {
        SqlConduitError::ConfigError(format!("invalid data source options: {err}"))
    }
}
