//! Error types for eventseries-linker

use thiserror::Error;

/// Linker result type
pub type LinkResult<T> = std::result::Result<T, LinkError>;

/// Linker error type
#[derive(Debug, Error)]
pub enum LinkError {
    /// Unknown id in the record store or completion cache
    #[error("Not found: {0}")]
    NotFound(String),

    /// A completion source failed (timeout, non-success status, unreadable body)
    #[error("External lookup failed ({source_name}): {message}")]
    ExternalLookup {
        source_name: String,
        message: String,
    },

    /// A record is missing a required identity field
    #[error("Malformed input: {0}")]
    MalformedInput(String),

    /// eventseries-common error
    #[error("Common error: {0}")]
    Common(#[from] eventseries_common::Error),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Generic error
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl LinkError {
    pub fn external(source_name: impl Into<String>, message: impl ToString) -> Self {
        LinkError::ExternalLookup {
            source_name: source_name.into(),
            message: message.to_string(),
        }
    }

    /// Whether the caller may treat this error as "no value found"
    pub fn is_recoverable(&self) -> bool {
        matches!(self, LinkError::ExternalLookup { .. })
    }
}

impl From<sqlx::Error> for LinkError {
    fn from(err: sqlx::Error) -> Self {
        LinkError::Common(eventseries_common::Error::Database(err))
    }
}
