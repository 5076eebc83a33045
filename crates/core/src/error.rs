//! Error types shared across crates

use thiserror::Error;

/// Entity extraction errors
///
/// Any of these leaves the conversation untouched: the engine treats a failed
/// extraction as "nothing was said".
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ExtractionError {
    /// Backend unreachable, timed out or refused the request
    #[error("Extractor unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with something that is not an extraction result
    #[error("Malformed extraction payload: {0}")]
    Malformed(String),

    #[error("Utterance rejected: {0}")]
    Rejected(String),
}

/// Session lifecycle errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Unknown conversation: {0}")]
    NotFound(String),

    #[error("Session serialization failed: {0}")]
    Serialization(String),
}

impl From<serde_json::Error> for SessionError {
    fn from(err: serde_json::Error) -> Self {
        SessionError::Serialization(err.to_string())
    }
}
