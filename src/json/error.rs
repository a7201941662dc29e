//! JSON-specific error types

use thiserror::Error;

pub type JsonResult<T> = Result<T, JsonError>;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum JsonError {
    /// Model output did not contain parseable JSON.
    #[error("Malformed model response: {0}")]
    MalformedResponse(String),

    /// A record could not be JSON-encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Invalid table name: {0}")]
    InvalidTableName(String),
}

impl From<serde_json::Error> for JsonError {
    fn from(err: serde_json::Error) -> Self {
        JsonError::Serialization(err.to_string())
    }
}
