//! Engine client error types.

use std::time::Duration;

use thiserror::Error;

pub type EngineResult<T> = Result<T, EngineError>;

/// Errors talking to the orchestration engine.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("invalid engine endpoint: {0}")]
    InvalidEndpoint(String),

    #[error("connect to {endpoint} failed: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("request {path} failed: {reason}")]
    Request { path: String, reason: String },

    #[error("request {path} timed out after {after:?}")]
    Timeout { path: String, after: Duration },

    #[error("not found: {0}")]
    NotFound(String),

    #[error("engine returned {status}: {message}")]
    Status { status: u16, message: String },

    #[error("decode {path}: {reason}")]
    Decode { path: String, reason: String },

    #[error("encode request body: {0}")]
    Encode(String),
}

impl EngineError {
    /// Whether the engine said the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, EngineError::NotFound(_))
    }

    /// Short human reason, without the variant prefix for engine replies.
    pub fn reason(&self) -> String {
        match self {
            EngineError::Status { message, .. } => message.clone(),
            EngineError::NotFound(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
