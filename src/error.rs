//! Error types for Chronicle API calls.

use reqwest::StatusCode;

/// Errors raised by the Chronicle client.
#[derive(Debug, thiserror::Error)]
pub enum SecOpsError {
    /// Caller-supplied arguments violate a precondition. Raised before any
    /// request is sent.
    #[error("invalid parameters: {0}")]
    Validation(String),

    /// The API answered with a non-success status.
    #[error("{context}: {status} - {body}")]
    Api {
        /// What the client was trying to do.
        context: String,
        status: StatusCode,
        /// Raw response body text.
        body: String,
    },

    /// A lookup by display name matched nothing.
    #[error("not found: {0}")]
    NotFound(String),

    /// The request could not be sent or its body could not be read.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Credentials could not be resolved or a token could not be minted.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// A success response carried a body that was not valid JSON.
    #[error("failed to parse response JSON: {0}")]
    Decode(#[from] serde_json::Error),
}

impl SecOpsError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// HTTP status of an API failure, if this is one.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

pub type Result<T> = std::result::Result<T, SecOpsError>;
