//! Error types for the chat core.

use thiserror::Error;

/// Errors raised below the dispatcher boundary.
///
/// `MessageDispatcher::send` folds every one of these into a fallback bot
/// message, so they only surface to callers of the lower-level pieces
/// (reply service, attachment encoder, profile avatar upload).
#[derive(Error, Debug)]
pub enum ChatError {
    /// File system error (attachment reads)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// No response was received from the reply endpoint
    #[error("Transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// The reply endpoint answered with a non-success status
    #[error("Reply endpoint returned HTTP {status}: {body}")]
    HttpStatus { status: u16, body: String },

    /// The response body was not valid JSON
    #[error("Invalid response body: {0}")]
    InvalidResponse(#[from] serde_json::Error),

    /// A string that should have been a base64 data URI was not one
    #[error("Invalid data URI: {0}")]
    InvalidDataUri(String),
}

impl ChatError {
    /// Creates an InvalidDataUri error
    pub fn invalid_data_uri(message: impl Into<String>) -> Self {
        Self::InvalidDataUri(message.into())
    }

    /// Check if the error happened before any response arrived
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }

    /// Check if this is an HTTP status error
    pub fn is_http_status(&self) -> bool {
        matches!(self, Self::HttpStatus { .. })
    }

    /// Check if the body could not be parsed
    pub fn is_invalid_response(&self) -> bool {
        matches!(self, Self::InvalidResponse(_))
    }
}

/// Convenient Result alias for the chat core.
pub type Result<T> = std::result::Result<T, ChatError>;
