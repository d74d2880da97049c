//! Error types and handling for gantry-web
//!
//! The client adds no translation or recovery layer of its own: everything
//! the wrapped engine reports passes through as [`ClientError::Transport`].

use thiserror::Error;

/// Result type alias for gantry-web operations
pub type Result<T> = std::result::Result<T, ClientError>;

/// Error types for gantry-web client operations
#[derive(Error, Debug)]
pub enum ClientError {
    /// The round-trip completed without producing a response object
    #[error("'null' http response")]
    NullResponse,

    /// HTTP request failed inside the wrapped engine
    #[error("HTTP request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The blocking runtime could not be started
    #[error("Failed to start blocking runtime: {0}")]
    Runtime(#[from] std::io::Error),
}

impl ClientError {
    /// HTTP status attached to the failure, when the engine reported one
    pub fn status(&self) -> Option<reqwest::StatusCode> {
        match self {
            Self::Transport(err) => err.status(),
            _ => None,
        }
    }
}
