//! Error types for normalization, classification and dispatch.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum NlpError {
    /// Invalid or incomplete configuration, detected at startup.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A message held a number of valid parameters outside the declared bounds.
    #[error("invalid number of parameters: expected {expected_min} to {expected_max}, {found} found")]
    ParamParse {
        expected_min: usize,
        expected_max: usize,
        found: usize,
    },

    #[error("message not found: {name}")]
    MessageNotFound { name: String },

    /// No handler binding of the command applies to the message.
    #[error("no handler of command '{command}' applies to the message")]
    NoHandlerMatched { command: String },

    #[error("index error: {0}")]
    Index(String),

    #[error("training state error: {0}")]
    State(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

impl NlpError {
    pub fn configuration(message: impl Into<String>) -> Self {
        NlpError::Configuration(message.into())
    }
}

/// Result type used throughout the hark crates.
pub type NlpResult<T> = Result<T, NlpError>;
