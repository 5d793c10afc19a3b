//! Error Handling
//!
//! One error enum covers every failure class of the streaming pipeline:
//! - `Validation`: request rejected before any upstream call (HTTP 400)
//! - `Upstream`: provider failure, surfaced to the consumer as one error frame
//! - `Transport`: consumer-side network failure
//! - `MalformedFrame`: a single unparseable frame, skipped by the consumer
//!
//! plus configuration, telemetry and plain HTTP status failures.

use thiserror::Error;

/// Errors produced by the producer, the consumer and their configuration.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GenerateError {
    /// The generation request failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// The upstream provider reported a failure or sent an unusable payload.
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// The connection to the generation endpoint failed.
    #[error("Transport error: {0}")]
    Transport(String),

    /// A frame payload could not be parsed.
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    /// Missing or invalid configuration value.
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Tracing subscriber could not be installed.
    #[error("Telemetry initialization error: {0}")]
    Telemetry(String),

    /// Non-success HTTP status from the generation endpoint.
    #[error("HTTP error {status}: {message}")]
    Http { status: u16, message: String },
}

impl GenerateError {
    /// Message suitable for showing to an end user in place of output.
    ///
    /// Validation messages are passed through; everything else is reduced to
    /// a generic message so provider details never reach the UI.
    pub fn user_message(&self) -> String {
        match self {
            Self::Validation(msg) => msg.clone(),
            Self::Http { .. } => "Failed to generate response.".to_string(),
            _ => "Something went wrong.".to_string(),
        }
    }

    /// Whether this error was raised before any stream was opened.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}

impl From<reqwest::Error> for GenerateError {
    fn from(err: reqwest::Error) -> Self {
        Self::Transport(err.to_string())
    }
}

/// Result alias used across the crate.
pub type Result<T> = std::result::Result<T, GenerateError>;
