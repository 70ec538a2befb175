//! Error types for the vigil risk engine.

use thiserror::Error;

/// Result type alias for engine operations.
pub type VigilResult<T> = Result<T, VigilError>;

/// Errors that can occur inside the monitoring engine.
///
/// Channel loops never propagate transient variants out of their loop body:
/// per the error policy, device hiccups and clipboard read failures are
/// logged and treated as "no new observation" for that cycle.
#[derive(Error, Debug)]
pub enum VigilError {
    #[error("Capture device error: {0}")]
    Device(String),

    #[error("Capture stream error: {0}")]
    Stream(String),

    #[error("Channel unavailable: {0}")]
    Unavailable(String),

    #[error("Clipboard error: {0}")]
    Clipboard(String),

    #[error("Input hook error: {0}")]
    Hook(String),

    #[error("Artifact persistence error: {0}")]
    Persistence(String),

    #[error("Channel send error: {0}")]
    ChannelSend(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<config::ConfigError> for VigilError {
    fn from(err: config::ConfigError) -> Self {
        VigilError::Config(err.to_string())
    }
}
