//! Error types and handling
//!
//! This module provides the error types used throughout the BookWorm engine.
//! All errors implement the `BookwormErrorExt` trait which provides user-friendly
//! hints and indicates whether errors are recoverable.
//!
//! # Security
//!
//! Error messages carried by these variants may contain upstream response
//! bodies. Callers that log them scrub credentials first; the hints returned
//! by `user_hint` are static and always safe to show to a chat user.

use thiserror::Error;

/// Trait for BookWorm error extensions
///
/// This trait provides additional context for errors, including user-friendly
/// hints and recoverability information. All engine errors implement this trait.
pub trait BookwormErrorExt {
    /// Returns a user-friendly hint for the error
    ///
    /// The hint never contains secrets or upstream response text.
    fn user_hint(&self) -> &str;

    /// Returns whether the error is recoverable
    ///
    /// Recoverable errors affect a single turn. Non-recoverable errors
    /// require fixing the configuration and restarting.
    fn is_recoverable(&self) -> bool;
}

/// Main engine error type
///
/// # Error Categories
///
/// - **Configuration**: Invalid or missing configuration
/// - **Transport**: Failures delivering activities to a channel
/// - **Activity**: Malformed inbound activities
///
/// # Examples
///
/// ```
/// use sdk::errors::{BookwormErrorExt, EngineError};
///
/// let error = EngineError::Transport("connector returned 502".to_string());
/// println!("Hint: {}", error.user_hint());
/// assert!(error.is_recoverable());
///
/// let fatal_error = EngineError::Config("max_turns must be at least 1".to_string());
/// assert!(!fatal_error.is_recoverable());
/// ```
#[derive(Debug, Error)]
pub enum EngineError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Channel errors
    #[error("Transport error: {0}")]
    Transport(String),

    #[error("Invalid activity: {0}")]
    InvalidActivity(String),

    // Network errors
    #[error("Network error: {0}")]
    Network(String),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BookwormErrorExt for EngineError {
    fn user_hint(&self) -> &str {
        match self {
            Self::Config(_) => "Check your config.toml file for errors",
            Self::Transport(_) => "Failed to deliver a message to the channel",
            Self::InvalidActivity(_) => "The channel sent a message the bot could not read",
            Self::Network(_) => "Network operation failed. Check your connection",
            Self::Serialization(_) => "Failed to encode or decode a message",
            Self::Io(_) => "File system operation failed",
        }
    }

    fn is_recoverable(&self) -> bool {
        !matches!(self, Self::Config(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_errors_are_fatal() {
        assert!(!EngineError::Config("bad".into()).is_recoverable());
    }

    #[test]
    fn test_turn_errors_are_recoverable() {
        assert!(EngineError::Transport("502".into()).is_recoverable());
        assert!(EngineError::InvalidActivity("no sender".into()).is_recoverable());
        assert!(EngineError::Network("reset".into()).is_recoverable());
    }

    #[test]
    fn test_io_error_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
        let err: EngineError = io.into();
        assert!(matches!(err, EngineError::Io(_)));
        assert_eq!(err.user_hint(), "File system operation failed");
    }

    #[test]
    fn test_display_includes_detail() {
        let err = EngineError::Transport("connector returned 502".into());
        assert_eq!(err.to_string(), "Transport error: connector returned 502");
    }
}
