//! Completion Gateway
//!
//! This module provides the interface for turning a conversation into the
//! next assistant reply. The `CompletionProvider` trait is the seam between
//! the relay bot and a remote large-language-model API; `OpenAIProvider` is
//! the shipped implementation.
//!
//! A provider is stateless with respect to conversations: it receives the
//! full ordered turn sequence on every call, performs exactly one request,
//! and never retries.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::fmt;

pub mod openai;

/// Result type for completion operations
pub type Result<T> = std::result::Result<T, CompletionError>;

/// Errors that can occur while requesting a completion
#[derive(Debug, thiserror::Error)]
pub enum CompletionError {
    #[error("Provider unavailable: {0}")]
    ProviderUnavailable(String),

    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Parse error: {0}")]
    ParseError(String),
}

/// One turn in a conversation
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Message {
    /// Role of the message sender (system, user, assistant)
    pub role: MessageRole,

    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::User,
            content: content.into(),
        }
    }

    /// Create a new assistant message
    pub fn assistant(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::Assistant,
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: MessageRole::System,
            content: content.into(),
        }
    }
}

/// Role of a message sender
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Persona and behaviour guidance
    System,

    /// User message
    User,

    /// Assistant message
    Assistant,
}

impl fmt::Display for MessageRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageRole::System => write!(f, "system"),
            MessageRole::User => write!(f, "user"),
            MessageRole::Assistant => write!(f, "assistant"),
        }
    }
}

/// Completion provider trait that all gateways must implement
#[async_trait]
pub trait CompletionProvider: Send + Sync {
    /// Returns the name of the provider (e.g., "openai")
    fn name(&self) -> &str;

    /// Returns the model identifier sent with each request
    fn model(&self) -> &str;

    /// Generate the next assistant reply
    ///
    /// # Arguments
    /// * `messages` - Full conversation, oldest first, starting with the persona when present
    ///
    /// # Returns
    /// * `Ok(String)` - Content of the first returned choice
    /// * `Err(CompletionError)` - If the request fails for any reason
    async fn complete(&self, messages: &[Message]) -> Result<String>;

    /// Check if the provider is configured and usable.
    /// Default implementation returns true.
    async fn check_health(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation() {
        let user_msg = Message::user("Hello");
        assert_eq!(user_msg.role, MessageRole::User);
        assert_eq!(user_msg.content, "Hello");

        let assistant_msg = Message::assistant("Hi there");
        assert_eq!(assistant_msg.role, MessageRole::Assistant);
        assert_eq!(assistant_msg.content, "Hi there");

        let system_msg = Message::system("You are a helpful assistant");
        assert_eq!(system_msg.role, MessageRole::System);
    }

    #[test]
    fn test_message_wire_format() {
        let json = serde_json::to_value(Message::system("persona")).unwrap();
        assert_eq!(json, serde_json::json!({"role": "system", "content": "persona"}));
    }

    #[test]
    fn test_role_display_matches_wire_name() {
        for role in [MessageRole::System, MessageRole::User, MessageRole::Assistant] {
            let wire = serde_json::to_value(role).unwrap();
            assert_eq!(wire, serde_json::Value::String(role.to_string()));
        }
    }

    #[test]
    fn test_error_messages() {
        assert_eq!(
            CompletionError::NetworkError("connection refused".into()).to_string(),
            "Network error: connection refused"
        );
        assert_eq!(
            CompletionError::RateLimitExceeded.to_string(),
            "Rate limit exceeded"
        );
    }
}
