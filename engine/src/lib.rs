//! BookWorm Engine Library
//!
//! This library provides the core functionality of the BookWorm relay.
//! It is used by both the main binary and integration tests.

/// Configuration management module
pub mod config;

/// Secret handling and log scrubbing
pub mod secrets;

/// Completion provider abstraction layer
pub mod llm;

/// Per-user conversation history
pub mod conversation;

/// Relay bot, turn error handling and channel adapters
pub mod bot;

/// HTTP channel endpoint
pub mod server;

/// Telemetry and Observability
pub mod telemetry;

/// CLI interface module
pub mod cli;

/// Command handlers module
pub mod handlers;
