//! BookWorm SDK
//!
//! Shared types for BookWorm components: the channel activity envelope
//! exchanged with messaging adapters and the engine-wide error type.
//! This crate is used by the engine and by its integration tests.

/// Channel activity types
pub mod activity;

/// Error types and handling
pub mod errors;

// Re-export commonly used types
pub use activity::{Activity, ActivityType, ChannelAccount, ConversationAccount};
pub use errors::{BookwormErrorExt, EngineError};
