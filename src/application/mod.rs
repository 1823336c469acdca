//! Application layer - Commands, Queries, and Handlers.
//!
//! This layer orchestrates the reflection domain and coordinates between
//! ports. Command handlers (start, submit, feedback, categorize) are kept
//! apart from query handlers (export, thresholds).

pub mod conversation_cache;
pub mod error;
pub mod handlers;
pub mod prompts;

pub use conversation_cache::{CachedConversation, ConversationCache};
pub use error::ReflectionError;
pub use handlers::*;
