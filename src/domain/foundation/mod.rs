//! Foundation module - Shared domain primitives.
//!
//! Contains identifiers, timestamps, the state machine trait, and error
//! types that the reflection domain is built from.

mod errors;
mod ids;
mod state_machine;
mod timestamp;

pub use errors::{DomainError, ErrorCode, ValidationError};
pub use ids::ConversationId;
pub use state_machine::StateMachine;
pub use timestamp::Timestamp;
