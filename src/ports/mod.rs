//! Ports - Interfaces for external dependencies.
//!
//! Following hexagonal architecture, ports define the contracts between
//! the reflection engine and the outside world. Adapters implement these ports.
//!
//! - `TextGenerator` - Opaque LLM text generation
//! - `TranscriptStore` - Append-only per-conversation turn log
//! - `ThresholdStore` - Shared admin-tuned threshold profiles

mod text_generator;
mod threshold_store;
mod transcript_store;

pub use text_generator::{GenerationError, GenerationRequest, TextGenerator, DEFAULT_MAX_TOKENS};
pub use threshold_store::{ThresholdStore, ThresholdStoreError};
pub use transcript_store::{
    CategoryChange, ConversationRecord, TranscriptError, TranscriptStore, TurnRecord,
};
