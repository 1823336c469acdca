//! Storage Adapters
//!
//! In-memory implementations of the transcript and threshold ports.
//!
//! ## Available Adapters
//!
//! - **InMemoryTranscriptStore** - Turn logs in memory (testing/development)
//! - **InMemoryThresholdStore** - Threshold profiles in memory (testing/development)
//!
//! ## Usage
//!
//! ```ignore
//! use adapters::storage::{InMemoryThresholdStore, InMemoryTranscriptStore};
//!
//! let transcripts = Arc::new(InMemoryTranscriptStore::new());
//! let thresholds = Arc::new(InMemoryThresholdStore::new());
//! ```

mod in_memory_threshold_store;
mod in_memory_transcript_store;

pub use in_memory_threshold_store::InMemoryThresholdStore;
pub use in_memory_transcript_store::InMemoryTranscriptStore;
