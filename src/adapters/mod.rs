//! Adapters - Implementations of port interfaces.
//!
//! Adapters connect the domain to external systems:
//! - `ai` - Text generators (OpenAI, scripted mock)
//! - `storage` - In-memory transcript and threshold stores
//! - `postgres` - PostgreSQL transcript and threshold stores
//! - `http` - axum REST API

pub mod ai;
pub mod http;
pub mod postgres;
pub mod storage;

pub use ai::{MockGenerator, OpenAIConfig, OpenAIGenerator};
pub use http::{api_router, ReflectionHandlers};
pub use postgres::{PostgresThresholdStore, PostgresTranscriptStore};
pub use storage::{InMemoryThresholdStore, InMemoryTranscriptStore};
