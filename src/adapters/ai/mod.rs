//! Text Generator Adapters.
//!
//! Implementations of the TextGenerator port.
//!
//! ## Available Adapters
//!
//! - `MockGenerator` - Scripted generator for testing
//! - `OpenAIGenerator` - OpenAI chat completion models

mod mock_generator;
mod openai_generator;

pub use mock_generator::{MockGenerator, MockOutcome, DEFAULT_MOCK_RESPONSE};
pub use openai_generator::{OpenAIConfig, OpenAIGenerator};
