//! Mock text generator for testing.
//!
//! Provides a scripted implementation of the TextGenerator port so that
//! services and HTTP handlers can run without calling a real model.
//!
//! # Features
//!
//! - Pre-configured responses, consumed in order
//! - Simulated delays for timeout testing
//! - Error injection for resilience testing
//! - Call tracking for verification
//!
//! # Example
//!
//! ```ignore
//! let generator = MockGenerator::new()
//!     .with_response("Thank you for naming that.")
//!     .with_error(GenerationError::unavailable("down"));
//!
//! let text = generator.generate(request).await?;
//! assert_eq!(text, "Thank you for naming that.");
//! ```

use async_trait::async_trait;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::sleep;

use crate::ports::{GenerationError, GenerationRequest, TextGenerator};

/// Reply used once the script runs out.
pub const DEFAULT_MOCK_RESPONSE: &str = "Mock response";

/// A configured mock outcome.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Text(String),
    Error(GenerationError),
}

/// Scripted generator for tests.
#[derive(Debug, Clone, Default)]
pub struct MockGenerator {
    outcomes: Arc<Mutex<VecDeque<MockOutcome>>>,
    calls: Arc<Mutex<Vec<GenerationRequest>>>,
    delay: Duration,
}

impl MockGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queues a successful response.
    pub fn with_response(self, text: impl Into<String>) -> Self {
        lock(&self.outcomes).push_back(MockOutcome::Text(text.into()));
        self
    }

    /// Queues an error.
    pub fn with_error(self, error: GenerationError) -> Self {
        lock(&self.outcomes).push_back(MockOutcome::Error(error));
        self
    }

    /// Sets simulated latency per request.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Queues a response on an already shared generator.
    pub fn push_response(&self, text: impl Into<String>) {
        lock(&self.outcomes).push_back(MockOutcome::Text(text.into()));
    }

    /// Queues an error on an already shared generator.
    pub fn push_error(&self, error: GenerationError) {
        lock(&self.outcomes).push_back(MockOutcome::Error(error));
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    /// Returns all recorded calls.
    pub fn calls(&self) -> Vec<GenerationRequest> {
        lock(&self.calls).clone()
    }

    fn next_outcome(&self) -> MockOutcome {
        lock(&self.outcomes)
            .pop_front()
            .unwrap_or_else(|| MockOutcome::Text(DEFAULT_MOCK_RESPONSE.to_string()))
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl TextGenerator for MockGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
        lock(&self.calls).push(request);

        if !self.delay.is_zero() {
            sleep(self.delay).await;
        }

        match self.next_outcome() {
            MockOutcome::Text(text) => Ok(text),
            MockOutcome::Error(err) => Err(err),
        }
    }

    fn name(&self) -> &str {
        "mock"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> GenerationRequest {
        GenerationRequest::new("system", "user")
    }

    #[tokio::test]
    async fn returns_scripted_responses_in_order() {
        let generator = MockGenerator::new()
            .with_response("first")
            .with_response("second");

        assert_eq!(generator.generate(request()).await.unwrap(), "first");
        assert_eq!(generator.generate(request()).await.unwrap(), "second");
        assert_eq!(
            generator.generate(request()).await.unwrap(),
            DEFAULT_MOCK_RESPONSE
        );
    }

    #[tokio::test]
    async fn injects_errors() {
        let generator = MockGenerator::new().with_error(GenerationError::AuthenticationFailed);
        let err = generator.generate(request()).await.unwrap_err();
        assert_eq!(err, GenerationError::AuthenticationFailed);
    }

    #[tokio::test]
    async fn records_calls() {
        let generator = MockGenerator::new();
        generator
            .generate(request().with_max_tokens(25))
            .await
            .unwrap();

        assert_eq!(generator.call_count(), 1);
        assert_eq!(generator.calls()[0].max_tokens, 25);
    }

    #[tokio::test]
    async fn clones_share_the_script() {
        let generator = MockGenerator::new();
        let shared = generator.clone();
        shared.push_response("from clone");
        assert_eq!(generator.generate(request()).await.unwrap(), "from clone");
        assert_eq!(shared.call_count(), 1);
    }
}
