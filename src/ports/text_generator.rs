//! Text Generator Port - Interface for LLM text generation.
//!
//! The reflection engine treats generation as opaque: it hands over a system
//! context and a user context and gets text back. Adapters decide which
//! provider and model answer.
//!
//! # Example
//!
//! ```ignore
//! use async_trait::async_trait;
//!
//! struct Echo;
//!
//! #[async_trait]
//! impl TextGenerator for Echo {
//!     async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError> {
//!         Ok(request.user_context)
//!     }
//!
//!     fn name(&self) -> &str {
//!         "echo"
//!     }
//! }
//! ```

use async_trait::async_trait;

/// Default completion budget for a conversational reply.
pub const DEFAULT_MAX_TOKENS: u32 = 250;

/// Port for generating assistant text.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generates a completion for the given contexts.
    ///
    /// An empty string is a valid response; callers decide how to handle it.
    async fn generate(&self, request: GenerationRequest) -> Result<String, GenerationError>;

    /// Provider name, for logs.
    fn name(&self) -> &str;
}

/// A single generation call.
#[derive(Debug, Clone, PartialEq)]
pub struct GenerationRequest {
    pub system_context: String,
    pub user_context: String,
    pub max_tokens: u32,
    /// `None` uses the adapter's configured temperature.
    pub temperature: Option<f32>,
}

impl GenerationRequest {
    pub fn new(system_context: impl Into<String>, user_context: impl Into<String>) -> Self {
        Self {
            system_context: system_context.into(),
            user_context: user_context.into(),
            max_tokens: DEFAULT_MAX_TOKENS,
            temperature: None,
        }
    }

    /// Sets the maximum tokens to generate.
    pub fn with_max_tokens(mut self, max: u32) -> Self {
        self.max_tokens = max;
        self
    }

    /// Sets the temperature.
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }
}

/// Text generation errors.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum GenerationError {
    /// Rate limited by provider.
    #[error("rate limited: retry after {retry_after_secs}s")]
    RateLimited { retry_after_secs: u32 },

    /// Provider is unavailable.
    #[error("provider unavailable: {message}")]
    Unavailable { message: String },

    /// API key or authentication failed.
    #[error("authentication failed")]
    AuthenticationFailed,

    /// Network error during request.
    #[error("network error: {0}")]
    Network(String),

    /// Failed to parse provider response.
    #[error("parse error: {0}")]
    Parse(String),

    /// Request timed out.
    #[error("request timed out after {timeout_secs}s")]
    Timeout { timeout_secs: u32 },
}

impl GenerationError {
    pub fn rate_limited(retry_after_secs: u32) -> Self {
        Self::RateLimited { retry_after_secs }
    }

    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }

    pub fn network(message: impl Into<String>) -> Self {
        Self::Network(message.into())
    }

    pub fn parse(message: impl Into<String>) -> Self {
        Self::Parse(message.into())
    }

    /// Returns true if this error is retryable.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            GenerationError::RateLimited { .. }
                | GenerationError::Unavailable { .. }
                | GenerationError::Network(_)
                | GenerationError::Timeout { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_builder_works() {
        let request = GenerationRequest::new("Be warm", "Hello")
            .with_max_tokens(25)
            .with_temperature(0.3);

        assert_eq!(request.system_context, "Be warm");
        assert_eq!(request.user_context, "Hello");
        assert_eq!(request.max_tokens, 25);
        assert_eq!(request.temperature, Some(0.3));
    }

    #[test]
    fn request_defaults_to_conversational_budget() {
        let request = GenerationRequest::new("s", "u");
        assert_eq!(request.max_tokens, DEFAULT_MAX_TOKENS);
        assert_eq!(request.temperature, None);
    }

    #[test]
    fn retryable_errors() {
        assert!(GenerationError::rate_limited(5).is_retryable());
        assert!(GenerationError::unavailable("503").is_retryable());
        assert!(GenerationError::network("reset").is_retryable());
        assert!(GenerationError::Timeout { timeout_secs: 30 }.is_retryable());
        assert!(!GenerationError::AuthenticationFailed.is_retryable());
        assert!(!GenerationError::parse("bad json").is_retryable());
    }
}
