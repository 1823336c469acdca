//! Phase progression configuration

use serde::Deserialize;

use super::error::ValidationError;

/// Tuning for completion evaluation and threshold learning
#[derive(Debug, Clone, Deserialize)]
pub struct ProgressionConfig {
    /// Profiles at or below this confidence are ignored
    #[serde(default = "default_activation_floor")]
    pub activation_floor: f64,

    /// Step size for corroborating feedback
    #[serde(default = "default_learning_rate")]
    pub learning_rate: f64,

    /// Confidence given to a profile created by its first feedback
    #[serde(default)]
    pub initial_confidence: f64,

    /// Attempts before a contended profile update gives up
    #[serde(default = "default_max_feedback_retries")]
    pub max_feedback_retries: u32,

    /// Idle conversations kept in memory before the oldest is dropped
    #[serde(default = "default_conversation_cache_capacity")]
    pub conversation_cache_capacity: usize,
}

impl ProgressionConfig {
    /// Validate progression configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        for (name, value) in [
            ("activation_floor", self.activation_floor),
            ("learning_rate", self.learning_rate),
            ("initial_confidence", self.initial_confidence),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ValidationError::OutOfUnitRange(name));
            }
        }
        if self.max_feedback_retries == 0 {
            return Err(ValidationError::MustBePositive("max_feedback_retries"));
        }
        if self.conversation_cache_capacity == 0 {
            return Err(ValidationError::MustBePositive("conversation_cache_capacity"));
        }
        Ok(())
    }
}

impl Default for ProgressionConfig {
    fn default() -> Self {
        Self {
            activation_floor: default_activation_floor(),
            learning_rate: default_learning_rate(),
            initial_confidence: 0.0,
            max_feedback_retries: default_max_feedback_retries(),
            conversation_cache_capacity: default_conversation_cache_capacity(),
        }
    }
}

fn default_activation_floor() -> f64 {
    0.6
}

fn default_learning_rate() -> f64 {
    0.2
}

fn default_max_feedback_retries() -> u32 {
    5
}

fn default_conversation_cache_capacity() -> usize {
    10_000
}
