//! Admin-tuned completion thresholds.
//!
//! A profile overrides a phase's default rule only once reviewers have
//! corroborated it often enough for its confidence to clear the activation
//! floor. Confidence only ever moves up; contradicting feedback tightens the
//! thresholds instead.

use serde::{Deserialize, Serialize};

use super::phase::PhaseId;
use crate::domain::foundation::{Timestamp, ValidationError};

/// Per-phase threshold override.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ThresholdProfile {
    pub phase_id: PhaseId,
    /// Turns taken in the phase, counting the current one.
    pub min_conversation_turns: u32,
    /// Cumulative words across the phase, counting the current utterance.
    pub min_word_count: u32,
    pub requires_emotion_signal: bool,
    pub requires_value_signal: bool,
    pub requires_perspective_signal: bool,
    /// In `[0, 1]`.
    pub confidence_score: f64,
    pub feedback_count: u32,
    /// Optimistic concurrency token; bumped on every change.
    pub version: u64,
    pub updated_at: Timestamp,
}

impl ThresholdProfile {
    /// Builds a profile from the phase's default rule.
    ///
    /// Profile conditions must all hold, so only one arm of the default rule
    /// carries over: the word minimum where the phase has one, otherwise the
    /// turn minimum. A signal that merely suffices by default is never
    /// required.
    pub fn from_defaults(phase_id: PhaseId, initial_confidence: f64) -> Self {
        let rule = phase_id.definition().default_rule;
        let (min_conversation_turns, min_word_count) = match rule.min_words {
            Some(words) => (1, words as u32),
            None => (rule.min_turn_index as u32 + 1, 0),
        };
        Self {
            phase_id,
            min_conversation_turns,
            min_word_count,
            requires_emotion_signal: false,
            requires_value_signal: false,
            requires_perspective_signal: false,
            confidence_score: initial_confidence.clamp(0.0, 1.0),
            feedback_count: 0,
            version: 0,
            updated_at: Timestamp::now(),
        }
    }

    /// True once confidence strictly exceeds `activation_floor`.
    pub fn is_active(&self, activation_floor: f64) -> bool {
        self.confidence_score > activation_floor
    }

    /// Returns the profile updated by one feedback event.
    ///
    /// Corroborating feedback moves confidence toward 1.0 by `learning_rate`
    /// and loosens the thresholds so the observation would have passed.
    /// Contradicting feedback tightens them so it would not have.
    pub fn apply_feedback(&self, event: &FeedbackEvent, learning_rate: f64) -> Self {
        let observed_turns = event.observed_turn_index as u32 + 1;
        let observed_words = event.observed_word_count as u32;
        let mut next = self.clone();

        if event.signaled_correct {
            let rate = learning_rate.clamp(0.0, 1.0);
            next.confidence_score =
                (self.confidence_score + (1.0 - self.confidence_score) * rate).clamp(0.0, 1.0);
            next.min_conversation_turns = self.min_conversation_turns.min(observed_turns);
            next.min_word_count = self.min_word_count.min(observed_words);
        } else {
            next.min_conversation_turns = self.min_conversation_turns.max(observed_turns + 1);
            next.min_word_count = self.min_word_count.max(observed_words.saturating_add(1));
        }

        next.feedback_count = self.feedback_count.saturating_add(1);
        next.version = self.version + 1;
        next.updated_at = Timestamp::now();
        next
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if !(0.0..=1.0).contains(&self.confidence_score) {
            return Err(ValidationError::invalid_format(
                "confidence_score",
                format!("must be within [0, 1], got {}", self.confidence_score),
            ));
        }
        if self.min_conversation_turns == 0 {
            return Err(ValidationError::out_of_range(
                "min_conversation_turns",
                1,
                i64::from(u32::MAX),
                0,
            ));
        }
        Ok(())
    }
}

/// A reviewer's verdict on whether a phase completion was right.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackEvent {
    pub phase_id: PhaseId,
    pub observed_turn_index: usize,
    pub observed_word_count: usize,
    /// Completing the phase at this observation was correct.
    pub signaled_correct: bool,
}
