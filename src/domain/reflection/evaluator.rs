//! Completion evaluator.
//!
//! Decides whether the current utterance completes its phase. The rules, in
//! order:
//!
//! 1. A standalone completion signal ("that's it", "yes") always completes.
//! 2. Fatigue after the first turn completes.
//! 3. An active threshold profile replaces the default rule; all of its
//!    conditions must hold.
//! 4. Otherwise the phase's default rule applies; any condition suffices.

use serde::{Deserialize, Serialize};

use super::features::UtteranceFeatures;
use super::phase::PhaseId;
use super::threshold::ThresholdProfile;

/// Utterances shorter than this, with no signals, are vague.
const VAGUE_WORD_LIMIT: usize = 3;

/// Which rule decided the verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CompletionReason {
    ExplicitSignal,
    Fatigue,
    ProfileMet,
    DefaultRule,
    NotMet,
}

/// The evaluator's verdict for one utterance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Evaluation {
    pub complete: bool,
    /// Incomplete, very short, and carrying no signal at all.
    pub vague: bool,
    pub reason: CompletionReason,
}

impl Evaluation {
    fn complete(reason: CompletionReason) -> Self {
        Self {
            complete: true,
            vague: false,
            reason,
        }
    }

    fn incomplete(features: &UtteranceFeatures) -> Self {
        Self {
            complete: false,
            vague: features.word_count < VAGUE_WORD_LIMIT && !features.has_any_signal(),
            reason: CompletionReason::NotMet,
        }
    }
}

/// Inputs describing where in the phase the utterance sits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseProgress {
    /// 0-based index of this utterance within the phase.
    pub turn_index: usize,
    /// Words across the phase including this utterance.
    pub cumulative_word_count: usize,
}

/// Pure completion policy.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CompletionEvaluator {
    activation_floor: f64,
}

impl CompletionEvaluator {
    pub const DEFAULT_ACTIVATION_FLOOR: f64 = 0.6;

    pub fn new(activation_floor: f64) -> Self {
        Self { activation_floor }
    }

    pub fn activation_floor(&self) -> f64 {
        self.activation_floor
    }

    pub fn evaluate(
        &self,
        phase_id: PhaseId,
        features: &UtteranceFeatures,
        progress: PhaseProgress,
        profile: Option<&ThresholdProfile>,
    ) -> Evaluation {
        if features.has_explicit_completion_signal {
            return Evaluation::complete(CompletionReason::ExplicitSignal);
        }
        if features.has_fatigue_signal && progress.turn_index >= 1 {
            return Evaluation::complete(CompletionReason::Fatigue);
        }

        let active = profile
            .filter(|p| p.phase_id == phase_id && p.is_active(self.activation_floor));

        let met = match active {
            Some(profile) => profile_met(profile, features, progress),
            None => default_met(phase_id, features, progress),
        };

        if met {
            let reason = if active.is_some() {
                CompletionReason::ProfileMet
            } else {
                CompletionReason::DefaultRule
            };
            Evaluation::complete(reason)
        } else {
            Evaluation::incomplete(features)
        }
    }
}

impl Default for CompletionEvaluator {
    fn default() -> Self {
        Self::new(Self::DEFAULT_ACTIVATION_FLOOR)
    }
}

fn default_met(phase_id: PhaseId, features: &UtteranceFeatures, progress: PhaseProgress) -> bool {
    let rule = phase_id.definition().default_rule;
    rule.min_words.is_some_and(|min| features.word_count >= min)
        || (rule.emotion_suffices && features.has_emotion_word)
        || progress.turn_index >= rule.min_turn_index
}

fn profile_met(
    profile: &ThresholdProfile,
    features: &UtteranceFeatures,
    progress: PhaseProgress,
) -> bool {
    let turns_taken = progress.turn_index + 1;
    turns_taken >= profile.min_conversation_turns as usize
        && progress.cumulative_word_count >= profile.min_word_count as usize
        && (!profile.requires_emotion_signal || features.has_emotion_word)
        && (!profile.requires_value_signal || features.has_value_word)
        && (!profile.requires_perspective_signal || features.has_subject_reference)
}
