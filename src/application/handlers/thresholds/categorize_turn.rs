//! CategorizeTurnHandler - Command handler for reviewer response tags.
//!
//! Tagging a turn that sealed its phase doubles as threshold feedback:
//! a sufficient category corroborates the completion, any other category
//! contradicts it. Each turn counts as one observation, so re-tagging only
//! records feedback when the verdict flips.

use std::sync::Arc;

use crate::application::conversation_cache::ConversationCache;
use crate::application::error::ReflectionError;
use crate::domain::foundation::ConversationId;
use crate::domain::reflection::{FeedbackEvent, ResponseCategory, ThresholdProfile};
use crate::ports::{TranscriptStore, TurnRecord};

use super::record_feedback::{RecordFeedbackCommand, RecordFeedbackHandler};

/// Command to tag a user response.
#[derive(Debug, Clone)]
pub struct CategorizeTurnCommand {
    pub conversation_id: ConversationId,
    pub sequence: u64,
    pub category: ResponseCategory,
}

/// Result of tagging a response.
#[derive(Debug, Clone)]
pub struct CategorizeTurnResult {
    pub turn: TurnRecord,
    /// Set when the tag was fed back into the phase's thresholds.
    pub feedback: Option<FeedbackEvent>,
    pub profile: Option<ThresholdProfile>,
}

/// Handler for categorizing turns.
pub struct CategorizeTurnHandler {
    transcript: Arc<dyn TranscriptStore>,
    cache: Arc<ConversationCache>,
    feedback: Arc<RecordFeedbackHandler>,
}

impl CategorizeTurnHandler {
    pub fn new(
        transcript: Arc<dyn TranscriptStore>,
        cache: Arc<ConversationCache>,
        feedback: Arc<RecordFeedbackHandler>,
    ) -> Self {
        Self {
            transcript,
            cache,
            feedback,
        }
    }

    pub async fn handle(
        &self,
        cmd: CategorizeTurnCommand,
    ) -> Result<CategorizeTurnResult, ReflectionError> {
        let change = self
            .transcript
            .set_category(cmd.conversation_id, cmd.sequence, cmd.category)
            .await?;

        if let Some(entry) = self.cache.peek(cmd.conversation_id).await {
            let mut conversation = entry.lock().await;
            if let Some(cached) = conversation
                .turns
                .iter_mut()
                .find(|t| t.sequence == cmd.sequence)
            {
                cached.category = Some(cmd.category);
            }
        }

        tracing::info!(
            conversation_id = %cmd.conversation_id,
            sequence = cmd.sequence,
            category = cmd.category.as_str(),
            previous = ?change.previous,
            "Turn categorized"
        );

        let verdict_changed = change.changes_verdict();
        let turn = change.turn;
        if !verdict_changed {
            tracing::debug!(
                conversation_id = %cmd.conversation_id,
                sequence = cmd.sequence,
                "Verdict unchanged; no feedback recorded"
            );
            return Ok(CategorizeTurnResult {
                turn,
                feedback: None,
                profile: None,
            });
        }

        let Some(event) = self.feedback_event(cmd.conversation_id, &turn, cmd.category).await? else {
            return Ok(CategorizeTurnResult {
                turn,
                feedback: None,
                profile: None,
            });
        };

        let profile = self.feedback.handle(RecordFeedbackCommand { event }).await?;
        Ok(CategorizeTurnResult {
            turn,
            feedback: Some(event),
            profile: Some(profile),
        })
    }

    /// Builds the feedback event for a turn that sealed its phase.
    ///
    /// The observed word count is the phase's cumulative count up to and
    /// including this turn, which is what profiles are evaluated against.
    async fn feedback_event(
        &self,
        id: ConversationId,
        turn: &TurnRecord,
        category: ResponseCategory,
    ) -> Result<Option<FeedbackEvent>, ReflectionError> {
        let transition = &turn.transition;
        let Some(utterance) = &transition.utterance else {
            return Ok(None);
        };
        if !transition.seals_phase() {
            return Ok(None);
        }

        let turns = self.transcript.turns(id).await?;
        let observed_word_count = turns
            .iter()
            .filter(|t| t.sequence <= turn.sequence && t.transition.phase_id == transition.phase_id)
            .filter_map(|t| t.transition.utterance.as_ref())
            .map(|u| u.word_count)
            .sum();

        Ok(Some(FeedbackEvent {
            phase_id: transition.phase_id,
            observed_turn_index: utterance.turn_index,
            observed_word_count,
            signaled_correct: category.is_sufficient(),
        }))
    }
}
