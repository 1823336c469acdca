//! SubmitTurnHandler - Command handler for one user utterance.
//!
//! The turn is planned against the locked conversation, the reply is
//! generated, the turn is appended to the transcript, and only then is the
//! plan committed. A failure at any step before the commit leaves the
//! conversation exactly as it was. A conversation that reaches its terminal
//! phase leaves the cache.

use std::sync::Arc;

use crate::application::conversation_cache::ConversationCache;
use crate::application::error::ReflectionError;
use crate::application::prompts;
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::domain::reflection::{
    ConversationState, PhaseId, PhaseSession, ProgressionController, RenderAction,
    ThresholdProfile, Transition,
};
use crate::ports::{TextGenerator, ThresholdStore, TranscriptError, TranscriptStore, TurnRecord};

/// Command carrying one user utterance.
#[derive(Debug, Clone)]
pub struct SubmitTurnCommand {
    pub conversation_id: ConversationId,
    pub text: String,
}

/// Outcome of a processed utterance.
#[derive(Debug, Clone)]
pub struct SubmitTurnResult {
    pub conversation_id: ConversationId,
    pub sequence: u64,
    pub assistant_text: String,
    pub action: RenderAction,
    /// Phase the utterance was evaluated in.
    pub phase_id: PhaseId,
    /// The verbatim prompt the reply carries.
    pub prompt_text: String,
    pub turn_index: usize,
    pub auto_progress: bool,
    pub next_phase_id: Option<PhaseId>,
    pub session_complete: bool,
    pub sealed_session: Option<PhaseSession>,
}

/// Handler for submitting utterances.
pub struct SubmitTurnHandler {
    transcript: Arc<dyn TranscriptStore>,
    thresholds: Arc<dyn ThresholdStore>,
    generator: Arc<dyn TextGenerator>,
    cache: Arc<ConversationCache>,
    controller: ProgressionController,
}

impl SubmitTurnHandler {
    pub fn new(
        transcript: Arc<dyn TranscriptStore>,
        thresholds: Arc<dyn ThresholdStore>,
        generator: Arc<dyn TextGenerator>,
        cache: Arc<ConversationCache>,
        controller: ProgressionController,
    ) -> Self {
        Self {
            transcript,
            thresholds,
            generator,
            cache,
            controller,
        }
    }

    pub async fn handle(&self, cmd: SubmitTurnCommand) -> Result<SubmitTurnResult, ReflectionError> {
        let id = cmd.conversation_id;
        let entry = self.cache.get_or_load(id, self.transcript.as_ref()).await?;
        let mut conversation = entry.lock().await;

        let profile = self.profile_for(conversation.state.current_phase_id()).await;
        let transition = self
            .controller
            .plan(&conversation.state, &cmd.text, profile.as_ref())?;

        let assistant_text = self
            .reply(&conversation.state, &transition, conversation.current_phase_turns())
            .await?;
        let summary = if transition.seals_phase() {
            self.summarize(id, &conversation.state, &transition).await
        } else {
            None
        };

        let now = Timestamp::now();
        let sequence = conversation.state.sequence();
        let record = TurnRecord::new(sequence, transition.clone(), assistant_text.clone(), now)
            .with_phase_summary(summary.clone());

        match self.transcript.append(id, &record).await {
            Ok(()) => {}
            Err(err @ TranscriptError::SequenceConflict { .. }) => {
                tracing::warn!(
                    conversation_id = %id,
                    sequence,
                    error = %err,
                    "Transcript moved ahead of cached state; evicting"
                );
                drop(conversation);
                self.cache.evict(id).await;
                return Err(err.into());
            }
            Err(err) => return Err(err.into()),
        }

        let sealed_session = conversation.state.commit(&transition, summary, now)?;
        conversation.turns.push(record);
        drop(conversation);

        log_transition(id, &transition);
        if transition.is_terminal() {
            self.cache.evict(id).await;
        }

        Ok(SubmitTurnResult {
            conversation_id: id,
            sequence,
            assistant_text,
            action: transition.action,
            phase_id: transition.phase_id,
            prompt_text: transition.prompt_text.clone(),
            turn_index: transition.turn_index,
            auto_progress: transition.action.is_advance(),
            next_phase_id: transition.next_phase_id(),
            session_complete: transition.is_terminal(),
            sealed_session,
        })
    }

    /// Missing or unreadable profiles fall back to the phase defaults.
    async fn profile_for(&self, phase_id: PhaseId) -> Option<ThresholdProfile> {
        match self.thresholds.get(phase_id).await {
            Ok(profile) => profile,
            Err(err) => {
                tracing::warn!(phase = %phase_id, error = %err, "Threshold lookup failed; using defaults");
                None
            }
        }
    }

    async fn reply(
        &self,
        state: &ConversationState,
        transition: &Transition,
        phase_turns: &[TurnRecord],
    ) -> Result<String, ReflectionError> {
        let request = prompts::turn_request(state, transition, phase_turns);
        let text = self.generator.generate(request).await.map_err(|source| {
            ReflectionError::Generation {
                phase_id: transition.phase_id,
                turn_index: transition.turn_index,
                source,
            }
        })?;

        if text.trim().is_empty() {
            tracing::warn!(
                conversation_id = %state.id(),
                phase = %transition.phase_id,
                generator = self.generator.name(),
                "Generator returned empty text; using fallback"
            );
            return Ok(prompts::fallback_reply(transition));
        }
        Ok(text)
    }

    /// Best-effort headline for the phase being sealed.
    async fn summarize(
        &self,
        id: ConversationId,
        state: &ConversationState,
        transition: &Transition,
    ) -> Option<String> {
        let open = state.open_session()?;
        let mut utterances: Vec<&str> = open.utterances().iter().map(|u| u.text.as_str()).collect();
        if let Some(current) = &transition.utterance {
            utterances.push(current.text.as_str());
        }

        let request = prompts::summary_request(transition.phase_id, &utterances);
        match self.generator.generate(request).await {
            Ok(text) if !text.trim().is_empty() => Some(text.trim().to_string()),
            Ok(_) => None,
            Err(err) => {
                tracing::warn!(
                    conversation_id = %id,
                    phase = %transition.phase_id,
                    error = %err,
                    "Could not generate phase summary"
                );
                None
            }
        }
    }
}

fn log_transition(id: ConversationId, transition: &Transition) {
    match transition.action {
        RenderAction::AcknowledgeAndAdvance { next_phase } => tracing::info!(
            conversation_id = %id,
            from = %transition.phase_id,
            to = %next_phase,
            turn = transition.turn_index,
            "Phase complete; advancing"
        ),
        RenderAction::TerminalSynthesis => tracing::info!(
            conversation_id = %id,
            turn = transition.turn_index,
            "Reflection complete"
        ),
        action => tracing::debug!(
            conversation_id = %id,
            phase = %transition.phase_id,
            turn = transition.turn_index,
            action = action.kind(),
            "Staying in phase"
        ),
    }
}
