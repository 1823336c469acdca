//! StartConversationHandler - Command handler for opening a reflection.

use std::sync::Arc;

use crate::application::conversation_cache::{CachedConversation, ConversationCache};
use crate::application::error::ReflectionError;
use crate::application::prompts;
use crate::domain::foundation::{ConversationId, Timestamp};
use crate::domain::reflection::{ConversationState, PhaseId};
use crate::ports::{ConversationRecord, TranscriptStore};

/// Result of starting a conversation.
#[derive(Debug, Clone)]
pub struct StartConversationResult {
    pub conversation_id: ConversationId,
    pub phase_id: PhaseId,
    /// Welcome text ending with the first phase's prompt.
    pub assistant_text: String,
    pub prompt_text: &'static str,
    pub started_at: Timestamp,
}

/// Handler for starting conversations.
pub struct StartConversationHandler {
    transcript: Arc<dyn TranscriptStore>,
    cache: Arc<ConversationCache>,
}

impl StartConversationHandler {
    pub fn new(transcript: Arc<dyn TranscriptStore>, cache: Arc<ConversationCache>) -> Self {
        Self { transcript, cache }
    }

    pub async fn handle(&self) -> Result<StartConversationResult, ReflectionError> {
        let id = ConversationId::new();
        let started_at = Timestamp::now();

        self.transcript
            .create(&ConversationRecord { id, started_at })
            .await?;

        let state = ConversationState::start(id, started_at);
        let phase_id = state.current_phase_id();
        self.cache.insert(CachedConversation::new(state)).await;

        tracing::info!(conversation_id = %id, "Started reflection conversation");

        Ok(StartConversationResult {
            conversation_id: id,
            phase_id,
            assistant_text: prompts::opening_message(started_at),
            prompt_text: phase_id.definition().initial_prompt,
            started_at,
        })
    }
}
