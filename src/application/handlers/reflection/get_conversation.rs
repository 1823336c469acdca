//! GetConversationHandler - Query handler for exporting a conversation.

use std::sync::Arc;

use serde::Serialize;

use crate::application::conversation_cache::ConversationCache;
use crate::application::error::ReflectionError;
use crate::domain::foundation::ConversationId;
use crate::domain::reflection::ConversationState;
use crate::ports::{TranscriptStore, TurnRecord};

/// Query to get a conversation by ID.
#[derive(Debug, Clone)]
pub struct GetConversationQuery {
    pub conversation_id: ConversationId,
}

/// Read-only snapshot of a conversation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversationExport {
    pub state: ConversationState,
    pub turns: Vec<TurnRecord>,
}

/// Handler for exporting conversations.
pub struct GetConversationHandler {
    transcript: Arc<dyn TranscriptStore>,
    cache: Arc<ConversationCache>,
}

impl GetConversationHandler {
    pub fn new(transcript: Arc<dyn TranscriptStore>, cache: Arc<ConversationCache>) -> Self {
        Self { transcript, cache }
    }

    pub async fn handle(
        &self,
        query: GetConversationQuery,
    ) -> Result<ConversationExport, ReflectionError> {
        let entry = self
            .cache
            .get_or_load(query.conversation_id, self.transcript.as_ref())
            .await?;
        // Waits for any turn in flight on this conversation.
        let conversation = entry.lock().await;

        Ok(ConversationExport {
            state: conversation.state.clone(),
            turns: conversation.turns.clone(),
        })
    }
}
