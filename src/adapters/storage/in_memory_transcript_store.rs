//! In-Memory Transcript Store Adapter
//!
//! Keeps conversation headers and turn logs in memory.
//! Useful for testing and development.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::foundation::ConversationId;
use crate::domain::reflection::ResponseCategory;
use crate::ports::{
    CategoryChange, ConversationRecord, TranscriptError, TranscriptStore, TurnRecord,
};

#[derive(Debug, Clone)]
struct StoredConversation {
    record: ConversationRecord,
    turns: Vec<TurnRecord>,
}

/// In-memory transcript storage
#[derive(Debug, Clone, Default)]
pub struct InMemoryTranscriptStore {
    conversations: Arc<RwLock<HashMap<ConversationId, StoredConversation>>>,
}

impl InMemoryTranscriptStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored conversations
    pub async fn conversation_count(&self) -> usize {
        self.conversations.read().await.len()
    }
}

#[async_trait]
impl TranscriptStore for InMemoryTranscriptStore {
    async fn create(&self, conversation: &ConversationRecord) -> Result<(), TranscriptError> {
        let mut conversations = self.conversations.write().await;
        if conversations.contains_key(&conversation.id) {
            return Err(TranscriptError::AlreadyExists(conversation.id));
        }
        conversations.insert(
            conversation.id,
            StoredConversation {
                record: conversation.clone(),
                turns: Vec::new(),
            },
        );
        Ok(())
    }

    async fn find(&self, id: ConversationId) -> Result<Option<ConversationRecord>, TranscriptError> {
        let conversations = self.conversations.read().await;
        Ok(conversations.get(&id).map(|c| c.record.clone()))
    }

    async fn append(&self, id: ConversationId, turn: &TurnRecord) -> Result<(), TranscriptError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&id)
            .ok_or(TranscriptError::NotFound(id))?;

        let actual = conversation.turns.len() as u64;
        if turn.sequence != actual {
            return Err(TranscriptError::SequenceConflict {
                conversation_id: id,
                expected: turn.sequence,
                actual,
            });
        }
        conversation.turns.push(turn.clone());
        Ok(())
    }

    async fn turns(&self, id: ConversationId) -> Result<Vec<TurnRecord>, TranscriptError> {
        let conversations = self.conversations.read().await;
        conversations
            .get(&id)
            .map(|c| c.turns.clone())
            .ok_or(TranscriptError::NotFound(id))
    }

    async fn set_category(
        &self,
        id: ConversationId,
        sequence: u64,
        category: ResponseCategory,
    ) -> Result<CategoryChange, TranscriptError> {
        let mut conversations = self.conversations.write().await;
        let conversation = conversations
            .get_mut(&id)
            .ok_or(TranscriptError::NotFound(id))?;

        let turn = conversation
            .turns
            .get_mut(sequence as usize)
            .ok_or(TranscriptError::TurnNotFound {
                conversation_id: id,
                sequence,
            })?;
        let previous = turn.category.replace(category);
        Ok(CategoryChange {
            turn: turn.clone(),
            previous,
        })
    }
}
