//! Transcript Store Port - Append-only per-conversation turn log.
//!
//! Each committed turn is stored with the transition that produced it, so a
//! conversation can be rebuilt by committing the stored transitions in order.
//! Appends carry the sequence number the writer expects to occupy; a writer
//! that lost a race gets `SequenceConflict` and must reload.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::foundation::{ConversationId, Timestamp};
use crate::domain::reflection::{ResponseCategory, Transition};

/// Errors that can occur during transcript operations.
#[derive(Debug, thiserror::Error)]
pub enum TranscriptError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Conversation already exists: {0}")]
    AlreadyExists(ConversationId),

    #[error("Turn {sequence} not found in conversation {conversation_id}")]
    TurnNotFound {
        conversation_id: ConversationId,
        sequence: u64,
    },

    #[error("Sequence conflict for {conversation_id}: expected {expected}, found {actual}")]
    SequenceConflict {
        conversation_id: ConversationId,
        expected: u64,
        actual: u64,
    },

    #[error("Serialization error: {0}")]
    Serialization(String),

    #[error("Database error: {0}")]
    Database(String),
}

/// Conversation header row.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationRecord {
    pub id: ConversationId,
    pub started_at: Timestamp,
}

/// One committed turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TurnRecord {
    /// 0-based position in the conversation.
    pub sequence: u64,
    pub transition: Transition,
    /// What the assistant actually said.
    pub assistant_text: String,
    /// Headline for the phase this turn sealed, if any.
    pub phase_summary: Option<String>,
    /// Reviewer tag, set after the fact.
    pub category: Option<ResponseCategory>,
    pub created_at: Timestamp,
}

impl TurnRecord {
    pub fn new(
        sequence: u64,
        transition: Transition,
        assistant_text: impl Into<String>,
        created_at: Timestamp,
    ) -> Self {
        Self {
            sequence,
            transition,
            assistant_text: assistant_text.into(),
            phase_summary: None,
            category: None,
            created_at,
        }
    }

    pub fn with_phase_summary(mut self, summary: Option<String>) -> Self {
        self.phase_summary = summary;
        self
    }

    /// The user's text, or an empty string for an empty submission.
    pub fn user_text(&self) -> &str {
        self.transition
            .utterance
            .as_ref()
            .map(|u| u.text.as_str())
            .unwrap_or("")
    }
}

/// A turn after tagging, with the tag it replaced.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryChange {
    pub turn: TurnRecord,
    pub previous: Option<ResponseCategory>,
}

impl CategoryChange {
    /// True unless the new tag gives the same verdict as the old one.
    pub fn changes_verdict(&self) -> bool {
        match (self.previous, self.turn.category) {
            (None, Some(_)) => true,
            (Some(old), Some(new)) => old.is_sufficient() != new.is_sufficient(),
            (_, None) => false,
        }
    }
}

/// Port for persisting conversation transcripts.
#[async_trait]
pub trait TranscriptStore: Send + Sync {
    /// Registers a new conversation.
    ///
    /// # Errors
    /// Returns `AlreadyExists` if the id is taken.
    async fn create(&self, conversation: &ConversationRecord) -> Result<(), TranscriptError>;

    /// Loads the conversation header.
    async fn find(&self, id: ConversationId) -> Result<Option<ConversationRecord>, TranscriptError>;

    /// Appends a turn at `turn.sequence`.
    ///
    /// # Errors
    /// Returns `SequenceConflict` if the log does not currently hold exactly
    /// `turn.sequence` turns.
    async fn append(&self, id: ConversationId, turn: &TurnRecord) -> Result<(), TranscriptError>;

    /// Loads all turns in sequence order.
    async fn turns(&self, id: ConversationId) -> Result<Vec<TurnRecord>, TranscriptError>;

    /// Tags a turn with a reviewer category, replacing any earlier tag.
    async fn set_category(
        &self,
        id: ConversationId,
        sequence: u64,
        category: ResponseCategory,
    ) -> Result<CategoryChange, TranscriptError>;
}
