//! Application-level errors for reflection handlers.

use thiserror::Error;

use crate::domain::foundation::{ConversationId, DomainError, ErrorCode, ValidationError};
use crate::domain::reflection::{PhaseId, ProgressionError};
use crate::ports::{GenerationError, ThresholdStoreError, TranscriptError};

/// Errors returned by the reflection handlers.
#[derive(Debug, Error)]
pub enum ReflectionError {
    #[error("Conversation not found: {0}")]
    NotFound(ConversationId),

    #[error("Turn {sequence} not found in conversation {conversation_id}")]
    TurnNotFound {
        conversation_id: ConversationId,
        sequence: u64,
    },

    #[error(transparent)]
    Progression(#[from] ProgressionError),

    /// Nothing was sealed or persisted; the user can retry.
    #[error("Generation failed at phase {phase_id}, turn {turn_index}: {source}")]
    Generation {
        phase_id: PhaseId,
        turn_index: usize,
        #[source]
        source: GenerationError,
    },

    #[error("Conversation {0} was modified concurrently")]
    Conflict(ConversationId),

    #[error("Threshold profile for phase {phase_id} still contended after {attempts} attempts")]
    ThresholdContention { phase_id: PhaseId, attempts: u32 },

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<TranscriptError> for ReflectionError {
    fn from(err: TranscriptError) -> Self {
        match err {
            TranscriptError::NotFound(id) => ReflectionError::NotFound(id),
            TranscriptError::TurnNotFound {
                conversation_id,
                sequence,
            } => ReflectionError::TurnNotFound {
                conversation_id,
                sequence,
            },
            TranscriptError::SequenceConflict {
                conversation_id, ..
            } => ReflectionError::Conflict(conversation_id),
            other => ReflectionError::Storage(other.to_string()),
        }
    }
}

impl From<ThresholdStoreError> for ReflectionError {
    fn from(err: ThresholdStoreError) -> Self {
        ReflectionError::Storage(err.to_string())
    }
}

impl From<ReflectionError> for DomainError {
    fn from(err: ReflectionError) -> Self {
        match err {
            ReflectionError::Progression(inner) => inner.into(),
            ReflectionError::Validation(inner) => inner.into(),
            ReflectionError::Generation {
                phase_id,
                turn_index,
                ref source,
            } => DomainError::new(ErrorCode::GenerationFailed, source.to_string())
                .with_detail("phase_id", phase_id.to_string())
                .with_detail("turn_index", turn_index.to_string()),
            ReflectionError::NotFound(id) => {
                DomainError::new(ErrorCode::ConversationNotFound, err.to_string())
                    .with_detail("conversation_id", id.to_string())
            }
            ReflectionError::TurnNotFound { sequence, .. } => {
                DomainError::new(ErrorCode::TurnNotFound, err.to_string())
                    .with_detail("sequence", sequence.to_string())
            }
            ReflectionError::Conflict(_) | ReflectionError::ThresholdContention { .. } => {
                DomainError::new(ErrorCode::ConcurrentModification, err.to_string())
            }
            ReflectionError::Storage(_) => DomainError::new(ErrorCode::DatabaseError, err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequence_conflict_becomes_conflict() {
        let id = ConversationId::new();
        let err: ReflectionError = TranscriptError::SequenceConflict {
            conversation_id: id,
            expected: 2,
            actual: 3,
        }
        .into();
        assert!(matches!(err, ReflectionError::Conflict(c) if c == id));
    }

    #[test]
    fn generation_failure_keeps_phase_context() {
        let err = ReflectionError::Generation {
            phase_id: PhaseId::FIRST,
            turn_index: 1,
            source: GenerationError::AuthenticationFailed,
        };
        let domain: DomainError = err.into();
        assert_eq!(domain.code(), ErrorCode::GenerationFailed);
        assert_eq!(domain.details.get("phase_id"), Some(&"1".to_string()));
        assert_eq!(domain.details.get("turn_index"), Some(&"1".to_string()));
    }

    #[test]
    fn not_found_maps_to_conversation_not_found() {
        let domain: DomainError = ReflectionError::NotFound(ConversationId::new()).into();
        assert_eq!(domain.code(), ErrorCode::ConversationNotFound);
    }
}
