//! Progression errors.

use thiserror::Error;

use super::phase::PhaseId;
use crate::domain::foundation::{DomainError, ErrorCode};

/// Errors raised while planning or committing a turn.
///
/// Every variant carries the phase and turn it happened at.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ProgressionError {
    #[error("Invalid phase transition at phase {phase_id}, turn {turn_index}: {reason}")]
    InvalidPhaseTransition {
        phase_id: PhaseId,
        turn_index: usize,
        reason: String,
    },

    #[error("Plan for phase {phase_id}, turn {turn_index} no longer matches the conversation")]
    StalePlan { phase_id: PhaseId, turn_index: usize },
}

impl ProgressionError {
    pub fn invalid_transition(
        phase_id: PhaseId,
        turn_index: usize,
        reason: impl Into<String>,
    ) -> Self {
        ProgressionError::InvalidPhaseTransition {
            phase_id,
            turn_index,
            reason: reason.into(),
        }
    }

    pub fn phase_id(&self) -> PhaseId {
        match self {
            ProgressionError::InvalidPhaseTransition { phase_id, .. }
            | ProgressionError::StalePlan { phase_id, .. } => *phase_id,
        }
    }

    pub fn turn_index(&self) -> usize {
        match self {
            ProgressionError::InvalidPhaseTransition { turn_index, .. }
            | ProgressionError::StalePlan { turn_index, .. } => *turn_index,
        }
    }
}

impl From<ProgressionError> for DomainError {
    fn from(err: ProgressionError) -> Self {
        let code = match &err {
            ProgressionError::InvalidPhaseTransition { .. } => ErrorCode::InvalidPhaseTransition,
            ProgressionError::StalePlan { .. } => ErrorCode::ConcurrentModification,
        };
        DomainError::new(code, err.to_string())
            .with_detail("phase_id", err.phase_id().to_string())
            .with_detail("turn_index", err.turn_index().to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converts_to_domain_error_with_context() {
        let err = ProgressionError::invalid_transition(PhaseId::LAST, 2, "conversation is complete");
        let domain: DomainError = err.into();
        assert_eq!(domain.code(), ErrorCode::InvalidPhaseTransition);
        assert_eq!(domain.details.get("phase_id"), Some(&"7".to_string()));
        assert_eq!(domain.details.get("turn_index"), Some(&"2".to_string()));
    }

    #[test]
    fn stale_plan_is_a_concurrency_error() {
        let domain: DomainError = ProgressionError::StalePlan {
            phase_id: PhaseId::FIRST,
            turn_index: 0,
        }
        .into();
        assert_eq!(domain.code(), ErrorCode::ConcurrentModification);
    }
}
