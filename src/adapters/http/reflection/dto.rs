//! Data transfer objects for reflection endpoints.

use serde::{Deserialize, Serialize};

use crate::application::handlers::{
    CategorizeTurnResult, ConversationExport, StartConversationResult, SubmitTurnResult,
    ThresholdView,
};
use crate::domain::foundation::{DomainError, Timestamp};
use crate::domain::reflection::{ConversationState, Phase, PhaseSession, RenderAction};
use crate::ports::TurnRecord;

// ════════════════════════════════════════════════════════════════════════════
// Requests
// ════════════════════════════════════════════════════════════════════════════

/// Body of `POST /api/conversations/:id/turns`.
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitTurnRequest {
    /// May be empty; an empty utterance restates the phase prompt.
    #[serde(default)]
    pub text: String,
}

/// Body of `POST /api/admin/feedback`.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeedbackRequest {
    pub phase_id: u8,
    pub observed_turn_index: usize,
    pub observed_word_count: usize,
    pub signaled_correct: bool,
}

/// Body of `POST /api/admin/conversations/:id/turns/:sequence/category`.
#[derive(Debug, Clone, Deserialize)]
pub struct CategorizeTurnRequest {
    pub category: String,
}

// ════════════════════════════════════════════════════════════════════════════
// Responses
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StartConversationResponse {
    pub conversation_id: String,
    pub phase_id: u8,
    pub assistant_text: String,
    pub prompt_text: String,
    pub started_at: Timestamp,
}

impl From<StartConversationResult> for StartConversationResponse {
    fn from(result: StartConversationResult) -> Self {
        Self {
            conversation_id: result.conversation_id.to_string(),
            phase_id: result.phase_id.get(),
            assistant_text: result.assistant_text,
            prompt_text: result.prompt_text.to_string(),
            started_at: result.started_at,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SealedSessionResponse {
    pub phase_id: u8,
    pub utterances: Vec<String>,
    pub cumulative_word_count: usize,
    pub completed_at: Option<Timestamp>,
    pub summary: Option<String>,
}

impl From<PhaseSession> for SealedSessionResponse {
    fn from(session: PhaseSession) -> Self {
        Self {
            phase_id: session.phase_id().get(),
            utterances: session.utterances().iter().map(|u| u.text.clone()).collect(),
            cumulative_word_count: session.cumulative_word_count(),
            completed_at: session.completed_at(),
            summary: session.summary().map(str::to_string),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TurnResponse {
    pub sequence: u64,
    pub assistant_text: String,
    pub action: RenderAction,
    pub phase_id: u8,
    pub prompt_text: String,
    pub turn_index: usize,
    pub auto_progress: bool,
    pub next_phase_id: Option<u8>,
    pub session_complete: bool,
    pub sealed_session: Option<SealedSessionResponse>,
}

impl From<SubmitTurnResult> for TurnResponse {
    fn from(result: SubmitTurnResult) -> Self {
        Self {
            sequence: result.sequence,
            assistant_text: result.assistant_text,
            action: result.action,
            phase_id: result.phase_id.get(),
            prompt_text: result.prompt_text,
            turn_index: result.turn_index,
            auto_progress: result.auto_progress,
            next_phase_id: result.next_phase_id.map(|p| p.get()),
            session_complete: result.session_complete,
            sealed_session: result.sealed_session.map(Into::into),
        }
    }
}

/// Read-only export of a conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ConversationResponse {
    pub conversation_id: String,
    pub current_phase_id: u8,
    pub is_terminal: bool,
    pub state: ConversationState,
    pub turns: Vec<TurnRecord>,
}

impl From<ConversationExport> for ConversationResponse {
    fn from(export: ConversationExport) -> Self {
        Self {
            conversation_id: export.state.id().to_string(),
            current_phase_id: export.state.current_phase_id().get(),
            is_terminal: export.state.is_terminal(),
            state: export.state,
            turns: export.turns,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PhaseResponse {
    pub id: u8,
    pub title: &'static str,
    pub goal: &'static str,
    pub initial_prompt: &'static str,
    pub probes: &'static [&'static str],
    pub completion_description: &'static str,
    pub transition_line: &'static str,
}

impl From<&'static Phase> for PhaseResponse {
    fn from(phase: &'static Phase) -> Self {
        Self {
            id: phase.id.get(),
            title: phase.title,
            goal: phase.goal,
            initial_prompt: phase.initial_prompt,
            probes: phase.probes,
            completion_description: phase.completion_description,
            transition_line: phase.transition_line,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ThresholdResponse {
    pub phase_id: u8,
    pub min_conversation_turns: u32,
    pub min_word_count: u32,
    pub requires_emotion_signal: bool,
    pub requires_value_signal: bool,
    pub requires_perspective_signal: bool,
    pub confidence_score: f64,
    pub feedback_count: u32,
    pub version: u64,
    pub updated_at: Timestamp,
    pub active: bool,
}

impl From<ThresholdView> for ThresholdResponse {
    fn from(view: ThresholdView) -> Self {
        let p = view.profile;
        Self {
            phase_id: p.phase_id.get(),
            min_conversation_turns: p.min_conversation_turns,
            min_word_count: p.min_word_count,
            requires_emotion_signal: p.requires_emotion_signal,
            requires_value_signal: p.requires_value_signal,
            requires_perspective_signal: p.requires_perspective_signal,
            confidence_score: p.confidence_score,
            feedback_count: p.feedback_count,
            version: p.version,
            updated_at: p.updated_at,
            active: view.active,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategorizeTurnResponse {
    pub sequence: u64,
    pub category: &'static str,
    pub feedback_recorded: bool,
    pub signaled_correct: Option<bool>,
}

impl From<CategorizeTurnResult> for CategorizeTurnResponse {
    fn from(result: CategorizeTurnResult) -> Self {
        Self {
            sequence: result.turn.sequence,
            category: result.turn.category.map_or("", |c| c.as_str()),
            feedback_recorded: result.feedback.is_some(),
            signaled_correct: result.feedback.map(|f| f.signaled_correct),
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Errors
// ════════════════════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn bad_request(message: impl Into<String>) -> Self {
        Self {
            code: "BAD_REQUEST".to_string(),
            message: message.into(),
            details: None,
        }
    }
}

impl From<DomainError> for ErrorResponse {
    fn from(err: DomainError) -> Self {
        let details = if err.details.is_empty() {
            None
        } else {
            serde_json::to_value(&err.details).ok()
        };
        Self {
            code: err.code.to_string(),
            message: err.message,
            details,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::foundation::ErrorCode;

    #[test]
    fn submit_turn_request_defaults_to_empty_text() {
        let req: SubmitTurnRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.text, "");
    }

    #[test]
    fn feedback_request_uses_camel_case() {
        let req: FeedbackRequest = serde_json::from_str(
            r#"{"phaseId":2,"observedTurnIndex":1,"observedWordCount":4,"signaledCorrect":true}"#,
        )
        .unwrap();
        assert_eq!(req.phase_id, 2);
        assert!(req.signaled_correct);
    }

    #[test]
    fn error_response_carries_details() {
        let err = DomainError::new(ErrorCode::GenerationFailed, "down").with_detail("phase_id", "3");
        let response = ErrorResponse::from(err);

        assert_eq!(response.code, "GENERATION_FAILED");
        assert_eq!(response.details.unwrap()["phase_id"], "3");
    }

    #[test]
    fn error_response_omits_empty_details() {
        let err = DomainError::new(ErrorCode::InternalError, "boom");
        let json = serde_json::to_value(ErrorResponse::from(err)).unwrap();
        assert!(json.get("details").is_none());
    }
}
