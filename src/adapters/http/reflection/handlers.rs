//! HTTP handlers for reflection endpoints.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

use crate::application::handlers::{
    CategorizeTurnCommand, CategorizeTurnHandler, FeedbackPolicy, GetConversationHandler,
    GetConversationQuery, ListThresholdsHandler, RecordFeedbackCommand, RecordFeedbackHandler,
    StartConversationHandler, SubmitTurnCommand, SubmitTurnHandler,
};
use crate::application::{ConversationCache, ReflectionError};
use crate::config::ProgressionConfig;
use crate::domain::foundation::{ConversationId, DomainError, ErrorCode};
use crate::domain::reflection::{
    CompletionEvaluator, FeedbackEvent, PhaseId, ProgressionController, ResponseCategory, PHASES,
};
use crate::ports::{TextGenerator, ThresholdStore, TranscriptStore};

use super::dto::{
    CategorizeTurnRequest, CategorizeTurnResponse, ConversationResponse, ErrorResponse,
    FeedbackRequest, PhaseResponse, StartConversationResponse, SubmitTurnRequest,
    ThresholdResponse, TurnResponse,
};

// ════════════════════════════════════════════════════════════════════════════
// Handler state
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone)]
pub struct ReflectionHandlers {
    start_handler: Arc<StartConversationHandler>,
    submit_handler: Arc<SubmitTurnHandler>,
    get_handler: Arc<GetConversationHandler>,
    feedback_handler: Arc<RecordFeedbackHandler>,
    categorize_handler: Arc<CategorizeTurnHandler>,
    thresholds_handler: Arc<ListThresholdsHandler>,
}

impl ReflectionHandlers {
    pub fn new(
        start_handler: Arc<StartConversationHandler>,
        submit_handler: Arc<SubmitTurnHandler>,
        get_handler: Arc<GetConversationHandler>,
        feedback_handler: Arc<RecordFeedbackHandler>,
        categorize_handler: Arc<CategorizeTurnHandler>,
        thresholds_handler: Arc<ListThresholdsHandler>,
    ) -> Self {
        Self {
            start_handler,
            submit_handler,
            get_handler,
            feedback_handler,
            categorize_handler,
            thresholds_handler,
        }
    }

    /// Wires every handler over one set of ports and a shared cache.
    pub fn from_ports(
        transcript: Arc<dyn TranscriptStore>,
        thresholds: Arc<dyn ThresholdStore>,
        generator: Arc<dyn TextGenerator>,
        progression: &ProgressionConfig,
    ) -> Self {
        let cache = Arc::new(ConversationCache::with_capacity(
            progression.conversation_cache_capacity,
        ));
        let evaluator = CompletionEvaluator::new(progression.activation_floor);
        let policy = FeedbackPolicy {
            learning_rate: progression.learning_rate,
            initial_confidence: progression.initial_confidence,
            max_retries: progression.max_feedback_retries,
        };
        let feedback_handler = Arc::new(RecordFeedbackHandler::new(thresholds.clone(), policy));

        Self::new(
            Arc::new(StartConversationHandler::new(transcript.clone(), cache.clone())),
            Arc::new(SubmitTurnHandler::new(
                transcript.clone(),
                thresholds.clone(),
                generator,
                cache.clone(),
                ProgressionController::new(evaluator),
            )),
            Arc::new(GetConversationHandler::new(transcript.clone(), cache.clone())),
            feedback_handler.clone(),
            Arc::new(CategorizeTurnHandler::new(transcript, cache, feedback_handler)),
            Arc::new(ListThresholdsHandler::new(thresholds, &evaluator)),
        )
    }
}

// ════════════════════════════════════════════════════════════════════════════
// HTTP handlers
// ════════════════════════════════════════════════════════════════════════════

/// POST /api/conversations - Start a reflection
pub async fn start_conversation(State(handlers): State<ReflectionHandlers>) -> Response {
    match handlers.start_handler.handle().await {
        Ok(result) => {
            let response: StartConversationResponse = result.into();
            (StatusCode::CREATED, Json(response)).into_response()
        }
        Err(e) => handle_reflection_error(e),
    }
}

/// POST /api/conversations/:id/turns - Submit one utterance
pub async fn submit_turn(
    State(handlers): State<ReflectionHandlers>,
    Path(conversation_id): Path<String>,
    Json(req): Json<SubmitTurnRequest>,
) -> Response {
    let conversation_id = match parse_conversation_id(&conversation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    let cmd = SubmitTurnCommand {
        conversation_id,
        text: req.text,
    };

    match handlers.submit_handler.handle(cmd).await {
        Ok(result) => {
            let response: TurnResponse = result.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_reflection_error(e),
    }
}

/// GET /api/conversations/:id - Export a conversation
pub async fn get_conversation(
    State(handlers): State<ReflectionHandlers>,
    Path(conversation_id): Path<String>,
) -> Response {
    let conversation_id = match parse_conversation_id(&conversation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };

    match handlers
        .get_handler
        .handle(GetConversationQuery { conversation_id })
        .await
    {
        Ok(export) => {
            let response: ConversationResponse = export.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_reflection_error(e),
    }
}

/// GET /api/phases - The phase table
pub async fn list_phases() -> Response {
    let phases: Vec<PhaseResponse> = PHASES.iter().map(PhaseResponse::from).collect();
    (StatusCode::OK, Json(phases)).into_response()
}

/// GET /api/admin/thresholds - All threshold profiles
pub async fn list_thresholds(State(handlers): State<ReflectionHandlers>) -> Response {
    match handlers.thresholds_handler.handle().await {
        Ok(views) => {
            let response: Vec<ThresholdResponse> = views.into_iter().map(Into::into).collect();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_reflection_error(e),
    }
}

/// POST /api/admin/feedback - Record a feedback event
pub async fn record_feedback(
    State(handlers): State<ReflectionHandlers>,
    Json(req): Json<FeedbackRequest>,
) -> Response {
    let phase_id = match PhaseId::new(req.phase_id) {
        Ok(id) => id,
        Err(e) => return handle_reflection_error(e.into()),
    };

    let event = FeedbackEvent {
        phase_id,
        observed_turn_index: req.observed_turn_index,
        observed_word_count: req.observed_word_count,
        signaled_correct: req.signaled_correct,
    };

    match handlers
        .feedback_handler
        .handle(RecordFeedbackCommand { event })
        .await
    {
        Ok(profile) => {
            let response: ThresholdResponse = handlers.thresholds_handler.view(profile).into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_reflection_error(e),
    }
}

/// POST /api/admin/conversations/:id/turns/:sequence/category - Tag a response
pub async fn categorize_turn(
    State(handlers): State<ReflectionHandlers>,
    Path((conversation_id, sequence)): Path<(String, u64)>,
    Json(req): Json<CategorizeTurnRequest>,
) -> Response {
    let conversation_id = match parse_conversation_id(&conversation_id) {
        Ok(id) => id,
        Err(response) => return response,
    };
    let category = match req.category.parse::<ResponseCategory>() {
        Ok(category) => category,
        Err(e) => return handle_reflection_error(e.into()),
    };

    let cmd = CategorizeTurnCommand {
        conversation_id,
        sequence,
        category,
    };

    match handlers.categorize_handler.handle(cmd).await {
        Ok(result) => {
            let response: CategorizeTurnResponse = result.into();
            (StatusCode::OK, Json(response)).into_response()
        }
        Err(e) => handle_reflection_error(e),
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Error handling
// ════════════════════════════════════════════════════════════════════════════

fn parse_conversation_id(raw: &str) -> Result<ConversationId, Response> {
    raw.parse::<ConversationId>().map_err(|_| {
        (
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::bad_request("Invalid conversation ID")),
        )
            .into_response()
    })
}

fn status_for(code: ErrorCode) -> StatusCode {
    match code {
        ErrorCode::ValidationFailed => StatusCode::BAD_REQUEST,
        ErrorCode::ConversationNotFound | ErrorCode::TurnNotFound => StatusCode::NOT_FOUND,
        ErrorCode::InvalidPhaseTransition | ErrorCode::ConcurrentModification => {
            StatusCode::CONFLICT
        }
        ErrorCode::GenerationFailed => StatusCode::BAD_GATEWAY,
        ErrorCode::DatabaseError | ErrorCode::InternalError => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn handle_reflection_error(error: ReflectionError) -> Response {
    let domain: DomainError = error.into();
    let status = status_for(domain.code);
    if status.is_server_error() {
        tracing::error!(code = %domain.code, message = %domain.message, "Request failed");
    }
    (status, Json(ErrorResponse::from(domain))).into_response()
}
