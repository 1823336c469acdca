//! HTTP routes for reflection endpoints.

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{
    categorize_turn, get_conversation, list_phases, list_thresholds, record_feedback,
    start_conversation, submit_turn, ReflectionHandlers,
};

/// Creates the reflection router, rooted at `/api`.
pub fn reflection_routes(handlers: ReflectionHandlers) -> Router {
    Router::new()
        .route("/conversations", post(start_conversation))
        .route("/conversations/:id", get(get_conversation))
        .route("/conversations/:id/turns", post(submit_turn))
        .route("/phases", get(list_phases))
        .route("/admin/thresholds", get(list_thresholds))
        .route("/admin/feedback", post(record_feedback))
        .route(
            "/admin/conversations/:id/turns/:sequence/category",
            post(categorize_turn),
        )
        .with_state(handlers)
}
