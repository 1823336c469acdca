//! HTTP adapter for reflection endpoints.

mod dto;
mod handlers;
mod routes;

pub use dto::{
    CategorizeTurnRequest, CategorizeTurnResponse, ConversationResponse, ErrorResponse,
    FeedbackRequest, PhaseResponse, SealedSessionResponse, StartConversationResponse,
    SubmitTurnRequest, ThresholdResponse, TurnResponse,
};
pub use handlers::ReflectionHandlers;
pub use routes::reflection_routes;
