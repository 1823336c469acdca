//! Application handlers.
//!
//! Command and query handlers that orchestrate domain operations.

pub mod reflection;
pub mod thresholds;

pub use reflection::{
    ConversationExport, GetConversationHandler, GetConversationQuery, StartConversationHandler,
    StartConversationResult, SubmitTurnCommand, SubmitTurnHandler, SubmitTurnResult,
};
pub use thresholds::{
    CategorizeTurnCommand, CategorizeTurnHandler, CategorizeTurnResult, FeedbackPolicy,
    ListThresholdsHandler, RecordFeedbackCommand, RecordFeedbackHandler, ThresholdView,
};
