//! Threshold handlers - Reviewer feedback and the adaptive profiles it drives.

mod categorize_turn;
mod list_thresholds;
mod record_feedback;

pub use categorize_turn::{CategorizeTurnCommand, CategorizeTurnHandler, CategorizeTurnResult};
pub use list_thresholds::{ListThresholdsHandler, ThresholdView};
pub use record_feedback::{FeedbackPolicy, RecordFeedbackCommand, RecordFeedbackHandler};
