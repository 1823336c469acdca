//! Reflection handlers - Conversation lifecycle and turn processing.

mod get_conversation;
mod start_conversation;
mod submit_turn;

pub use get_conversation::{ConversationExport, GetConversationHandler, GetConversationQuery};
pub use start_conversation::{StartConversationHandler, StartConversationResult};
pub use submit_turn::{SubmitTurnCommand, SubmitTurnHandler, SubmitTurnResult};
