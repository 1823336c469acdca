//! Reflection module - The seven-phase progression engine.
//!
//! Data flows leaf-first: an utterance is reduced to [`UtteranceFeatures`],
//! the [`CompletionEvaluator`] decides whether the phase is complete
//! (consulting the static [`PHASES`] table and an optional
//! [`ThresholdProfile`]), and the [`ProgressionController`] turns that
//! verdict into a [`Transition`] that a [`ConversationState`] commits.
//!
//! Nothing in this module performs I/O.

mod category;
mod controller;
mod errors;
mod evaluator;
mod features;
mod lexicon;
mod phase;
mod session;
mod threshold;

pub use category::ResponseCategory;
pub use controller::{ControllerState, ProgressionController, RenderAction, Transition};
pub use errors::ProgressionError;
pub use evaluator::{CompletionEvaluator, CompletionReason, Evaluation, PhaseProgress};
pub use features::{sentence_count, word_count, UtteranceFeatures};
pub use lexicon::{is_standalone_completion, tokenize, Lexicon};
pub use phase::{DefaultRule, Phase, PhaseId, PHASES};
pub use session::{ConversationState, PhaseSession, Utterance};
pub use threshold::{FeedbackEvent, ThresholdProfile};
