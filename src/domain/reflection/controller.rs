//! Progression controller.
//!
//! After every utterance the controller decides whether to stay in the
//! current phase (acknowledging or probing), advance to the next phase, or
//! finish the conversation. Planning is pure: [`ProgressionController::plan`]
//! returns a [`Transition`] and leaves the conversation untouched until the
//! caller commits it.

use serde::{Deserialize, Serialize};

use super::errors::ProgressionError;
use super::evaluator::{CompletionEvaluator, Evaluation, PhaseProgress};
use super::features::UtteranceFeatures;
use super::phase::PhaseId;
use super::session::{ConversationState, Utterance};
use super::threshold::ThresholdProfile;
use crate::domain::foundation::{StateMachine, ValidationError};

/// Controller position within the curriculum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum ControllerState {
    Probing { phase: PhaseId, probe_index: usize },
    Acknowledging { phase: PhaseId },
    Advancing { from: PhaseId, to: PhaseId },
    Terminal,
}

impl ControllerState {
    pub fn initial() -> Self {
        ControllerState::Probing {
            phase: PhaseId::FIRST,
            probe_index: 0,
        }
    }

    /// The phase the next utterance belongs to, if any.
    pub fn phase(&self) -> Option<PhaseId> {
        match *self {
            ControllerState::Probing { phase, .. } | ControllerState::Acknowledging { phase } => {
                Some(phase)
            }
            ControllerState::Advancing { to, .. } => Some(to),
            ControllerState::Terminal => None,
        }
    }

    /// An advance is re-entered as the new phase's first probe.
    fn entered(self) -> Self {
        match self {
            ControllerState::Advancing { to, .. } => ControllerState::Probing {
                phase: to,
                probe_index: 0,
            },
            other => other,
        }
    }

    /// Moves to `target` on behalf of the next utterance.
    pub fn step(&self, target: ControllerState) -> Result<Self, ValidationError> {
        let entered = self.transition_to(self.entered())?;
        entered.transition_to(target)
    }
}

impl Default for ControllerState {
    fn default() -> Self {
        Self::initial()
    }
}

impl StateMachine for ControllerState {
    fn can_transition_to(&self, target: &Self) -> bool {
        // Re-entering a state is allowed for in-phase states only.
        if self == target {
            return !matches!(
                self,
                ControllerState::Advancing { .. } | ControllerState::Terminal
            );
        }
        self.valid_transitions().contains(target)
    }

    fn valid_transitions(&self) -> Vec<Self> {
        match *self {
            ControllerState::Probing { phase, .. } | ControllerState::Acknowledging { phase } => {
                in_phase_targets(phase)
            }
            ControllerState::Advancing { to, .. } => vec![ControllerState::Probing {
                phase: to,
                probe_index: 0,
            }],
            ControllerState::Terminal => vec![],
        }
    }
}

fn in_phase_targets(phase: PhaseId) -> Vec<ControllerState> {
    let mut targets = vec![ControllerState::Acknowledging { phase }];
    targets.extend(
        (0..phase.definition().probes.len())
            .map(|probe_index| ControllerState::Probing { phase, probe_index }),
    );
    targets.push(match phase.next() {
        Some(to) => ControllerState::Advancing { from: phase, to },
        None => ControllerState::Terminal,
    });
    targets
}

/// What the assistant should say next.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RenderAction {
    /// Acknowledge and restate the phase's opening prompt. `deepen` asks the
    /// generator to gently invite more detail.
    InitialPrompt { deepen: bool },
    Probe { index: usize },
    AcknowledgeAndProbe { index: usize },
    AcknowledgeAndAdvance { next_phase: PhaseId },
    TerminalSynthesis,
}

impl RenderAction {
    /// The verbatim prompt this action renders while in `phase_id`.
    pub fn prompt_text(&self, phase_id: PhaseId) -> &'static str {
        let phase = phase_id.definition();
        match *self {
            RenderAction::InitialPrompt { .. } => phase.initial_prompt,
            RenderAction::Probe { index } | RenderAction::AcknowledgeAndProbe { index } => {
                phase.probe(index)
            }
            RenderAction::AcknowledgeAndAdvance { next_phase } => {
                next_phase.definition().initial_prompt
            }
            RenderAction::TerminalSynthesis => PhaseId::LAST.definition().transition_line,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            RenderAction::InitialPrompt { .. } => "initial_prompt",
            RenderAction::Probe { .. } => "probe",
            RenderAction::AcknowledgeAndProbe { .. } => "acknowledge_and_probe",
            RenderAction::AcknowledgeAndAdvance { .. } => "acknowledge_and_advance",
            RenderAction::TerminalSynthesis => "terminal_synthesis",
        }
    }

    pub fn is_advance(&self) -> bool {
        matches!(self, RenderAction::AcknowledgeAndAdvance { .. })
    }
}

/// A planned, not yet applied, controller step.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transition {
    pub from: ControllerState,
    pub to: ControllerState,
    /// Phase the utterance was evaluated in.
    pub phase_id: PhaseId,
    pub turn_index: usize,
    pub action: RenderAction,
    pub prompt_text: String,
    /// `None` for an empty utterance, which is not counted as a turn.
    pub utterance: Option<Utterance>,
    pub features: UtteranceFeatures,
    pub evaluation: Option<Evaluation>,
}

impl Transition {
    /// True if committing this transition seals the current phase.
    pub fn seals_phase(&self) -> bool {
        matches!(
            self.to,
            ControllerState::Advancing { .. } | ControllerState::Terminal
        )
    }

    pub fn next_phase_id(&self) -> Option<PhaseId> {
        match self.to {
            ControllerState::Advancing { to, .. } => Some(to),
            _ => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        self.to == ControllerState::Terminal
    }
}

/// Turns utterances into transitions.
#[derive(Debug, Clone, Default)]
pub struct ProgressionController {
    evaluator: CompletionEvaluator,
}

impl ProgressionController {
    pub fn new(evaluator: CompletionEvaluator) -> Self {
        Self { evaluator }
    }

    pub fn evaluator(&self) -> &CompletionEvaluator {
        &self.evaluator
    }

    /// Plans the controller's response to `text`.
    ///
    /// Fails with `InvalidPhaseTransition` once the conversation is terminal.
    pub fn plan(
        &self,
        state: &ConversationState,
        text: &str,
        profile: Option<&ThresholdProfile>,
    ) -> Result<Transition, ProgressionError> {
        let phase_id = state.current_phase_id();
        let turn_index = state.current_turn_index();
        let session = match state.open_session() {
            Some(session) if !state.is_terminal() => session,
            _ => {
                return Err(ProgressionError::invalid_transition(
                    phase_id,
                    turn_index,
                    "conversation is complete",
                ))
            }
        };

        let phase = phase_id.definition();
        let features = UtteranceFeatures::extract(text, turn_index);

        let (to, action, utterance, evaluation) = if features.word_count == 0 {
            (
                ControllerState::Acknowledging { phase: phase_id },
                RenderAction::InitialPrompt { deepen: false },
                None,
                None,
            )
        } else {
            let progress = PhaseProgress {
                turn_index,
                cumulative_word_count: session.cumulative_word_count() + features.word_count,
            };
            let evaluation = self.evaluator.evaluate(phase_id, &features, progress, profile);
            tracing::debug!(
                phase = %phase_id,
                turn = turn_index,
                words = features.word_count,
                complete = evaluation.complete,
                vague = evaluation.vague,
                reason = ?evaluation.reason,
                "Evaluated utterance"
            );

            let (to, action) = if evaluation.complete {
                match phase_id.next() {
                    Some(next) => (
                        ControllerState::Advancing {
                            from: phase_id,
                            to: next,
                        },
                        RenderAction::AcknowledgeAndAdvance { next_phase: next },
                    ),
                    None => (ControllerState::Terminal, RenderAction::TerminalSynthesis),
                }
            } else if turn_index == 0 {
                (
                    ControllerState::Acknowledging { phase: phase_id },
                    RenderAction::InitialPrompt {
                        deepen: evaluation.vague,
                    },
                )
            } else {
                let index = phase.clamp_probe_index(turn_index);
                let action = if evaluation.vague {
                    RenderAction::Probe { index }
                } else {
                    RenderAction::AcknowledgeAndProbe { index }
                };
                (
                    ControllerState::Probing {
                        phase: phase_id,
                        probe_index: index,
                    },
                    action,
                )
            };

            let utterance = Utterance::new(text, &features, turn_index);
            (to, action, Some(utterance), Some(evaluation))
        };

        let from = state.controller_state();
        from.step(to).map_err(|err| {
            ProgressionError::invalid_transition(phase_id, turn_index, err.to_string())
        })?;

        Ok(Transition {
            from,
            to,
            phase_id,
            turn_index,
            action,
            prompt_text: action.prompt_text(phase_id).to_string(),
            utterance,
            features,
            evaluation,
        })
    }
}
