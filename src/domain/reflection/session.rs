//! Phase sessions and the conversation aggregate.

use serde::{Deserialize, Serialize};

use super::controller::{ControllerState, Transition};
use super::errors::ProgressionError;
use super::features::UtteranceFeatures;
use super::phase::PhaseId;
use crate::domain::foundation::{ConversationId, Timestamp};

/// One processed user message.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Utterance {
    pub text: String,
    pub word_count: usize,
    pub sentence_count: usize,
    /// 0-based position within its phase.
    pub turn_index: usize,
}

impl Utterance {
    pub fn new(text: impl Into<String>, features: &UtteranceFeatures, turn_index: usize) -> Self {
        Self {
            text: text.into(),
            word_count: features.word_count,
            sentence_count: features.sentence_count,
            turn_index,
        }
    }
}

/// Everything the user said within one phase.
///
/// Sealed sessions are never evaluated or mutated again.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseSession {
    phase_id: PhaseId,
    utterances: Vec<Utterance>,
    cumulative_word_count: usize,
    completed: bool,
    completed_at: Option<Timestamp>,
    summary: Option<String>,
}

impl PhaseSession {
    pub fn open(phase_id: PhaseId) -> Self {
        Self {
            phase_id,
            utterances: Vec::new(),
            cumulative_word_count: 0,
            completed: false,
            completed_at: None,
            summary: None,
        }
    }

    pub fn phase_id(&self) -> PhaseId {
        self.phase_id
    }

    pub fn utterances(&self) -> &[Utterance] {
        &self.utterances
    }

    pub fn cumulative_word_count(&self) -> usize {
        self.cumulative_word_count
    }

    /// Index the next utterance will get.
    pub fn turn_index(&self) -> usize {
        self.utterances.len()
    }

    pub fn is_completed(&self) -> bool {
        self.completed
    }

    pub fn completed_at(&self) -> Option<Timestamp> {
        self.completed_at
    }

    /// Short headline produced when the session was sealed, if any.
    pub fn summary(&self) -> Option<&str> {
        self.summary.as_deref()
    }

    fn record(&mut self, utterance: Utterance) {
        self.cumulative_word_count += utterance.word_count;
        self.utterances.push(utterance);
    }

    fn seal(&mut self, at: Timestamp, summary: Option<String>) {
        self.completed = true;
        self.completed_at = Some(at);
        self.summary = summary;
    }
}

/// The state of one reflection conversation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConversationState {
    id: ConversationId,
    current_phase_id: PhaseId,
    /// `None` once terminal.
    open_session: Option<PhaseSession>,
    sealed_sessions: Vec<PhaseSession>,
    controller: ControllerState,
    terminal: bool,
    /// Number of committed turns.
    sequence: u64,
    started_at: Timestamp,
}

impl ConversationState {
    /// A new conversation positioned at phase 1.
    pub fn start(id: ConversationId, started_at: Timestamp) -> Self {
        Self {
            id,
            current_phase_id: PhaseId::FIRST,
            open_session: Some(PhaseSession::open(PhaseId::FIRST)),
            sealed_sessions: Vec::new(),
            controller: ControllerState::initial(),
            terminal: false,
            sequence: 0,
            started_at,
        }
    }

    /// Rebuilds a conversation by committing stored transitions in order.
    pub fn replay<'a, I>(
        id: ConversationId,
        started_at: Timestamp,
        turns: I,
    ) -> Result<Self, ProgressionError>
    where
        I: IntoIterator<Item = (&'a Transition, Option<&'a str>, Timestamp)>,
    {
        let mut state = Self::start(id, started_at);
        for (transition, summary, at) in turns {
            state.commit(transition, summary.map(str::to_string), at)?;
        }
        Ok(state)
    }

    pub fn id(&self) -> ConversationId {
        self.id
    }

    pub fn current_phase_id(&self) -> PhaseId {
        self.current_phase_id
    }

    pub fn open_session(&self) -> Option<&PhaseSession> {
        self.open_session.as_ref()
    }

    pub fn sealed_sessions(&self) -> &[PhaseSession] {
        &self.sealed_sessions
    }

    pub fn controller_state(&self) -> ControllerState {
        self.controller
    }

    pub fn is_terminal(&self) -> bool {
        self.terminal
    }

    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    pub fn started_at(&self) -> Timestamp {
        self.started_at
    }

    /// Turn index of the next utterance, or the last phase's turn count once
    /// terminal.
    pub fn current_turn_index(&self) -> usize {
        match (&self.open_session, self.sealed_sessions.last()) {
            (Some(open), _) => open.turn_index(),
            (None, Some(last)) => last.turn_index(),
            (None, None) => 0,
        }
    }

    /// Utterances from phases before the current one, oldest first.
    pub fn earlier_utterances(&self) -> impl Iterator<Item = (PhaseId, &Utterance)> {
        self.sealed_sessions
            .iter()
            .flat_map(|s| s.utterances.iter().map(move |u| (s.phase_id, u)))
    }

    /// Applies a planned transition.
    ///
    /// Returns the session sealed by this step, if any. Fails without
    /// mutation when the conversation is terminal or the plan was made
    /// against a different state.
    pub fn commit(
        &mut self,
        transition: &Transition,
        summary: Option<String>,
        at: Timestamp,
    ) -> Result<Option<PhaseSession>, ProgressionError> {
        let turn_index = self.current_turn_index();
        if self.terminal {
            return Err(ProgressionError::invalid_transition(
                self.current_phase_id,
                turn_index,
                "conversation is complete",
            ));
        }
        if transition.from != self.controller
            || transition.phase_id != self.current_phase_id
            || transition.turn_index != turn_index
        {
            return Err(ProgressionError::StalePlan {
                phase_id: self.current_phase_id,
                turn_index,
            });
        }
        self.controller.step(transition.to).map_err(|err| {
            ProgressionError::invalid_transition(self.current_phase_id, turn_index, err.to_string())
        })?;

        let Some(mut session) = self.open_session.take() else {
            return Err(ProgressionError::invalid_transition(
                self.current_phase_id,
                turn_index,
                "no open phase session",
            ));
        };
        if let Some(utterance) = &transition.utterance {
            session.record(utterance.clone());
        }

        self.controller = transition.to;
        self.sequence += 1;

        let sealed = match transition.to {
            ControllerState::Advancing { to, .. } => {
                session.seal(at, summary);
                self.sealed_sessions.push(session.clone());
                self.current_phase_id = to;
                self.open_session = Some(PhaseSession::open(to));
                Some(session)
            }
            ControllerState::Terminal => {
                session.seal(at, summary);
                self.sealed_sessions.push(session.clone());
                self.terminal = true;
                Some(session)
            }
            _ => {
                self.open_session = Some(session);
                None
            }
        };
        Ok(sealed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::reflection::controller::ProgressionController;

    fn drive(texts: &[&str]) -> (ConversationState, Vec<(Transition, Option<String>, Timestamp)>) {
        let controller = ProgressionController::default();
        let mut state = ConversationState::start(ConversationId::new(), Timestamp::now());
        let mut log = Vec::new();
        for (i, text) in texts.iter().enumerate() {
            let t = controller.plan(&state, text, None).unwrap();
            let summary = t.seals_phase().then(|| format!("summary {}", i));
            let at = Timestamp::now();
            state.commit(&t, summary.clone(), at).unwrap();
            log.push((t, summary, at));
        }
        (state, log)
    }

    const FULL_RUN: &[&str] = &[
        "My ex keeps showing up late for pickups",
        "I feel hurt and angry",
        "I want my kids to feel safe and loved",
        "",
        "maybe",
        "she is probably overwhelmed with her new job",
        "They notice the tension at handoffs",
        "We could text when running late",
        "Hi, can we agree to text if pickup is delayed?",
    ];

    mod commit {
        use super::*;

        #[test]
        fn sealing_moves_session_into_history() {
            let (state, _) = drive(&["My ex keeps showing up late for pickups"]);
            assert_eq!(state.current_phase_id(), PhaseId::new(2).unwrap());
            let sealed = &state.sealed_sessions()[0];
            assert!(sealed.is_completed());
            assert!(sealed.completed_at().is_some());
            assert_eq!(sealed.summary(), Some("summary 0"));
            assert_eq!(sealed.cumulative_word_count(), 8);
            assert_eq!(state.open_session().unwrap().turn_index(), 0);
        }

        #[test]
        fn full_run_reaches_terminal() {
            let (state, _) = drive(FULL_RUN);
            assert!(state.is_terminal());
            assert_eq!(state.sealed_sessions().len(), 7);
            assert!(state.open_session().is_none());
            assert_eq!(state.sequence(), FULL_RUN.len() as u64);
            assert_eq!(state.current_phase_id(), PhaseId::LAST);
        }

        #[test]
        fn stale_plan_is_rejected() {
            let controller = ProgressionController::default();
            let mut state = ConversationState::start(ConversationId::new(), Timestamp::now());
            let t = controller.plan(&state, "he is late", None).unwrap();
            state.commit(&t, None, Timestamp::now()).unwrap();

            let before = state.clone();
            let err = state.commit(&t, None, Timestamp::now()).unwrap_err();
            assert!(matches!(err, ProgressionError::StalePlan { .. }));
            assert_eq!(state, before);
        }

        #[test]
        fn earlier_utterances_cover_sealed_phases_only() {
            let (state, _) = drive(&["My ex keeps showing up late for pickups", "idk"]);
            let earlier: Vec<_> = state.earlier_utterances().collect();
            assert_eq!(earlier.len(), 1);
            assert_eq!(earlier[0].0, PhaseId::FIRST);
        }
    }

    mod replay {
        use super::*;

        #[test]
        fn replay_reproduces_state() {
            let (state, log) = drive(FULL_RUN);
            let replayed = ConversationState::replay(
                state.id(),
                state.started_at(),
                log.iter().map(|(t, s, at)| (t, s.as_deref(), *at)),
            )
            .unwrap();

            assert_eq!(replayed, state);
            assert_eq!(replayed.current_phase_id(), state.current_phase_id());
            assert_eq!(replayed.is_terminal(), state.is_terminal());
            assert_eq!(replayed.sealed_sessions(), state.sealed_sessions());
        }

        #[test]
        fn partial_replay_matches_prefix() {
            let (state, log) = drive(&FULL_RUN[..4]);
            let replayed = ConversationState::replay(
                state.id(),
                state.started_at(),
                log.iter().map(|(t, s, at)| (t, s.as_deref(), *at)),
            )
            .unwrap();
            assert_eq!(replayed, state);
        }

        #[test]
        fn state_round_trips_through_json() {
            let (state, _) = drive(&FULL_RUN[..3]);
            let json = serde_json::to_string(&state).unwrap();
            let back: ConversationState = serde_json::from_str(&json).unwrap();
            assert_eq!(back, state);
        }
    }
}
