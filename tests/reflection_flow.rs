//! Integration tests for the reflection flow.
//!
//! These tests drive the application handlers end to end over the in-memory
//! adapters:
//! 1. A conversation runs from phase 1 to the terminal synthesis
//! 2. A fresh process resumes a conversation from its transcript
//! 3. Reviewer feedback activates a learned threshold profile

use std::sync::Arc;

use be_aligned::adapters::{InMemoryThresholdStore, InMemoryTranscriptStore, MockGenerator};
use be_aligned::application::handlers::{
    ConversationExport, FeedbackPolicy, GetConversationHandler, GetConversationQuery,
    RecordFeedbackCommand, RecordFeedbackHandler, StartConversationHandler, SubmitTurnCommand,
    SubmitTurnHandler, SubmitTurnResult,
};
use be_aligned::application::{ConversationCache, ReflectionError};
use be_aligned::domain::foundation::ConversationId;
use be_aligned::domain::reflection::{
    CompletionReason, FeedbackEvent, PhaseId, ProgressionController, ProgressionError,
    RenderAction, ThresholdProfile,
};

// =============================================================================
// Test Infrastructure
// =============================================================================

struct Service {
    transcript: Arc<InMemoryTranscriptStore>,
    thresholds: Arc<InMemoryThresholdStore>,
    generator: MockGenerator,
    cache: Arc<ConversationCache>,
}

impl Service {
    fn new() -> Self {
        Self {
            transcript: Arc::new(InMemoryTranscriptStore::new()),
            thresholds: Arc::new(InMemoryThresholdStore::new()),
            generator: MockGenerator::new(),
            cache: Arc::new(ConversationCache::new()),
        }
    }

    /// Same stores, cold cache.
    fn restarted(&self) -> Self {
        Self {
            transcript: self.transcript.clone(),
            thresholds: self.thresholds.clone(),
            generator: MockGenerator::new(),
            cache: Arc::new(ConversationCache::new()),
        }
    }

    async fn start(&self) -> ConversationId {
        StartConversationHandler::new(self.transcript.clone(), self.cache.clone())
            .handle()
            .await
            .unwrap()
            .conversation_id
    }

    async fn send(
        &self,
        id: ConversationId,
        text: &str,
    ) -> Result<SubmitTurnResult, ReflectionError> {
        SubmitTurnHandler::new(
            self.transcript.clone(),
            self.thresholds.clone(),
            Arc::new(self.generator.clone()),
            self.cache.clone(),
            ProgressionController::default(),
        )
        .handle(SubmitTurnCommand {
            conversation_id: id,
            text: text.to_string(),
        })
        .await
    }

    async fn export(&self, id: ConversationId) -> ConversationExport {
        GetConversationHandler::new(self.transcript.clone(), self.cache.clone())
            .handle(GetConversationQuery { conversation_id: id })
            .await
            .unwrap()
    }
}

fn phase(n: u8) -> PhaseId {
    PhaseId::new(n).unwrap()
}

// =============================================================================
// Full conversation
// =============================================================================

#[tokio::test]
async fn conversation_runs_through_all_seven_phases() {
    let service = Service::new();
    let id = service.start().await;

    // Phase 1: too short at turn 0, completes at turn 1.
    let r = service.send(id, "he is late").await.unwrap();
    assert_eq!(r.action, RenderAction::InitialPrompt { deepen: false });
    let r = service.send(id, "again this week, for the third time").await.unwrap();
    assert_eq!(r.next_phase_id, Some(phase(2)));

    // Phase 2: "idk" restates, "fine" is fatigue.
    let r = service.send(id, "idk").await.unwrap();
    assert_eq!(r.action, RenderAction::InitialPrompt { deepen: true });
    assert_eq!(r.turn_index, 0);
    let r = service.send(id, "fine").await.unwrap();
    assert_eq!(r.action, RenderAction::AcknowledgeAndAdvance { next_phase: phase(3) });
    assert_eq!(r.prompt_text, phase(3).definition().initial_prompt);

    // Phase 3: one substantive answer is enough.
    let r = service.send(id, "I want my kids to feel safe and loved").await.unwrap();
    assert_eq!(r.action, RenderAction::AcknowledgeAndAdvance { next_phase: phase(4) });
    assert_eq!(r.prompt_text, phase(4).definition().initial_prompt);

    // Phases 4 to 6 close on explicit signals.
    for expected_next in 5..=7 {
        let r = service.send(id, "that's it").await.unwrap();
        assert_eq!(r.next_phase_id, Some(phase(expected_next)));
    }

    // Phase 7 completes on its first answer.
    let r = service
        .send(id, "Could we agree to text each other when pickup runs late?")
        .await
        .unwrap();
    assert_eq!(r.action, RenderAction::TerminalSynthesis);
    assert!(r.session_complete);
    assert_eq!(r.prompt_text, PhaseId::LAST.definition().transition_line);
    assert!(service.cache.is_empty().await);

    let export = service.export(id).await;
    assert!(export.state.is_terminal());
    assert_eq!(export.state.current_phase_id(), PhaseId::LAST);
    assert_eq!(export.state.sealed_sessions().len(), 7);
    assert_eq!(export.turns.len(), 9);

    let err = service.send(id, "anything else?").await.unwrap_err();
    assert!(matches!(
        err,
        ReflectionError::Progression(ProgressionError::InvalidPhaseTransition { .. })
    ));
}

#[tokio::test]
async fn empty_utterances_restate_without_counting_as_turns() {
    let service = Service::new();
    let id = service.start().await;

    let r = service.send(id, "   ").await.unwrap();
    assert_eq!(r.action, RenderAction::InitialPrompt { deepen: false });
    assert_eq!(r.turn_index, 0);

    let r = service.send(id, "he is late").await.unwrap();
    assert_eq!(r.turn_index, 0);
    assert_eq!(r.sequence, 1);
}

#[tokio::test]
async fn probe_index_clamps_to_the_last_probe() {
    let service = Service::new();
    let id = service.start().await;
    service.send(id, "that's it").await.unwrap();

    // An active profile demanding many turns holds phase 2 open.
    let mut profile = ThresholdProfile::from_defaults(phase(2), 0.95);
    profile.min_conversation_turns = 20;
    service.thresholds.insert(profile).await;

    let probes = phase(2).definition().probes;
    let mut last = None;
    for _ in 0..8 {
        last = Some(
            service
                .send(id, "my ex forgets the school pickup again every week")
                .await
                .unwrap(),
        );
    }
    let last = last.unwrap();
    assert_eq!(last.turn_index, 7);
    assert_eq!(last.prompt_text, probes[probes.len() - 1]);
}

// =============================================================================
// Resume
// =============================================================================

#[tokio::test]
async fn restarted_service_resumes_from_transcript() {
    let service = Service::new();
    let id = service.start().await;
    service.send(id, "My ex keeps showing up late for pickups").await.unwrap();
    service.send(id, "idk").await.unwrap();
    let before = service.export(id).await;

    let restarted = service.restarted();
    assert_eq!(restarted.export(id).await, before);

    let r = restarted.send(id, "fine").await.unwrap();
    assert_eq!(r.phase_id, phase(2));
    assert_eq!(r.turn_index, 1);
    assert!(r.auto_progress);
}

// =============================================================================
// Threshold learning
// =============================================================================

#[tokio::test]
async fn corroborated_profile_changes_progression() {
    let service = Service::new();
    let feedback =
        RecordFeedbackHandler::new(service.thresholds.clone(), FeedbackPolicy::default());

    // Below the activation floor the defaults still apply.
    let event = FeedbackEvent {
        phase_id: PhaseId::FIRST,
        observed_turn_index: 0,
        observed_word_count: 3,
        signaled_correct: true,
    };
    let first = feedback.handle(RecordFeedbackCommand { event }).await.unwrap();
    assert!(first.confidence_score < 0.6);

    let id = service.start().await;
    let r = service.send(id, "he is late").await.unwrap();
    assert!(!r.auto_progress);

    // Five corroborations lift confidence past 0.6.
    for _ in 0..4 {
        feedback.handle(RecordFeedbackCommand { event }).await.unwrap();
    }

    let other = service.start().await;
    let r = service.send(other, "he is late").await.unwrap();
    assert!(r.auto_progress);

    let export = service.export(other).await;
    let evaluation = export.turns[0].transition.evaluation.unwrap();
    assert_eq!(evaluation.reason, CompletionReason::ProfileMet);
}
