//! RecordFeedbackHandler - Command handler for threshold feedback.
//!
//! Profiles are updated with read / compute / conditional write on the
//! profile version. A lost race re-reads and recomputes, up to
//! `FeedbackPolicy::max_retries` attempts. An update that would leave the
//! profile invalid is rejected before it reaches the store.

use std::sync::Arc;

use crate::application::error::ReflectionError;
use crate::domain::reflection::{FeedbackEvent, ThresholdProfile};
use crate::ports::{ThresholdStore, ThresholdStoreError};

/// Tuning for how feedback moves a profile.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FeedbackPolicy {
    pub learning_rate: f64,
    /// Confidence for a profile created on first feedback.
    pub initial_confidence: f64,
    pub max_retries: u32,
}

impl Default for FeedbackPolicy {
    fn default() -> Self {
        Self {
            learning_rate: 0.2,
            initial_confidence: 0.0,
            max_retries: 5,
        }
    }
}

/// Command to record one feedback event.
#[derive(Debug, Clone)]
pub struct RecordFeedbackCommand {
    pub event: FeedbackEvent,
}

/// Handler for recording feedback.
pub struct RecordFeedbackHandler {
    thresholds: Arc<dyn ThresholdStore>,
    policy: FeedbackPolicy,
}

impl RecordFeedbackHandler {
    pub fn new(thresholds: Arc<dyn ThresholdStore>, policy: FeedbackPolicy) -> Self {
        Self { thresholds, policy }
    }

    /// Returns the profile as stored after the update.
    pub async fn handle(
        &self,
        cmd: RecordFeedbackCommand,
    ) -> Result<ThresholdProfile, ReflectionError> {
        let event = cmd.event;
        let attempts = self.policy.max_retries.max(1);

        for attempt in 1..=attempts {
            let current = match self.thresholds.get(event.phase_id).await? {
                Some(profile) => profile,
                None => ThresholdProfile::from_defaults(event.phase_id, self.policy.initial_confidence),
            };
            let updated = current.apply_feedback(&event, self.policy.learning_rate);
            if let Err(err) = updated.validate() {
                tracing::warn!(phase = %event.phase_id, error = %err, "Rejected invalid threshold update");
                return Err(err.into());
            }

            match self.thresholds.put_if_version(&updated, current.version).await {
                Ok(()) => {
                    tracing::info!(
                        phase = %event.phase_id,
                        signaled_correct = event.signaled_correct,
                        confidence = updated.confidence_score,
                        version = updated.version,
                        "Threshold profile updated"
                    );
                    return Ok(updated);
                }
                Err(ThresholdStoreError::VersionConflict { .. }) => {
                    tracing::debug!(phase = %event.phase_id, attempt, "Threshold version conflict; retrying");
                }
                Err(err) => return Err(err.into()),
            }
        }

        tracing::warn!(phase = %event.phase_id, attempts, "Gave up updating threshold profile");
        Err(ReflectionError::ThresholdContention {
            phase_id: event.phase_id,
            attempts,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::storage::InMemoryThresholdStore;
    use crate::domain::reflection::PhaseId;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    fn event(correct: bool) -> FeedbackEvent {
        FeedbackEvent {
            phase_id: PhaseId::FIRST,
            observed_turn_index: 1,
            observed_word_count: 12,
            signaled_correct: correct,
        }
    }

    /// Store that loses every write race.
    struct ContendedStore {
        writes: AtomicU32,
    }

    #[async_trait]
    impl ThresholdStore for ContendedStore {
        async fn get(&self, _phase_id: PhaseId) -> Result<Option<ThresholdProfile>, ThresholdStoreError> {
            Ok(None)
        }

        async fn put_if_version(
            &self,
            profile: &ThresholdProfile,
            expected_version: u64,
        ) -> Result<(), ThresholdStoreError> {
            self.writes.fetch_add(1, Ordering::SeqCst);
            Err(ThresholdStoreError::VersionConflict {
                phase_id: profile.phase_id,
                expected: expected_version,
            })
        }

        async fn list(&self) -> Result<Vec<ThresholdProfile>, ThresholdStoreError> {
            Ok(vec![])
        }
    }

    #[tokio::test]
    async fn first_feedback_creates_profile_from_defaults() {
        let store = Arc::new(InMemoryThresholdStore::new());
        let handler = RecordFeedbackHandler::new(store.clone(), FeedbackPolicy::default());

        let profile = handler
            .handle(RecordFeedbackCommand { event: event(true) })
            .await
            .unwrap();

        assert_eq!(profile.version, 1);
        assert_eq!(profile.feedback_count, 1);
        assert!((profile.confidence_score - 0.2).abs() < 1e-9);
        assert_eq!(store.get(PhaseId::FIRST).await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn contradicting_feedback_keeps_confidence() {
        let store = Arc::new(InMemoryThresholdStore::new());
        let handler = RecordFeedbackHandler::new(store, FeedbackPolicy::default());

        handler.handle(RecordFeedbackCommand { event: event(true) }).await.unwrap();
        let profile = handler
            .handle(RecordFeedbackCommand { event: event(false) })
            .await
            .unwrap();

        assert_eq!(profile.version, 2);
        assert!((profile.confidence_score - 0.2).abs() < 1e-9);
        assert_eq!(profile.min_conversation_turns, 3);
        assert_eq!(profile.min_word_count, 13);
    }

    #[tokio::test]
    async fn concurrent_feedback_is_not_lost() {
        let store = Arc::new(InMemoryThresholdStore::new());
        let handler = Arc::new(RecordFeedbackHandler::new(
            store.clone(),
            FeedbackPolicy {
                max_retries: 50,
                ..FeedbackPolicy::default()
            },
        ));

        let tasks: Vec<_> = (0..8)
            .map(|_| {
                let handler = Arc::clone(&handler);
                tokio::spawn(async move {
                    handler.handle(RecordFeedbackCommand { event: event(true) }).await
                })
            })
            .collect();
        for task in tasks {
            task.await.unwrap().unwrap();
        }

        let profile = store.get(PhaseId::FIRST).await.unwrap().unwrap();
        assert_eq!(profile.feedback_count, 8);
        assert_eq!(profile.version, 8);
    }

    #[tokio::test]
    async fn persistent_conflict_gives_up() {
        let store = Arc::new(ContendedStore {
            writes: AtomicU32::new(0),
        });
        let handler = RecordFeedbackHandler::new(
            store.clone(),
            FeedbackPolicy {
                max_retries: 3,
                ..FeedbackPolicy::default()
            },
        );

        let err = handler
            .handle(RecordFeedbackCommand { event: event(true) })
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            ReflectionError::ThresholdContention { attempts: 3, .. }
        ));
        assert_eq!(store.writes.load(Ordering::SeqCst), 3);
    }

    #[tokio::test]
    async fn invalid_update_is_rejected_and_not_stored() {
        let store = Arc::new(InMemoryThresholdStore::new());
        let mut corrupt = ThresholdProfile::from_defaults(PhaseId::FIRST, 0.5);
        corrupt.min_conversation_turns = 0;
        store.insert(corrupt.clone()).await;
        let handler = RecordFeedbackHandler::new(store.clone(), FeedbackPolicy::default());

        let err = handler
            .handle(RecordFeedbackCommand { event: event(true) })
            .await
            .unwrap_err();

        assert!(matches!(err, ReflectionError::Validation(_)));
        assert_eq!(store.get(PhaseId::FIRST).await.unwrap(), Some(corrupt));
    }

    #[tokio::test]
    async fn out_of_range_initial_confidence_is_rejected() {
        let store = Arc::new(InMemoryThresholdStore::new());
        let handler = RecordFeedbackHandler::new(
            store.clone(),
            FeedbackPolicy {
                initial_confidence: 1.5,
                ..FeedbackPolicy::default()
            },
        );

        let err = handler
            .handle(RecordFeedbackCommand { event: event(false) })
            .await
            .unwrap_err();

        assert!(matches!(err, ReflectionError::Validation(_)));
        assert!(store.list().await.unwrap().is_empty());
    }
}
