//! In-Memory Threshold Store Adapter
//!
//! Keeps threshold profiles in memory with version-checked writes.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::domain::reflection::{PhaseId, ThresholdProfile};
use crate::ports::{ThresholdStore, ThresholdStoreError};

/// In-memory threshold profiles, keyed by phase.
#[derive(Debug, Clone, Default)]
pub struct InMemoryThresholdStore {
    profiles: Arc<RwLock<BTreeMap<PhaseId, ThresholdProfile>>>,
}

impl InMemoryThresholdStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seeds a profile unconditionally (tests and fixtures).
    pub async fn insert(&self, profile: ThresholdProfile) {
        self.profiles.write().await.insert(profile.phase_id, profile);
    }
}

#[async_trait]
impl ThresholdStore for InMemoryThresholdStore {
    async fn get(&self, phase_id: PhaseId) -> Result<Option<ThresholdProfile>, ThresholdStoreError> {
        Ok(self.profiles.read().await.get(&phase_id).cloned())
    }

    async fn put_if_version(
        &self,
        profile: &ThresholdProfile,
        expected_version: u64,
    ) -> Result<(), ThresholdStoreError> {
        let mut profiles = self.profiles.write().await;
        let current = profiles.get(&profile.phase_id).map_or(0, |p| p.version);
        if current != expected_version {
            return Err(ThresholdStoreError::VersionConflict {
                phase_id: profile.phase_id,
                expected: expected_version,
            });
        }
        profiles.insert(profile.phase_id, profile.clone());
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ThresholdProfile>, ThresholdStoreError> {
        Ok(self.profiles.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn missing_profile_is_none() {
        let store = InMemoryThresholdStore::new();
        assert_eq!(store.get(PhaseId::FIRST).await.unwrap(), None);
    }

    #[tokio::test]
    async fn first_write_expects_version_zero() {
        let store = InMemoryThresholdStore::new();
        let mut profile = ThresholdProfile::from_defaults(PhaseId::FIRST, 0.0);
        profile.version = 1;

        store.put_if_version(&profile, 0).await.unwrap();
        assert_eq!(store.get(PhaseId::FIRST).await.unwrap(), Some(profile));
    }

    #[tokio::test]
    async fn stale_version_is_rejected() {
        let store = InMemoryThresholdStore::new();
        let mut profile = ThresholdProfile::from_defaults(PhaseId::LAST, 0.0);
        profile.version = 1;
        store.put_if_version(&profile, 0).await.unwrap();

        profile.version = 2;
        let err = store.put_if_version(&profile, 0).await.unwrap_err();
        assert!(matches!(err, ThresholdStoreError::VersionConflict { expected: 0, .. }));
    }

    #[tokio::test]
    async fn list_is_ordered_by_phase() {
        let store = InMemoryThresholdStore::new();
        store.insert(ThresholdProfile::from_defaults(PhaseId::LAST, 0.0)).await;
        store.insert(ThresholdProfile::from_defaults(PhaseId::FIRST, 0.0)).await;

        let phases: Vec<u8> = store
            .list()
            .await
            .unwrap()
            .iter()
            .map(|p| p.phase_id.get())
            .collect();
        assert_eq!(phases, vec![1, 7]);
    }
}
