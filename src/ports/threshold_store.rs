//! Threshold Store Port - Shared per-phase threshold profiles.
//!
//! Writers use read / compute / conditional-update: `put_if_version` only
//! succeeds if the stored profile still has the version the writer read.

use async_trait::async_trait;

use crate::domain::reflection::{PhaseId, ThresholdProfile};

/// Errors that can occur during threshold store operations.
#[derive(Debug, thiserror::Error)]
pub enum ThresholdStoreError {
    #[error("Version conflict for phase {phase_id}: expected {expected}")]
    VersionConflict { phase_id: PhaseId, expected: u64 },

    #[error("Database error: {0}")]
    Database(String),
}

/// Port for reading and updating threshold profiles.
#[async_trait]
pub trait ThresholdStore: Send + Sync {
    /// Returns the profile for a phase, if one was ever written.
    async fn get(&self, phase_id: PhaseId) -> Result<Option<ThresholdProfile>, ThresholdStoreError>;

    /// Stores `profile` if the current version equals `expected_version`.
    ///
    /// A missing profile counts as version 0.
    async fn put_if_version(
        &self,
        profile: &ThresholdProfile,
        expected_version: u64,
    ) -> Result<(), ThresholdStoreError>;

    /// All stored profiles, ordered by phase.
    async fn list(&self) -> Result<Vec<ThresholdProfile>, ThresholdStoreError>;
}
