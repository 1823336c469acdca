//! PostgreSQL implementation of ThresholdStore.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::Timestamp;
use crate::domain::reflection::{PhaseId, ThresholdProfile};
use crate::ports::{ThresholdStore, ThresholdStoreError};

const COLUMNS: &str = "phase_id, min_conversation_turns, min_word_count, \
    requires_emotion_signal, requires_value_signal, requires_perspective_signal, \
    confidence_score, feedback_count, version, updated_at";

/// PostgreSQL implementation of ThresholdStore.
#[derive(Clone)]
pub struct PostgresThresholdStore {
    pool: PgPool,
}

impl PostgresThresholdStore {
    /// Creates a new PostgresThresholdStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// First write for a phase. Loses to any concurrent first write.
    async fn insert(&self, profile: &ThresholdProfile) -> Result<u64, ThresholdStoreError> {
        let result = sqlx::query(
            r#"
            INSERT INTO threshold_profiles (
                phase_id, min_conversation_turns, min_word_count,
                requires_emotion_signal, requires_value_signal, requires_perspective_signal,
                confidence_score, feedback_count, version, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10)
            ON CONFLICT (phase_id) DO NOTHING
            "#,
        )
        .bind(i16::from(profile.phase_id.get()))
        .bind(profile.min_conversation_turns as i32)
        .bind(profile.min_word_count as i32)
        .bind(profile.requires_emotion_signal)
        .bind(profile.requires_value_signal)
        .bind(profile.requires_perspective_signal)
        .bind(profile.confidence_score)
        .bind(profile.feedback_count as i32)
        .bind(profile.version as i64)
        .bind(profile.updated_at.as_datetime())
        .execute(&self.pool)
        .await
        .map_err(|e| database("insert threshold profile", e))?;

        Ok(result.rows_affected())
    }

    async fn update(
        &self,
        profile: &ThresholdProfile,
        expected_version: u64,
    ) -> Result<u64, ThresholdStoreError> {
        let result = sqlx::query(
            r#"
            UPDATE threshold_profiles SET
                min_conversation_turns = $2,
                min_word_count = $3,
                requires_emotion_signal = $4,
                requires_value_signal = $5,
                requires_perspective_signal = $6,
                confidence_score = $7,
                feedback_count = $8,
                version = $9,
                updated_at = $10
            WHERE phase_id = $1 AND version = $11
            "#,
        )
        .bind(i16::from(profile.phase_id.get()))
        .bind(profile.min_conversation_turns as i32)
        .bind(profile.min_word_count as i32)
        .bind(profile.requires_emotion_signal)
        .bind(profile.requires_value_signal)
        .bind(profile.requires_perspective_signal)
        .bind(profile.confidence_score)
        .bind(profile.feedback_count as i32)
        .bind(profile.version as i64)
        .bind(profile.updated_at.as_datetime())
        .bind(expected_version as i64)
        .execute(&self.pool)
        .await
        .map_err(|e| database("update threshold profile", e))?;

        Ok(result.rows_affected())
    }
}

#[async_trait]
impl ThresholdStore for PostgresThresholdStore {
    async fn get(&self, phase_id: PhaseId) -> Result<Option<ThresholdProfile>, ThresholdStoreError> {
        let row = sqlx::query(&format!(
            "SELECT {} FROM threshold_profiles WHERE phase_id = $1",
            COLUMNS
        ))
        .bind(i16::from(phase_id.get()))
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database("fetch threshold profile", e))?;

        row.map(row_to_profile).transpose()
    }

    async fn put_if_version(
        &self,
        profile: &ThresholdProfile,
        expected_version: u64,
    ) -> Result<(), ThresholdStoreError> {
        let written = if expected_version == 0 {
            self.insert(profile).await?
        } else {
            self.update(profile, expected_version).await?
        };

        if written == 0 {
            return Err(ThresholdStoreError::VersionConflict {
                phase_id: profile.phase_id,
                expected: expected_version,
            });
        }
        Ok(())
    }

    async fn list(&self) -> Result<Vec<ThresholdProfile>, ThresholdStoreError> {
        let rows = sqlx::query(&format!(
            "SELECT {} FROM threshold_profiles ORDER BY phase_id ASC",
            COLUMNS
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database("list threshold profiles", e))?;

        rows.into_iter().map(row_to_profile).collect()
    }
}

fn row_to_profile(row: PgRow) -> Result<ThresholdProfile, ThresholdStoreError> {
    let phase_id: i16 = row.try_get("phase_id").map_err(column)?;
    let phase_id = u8::try_from(phase_id)
        .ok()
        .and_then(|id| PhaseId::new(id).ok())
        .ok_or_else(|| ThresholdStoreError::Database(format!("Invalid phase id: {}", phase_id)))?;

    let min_conversation_turns: i32 = row.try_get("min_conversation_turns").map_err(column)?;
    let min_word_count: i32 = row.try_get("min_word_count").map_err(column)?;
    let feedback_count: i32 = row.try_get("feedback_count").map_err(column)?;
    let version: i64 = row.try_get("version").map_err(column)?;

    Ok(ThresholdProfile {
        phase_id,
        min_conversation_turns: min_conversation_turns.max(0) as u32,
        min_word_count: min_word_count.max(0) as u32,
        requires_emotion_signal: row.try_get("requires_emotion_signal").map_err(column)?,
        requires_value_signal: row.try_get("requires_value_signal").map_err(column)?,
        requires_perspective_signal: row.try_get("requires_perspective_signal").map_err(column)?,
        confidence_score: row.try_get("confidence_score").map_err(column)?,
        feedback_count: feedback_count.max(0) as u32,
        version: version.max(0) as u64,
        updated_at: Timestamp::from_datetime(row.try_get("updated_at").map_err(column)?),
    })
}

fn database(action: &str, e: sqlx::Error) -> ThresholdStoreError {
    ThresholdStoreError::Database(format!("Failed to {}: {}", action, e))
}

fn column(e: sqlx::Error) -> ThresholdStoreError {
    ThresholdStoreError::Database(format!("Unexpected row shape: {}", e))
}
