//! PostgreSQL implementation of TranscriptStore.
//!
//! Turns are keyed by `(conversation_id, sequence)`. Appends lock the
//! conversation row so the sequence check and the insert happen atomically.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Row};

use crate::domain::foundation::{ConversationId, Timestamp};
use crate::domain::reflection::{ResponseCategory, Transition};
use crate::ports::{
    CategoryChange, ConversationRecord, TranscriptError, TranscriptStore, TurnRecord,
};

/// PostgreSQL implementation of TranscriptStore.
#[derive(Clone)]
pub struct PostgresTranscriptStore {
    pool: PgPool,
}

impl PostgresTranscriptStore {
    /// Creates a new PostgresTranscriptStore.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TranscriptStore for PostgresTranscriptStore {
    async fn create(&self, conversation: &ConversationRecord) -> Result<(), TranscriptError> {
        let result = sqlx::query("INSERT INTO conversations (id, started_at) VALUES ($1, $2)")
            .bind(conversation.id.as_uuid())
            .bind(conversation.started_at.as_datetime())
            .execute(&self.pool)
            .await;

        match result {
            Ok(_) => Ok(()),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(TranscriptError::AlreadyExists(conversation.id))
            }
            Err(e) => Err(database("insert conversation", e)),
        }
    }

    async fn find(&self, id: ConversationId) -> Result<Option<ConversationRecord>, TranscriptError> {
        let row = sqlx::query("SELECT id, started_at FROM conversations WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| database("fetch conversation", e))?;

        row.map(|row| {
            Ok(ConversationRecord {
                id: ConversationId::from_uuid(row.try_get("id").map_err(column)?),
                started_at: Timestamp::from_datetime(row.try_get("started_at").map_err(column)?),
            })
        })
        .transpose()
    }

    async fn append(&self, id: ConversationId, turn: &TurnRecord) -> Result<(), TranscriptError> {
        let transition = serde_json::to_value(&turn.transition)
            .map_err(|e| TranscriptError::Serialization(e.to_string()))?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| database("start transaction", e))?;

        let locked = sqlx::query("SELECT id FROM conversations WHERE id = $1 FOR UPDATE")
            .bind(id.as_uuid())
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| database("lock conversation", e))?;
        if locked.is_none() {
            return Err(TranscriptError::NotFound(id));
        }

        let (actual,): (i64,) =
            sqlx::query_as("SELECT COUNT(*) FROM turns WHERE conversation_id = $1")
                .bind(id.as_uuid())
                .fetch_one(&mut *tx)
                .await
                .map_err(|e| database("count turns", e))?;
        let conflict = || TranscriptError::SequenceConflict {
            conversation_id: id,
            expected: turn.sequence,
            actual: actual as u64,
        };
        if actual as u64 != turn.sequence {
            return Err(conflict());
        }

        let inserted = sqlx::query(
            r#"
            INSERT INTO turns (
                conversation_id, sequence, phase_id, action, transition,
                assistant_text, phase_summary, category, created_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id.as_uuid())
        .bind(turn.sequence as i64)
        .bind(i16::from(turn.transition.phase_id.get()))
        .bind(turn.transition.action.kind())
        .bind(transition)
        .bind(&turn.assistant_text)
        .bind(turn.phase_summary.as_deref())
        .bind(turn.category.map(|c| c.as_str()))
        .bind(turn.created_at.as_datetime())
        .execute(&mut *tx)
        .await;

        match inserted {
            Ok(_) => {}
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                return Err(conflict());
            }
            Err(e) => return Err(database("insert turn", e)),
        }

        tx.commit()
            .await
            .map_err(|e| database("commit transaction", e))
    }

    async fn turns(&self, id: ConversationId) -> Result<Vec<TurnRecord>, TranscriptError> {
        if self.find(id).await?.is_none() {
            return Err(TranscriptError::NotFound(id));
        }

        let rows = sqlx::query(
            r#"
            SELECT sequence, transition, assistant_text, phase_summary, category, created_at
            FROM turns
            WHERE conversation_id = $1
            ORDER BY sequence ASC
            "#,
        )
        .bind(id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| database("fetch turns", e))?;

        rows.into_iter().map(row_to_turn).collect()
    }

    async fn set_category(
        &self,
        id: ConversationId,
        sequence: u64,
        category: ResponseCategory,
    ) -> Result<CategoryChange, TranscriptError> {
        let row = sqlx::query(
            r#"
            UPDATE turns t SET category = $3
            FROM (
                SELECT category FROM turns
                WHERE conversation_id = $1 AND sequence = $2
                FOR UPDATE
            ) prev
            WHERE t.conversation_id = $1 AND t.sequence = $2
            RETURNING t.sequence, t.transition, t.assistant_text, t.phase_summary,
                t.category, t.created_at, prev.category AS previous_category
            "#,
        )
        .bind(id.as_uuid())
        .bind(sequence as i64)
        .bind(category.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| database("update turn category", e))?;

        match row {
            Some(row) => {
                let previous = parse_category(row.try_get("previous_category").map_err(column)?)?;
                Ok(CategoryChange {
                    turn: row_to_turn(row)?,
                    previous,
                })
            }
            None if self.find(id).await?.is_none() => Err(TranscriptError::NotFound(id)),
            None => Err(TranscriptError::TurnNotFound {
                conversation_id: id,
                sequence,
            }),
        }
    }
}

fn row_to_turn(row: PgRow) -> Result<TurnRecord, TranscriptError> {
    let sequence: i64 = row.try_get("sequence").map_err(column)?;
    let transition: serde_json::Value = row.try_get("transition").map_err(column)?;
    let transition: Transition = serde_json::from_value(transition)
        .map_err(|e| TranscriptError::Serialization(e.to_string()))?;
    let category = parse_category(row.try_get("category").map_err(column)?)?;

    Ok(TurnRecord {
        sequence: sequence as u64,
        transition,
        assistant_text: row.try_get("assistant_text").map_err(column)?,
        phase_summary: row.try_get("phase_summary").map_err(column)?,
        category,
        created_at: Timestamp::from_datetime(row.try_get("created_at").map_err(column)?),
    })
}

fn parse_category(raw: Option<String>) -> Result<Option<ResponseCategory>, TranscriptError> {
    raw.map(|c| c.parse::<ResponseCategory>())
        .transpose()
        .map_err(|e| TranscriptError::Serialization(e.to_string()))
}

fn database(action: &str, e: sqlx::Error) -> TranscriptError {
    TranscriptError::Database(format!("Failed to {}: {}", action, e))
}

fn column(e: sqlx::Error) -> TranscriptError {
    TranscriptError::Database(format!("Unexpected row shape: {}", e))
}
