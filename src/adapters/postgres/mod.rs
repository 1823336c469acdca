//! PostgreSQL adapters - Database implementations for the storage ports.
//!
//! - `PostgresTranscriptStore` - Conversation headers and append-only turn logs
//! - `PostgresThresholdStore` - Version-checked threshold profiles
//!
//! Schema lives in `migrations/`; call [`migrate`] once at startup.

mod threshold_store;
mod transcript_store;

pub use threshold_store::PostgresThresholdStore;
pub use transcript_store::PostgresTranscriptStore;

use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

/// Opens a connection pool.
pub async fn connect(url: &str, max_connections: u32) -> Result<PgPool, sqlx::Error> {
    PgPoolOptions::new()
        .max_connections(max_connections)
        .connect(url)
        .await
}

/// Applies pending migrations.
pub async fn migrate(pool: &PgPool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}
