//! BeAligned reflection service entry point.

use std::error::Error;
use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use be_aligned::adapters::{
    api_router, postgres, InMemoryThresholdStore, InMemoryTranscriptStore, MockGenerator,
    OpenAIConfig, OpenAIGenerator, PostgresThresholdStore, PostgresTranscriptStore,
    ReflectionHandlers,
};
use be_aligned::config::{AiConfig, AppConfig};
use be_aligned::ports::{TextGenerator, ThresholdStore, TranscriptStore};

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = AppConfig::load()?;
    init_tracing(&config);
    config.validate()?;

    let (transcript, thresholds) = storage(&config).await?;
    let generator = generator(&config.ai)?;
    let handlers =
        ReflectionHandlers::from_ports(transcript, thresholds, generator, &config.progression);
    let app = api_router(handlers, &config.server);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(%addr, environment = ?config.server.environment, "Listening");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;
    Ok(())
}

fn init_tracing(config: &AppConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.server.log_level));
    let registry = tracing_subscriber::registry().with(filter);

    if config.server.json_logs {
        registry.with(tracing_subscriber::fmt::layer().json()).init();
    } else {
        registry.with(tracing_subscriber::fmt::layer()).init();
    }
}

async fn storage(
    config: &AppConfig,
) -> Result<(Arc<dyn TranscriptStore>, Arc<dyn ThresholdStore>), Box<dyn Error>> {
    let Some(url) = config.database.url() else {
        tracing::warn!("No database configured; conversations are kept in memory");
        return Ok((
            Arc::new(InMemoryTranscriptStore::new()),
            Arc::new(InMemoryThresholdStore::new()),
        ));
    };

    let pool = postgres::connect(url, config.database.max_connections).await?;
    if config.database.run_migrations {
        postgres::migrate(&pool).await?;
        tracing::info!("Database migrations applied");
    }
    Ok((
        Arc::new(PostgresTranscriptStore::new(pool.clone())),
        Arc::new(PostgresThresholdStore::new(pool)),
    ))
}

fn generator(ai: &AiConfig) -> Result<Arc<dyn TextGenerator>, Box<dyn Error>> {
    let Some(key) = ai.openai_api_key.as_deref().filter(|k| !k.is_empty()) else {
        tracing::warn!("No OpenAI key configured; using the mock generator");
        return Ok(Arc::new(MockGenerator::new()));
    };

    let config = OpenAIConfig::new(key)
        .with_model(&ai.model)
        .with_base_url(&ai.base_url)
        .with_timeout(ai.timeout())
        .with_max_retries(ai.max_retries)
        .with_temperature(ai.temperature);
    Ok(Arc::new(OpenAIGenerator::new(config)?))
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %err, "Failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("Shutting down");
}
