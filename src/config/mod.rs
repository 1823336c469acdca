//! Application configuration module
//!
//! This module provides type-safe configuration loading from environment variables
//! using the `config` and `dotenvy` crates. Configuration is loaded with the
//! `BE_ALIGNED` prefix and nested values use double underscores as separators.
//!
//! Every section has defaults, so an empty environment yields a runnable
//! development service (in-memory storage, mock text generator).
//!
//! # Example
//!
//! ```no_run
//! use be_aligned::config::AppConfig;
//!
//! let config = AppConfig::load().expect("Failed to load configuration");
//! config.validate().expect("Invalid configuration");
//!
//! println!("Server running on {:?}", config.server.socket_addr());
//! ```

mod ai;
mod database;
mod error;
mod progression;
mod server;

pub use ai::AiConfig;
pub use database::DatabaseConfig;
pub use error::{ConfigError, ValidationError};
pub use progression::ProgressionConfig;
pub use server::{Environment, ServerConfig};

use serde::Deserialize;

/// Root application configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Server configuration (host, port, environment, logging)
    #[serde(default)]
    pub server: ServerConfig,

    /// Database configuration (optional PostgreSQL connection)
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Text generation configuration (OpenAI)
    #[serde(default)]
    pub ai: AiConfig,

    /// Completion evaluation and threshold learning
    #[serde(default)]
    pub progression: ProgressionConfig,
}

impl AppConfig {
    /// Load configuration from environment variables
    ///
    /// This function:
    /// 1. Loads `.env` file if present (for development)
    /// 2. Reads environment variables with `BE_ALIGNED` prefix
    /// 3. Uses `__` (double underscore) to separate nested values
    /// 4. Deserializes into typed configuration structs
    ///
    /// # Environment Variable Format
    ///
    /// - `BE_ALIGNED__SERVER__PORT=8080` -> `server.port = 8080`
    /// - `BE_ALIGNED__DATABASE__URL=...` -> `database.url = ...`
    /// - `BE_ALIGNED__PROGRESSION__LEARNING_RATE=0.1` -> `progression.learning_rate = 0.1`
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if values cannot be parsed into expected types.
    pub fn load() -> Result<Self, ConfigError> {
        // Load .env file if present (development)
        dotenvy::dotenv().ok();

        let config = config::Config::builder()
            .add_source(
                config::Environment::default()
                    .prefix("BE_ALIGNED")
                    .separator("__"),
            )
            .build()?
            .try_deserialize()?;

        Ok(config)
    }

    /// Validate all configuration values
    ///
    /// # Errors
    ///
    /// Returns `ValidationError` for the first invalid section.
    pub fn validate(&self) -> Result<(), ValidationError> {
        self.server.validate()?;
        self.database.validate()?;
        self.ai.validate()?;
        self.progression.validate()?;
        Ok(())
    }

    /// Check if running in production environment
    pub fn is_production(&self) -> bool {
        self.server.is_production()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;
    use std::sync::Mutex;

    // Mutex to ensure tests don't run in parallel (env vars are global)
    static ENV_MUTEX: Mutex<()> = Mutex::new(());

    const VARS: &[&str] = &[
        "BE_ALIGNED__SERVER__PORT",
        "BE_ALIGNED__SERVER__ENVIRONMENT",
        "BE_ALIGNED__SERVER__JSON_LOGS",
        "BE_ALIGNED__DATABASE__URL",
        "BE_ALIGNED__AI__OPENAI_API_KEY",
        "BE_ALIGNED__PROGRESSION__LEARNING_RATE",
    ];

    fn clear_env() {
        for var in VARS {
            env::remove_var(var);
        }
    }

    #[test]
    fn test_empty_environment_uses_defaults() {
        let _guard = ENV_MUTEX.lock().unwrap();
        clear_env();
        let config = AppConfig::load().unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.database.url(), None);
        assert!(!config.ai.has_openai());
        assert_eq!(config.progression.activation_floor, 0.6);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_load_from_environment() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("BE_ALIGNED__SERVER__PORT", "3000");
        env::set_var("BE_ALIGNED__SERVER__JSON_LOGS", "true");
        env::set_var("BE_ALIGNED__DATABASE__URL", "postgresql://test@localhost/test");
        env::set_var("BE_ALIGNED__AI__OPENAI_API_KEY", "sk-test");
        env::set_var("BE_ALIGNED__PROGRESSION__LEARNING_RATE", "0.1");
        let result = AppConfig::load();
        clear_env();

        let config = result.unwrap();
        assert_eq!(config.server.port, 3000);
        assert!(config.server.json_logs);
        assert_eq!(config.database.url(), Some("postgresql://test@localhost/test"));
        assert!(config.ai.has_openai());
        assert_eq!(config.progression.learning_rate, 0.1);
    }

    #[test]
    fn test_is_production() {
        let _guard = ENV_MUTEX.lock().unwrap();
        env::set_var("BE_ALIGNED__SERVER__ENVIRONMENT", "production");
        let result = AppConfig::load();
        clear_env();

        assert!(result.unwrap().is_production());
    }

    #[test]
    fn test_invalid_section_fails_validation() {
        let mut config = AppConfig::default();
        config.progression.activation_floor = 2.0;
        assert_eq!(
            config.validate(),
            Err(ValidationError::OutOfUnitRange("activation_floor"))
        );
    }
}
