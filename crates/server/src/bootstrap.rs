use std::sync::Arc;

use leadflow_ai::{FollowUpSuggester, GenerativeLanguageClient};
use leadflow_core::config::{AppConfig, ConfigError, LoadOptions};
use leadflow_db::{connect, migrations, DbPool};
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub db_pool: DbPool,
    pub suggester: Arc<FollowUpSuggester>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("database connection failed: {0}")]
    DatabaseConnect(#[source] sqlx::Error),
    #[error("database migration failed: {0}")]
    Migration(#[source] sqlx::migrate::MigrateError),
}

pub async fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config).await
}

pub async fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let db_pool = connect(&config.database).await.map_err(BootstrapError::DatabaseConnect)?;
    info!(
        event_name = "system.bootstrap.database_connected",
        correlation_id = "bootstrap",
        "database connection established"
    );

    migrations::run_pending(&db_pool).await.map_err(BootstrapError::Migration)?;
    info!(
        event_name = "system.bootstrap.migrations_applied",
        correlation_id = "bootstrap",
        "database migrations applied"
    );

    let llm_client = Arc::new(GenerativeLanguageClient::from_config(&config.ai));
    let suggester = Arc::new(FollowUpSuggester::new(llm_client));
    info!(
        event_name = "system.bootstrap.ai_client_ready",
        correlation_id = "bootstrap",
        ai_key_configured = config.ai.api_key.is_some(),
        "suggestion client initialized"
    );

    Ok(Application { config, db_pool, suggester })
}
