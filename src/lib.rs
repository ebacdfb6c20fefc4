pub mod api; // HTTP API
pub mod appointment; // Appointment operations
pub mod book; // In-memory appointment list
pub mod config;
pub mod core_state; // Shared state and owner session
pub mod db;
pub mod display; // Local-time formatting
pub mod form; // Appointment form controller
pub mod ledger; // Earnings and balances
pub mod models;
pub mod notification; // Reminder delivery
pub mod reminder; // Reminder engine

use std::sync::Arc;

use tracing_subscriber::EnvFilter;

use crate::core_state::CoreState;
use crate::notification::HeadlessPlatform;

/// Failures that stop the process before or while serving.
#[derive(Debug, thiserror::Error)]
pub enum StartupError {
    #[error(transparent)]
    Config(#[from] config::ConfigError),
    #[error("Cannot open database: {0}")]
    Database(#[from] db::DatabaseError),
    #[error("Cannot start runtime: {0}")]
    Runtime(#[from] std::io::Error),
    #[error(transparent)]
    Server(#[from] api::ServerError),
}

pub fn run() -> Result<(), StartupError> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config::default_log_filter())),
        )
        .init();

    tracing::info!("Turnos starting v{}", config::APP_VERSION);

    let settings = config::Settings::from_env()?;
    tracing::info!(
        db = %settings.db_path.display(),
        timezone = %settings.timezone,
        "Settings loaded"
    );

    let store = Arc::new(db::Store::open(&settings.db_path)?);
    // No desktop notification host in the server build; reminders reach
    // clients through the in-app banner.
    let core = Arc::new(CoreState::new(store, Arc::new(HeadlessPlatform), settings.timezone));

    let runtime = tokio::runtime::Builder::new_multi_thread().enable_all().build()?;
    runtime.block_on(async move {
        let mut server = api::start_api_server(core.clone(), settings.bind_addr).await?;

        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Cannot listen for shutdown signal: {e}");
        }

        server.shutdown();
        if let Err(e) = core.close_session() {
            tracing::warn!("Session not closed cleanly: {e}");
        }
        server.wait().await;
        tracing::info!("Turnos stopped");
        Ok(())
    })
}
