//! gym-desk server: loads configuration, opens the database and serves the API

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::{error, info};

use gym_desk::config::Config;
use gym_desk::database::DatabaseManager;
use gym_desk::services::{mailer, SystemTimeProvider};
use gym_desk::{build_router, logging, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config = Config::from_env().context("Invalid configuration")?;

    logging::init_logging(&config.log_level, config.is_production());
    logging::log_startup();
    config.log_config();

    config.ensure_data_dir()?;

    let database = DatabaseManager::new(&config.resolved_database_url()).await?;
    database.migrate().await?;

    let mailer = mailer::from_settings(&config.smtp).context("Failed to set up the mailer")?;
    let bind_address = config.bind_address();
    let state = AppState::new(config, database, Arc::new(SystemTimeProvider::new()), mailer);
    let app = build_router(state);

    let listener = TcpListener::bind(&bind_address)
        .await
        .with_context(|| format!("Failed to bind {}", bind_address))?;
    info!("gym-desk listening on http://{}", bind_address);

    if let Err(err) = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
    {
        error!(error = %err, "Server terminated with an error");
        return Err(err.into());
    }

    info!("gym-desk stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(err) = tokio::signal::ctrl_c().await {
        error!(error = %err, "Failed to listen for shutdown signal");
    }
    info!("Shutdown signal received");
}
