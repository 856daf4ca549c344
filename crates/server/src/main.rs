//! Issue Tracker REST API Server

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;

use issuetracker::config::EffectiveConfig;
use issuetracker::storage::{InMemoryStorage, IssueStore, JsonFileStorage};
use issuetracker::StorageBackend;
use issuetracker_server::cli::Args;
use issuetracker_server::{build_app, build_state, logging};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let config = args.effective_config()?;

    logging::init_logging(&config.log_filter)?;
    info!("Starting Issue Tracker API Server...");

    match config.backend {
        StorageBackend::Json => {
            let storage = JsonFileStorage::new(&config.data_dir).with_lock_timeout(config.lock_timeout);
            info!("Using JSON store at: {}", config.data_dir.display());
            serve(storage, &config).await
        }
        StorageBackend::Memory => {
            info!("Using in-memory store; data is lost on shutdown");
            serve(InMemoryStorage::new(), &config).await
        }
    }
}

async fn serve<S: IssueStore + Send + Sync + 'static>(
    storage: S,
    config: &EffectiveConfig,
) -> Result<()> {
    storage
        .init()
        .context("Failed to initialize issue store")?;

    let app = build_app(build_state(storage, config)?);

    let listener = tokio::net::TcpListener::bind(config.bind.as_str())
        .await
        .with_context(|| format!("Failed to bind {}", config.bind))?;
    info!("Server listening on http://{}", config.bind);

    axum::serve(listener, app).await?;

    Ok(())
}
