use anyhow::{Context, Result};
use reviewer_assign::config::Config;
use reviewer_assign::db;
use reviewer_assign::services::{server, ReviewService};
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = Config::from_env().context("Failed to load configuration")?;

    log::info!(
        "[main] Opening database at {}",
        config.database_path.display()
    );
    let pool = db::initialize_with_limit(&config.database_path, config.max_connections)
        .await
        .context("Failed to initialize database")?;

    let service = ReviewService::new(pool.clone(), config.request_timeout);

    let shutdown = CancellationToken::new();
    let signal_token = shutdown.clone();
    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            log::error!("[main] Failed to listen for shutdown signal: {}", e);
            return;
        }
        log::info!("[main] Shutdown signal received");
        signal_token.cancel();
    });

    server::serve(config.port, service, shutdown)
        .await
        .context("Server error")?;

    pool.close().await;
    Ok(())
}
