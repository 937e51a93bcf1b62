use anyhow::{Context, Result};
use certamen_api::jobs::{JobScheduler, RateLimitPruneJob, SessionCleanupJob};
use certamen_api::{app, config, middleware, services};
use domain::clock::SystemClock;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present
    dotenvy::dotenv().ok();

    let config = config::Config::load()?;

    middleware::logging::init_logging(&config.logging)
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;
    middleware::init_metrics().context("Failed to install Prometheus recorder")?;

    info!("Starting Certamen API v{}", env!("CARGO_PKG_VERSION"));

    let pool = persistence::db::create_pool(&config.database.pool_config())
        .await
        .context("Failed to connect to database")?;

    info!("Running database migrations...");
    sqlx::migrate!("../persistence/src/migrations")
        .run(&pool)
        .await?;
    info!("Migrations completed");

    let outcome = services::bootstrap_admin(&pool, &config.admin).await?;
    info!(?outcome, "Admin bootstrap finished");

    let addr = config.socket_addr()?;
    let state = app::AppState::new(config, pool, Arc::new(SystemClock))
        .context("Invalid JWT key configuration")?;

    let mut scheduler = JobScheduler::new();
    scheduler.register(SessionCleanupJob::new(state.pool.clone()));
    if let Some(limiter) = &state.rate_limiter {
        scheduler.register(RateLimitPruneJob::new(Arc::clone(limiter)));
    }
    scheduler.start();

    let app = app::build_router(state);

    info!("Server listening on {}", addr);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    scheduler.shutdown();
    scheduler.wait_for_shutdown(Duration::from_secs(10)).await;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!("Failed to listen for shutdown signal: {}", e);
    }
    info!("Shutdown signal received");
}
