//! SlotSwap HTTP server - binary entry point

use std::sync::Arc;

use slot_swap::api::{create_router, AppState};
use slot_swap::auth::JwtAuth;
use slot_swap::config::Config;
use slot_swap::store::SlotStore;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,slot_swap=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env()?;
    tracing::info!(
        data_dir = %config.data_dir.display(),
        snapshot_threshold = config.snapshot_threshold,
        "configuration loaded"
    );

    let store = Arc::new(SlotStore::open(config.journal())?);
    let auth = JwtAuth::from_config(&config.auth, &config.data_dir)?;
    let state = Arc::new(AppState::new(store.clone(), auth, config.auth.bcrypt_cost));

    let listener = tokio::net::TcpListener::bind(config.bind_addr).await?;
    tracing::info!(addr = %config.bind_addr, version = slot_swap::VERSION, "listening");

    axum::serve(listener, create_router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // Compact the journal on the way out so the next start replays little
    if let Err(e) = store.snapshot() {
        tracing::warn!(error = %e, "final snapshot failed");
    }
    tracing::info!("server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutdown requested");
}
