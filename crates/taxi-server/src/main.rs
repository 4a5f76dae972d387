use clap::Parser;
use std::time::Duration;
use tokio::net::TcpListener;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use taxi_server::{
    config::{Args, ServerConfig},
    create_router,
    session::cleanup_task,
    state::AppState,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let log_filter = args.log_level.clone();
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| format!("taxi_server={},tower_http=info", log_filter).into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Create configuration
    let config: ServerConfig = args.into();
    let listen_addr = config.listen_addr();
    let base_url = config.base_url();

    if config.data_dir.is_none() {
        tracing::warn!("No --data-dir given, using a temporary database");
    }

    // Open the store and create application state
    let state = AppState::new(config)?;
    let store = state.store.clone();

    // Start session cleanup background task
    let cleanup_manager = state.sessions.clone();
    tokio::spawn(async move {
        cleanup_task(cleanup_manager, Duration::from_secs(60)).await;
    });

    // Create router
    let app = create_router(state);

    // Bind to address
    let listener = TcpListener::bind(&listen_addr).await?;

    tracing::info!("Taxi server starting on {}", base_url);
    tracing::info!("Login at {}/accounts/login/", base_url);
    tracing::info!("Health check at {}/health", base_url);

    // Start server
    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    store.flush()?;
    tracing::info!("Taxi server stopped");

    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::warn!("Failed to listen for shutdown signal: {}", e);
    }
}
