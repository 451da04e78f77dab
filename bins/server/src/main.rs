//! docgate server
//!
//! Main entry point for the WOPI document gateway.

use std::sync::Arc;

use anyhow::Context;
use tokio::net::TcpListener;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docgate_api::{AppState, create_router};
use docgate_core::storage;
use docgate_shared::{AccessTokenService, AppConfig};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    // Initialize tracing
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "docgate=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Load configuration
    let config = AppConfig::load().context("Failed to load configuration")?;

    // Build the storage backend; an unreachable backend aborts startup
    let base_dir = std::env::current_dir().context("Failed to resolve working directory")?;
    let storage = storage::connect(&config.storage, &base_dir)
        .await
        .with_context(|| format!("Failed to start {} storage", config.storage.name()))?;

    let access_tokens = AccessTokenService::new(&config.access_token);
    info!(
        expires_in_secs = access_tokens.expires_in_secs(),
        "Access tokens configured"
    );

    // Create application state
    let state = AppState::new(storage, Arc::new(access_tokens), &config.server.base_url);

    // Create router
    let app = create_router(state);

    // Start server
    let addr = format!("{}:{}", config.server.host, config.server.port);
    let listener = TcpListener::bind(&addr).await?;
    info!(base_url = %config.server.base_url, "Server listening on {}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}
