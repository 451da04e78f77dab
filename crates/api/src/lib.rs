//! HTTP API layer with Axum routes and middleware.
//!
//! This crate provides:
//! - WOPI routes under `/wopi` (ecosystem, containers, files)
//! - Access-token middleware
//! - Error to JSON response mapping
//! - Health endpoint under `/api/v1`

pub mod error;
pub mod middleware;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use docgate_core::storage::StorageProvider;
use docgate_shared::AccessTokenService;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    /// Storage provider selected at startup.
    pub storage: Arc<dyn StorageProvider>,
    /// Access-token service for validating `access_token` parameters.
    pub access_tokens: Arc<AccessTokenService>,
    /// Public base URL, without a trailing `/`.
    pub base_url: Arc<str>,
}

impl AppState {
    /// Creates the state, normalising `base_url`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageProvider>,
        access_tokens: Arc<AccessTokenService>,
        base_url: &str,
    ) -> Self {
        Self {
            storage,
            access_tokens,
            base_url: Arc::from(base_url.trim_end_matches('/')),
        }
    }
}

/// Creates the main application router.
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/wopi", routes::wopi_routes_with_state(state.clone()))
        .nest("/api/v1", routes::api_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
