//! Issue Tracker REST API Server Library
//!
//! Exposes the issue service and criteria search over HTTP. All issue routes
//! are mounted under `/api`.

pub mod cli;
pub mod error;
pub mod headers;
pub mod logging;
pub mod routes;

use anyhow::Result;
use axum::Router;
use issuetracker::config::EffectiveConfig;
use issuetracker::IssueStore;
use std::sync::Arc;
use tower::ServiceBuilder;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

// Re-export for convenience
pub use headers::AlertHeaders;
pub use routes::{create_routes, AppContext, AppState};

/// Build the shared state for a store.
///
/// # Errors
///
/// Fails if the configured application name is not usable in header names.
pub fn build_state<S: IssueStore>(storage: S, config: &EffectiveConfig) -> Result<AppState<S>> {
    let alerts = AlertHeaders::new(&config.app_name)?;
    Ok(Arc::new(AppContext::new(storage, alerts)))
}

/// Full application router: API routes under `/api` plus CORS and request
/// tracing.
pub fn build_app<S: IssueStore + Send + Sync + 'static>(state: AppState<S>) -> Router {
    // Build CORS layer for local development
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new().nest("/api", create_routes(state)).layer(
        ServiceBuilder::new()
            .layer(TraceLayer::new_for_http())
            .layer(cors),
    )
}
