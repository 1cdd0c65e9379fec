//! HTTP service hosting payment sessions for a thin client.
//!
//! Provides endpoints to create a session, forward provider UI signals and
//! redirects, and read the outcome, with structured logging (tracing) and
//! Prometheus metrics.

pub mod config;
pub mod error;
pub mod routes;

use std::sync::Arc;

use axum::Router;
use axum::routing::{get, post};
use checkout::services::StaticWalletEligibility;
use checkout::{InMemoryServices, PaymentServices, ProviderSettings};
use gateway::BackendClient;
use metrics_exporter_prometheus::PrometheusHandle;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use config::Config;
use error::ApiError;
pub use routes::sessions::{AppState, spawn_session_sweeper};

/// Creates the Axum application router with all routes and shared state.
pub fn create_app(state: Arc<AppState>, metrics_handle: PrometheusHandle) -> Router {
    let metrics_router = Router::new()
        .route("/metrics", get(routes::metrics::get))
        .with_state(metrics_handle);

    Router::new()
        .route("/health", get(routes::health::check))
        .route("/sessions", post(routes::sessions::create))
        .route("/sessions/{id}", get(routes::sessions::get))
        .route("/sessions/{id}/events", get(routes::sessions::events))
        .route("/sessions/{id}/signals", post(routes::sessions::signal))
        .route("/sessions/{id}/redirect", post(routes::sessions::redirect))
        .route("/sessions/{id}/dismiss", post(routes::sessions::dismiss))
        .with_state(state)
        .merge(metrics_router)
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .layer(TraceLayer::new_for_http())
}

/// Creates application state over the given collaborators.
pub fn create_default_state(settings: ProviderSettings, services: PaymentServices) -> Arc<AppState> {
    Arc::new(AppState::new(settings, services))
}

/// Creates application state from configuration: the HTTP backend when a
/// backend URL is set, in-memory collaborators otherwise.
pub fn create_state_from_config(config: &Config) -> Result<Arc<AppState>, ApiError> {
    let services = match config.backend_config() {
        Some(backend) => {
            tracing::info!(base_url = %backend.base_url, "using HTTP payment backend");
            BackendClient::new(backend)?.payment_services(Arc::new(StaticWalletEligibility(true)))
        }
        None => {
            tracing::warn!("BACKEND_URL not set, using in-memory payment collaborators");
            InMemoryServices::new().services()
        }
    };

    Ok(Arc::new(
        AppState::new(config.providers.clone(), services).with_session_ttl(config.session_ttl()),
    ))
}
