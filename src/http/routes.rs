use super::handlers;
use super::state::AppState;
use axum::{routing::get, Router};
use tower::ServiceBuilder;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        .route("/health/details", get(handlers::health_details))
        // Metrics snapshots
        .route("/metrics", get(handlers::get_metrics))
        .route("/metrics/latency", get(handlers::get_latency_metrics))
        .route("/metrics/quality", get(handlers::get_quality_metrics))
        // Add tracing middleware for request logging
        .layer(ServiceBuilder::new().layer(TraceLayer::new_for_http()))
        .with_state(state)
}
