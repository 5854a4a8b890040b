use super::state::AppState;
use crate::metrics::{LatencySummary, MetricsSnapshot, QualitySummary};
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
};
use chrono::Utc;
use serde::Serialize;
use tracing::debug;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub uptime_secs: i64,
    pub sessions: usize,
}

/// GET /health
/// Health check endpoint
pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK")
}

/// GET /health/details
pub async fn health_details(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        uptime_secs: (Utc::now() - state.started_at).num_seconds(),
        sessions: state.hub.session_count().await,
    })
}

/// GET /metrics
/// Full snapshot of latency, quality and stage counters
pub async fn get_metrics(State(state): State<AppState>) -> Json<MetricsSnapshot> {
    let snapshot = state.hub.snapshot().await;
    debug!(
        "Serving metrics snapshot (turns_completed={})",
        snapshot.turns_completed
    );
    Json(snapshot)
}

/// GET /metrics/latency
pub async fn get_latency_metrics(State(state): State<AppState>) -> Json<LatencySummary> {
    Json(state.hub.latency_summary().await)
}

/// GET /metrics/quality
pub async fn get_quality_metrics(State(state): State<AppState>) -> Json<QualitySummary> {
    Json(state.hub.quality_summary().await)
}
