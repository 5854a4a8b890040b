//! Read-only HTTP API over the shared metrics hub
//!
//! - GET /health - Health check
//! - GET /health/details - Uptime and number of reporting sessions
//! - GET /metrics - Full metrics snapshot
//! - GET /metrics/latency - Latency averages, percentiles and compliance
//! - GET /metrics/quality - Quality statistics against the minimum standard

mod handlers;
mod routes;
mod state;

pub use routes::create_router;
pub use state::AppState;
