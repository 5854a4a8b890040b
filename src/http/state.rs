use crate::metrics::MetricsHub;
use chrono::{DateTime, Utc};

/// Shared application state for HTTP handlers
#[derive(Clone)]
pub struct AppState {
    /// Aggregate metrics published by every pipeline session
    pub hub: MetricsHub,

    pub started_at: DateTime<Utc>,
}

impl AppState {
    pub fn new(hub: MetricsHub) -> Self {
        Self {
            hub,
            started_at: Utc::now(),
        }
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new(MetricsHub::default())
    }
}
