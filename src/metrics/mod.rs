//! Latency and quality instrumentation for the voice pipeline
//!
//! - `LatencyTracker`: per-phase timing of one execution plus a rolling history
//! - `QualityTracker`: clamped 0-10 quality scores with summary statistics
//! - `MetricsHub`: lock-guarded aggregate shared between sessions for reporting

mod hub;
mod latency;
mod quality;
mod window;

pub use hub::{LatencySummary, MetricsHub, MetricsSnapshot, QualitySummary};
pub use latency::{
    AverageLatencies, LatencyTargets, LatencyTracker, PhaseMeasurement, PipelineLatencyRecord,
    PipelinePhase, TrackerState, DEFAULT_LATENCY_WINDOW,
};
pub use quality::{
    QualityLevel, QualityStats, QualityThresholds, QualityTracker, DEFAULT_QUALITY_WINDOW,
    MAX_QUALITY_SCORE, MIN_QUALITY_SCORE,
};
pub use window::RollingWindow;
