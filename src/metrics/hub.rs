use super::latency::{AverageLatencies, LatencyTargets, PipelineLatencyRecord};
use super::quality::{QualityStats, QualityThresholds};
use super::{LatencyTracker, QualityTracker};
use crate::stt::SttMetrics;
use crate::tts::TtsMetrics;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

/// Latency summary over the hub's history.
#[derive(Debug, Clone, Serialize)]
pub struct LatencySummary {
    pub averages: AverageLatencies,
    pub p50_ms: f64,
    pub p95_ms: f64,
    pub p99_ms: f64,
    pub target_compliance_rate: f64,
    pub targets: LatencyTargets,
    pub latest: Option<PipelineLatencyRecord>,
}

#[derive(Debug, Clone, Serialize)]
pub struct QualitySummary {
    pub stats: QualityStats,
    pub minimum_standard: f64,
    pub meets_minimum_standard: bool,
}

/// Point-in-time view of every aggregate the hub holds.
#[derive(Debug, Clone, Serialize)]
pub struct MetricsSnapshot {
    pub taken_at: DateTime<Utc>,
    pub turns_completed: u64,
    pub latency: LatencySummary,
    pub quality: QualitySummary,
    pub stt: SttMetrics,
    pub tts: TtsMetrics,
}

struct HubInner {
    latency: LatencyTracker,
    quality: QualityTracker,
    /// Latest cumulative stage metrics per live session.
    sessions: HashMap<String, (SttMetrics, TtsMetrics)>,
    /// Counters folded in from sessions that have ended.
    retired: (SttMetrics, TtsMetrics),
    turns_completed: u64,
}

impl HubInner {
    fn stage_totals(&self) -> (SttMetrics, TtsMetrics) {
        let (mut stt, mut tts) = self.retired.clone();
        for (session_stt, session_tts) in self.sessions.values() {
            stt.merge(session_stt);
            tts.merge(session_tts);
        }
        (stt, tts)
    }
}

/// Cross-session aggregate. Sessions keep their own trackers and publish finished
/// records here; every access goes through one lock.
#[derive(Clone)]
pub struct MetricsHub {
    inner: Arc<Mutex<HubInner>>,
    minimum_quality: f64,
}

impl MetricsHub {
    pub fn new(
        targets: LatencyTargets,
        latency_window: usize,
        thresholds: QualityThresholds,
        quality_window: usize,
        minimum_quality: f64,
    ) -> Self {
        Self {
            inner: Arc::new(Mutex::new(HubInner {
                latency: LatencyTracker::with_targets(targets, latency_window),
                quality: QualityTracker::new(thresholds, quality_window),
                sessions: HashMap::new(),
                retired: (SttMetrics::default(), TtsMetrics::default()),
                turns_completed: 0,
            })),
            minimum_quality,
        }
    }

    /// Folds a finished execution's record into the shared history.
    pub async fn publish_latency(&self, record: PipelineLatencyRecord) {
        let mut inner = self.inner.lock().await;
        inner.latency.record(record);
        inner.turns_completed += 1;
    }

    pub async fn publish_quality(&self, score: f64) {
        self.inner.lock().await.quality.record_score(score, None);
    }

    /// Replaces the stage metrics last published by `session_id`.
    pub async fn publish_stage_metrics(&self, session_id: &str, stt: &SttMetrics, tts: &TtsMetrics) {
        self.inner
            .lock()
            .await
            .sessions
            .insert(session_id.to_string(), (stt.clone(), tts.clone()));
    }

    /// Folds an ended session's stage metrics into the retained totals and forgets
    /// the session. Returns false if the session never published.
    pub async fn retire_session(&self, session_id: &str) -> bool {
        let mut inner = self.inner.lock().await;
        let Some((stt, tts)) = inner.sessions.remove(session_id) else {
            return false;
        };
        inner.retired.0.merge(&stt);
        inner.retired.1.merge(&tts);
        debug!("Retired session {}", session_id);
        true
    }

    /// Number of live sessions holding published stage metrics.
    pub async fn session_count(&self) -> usize {
        self.inner.lock().await.sessions.len()
    }

    pub async fn latency_summary(&self) -> LatencySummary {
        let inner = self.inner.lock().await;
        summarize_latency(&inner.latency)
    }

    pub async fn quality_summary(&self) -> QualitySummary {
        let inner = self.inner.lock().await;
        summarize_quality(&inner.quality, self.minimum_quality)
    }

    pub async fn snapshot(&self) -> MetricsSnapshot {
        let inner = self.inner.lock().await;
        let (stt, tts) = inner.stage_totals();
        MetricsSnapshot {
            taken_at: Utc::now(),
            turns_completed: inner.turns_completed,
            latency: summarize_latency(&inner.latency),
            quality: summarize_quality(&inner.quality, self.minimum_quality),
            stt,
            tts,
        }
    }
}

impl Default for MetricsHub {
    fn default() -> Self {
        Self::new(
            LatencyTargets::default(),
            super::latency::DEFAULT_LATENCY_WINDOW,
            QualityThresholds::default(),
            super::quality::DEFAULT_QUALITY_WINDOW,
            6.0,
        )
    }
}

fn summarize_latency(tracker: &LatencyTracker) -> LatencySummary {
    LatencySummary {
        averages: tracker.get_average_latencies(),
        p50_ms: tracker.get_percentile_latency(50.0),
        p95_ms: tracker.get_percentile_latency(95.0),
        p99_ms: tracker.get_percentile_latency(99.0),
        target_compliance_rate: tracker.get_target_compliance_rate(),
        targets: tracker.targets(),
        latest: tracker.latest().cloned(),
    }
}

fn summarize_quality(tracker: &QualityTracker, minimum: f64) -> QualitySummary {
    QualitySummary {
        stats: tracker.get_quality_stats(),
        minimum_standard: minimum,
        meets_minimum_standard: tracker.meets_minimum_standard(minimum),
    }
}
