//! Phase-by-phase latency measurement for one pipeline execution, folded into a
//! rolling history with target-compliance statistics.

use super::window::RollingWindow;
use crate::error::VoiceError;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::time::Instant;
use tracing::{debug, info, warn};

/// Default number of completed executions kept in the history.
pub const DEFAULT_LATENCY_WINDOW: usize = 100;

/// Phase boundary markers of the voice pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PipelinePhase {
    SttStart,
    SttEnd,
    ProcessingStart,
    ProcessingEnd,
    TtsStart,
    TtsEnd,
    Total,
}

impl PipelinePhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            PipelinePhase::SttStart => "stt_start",
            PipelinePhase::SttEnd => "stt_end",
            PipelinePhase::ProcessingStart => "processing_start",
            PipelinePhase::ProcessingEnd => "processing_end",
            PipelinePhase::TtsStart => "tts_start",
            PipelinePhase::TtsEnd => "tts_end",
            PipelinePhase::Total => "total",
        }
    }

    /// The marker a start instant is stored under for this phase's interval.
    fn start_marker(self) -> PipelinePhase {
        match self {
            PipelinePhase::SttEnd => PipelinePhase::SttStart,
            PipelinePhase::ProcessingEnd => PipelinePhase::ProcessingStart,
            PipelinePhase::TtsEnd => PipelinePhase::TtsStart,
            other => other,
        }
    }

    /// The marker a finished duration is stored under for this phase's interval.
    fn end_marker(self) -> PipelinePhase {
        match self {
            PipelinePhase::SttStart => PipelinePhase::SttEnd,
            PipelinePhase::ProcessingStart => PipelinePhase::ProcessingEnd,
            PipelinePhase::TtsStart => PipelinePhase::TtsEnd,
            other => other,
        }
    }
}

impl fmt::Display for PipelinePhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single phase duration, produced when a phase ends.
#[derive(Debug, Clone, Serialize)]
pub struct PhaseMeasurement {
    pub phase: PipelinePhase,
    pub duration_ms: f64,
    pub timestamp: DateTime<Utc>,
    pub metadata: HashMap<String, String>,
}

/// Latency breakdown of one completed pipeline execution.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PipelineLatencyRecord {
    pub stt_latency_ms: f64,
    pub processing_latency_ms: f64,
    pub tts_latency_ms: f64,
    pub total_latency_ms: f64,
    pub timestamp: DateTime<Utc>,
    /// Total-latency target in force when the record was made.
    pub target_total_ms: f64,
}

impl PipelineLatencyRecord {
    pub fn new(
        stt_latency_ms: f64,
        processing_latency_ms: f64,
        tts_latency_ms: f64,
        total_latency_ms: f64,
        target_total_ms: f64,
    ) -> Self {
        Self {
            stt_latency_ms,
            processing_latency_ms,
            tts_latency_ms,
            total_latency_ms,
            timestamp: Utc::now(),
            target_total_ms,
        }
    }

    /// Strictly below target; a measurement exactly at the target does not comply.
    pub fn meets_target(&self) -> bool {
        self.total_latency_ms < self.target_total_ms
    }
}

/// Latency budgets in milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatencyTargets {
    pub total_ms: f64,
    pub stt_ms: f64,
    pub tts_ms: f64,
}

impl Default for LatencyTargets {
    fn default() -> Self {
        Self {
            total_ms: 2000.0,
            stt_ms: 500.0,
            tts_ms: 500.0,
        }
    }
}

/// Mean latencies across the history.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct AverageLatencies {
    pub stt_avg_ms: f64,
    pub processing_avg_ms: f64,
    pub tts_avg_ms: f64,
    pub total_avg_ms: f64,
    pub sample_count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TrackerState {
    Idle,
    Running,
}

/// Tracks phase timings for one in-flight execution at a time.
///
/// Not meant to be shared between concurrently running executions; give each
/// session its own tracker, or aggregate through a [`MetricsHub`](super::MetricsHub).
#[derive(Debug, Clone)]
pub struct LatencyTracker {
    targets: LatencyTargets,
    history: RollingWindow<PipelineLatencyRecord>,
    started_at: Option<Instant>,
    phase_starts: HashMap<PipelinePhase, Instant>,
    phase_durations: HashMap<PipelinePhase, f64>,
}

impl Default for LatencyTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl LatencyTracker {
    pub fn new() -> Self {
        Self::with_targets(LatencyTargets::default(), DEFAULT_LATENCY_WINDOW)
    }

    pub fn with_targets(targets: LatencyTargets, window_size: usize) -> Self {
        Self {
            targets,
            history: RollingWindow::new(window_size),
            started_at: None,
            phase_starts: HashMap::new(),
            phase_durations: HashMap::new(),
        }
    }

    pub fn targets(&self) -> LatencyTargets {
        self.targets
    }

    pub fn window_size(&self) -> usize {
        self.history.capacity()
    }

    pub fn state(&self) -> TrackerState {
        if self.started_at.is_some() {
            TrackerState::Running
        } else {
            TrackerState::Idle
        }
    }

    /// Begins a new execution, discarding any in-flight markers.
    pub fn start_pipeline(&mut self) {
        if self.started_at.is_some() {
            debug!("Restarting pipeline latency tracking; in-flight markers discarded");
        }
        self.started_at = Some(Instant::now());
        self.phase_starts.clear();
        self.phase_durations.clear();
        debug!("Pipeline latency tracking started");
    }

    /// Records the start of `phase`. A repeated call overwrites the earlier start.
    pub fn mark_phase_start(&mut self, phase: PipelinePhase) {
        self.phase_starts.insert(phase.start_marker(), Instant::now());
    }

    /// Ends `phase` and returns its duration in milliseconds, or 0.0 when no matching
    /// start was recorded in this execution.
    pub fn mark_phase_end(&mut self, phase: PipelinePhase) -> f64 {
        self.mark_phase_end_with(phase, HashMap::new()).duration_ms
    }

    /// Like [`mark_phase_end`](Self::mark_phase_end), attaching `metadata` to the measurement.
    pub fn mark_phase_end_with(
        &mut self,
        phase: PipelinePhase,
        metadata: HashMap<String, String>,
    ) -> PhaseMeasurement {
        let end = Instant::now();
        let duration_ms = match self.phase_starts.get(&phase.start_marker()).copied() {
            Some(start) => {
                let duration_ms = end.duration_since(start).as_secs_f64() * 1000.0;
                self.phase_durations.insert(phase.end_marker(), duration_ms);
                self.warn_if_over_budget(phase.end_marker(), duration_ms);
                duration_ms
            }
            None => {
                warn!(phase = %phase, "Phase end marked without a matching start");
                0.0
            }
        };

        PhaseMeasurement {
            phase,
            duration_ms,
            timestamp: Utc::now(),
            metadata,
        }
    }

    /// Duration recorded so far in this execution for the interval ending at `phase`.
    pub fn phase_duration(&self, phase: PipelinePhase) -> Option<f64> {
        self.phase_durations.get(&phase.end_marker()).copied()
    }

    /// Finishes the execution, appends its record to the history and returns to idle.
    pub fn complete_pipeline(&mut self) -> Result<PipelineLatencyRecord, VoiceError> {
        let started_at = self
            .started_at
            .ok_or_else(|| VoiceError::IllegalState("pipeline tracking not started".to_string()))?;

        let total_ms = started_at.elapsed().as_secs_f64() * 1000.0;
        let duration = |phase: PipelinePhase| self.phase_durations.get(&phase).copied().unwrap_or(0.0);

        let record = PipelineLatencyRecord::new(
            duration(PipelinePhase::SttEnd),
            duration(PipelinePhase::ProcessingEnd),
            duration(PipelinePhase::TtsEnd),
            total_ms,
            self.targets.total_ms,
        );

        self.record(record.clone());

        self.started_at = None;
        self.phase_starts.clear();
        self.phase_durations.clear();

        Ok(record)
    }

    /// Appends a finished record to the history, evicting the oldest beyond the window.
    pub fn record(&mut self, record: PipelineLatencyRecord) {
        info!(
            total_ms = round2(record.total_latency_ms),
            stt_ms = round2(record.stt_latency_ms),
            processing_ms = round2(record.processing_latency_ms),
            tts_ms = round2(record.tts_latency_ms),
            meets_target = record.meets_target(),
            "Pipeline latency recorded"
        );
        self.history.push(record);
    }

    /// Records currently in the window, oldest first.
    pub fn history(&self) -> Vec<PipelineLatencyRecord> {
        self.history.to_vec()
    }

    /// Most recent record in the history.
    pub fn latest(&self) -> Option<&PipelineLatencyRecord> {
        self.history.latest()
    }

    pub fn get_average_latencies(&self) -> AverageLatencies {
        let count = self.history.len();
        if count == 0 {
            return AverageLatencies::default();
        }

        let mean = |f: fn(&PipelineLatencyRecord) -> f64| {
            self.history.iter().map(f).sum::<f64>() / count as f64
        };

        AverageLatencies {
            stt_avg_ms: mean(|r| r.stt_latency_ms),
            processing_avg_ms: mean(|r| r.processing_latency_ms),
            tts_avg_ms: mean(|r| r.tts_latency_ms),
            total_avg_ms: mean(|r| r.total_latency_ms),
            sample_count: count,
        }
    }

    /// Nearest-rank percentile of total latency; 0.0 when the history is empty.
    pub fn get_percentile_latency(&self, percentile: f64) -> f64 {
        let mut totals: Vec<f64> = self.history.iter().map(|r| r.total_latency_ms).collect();
        if totals.is_empty() {
            return 0.0;
        }
        totals.sort_by(|a, b| a.total_cmp(b));

        let index = (totals.len() as f64 * (percentile / 100.0)).floor() as usize;
        totals[index.min(totals.len() - 1)]
    }

    /// Fraction of the history meeting the total-latency target; 0.0 when empty.
    pub fn get_target_compliance_rate(&self) -> f64 {
        if self.history.is_empty() {
            return 0.0;
        }
        let compliant = self.history.iter().filter(|r| r.meets_target()).count();
        compliant as f64 / self.history.len() as f64
    }

    fn warn_if_over_budget(&self, phase: PipelinePhase, duration_ms: f64) {
        let budget = match phase {
            PipelinePhase::SttEnd => self.targets.stt_ms,
            PipelinePhase::TtsEnd => self.targets.tts_ms,
            _ => return,
        };
        if duration_ms >= budget {
            warn!(
                phase = %phase,
                duration_ms = round2(duration_ms),
                budget_ms = budget,
                "Phase exceeded its latency budget"
            );
        }
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_phase_pairing() {
        assert_eq!(PipelinePhase::SttEnd.start_marker(), PipelinePhase::SttStart);
        assert_eq!(PipelinePhase::TtsStart.end_marker(), PipelinePhase::TtsEnd);
        assert_eq!(PipelinePhase::Total.start_marker(), PipelinePhase::Total);
        assert_eq!(PipelinePhase::Total.end_marker(), PipelinePhase::Total);
    }

    #[test]
    fn test_state_transitions() {
        let mut tracker = LatencyTracker::new();
        assert_eq!(tracker.state(), TrackerState::Idle);

        tracker.start_pipeline();
        assert_eq!(tracker.state(), TrackerState::Running);

        tracker.complete_pipeline().unwrap();
        assert_eq!(tracker.state(), TrackerState::Idle);
    }

    #[test]
    fn test_restart_clears_markers() {
        let mut tracker = LatencyTracker::new();
        tracker.start_pipeline();
        tracker.mark_phase_start(PipelinePhase::SttStart);
        tracker.mark_phase_end(PipelinePhase::SttEnd);
        assert!(tracker.phase_duration(PipelinePhase::SttEnd).is_some());

        tracker.start_pipeline();
        assert!(tracker.phase_duration(PipelinePhase::SttEnd).is_none());
        assert_eq!(tracker.mark_phase_end(PipelinePhase::SttEnd), 0.0);
    }

    #[test]
    fn test_end_with_metadata() {
        let mut tracker = LatencyTracker::new();
        tracker.start_pipeline();
        tracker.mark_phase_start(PipelinePhase::ProcessingStart);

        let mut metadata = HashMap::new();
        metadata.insert("responder".to_string(), "echo".to_string());
        let measurement = tracker.mark_phase_end_with(PipelinePhase::ProcessingEnd, metadata);

        assert_eq!(measurement.phase, PipelinePhase::ProcessingEnd);
        assert!(measurement.duration_ms >= 0.0);
        assert_eq!(measurement.metadata.get("responder").map(String::as_str), Some("echo"));
    }

    #[test]
    fn test_phase_serializes_snake_case() {
        let json = serde_json::to_string(&PipelinePhase::ProcessingStart).unwrap();
        assert_eq!(json, "\"processing_start\"");
        assert_eq!(PipelinePhase::TtsEnd.to_string(), "tts_end");
    }
}
