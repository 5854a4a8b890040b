use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A transcript produced from one recognizer event
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptionResult {
    /// Transcribed text
    pub text: String,

    /// Whether this is a final (not interim) result
    pub is_final: bool,

    /// Confidence score (0.0 to 1.0)
    pub confidence: f32,

    /// Speech start, seconds since the Unix epoch
    pub start_time: f64,

    /// Speech end, seconds since the Unix epoch
    pub end_time: f64,

    /// Receive time minus speech start. Negative when the recognizer reports a
    /// start time in the future.
    pub latency_ms: f64,

    /// Language tag
    pub language: String,

    /// When the result was produced
    pub received_at: DateTime<Utc>,
}

/// Counters for the transcription stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SttMetrics {
    pub total_transcriptions: u64,
    pub successful_transcriptions: u64,
    pub failed_transcriptions: u64,
    pub total_latency_ms: f64,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
    pub total_audio_duration_ms: f64,
    /// Retries spent on single-shot recognition
    pub retry_attempts: u64,
}

impl SttMetrics {
    pub fn average_latency_ms(&self) -> f64 {
        if self.successful_transcriptions == 0 {
            return 0.0;
        }
        self.total_latency_ms / self.successful_transcriptions as f64
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_transcriptions == 0 {
            return 0.0;
        }
        self.successful_transcriptions as f64 / self.total_transcriptions as f64
    }

    /// Success rate stands in for accuracy.
    pub fn meets_accuracy_target(&self, min_accuracy: f64) -> bool {
        self.success_rate() >= min_accuracy
    }

    pub(crate) fn observe_latency(&mut self, latency_ms: f64) {
        self.total_latency_ms += latency_ms;
        self.min_latency_ms = Some(self.min_latency_ms.map_or(latency_ms, |m| m.min(latency_ms)));
        self.max_latency_ms = Some(self.max_latency_ms.map_or(latency_ms, |m| m.max(latency_ms)));
    }

    /// Adds `other`'s counters into `self`.
    pub fn merge(&mut self, other: &SttMetrics) {
        self.total_transcriptions += other.total_transcriptions;
        self.successful_transcriptions += other.successful_transcriptions;
        self.failed_transcriptions += other.failed_transcriptions;
        self.total_latency_ms += other.total_latency_ms;
        self.min_latency_ms = merge_bound(self.min_latency_ms, other.min_latency_ms, f64::min);
        self.max_latency_ms = merge_bound(self.max_latency_ms, other.max_latency_ms, f64::max);
        self.total_audio_duration_ms += other.total_audio_duration_ms;
        self.retry_attempts += other.retry_attempts;
    }
}

pub(crate) fn merge_bound(a: Option<f64>, b: Option<f64>, pick: fn(f64, f64) -> f64) -> Option<f64> {
    match (a, b) {
        (Some(a), Some(b)) => Some(pick(a, b)),
        (a, None) => a,
        (None, b) => b,
    }
}
