use crate::stt::merge_bound;
use serde::{Deserialize, Serialize};

/// Audio produced by one buffered synthesis call
#[derive(Debug, Clone, PartialEq)]
pub struct SynthesisResult {
    pub audio_data: Vec<u8>,
    pub text: String,
    /// Estimated from byte length, assuming 16-bit mono samples
    pub duration_ms: f64,
    pub latency_ms: f64,
    pub sample_rate: u32,
    pub voice_id: String,
}

/// Counters for the synthesis stage
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TtsMetrics {
    pub total_syntheses: u64,
    pub successful_syntheses: u64,
    pub failed_syntheses: u64,
    pub total_latency_ms: f64,
    pub min_latency_ms: Option<f64>,
    pub max_latency_ms: Option<f64>,
    pub total_audio_duration_ms: f64,
    pub total_characters_processed: u64,
    pub retry_attempts: u64,
}

impl TtsMetrics {
    pub fn average_latency_ms(&self) -> f64 {
        if self.successful_syntheses == 0 {
            return 0.0;
        }
        self.total_latency_ms / self.successful_syntheses as f64
    }

    pub fn success_rate(&self) -> f64 {
        if self.total_syntheses == 0 {
            return 0.0;
        }
        self.successful_syntheses as f64 / self.total_syntheses as f64
    }

    /// Characters synthesized per second of produced audio
    pub fn average_chars_per_second(&self) -> f64 {
        if self.total_audio_duration_ms <= 0.0 {
            return 0.0;
        }
        self.total_characters_processed as f64 / (self.total_audio_duration_ms / 1000.0)
    }

    pub(crate) fn record_success(&mut self, latency_ms: f64, audio_ms: f64, characters: usize) {
        self.total_syntheses += 1;
        self.successful_syntheses += 1;
        self.total_latency_ms += latency_ms;
        self.min_latency_ms = Some(self.min_latency_ms.map_or(latency_ms, |m| m.min(latency_ms)));
        self.max_latency_ms = Some(self.max_latency_ms.map_or(latency_ms, |m| m.max(latency_ms)));
        self.total_audio_duration_ms += audio_ms;
        self.total_characters_processed += characters as u64;
    }

    pub(crate) fn record_failure(&mut self) {
        self.total_syntheses += 1;
        self.failed_syntheses += 1;
    }

    /// Adds `other`'s counters into `self`.
    pub fn merge(&mut self, other: &TtsMetrics) {
        self.total_syntheses += other.total_syntheses;
        self.successful_syntheses += other.successful_syntheses;
        self.failed_syntheses += other.failed_syntheses;
        self.total_latency_ms += other.total_latency_ms;
        self.min_latency_ms = merge_bound(self.min_latency_ms, other.min_latency_ms, f64::min);
        self.max_latency_ms = merge_bound(self.max_latency_ms, other.max_latency_ms, f64::max);
        self.total_audio_duration_ms += other.total_audio_duration_ms;
        self.total_characters_processed += other.total_characters_processed;
        self.retry_attempts += other.retry_attempts;
    }
}
