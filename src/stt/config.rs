use crate::retry::RetryPolicy;

/// Configuration for the transcription stage
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Language tag stamped on every result (e.g., "en-US")
    pub language: String,

    /// Whether interim (non-final) transcripts are requested from the recognizer.
    /// Interim events that do arrive are always processed.
    pub interim_results: bool,

    /// Default sample rate for single-shot buffers
    pub sample_rate: u32,

    /// Confidence reported when the recognizer omits one
    pub default_confidence: f32,

    /// Success rate a healthy recognizer is expected to reach
    pub min_accuracy: f64,

    /// Retry policy for single-shot recognition
    pub retry: RetryPolicy,
}

impl Default for SttConfig {
    fn default() -> Self {
        Self {
            language: "en-US".to_string(),
            interim_results: true,
            sample_rate: 16000,
            default_confidence: 0.95,
            min_accuracy: 0.95,
            retry: RetryPolicy::default(),
        }
    }
}
