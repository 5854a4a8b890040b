use crate::retry::RetryPolicy;
use serde::{Deserialize, Serialize};

/// Voice tuning forwarded to the synthesizer with every request
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct VoiceSettings {
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
    /// 0-4, higher trades quality for lower streaming latency
    pub optimize_streaming_latency: u8,
}

impl Default for VoiceSettings {
    fn default() -> Self {
        Self {
            stability: 0.5,
            similarity_boost: 0.75,
            style: 0.0,
            use_speaker_boost: true,
            optimize_streaming_latency: 3,
        }
    }
}

/// Configuration for the synthesis stage
#[derive(Debug, Clone)]
pub struct TtsConfig {
    pub voice_id: String,
    pub model_id: String,

    /// Sample rate of the synthesizer's PCM output, used for duration estimates
    pub sample_rate: u32,

    pub voice: VoiceSettings,

    /// Retry policy for buffered synthesis
    pub retry: RetryPolicy,
}

impl Default for TtsConfig {
    fn default() -> Self {
        Self {
            voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
            model_id: "eleven_turbo_v2".to_string(),
            sample_rate: 24000,
            voice: VoiceSettings::default(),
            retry: RetryPolicy::default(),
        }
    }
}
