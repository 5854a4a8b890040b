use crate::error::CollaboratorError;
use crate::tts::VoiceSettings;
use base64::Engine;
use serde::{Deserialize, Serialize};

/// Audio frame message published to NATS
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AudioFrameMessage {
    pub session_id: String,
    pub sequence: u32,
    pub pcm: String, // Base64-encoded PCM bytes
    pub sample_rate: u32,
    pub channels: u16,
    pub timestamp: String, // RFC3339 timestamp
    #[serde(rename = "final")]
    pub final_frame: bool,
}

/// Transcript message received from the STT service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptMessage {
    pub session_id: String,
    pub text: String,
    pub partial: bool,
    pub timestamp: String,
    #[serde(default)]
    pub confidence: Option<f32>,
    /// Speech start, seconds since the Unix epoch
    #[serde(default)]
    pub start_time: Option<f64>,
    #[serde(default)]
    pub end_time: Option<f64>,
}

/// Synthesis request published to the TTS service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisRequestMessage {
    pub request_id: String,
    pub text: String,
    pub voice_id: String,
    pub model_id: String,
    pub sample_rate: u32,
    pub voice: VoiceSettings,
    pub timestamp: String,
}

/// One chunk of synthesized audio, answering a `SynthesisRequestMessage`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynthesisChunkMessage {
    pub request_id: String,
    pub sequence: u32,
    #[serde(default)]
    pub pcm: String, // Base64-encoded PCM bytes
    #[serde(rename = "final")]
    pub final_chunk: bool,
    /// Set by the TTS service when synthesis failed
    #[serde(default)]
    pub error: Option<String>,
}

impl SynthesisChunkMessage {
    /// Decoded audio, or the failure the service reported
    pub fn audio(&self) -> Result<Vec<u8>, CollaboratorError> {
        if let Some(reason) = &self.error {
            return Err(CollaboratorError::Rejected(reason.clone()));
        }
        decode_pcm(&self.pcm)
    }
}

pub fn encode_pcm(pcm: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(pcm)
}

pub fn decode_pcm(encoded: &str) -> Result<Vec<u8>, CollaboratorError> {
    base64::engine::general_purpose::STANDARD
        .decode(encoded)
        .map_err(|e| CollaboratorError::Decode(format!("invalid base64 PCM: {}", e)))
}
