//! NATS bridge to the remote STT and TTS services
//!
//! Subjects:
//! - `audio.frame.<session>`: base64 PCM frames for recognition
//! - `stt.text.>`: partial and final transcripts, filtered by session
//! - `tts.request`: synthesis requests
//! - `tts.audio.<request_id>`: synthesized audio chunks

pub mod client;
pub mod messages;
mod recognizer;
mod synthesizer;

pub use client::NatsClient;
pub use messages::{
    AudioFrameMessage, SynthesisChunkMessage, SynthesisRequestMessage, TranscriptMessage,
};
pub use recognizer::NatsRecognizer;
pub use synthesizer::NatsSynthesizer;
