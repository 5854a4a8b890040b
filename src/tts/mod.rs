//! Text-to-speech stage
//!
//! Wraps an injected `Synthesizer` with retry, state tracking and metrics.
//! Buffered synthesis collects every chunk; streaming synthesis yields chunks as
//! they arrive and is never retried.

mod config;
mod stage;
mod stats;
mod synthesizer;

pub use config::{TtsConfig, VoiceSettings};
pub use stage::{SynthesisStage, SynthesisState};
pub use stats::{SynthesisResult, TtsMetrics};
pub use synthesizer::{AudioChunkStream, Synthesizer};
