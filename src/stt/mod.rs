//! Speech-to-text stage
//!
//! This module wraps an external speech recognizer with:
//! - Streaming event consumption (interim and final transcripts)
//! - Single-shot recognition with exponential-backoff retry
//! - Per-stage metrics and an observable Idle/Listening/Processing/Error state

mod config;
mod recognizer;
mod stage;
mod stats;

pub use config::SttConfig;
pub use recognizer::{
    AudioInputStream, Recognizer, RecognizerEvent, RecognizerEventStream, SpeechAlternative,
    SpeechEventKind, StreamOptions,
};
pub use stage::{TranscriptionCallback, TranscriptionStage, TranscriptionState};
pub use stats::{SttMetrics, TranscriptionResult};
pub(crate) use stats::merge_bound;
