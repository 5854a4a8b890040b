pub mod audio;
pub mod config;
pub mod error;
pub mod http;
pub mod metrics;
pub mod nats;
pub mod pipeline;
pub mod retry;
mod stage;
pub mod stt;
pub mod tts;

pub use audio::AudioFile;
pub use config::Config;
pub use error::{CollaboratorError, VoiceError};
pub use http::{create_router, AppState};
pub use metrics::{
    LatencyTracker, MetricsHub, MetricsSnapshot, PipelineLatencyRecord, PipelinePhase,
    QualityTracker,
};
pub use nats::{NatsClient, NatsRecognizer, NatsSynthesizer};
pub use pipeline::{EchoResponder, PipelineCoordinator, Responder, TurnOutcome};
pub use retry::RetryPolicy;
pub use stt::{Recognizer, TranscriptionStage};
pub use tts::{SynthesisStage, Synthesizer};
