use crate::error::CollaboratorError;
use futures::stream::BoxStream;

/// Kind of event a streaming recognizer emits.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeechEventKind {
    StartOfSpeech,
    InterimTranscript,
    FinalTranscript,
    EndOfSpeech,
}

/// One candidate transcript. Times are wall-clock seconds since the Unix epoch.
#[derive(Debug, Clone, PartialEq)]
pub struct SpeechAlternative {
    pub text: String,
    pub confidence: Option<f32>,
    pub start_time: f64,
    pub end_time: f64,
}

/// Event from a streaming recognizer; alternatives are ordered best first.
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerEvent {
    pub kind: SpeechEventKind,
    pub alternatives: Vec<SpeechAlternative>,
}

impl RecognizerEvent {
    pub fn final_transcript(alternative: SpeechAlternative) -> Self {
        Self {
            kind: SpeechEventKind::FinalTranscript,
            alternatives: vec![alternative],
        }
    }

    pub fn interim_transcript(alternative: SpeechAlternative) -> Self {
        Self {
            kind: SpeechEventKind::InterimTranscript,
            alternatives: vec![alternative],
        }
    }

    pub fn end_of_speech() -> Self {
        Self {
            kind: SpeechEventKind::EndOfSpeech,
            alternatives: Vec::new(),
        }
    }
}

/// Options sent along with a streaming recognition request.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamOptions {
    pub sample_rate: u32,
    pub language: String,
    /// Whether the recognizer should emit interim transcripts at all
    pub interim_results: bool,
}

/// Raw 16-bit PCM buffers fed to a streaming recognizer.
pub type AudioInputStream = BoxStream<'static, Vec<u8>>;

/// Events produced by a streaming recognizer.
pub type RecognizerEventStream = BoxStream<'static, Result<RecognizerEvent, CollaboratorError>>;

/// Speech recognition service
///
/// Implementations:
/// - `NatsRecognizer`: remote STT service over NATS
/// - test doubles in `tests/common`
#[async_trait::async_trait]
pub trait Recognizer: Send + Sync {
    /// Transcribe a complete 16-bit PCM buffer
    async fn recognize(&self, audio: &[u8], sample_rate: u32) -> Result<String, CollaboratorError>;

    /// Open a streaming recognition session over `audio`
    async fn stream(
        &self,
        audio: AudioInputStream,
        options: StreamOptions,
    ) -> Result<RecognizerEventStream, CollaboratorError>;

    /// Get recognizer name for logging
    fn name(&self) -> &str;
}
