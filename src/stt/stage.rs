use super::config::SttConfig;
use super::recognizer::{
    AudioInputStream, Recognizer, RecognizerEvent, SpeechEventKind, StreamOptions,
};
use super::stats::{SttMetrics, TranscriptionResult};
use crate::error::{CollaboratorError, VoiceError};
use crate::retry::RetryEvent;
use crate::stage::StateGuard;
use chrono::Utc;
use futures::stream::{Stream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// State of the transcription stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TranscriptionState {
    Idle,
    Listening,
    Processing,
    Error,
}

/// Callback invoked synchronously with every result, in arrival order
pub type TranscriptionCallback = Box<dyn FnMut(&TranscriptionResult) + Send>;

/// Speech-to-text stage wrapping an external recognizer
///
/// Handles:
/// - Streaming recognition with interim and final results
/// - Single-shot recognition with retry
/// - Metrics collection
pub struct TranscriptionStage {
    recognizer: Arc<dyn Recognizer>,
    config: SttConfig,
    metrics: SttMetrics,
    state: Arc<watch::Sender<TranscriptionState>>,
    on_transcription: Option<TranscriptionCallback>,
}

impl TranscriptionStage {
    pub fn new(recognizer: Arc<dyn Recognizer>, config: SttConfig) -> Self {
        info!(
            "Transcription stage initialized: recognizer={}, language={}",
            recognizer.name(),
            config.language
        );

        let (state, _) = watch::channel(TranscriptionState::Idle);
        Self {
            recognizer,
            config,
            metrics: SttMetrics::default(),
            state: Arc::new(state),
            on_transcription: None,
        }
    }

    /// Set callback for transcription results
    pub fn set_transcription_callback(
        &mut self,
        callback: impl FnMut(&TranscriptionResult) + Send + 'static,
    ) {
        self.on_transcription = Some(Box::new(callback));
    }

    pub fn clear_transcription_callback(&mut self) {
        self.on_transcription = None;
    }

    pub fn state(&self) -> TranscriptionState {
        *self.state.borrow()
    }

    /// Watch state transitions as they happen
    pub fn subscribe_state(&self) -> watch::Receiver<TranscriptionState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &SttConfig {
        &self.config
    }

    pub fn get_metrics(&self) -> &SttMetrics {
        &self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = SttMetrics::default();
    }

    /// Whether the success rate so far reaches the configured minimum accuracy
    pub fn meets_accuracy_target(&self) -> bool {
        self.metrics.meets_accuracy_target(self.config.min_accuracy)
    }

    /// Stream `audio` through the recognizer and process the resulting events
    pub async fn transcribe_stream(
        &mut self,
        audio: AudioInputStream,
        sample_rate: u32,
    ) -> Result<Vec<TranscriptionResult>, VoiceError> {
        let guard = StateGuard::enter(
            &self.state,
            TranscriptionState::Listening,
            TranscriptionState::Idle,
        );
        let options = StreamOptions {
            sample_rate,
            language: self.config.language.clone(),
            interim_results: self.config.interim_results,
        };

        let events = match self.recognizer.stream(audio, options).await {
            Ok(events) => events,
            Err(e) => {
                guard.set(TranscriptionState::Error);
                self.metrics.failed_transcriptions += 1;
                error!("Failed to open recognition stream: {}", e);
                return Err(VoiceError::Stream(e));
            }
        };
        self.consume_events(events, guard).await
    }

    /// Consume recognizer events until the stream ends
    ///
    /// Every event with non-empty text, interim or final, becomes a
    /// `TranscriptionResult`, is handed to the callback, and is returned in arrival
    /// order. The first stream error aborts processing and is returned as
    /// `VoiceError::Stream`.
    pub async fn process_audio_stream<S>(
        &mut self,
        events: S,
    ) -> Result<Vec<TranscriptionResult>, VoiceError>
    where
        S: Stream<Item = Result<RecognizerEvent, CollaboratorError>> + Unpin + Send,
    {
        let guard = StateGuard::enter(
            &self.state,
            TranscriptionState::Listening,
            TranscriptionState::Idle,
        );
        self.consume_events(events, guard).await
    }

    async fn consume_events<S>(
        &mut self,
        mut events: S,
        guard: StateGuard<TranscriptionState>,
    ) -> Result<Vec<TranscriptionResult>, VoiceError>
    where
        S: Stream<Item = Result<RecognizerEvent, CollaboratorError>> + Unpin + Send,
    {
        info!("STT processing started");

        let mut results = Vec::new();
        let outcome = loop {
            let event = match events.next().await {
                Some(Ok(event)) => event,
                Some(Err(e)) => break Err(e),
                None => break Ok(()),
            };

            let is_final = match event.kind {
                SpeechEventKind::FinalTranscript => true,
                SpeechEventKind::InterimTranscript => false,
                SpeechEventKind::EndOfSpeech => {
                    debug!("End of speech detected");
                    continue;
                }
                SpeechEventKind::StartOfSpeech => continue,
            };

            if let Some(result) = self.handle_transcript(&event, is_final) {
                if let Some(callback) = self.on_transcription.as_mut() {
                    callback(&result);
                }
                results.push(result);
            }
        };

        let outcome = match outcome {
            Ok(()) => Ok(results),
            Err(e) => {
                guard.set(TranscriptionState::Error);
                self.metrics.failed_transcriptions += 1;
                error!("STT processing error: {}", e);
                Err(VoiceError::Stream(e))
            }
        };

        info!(
            "STT processing completed: total_transcriptions={}, success_rate={:.2}",
            self.metrics.total_transcriptions,
            self.metrics.success_rate()
        );
        outcome
    }

    fn handle_transcript(
        &mut self,
        event: &RecognizerEvent,
        is_final: bool,
    ) -> Option<TranscriptionResult> {
        let best = event.alternatives.first()?;
        if best.text.trim().is_empty() {
            return None;
        }

        let received_at = Utc::now();
        let receive_secs = received_at.timestamp_micros() as f64 / 1_000_000.0;
        let latency_ms = (receive_secs - best.start_time) * 1000.0;

        let result = TranscriptionResult {
            text: best.text.clone(),
            is_final,
            confidence: best.confidence.unwrap_or(self.config.default_confidence),
            start_time: best.start_time,
            end_time: best.end_time,
            latency_ms,
            language: self.config.language.clone(),
            received_at,
        };

        self.metrics.total_transcriptions += 1;
        if is_final {
            self.metrics.successful_transcriptions += 1;
            self.metrics.observe_latency(latency_ms);
            self.metrics.total_audio_duration_ms +=
                ((best.end_time - best.start_time) * 1000.0).max(0.0);
        }

        debug!(
            "Transcription received: {} (final={}, latency={:.2}ms)",
            preview(&result.text),
            is_final,
            latency_ms
        );

        Some(result)
    }

    /// Transcribe a single PCM buffer, retrying transient recognizer failures
    pub async fn transcribe_audio(
        &mut self,
        audio: &[u8],
        sample_rate: u32,
    ) -> Result<String, VoiceError> {
        let guard = StateGuard::enter(
            &self.state,
            TranscriptionState::Processing,
            TranscriptionState::Idle,
        );
        let started = Instant::now();

        let recognizer = &self.recognizer;
        let mut retries = 0u64;
        let outcome = self
            .config
            .retry
            .run_observed(
                move || recognizer.recognize(audio, sample_rate),
                |event| {
                    if let RetryEvent::Retrying { .. } = event {
                        retries += 1;
                    }
                },
            )
            .await;
        self.metrics.retry_attempts += retries;

        match outcome {
            Ok(text) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                self.metrics.total_transcriptions += 1;
                self.metrics.successful_transcriptions += 1;
                self.metrics.total_latency_ms += latency_ms;
                self.metrics.total_audio_duration_ms +=
                    crate::audio::pcm_duration_ms(audio.len(), sample_rate);

                info!(
                    "Audio transcribed: text_length={}, latency={:.2}ms",
                    text.len(),
                    latency_ms
                );
                Ok(text)
            }
            Err(e) => {
                self.metrics.total_transcriptions += 1;
                self.metrics.failed_transcriptions += 1;
                guard.set(TranscriptionState::Error);
                error!("Transcription failed: {}", e);
                Err(VoiceError::Collaborator(e))
            }
        }
    }
}

fn preview(text: &str) -> String {
    const MAX_CHARS: usize = 50;
    if text.chars().count() > MAX_CHARS {
        let head: String = text.chars().take(MAX_CHARS).collect();
        format!("{}...", head)
    } else {
        text.to_string()
    }
}
