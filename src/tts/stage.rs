use super::config::TtsConfig;
use super::stats::{SynthesisResult, TtsMetrics};
use super::synthesizer::Synthesizer;
use crate::audio::pcm_duration_ms;
use crate::error::{CollaboratorError, VoiceError};
use crate::retry::RetryEvent;
use crate::stage::StateGuard;
use futures::stream::{BoxStream, StreamExt};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::watch;
use tracing::{debug, error, info};

/// State of the synthesis stage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SynthesisState {
    Idle,
    Synthesizing,
    Streaming,
    Error,
}

/// Text-to-speech stage wrapping an external synthesizer
pub struct SynthesisStage {
    synthesizer: Arc<dyn Synthesizer>,
    config: TtsConfig,
    metrics: TtsMetrics,
    state: Arc<watch::Sender<SynthesisState>>,
}

impl SynthesisStage {
    pub fn new(synthesizer: Arc<dyn Synthesizer>, config: TtsConfig) -> Self {
        info!(
            "Synthesis stage initialized: synthesizer={}, voice={}, model={}, sample_rate={}",
            synthesizer.name(),
            config.voice_id,
            config.model_id,
            config.sample_rate
        );

        let (state, _) = watch::channel(SynthesisState::Idle);
        Self {
            synthesizer,
            config,
            metrics: TtsMetrics::default(),
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> SynthesisState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<SynthesisState> {
        self.state.subscribe()
    }

    pub fn config(&self) -> &TtsConfig {
        &self.config
    }

    pub fn get_metrics(&self) -> &TtsMetrics {
        &self.metrics
    }

    pub fn reset_metrics(&mut self) {
        self.metrics = TtsMetrics::default();
    }

    /// Synthesize `text` into one buffer, retrying transient synthesizer failures
    ///
    /// Each attempt restarts the synthesis and collects every chunk. Once retries
    /// are exhausted the last failure is returned inside `VoiceError::SynthesisFailed`.
    pub async fn synthesize(&mut self, text: &str) -> Result<SynthesisResult, VoiceError> {
        let characters = require_text(text)?;

        let guard = StateGuard::enter(
            &self.state,
            SynthesisState::Synthesizing,
            SynthesisState::Idle,
        );
        let started = Instant::now();
        info!("TTS synthesis started: text_length={}", characters);

        let synthesizer = self.synthesizer.as_ref();
        let mut retries = 0u64;
        let outcome = self
            .config
            .retry
            .run_observed(
                move || collect_audio(synthesizer, text),
                |event| {
                    if let RetryEvent::Retrying { .. } = event {
                        retries += 1;
                    }
                },
            )
            .await;
        self.metrics.retry_attempts += retries;

        match outcome {
            Ok(audio_data) => {
                let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                let duration_ms = pcm_duration_ms(audio_data.len(), self.config.sample_rate);
                self.metrics
                    .record_success(latency_ms, duration_ms, characters);

                info!(
                    "TTS synthesis completed: text_length={}, audio_bytes={}, duration={:.2}ms, latency={:.2}ms",
                    characters,
                    audio_data.len(),
                    duration_ms,
                    latency_ms
                );

                Ok(SynthesisResult {
                    audio_data,
                    text: text.to_string(),
                    duration_ms,
                    latency_ms,
                    sample_rate: self.config.sample_rate,
                    voice_id: self.config.voice_id.clone(),
                })
            }
            Err(source) => {
                guard.set(SynthesisState::Error);
                self.metrics.record_failure();
                error!(
                    "TTS synthesis failed: {} (text_length={})",
                    source, characters
                );
                Err(VoiceError::SynthesisFailed { source })
            }
        }
    }

    /// Stream synthesized audio chunks as the synthesizer produces them
    ///
    /// Nothing happens until the stream is first polled. The stage stays in
    /// `Streaming` while the consumer holds the stream and returns to `Idle` when
    /// it ends, fails or is dropped. A mid-stream failure is yielded once as
    /// `VoiceError::Stream` and ends the stream.
    pub fn synthesize_stream(
        &mut self,
        text: &str,
    ) -> Result<BoxStream<'_, Result<Vec<u8>, VoiceError>>, VoiceError> {
        let characters = require_text(text)?;
        let text = text.to_string();
        let synthesizer = Arc::clone(&self.synthesizer);
        let state = Arc::clone(&self.state);
        let sample_rate = self.config.sample_rate;
        let metrics = &mut self.metrics;

        let stream = async_stream::stream! {
            let guard = StateGuard::enter(&state, SynthesisState::Streaming, SynthesisState::Idle);
            let started = Instant::now();
            info!("TTS streaming started: text_length={}", characters);

            let mut failure: Option<CollaboratorError> = None;
            let mut total_bytes = 0usize;

            match synthesizer.synthesize(&text).await {
                Ok(mut chunks) => {
                    while let Some(item) = chunks.next().await {
                        let chunk = match item {
                            Ok(chunk) => chunk,
                            Err(e) => {
                                failure = Some(e);
                                break;
                            }
                        };
                        if chunk.is_empty() {
                            continue;
                        }
                        if total_bytes == 0 {
                            let ttfb_ms = started.elapsed().as_secs_f64() * 1000.0;
                            debug!("TTS first chunk: ttfb={:.2}ms", ttfb_ms);
                        }
                        total_bytes += chunk.len();
                        yield Ok(chunk);
                    }
                }
                Err(e) => failure = Some(e),
            }

            match failure {
                None => {
                    let latency_ms = started.elapsed().as_secs_f64() * 1000.0;
                    metrics.record_success(
                        latency_ms,
                        pcm_duration_ms(total_bytes, sample_rate),
                        characters,
                    );
                    info!(
                        "TTS streaming completed: text_length={}, total_bytes={}, latency={:.2}ms",
                        characters,
                        total_bytes,
                        latency_ms
                    );
                }
                Some(e) => {
                    guard.set(SynthesisState::Error);
                    metrics.record_failure();
                    error!("TTS streaming failed: {}", e);
                    yield Err(VoiceError::Stream(e));
                }
            }
            drop(guard);
        };

        Ok(Box::pin(stream))
    }
}

/// Rejects blank text, returning the character count otherwise.
fn require_text(text: &str) -> Result<usize, VoiceError> {
    if text.trim().is_empty() {
        return Err(VoiceError::InvalidArgument(
            "cannot synthesize empty text".to_string(),
        ));
    }
    Ok(text.chars().count())
}

async fn collect_audio(
    synthesizer: &dyn Synthesizer,
    text: &str,
) -> Result<Vec<u8>, CollaboratorError> {
    let mut chunks = synthesizer.synthesize(text).await?;
    let mut audio = Vec::new();
    while let Some(chunk) = chunks.next().await {
        audio.extend_from_slice(&chunk?);
    }
    Ok(audio)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_require_text() {
        assert!(matches!(
            require_text("  \n\t"),
            Err(VoiceError::InvalidArgument(_))
        ));
        assert_eq!(require_text("héllo").ok(), Some(5));
    }
}
