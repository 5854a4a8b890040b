use super::client::NatsClient;
use super::messages::TranscriptMessage;
use crate::error::CollaboratorError;
use crate::stt::{
    AudioInputStream, Recognizer, RecognizerEvent, RecognizerEventStream, SpeechAlternative,
    StreamOptions,
};
use async_nats::Subscriber;
use chrono::Utc;
use futures::future;
use futures::stream::{BoxStream, StreamExt};
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, warn};

/// Bytes per published frame: 100ms of 16kHz mono 16-bit audio
const DEFAULT_FRAME_BYTES: usize = 3200;

/// Remote STT service reached over NATS
pub struct NatsRecognizer {
    client: NatsClient,
    timeout: Duration,
    frame_bytes: usize,
}

impl NatsRecognizer {
    /// `timeout` bounds the wait for each transcript message.
    pub fn new(client: NatsClient, timeout: Duration) -> Self {
        Self {
            client,
            timeout,
            frame_bytes: DEFAULT_FRAME_BYTES,
        }
    }

    async fn session_transcripts(&self) -> Result<TranscriptStream, CollaboratorError> {
        let subscriber = self
            .client
            .subscribe_transcripts()
            .await
            .map_err(unavailable)?;
        Ok(filter_session(subscriber, self.client.session_id().to_string()))
    }

    pub fn with_frame_bytes(mut self, frame_bytes: usize) -> Self {
        self.frame_bytes = frame_bytes.max(2);
        self
    }

    async fn publish_utterance(&self, audio: &[u8], sample_rate: u32) -> Result<(), CollaboratorError> {
        let mut sequence = 0u32;
        for frame in audio.chunks(self.frame_bytes) {
            self.client
                .publish_audio_frame(frame, sample_rate, 1, sequence, false)
                .await
                .map_err(transport)?;
            sequence += 1;
        }
        self.client
            .publish_audio_frame(&[], sample_rate, 1, sequence, true)
            .await
            .map_err(transport)
    }
}

#[async_trait::async_trait]
impl Recognizer for NatsRecognizer {
    async fn recognize(&self, audio: &[u8], sample_rate: u32) -> Result<String, CollaboratorError> {
        // Subscribe before publishing so the final transcript cannot be missed
        let mut transcripts = self.session_transcripts().await?;

        self.publish_utterance(audio, sample_rate).await?;

        loop {
            let message = next_transcript(&mut transcripts, self.timeout)
                .await?
                .ok_or_else(|| {
                    CollaboratorError::Unavailable("transcript subscription closed".to_string())
                })?;
            if !message.partial {
                return Ok(message.text);
            }
        }
    }

    async fn stream(
        &self,
        mut audio: AudioInputStream,
        options: StreamOptions,
    ) -> Result<RecognizerEventStream, CollaboratorError> {
        let transcripts = self.session_transcripts().await?;

        let publisher = self.client.clone();
        let sample_rate = options.sample_rate;
        let input = tokio::spawn(async move {
            let mut sequence = 0u32;
            while let Some(frame) = audio.next().await {
                publisher
                    .publish_audio_frame(&frame, sample_rate, 1, sequence, false)
                    .await
                    .map_err(transport)?;
                sequence += 1;
            }
            publisher
                .publish_audio_frame(&[], sample_rate, 1, sequence, true)
                .await
                .map_err(transport)
        });

        Ok(transcript_events(
            transcripts,
            input,
            self.timeout,
            options.interim_results,
        ))
    }

    fn name(&self) -> &str {
        "nats"
    }
}

/// Aborts the audio publisher when the event stream is dropped.
struct AbortOnDrop(JoinHandle<Result<(), CollaboratorError>>);

impl Drop for AbortOnDrop {
    fn drop(&mut self) {
        self.0.abort();
    }
}

enum Step {
    Transcript(Result<Option<TranscriptMessage>, CollaboratorError>),
    InputFinished(Result<(), CollaboratorError>),
}

/// Turns session transcripts into recognizer events while `input` publishes audio.
///
/// A publish failure ends the stream with that error. The stream stops after the
/// first final transcript that arrives once all input is published.
fn transcript_events(
    mut transcripts: TranscriptStream,
    input: JoinHandle<Result<(), CollaboratorError>>,
    timeout: Duration,
    interim_results: bool,
) -> RecognizerEventStream {
    let mut input = AbortOnDrop(input);
    let events = async_stream::stream! {
        let mut input_done = false;
        loop {
            let step = if input_done {
                Step::Transcript(next_transcript(&mut transcripts, timeout).await)
            } else {
                tokio::select! {
                    joined = &mut input.0 => Step::InputFinished(joined.unwrap_or_else(|e| {
                        Err(CollaboratorError::Transport(format!("audio publisher stopped: {}", e)))
                    })),
                    next = next_transcript(&mut transcripts, timeout) => Step::Transcript(next),
                }
            };

            let message = match step {
                Step::InputFinished(Ok(())) => {
                    input_done = true;
                    continue;
                }
                Step::InputFinished(Err(e)) | Step::Transcript(Err(e)) => {
                    yield Err(e);
                    break;
                }
                Step::Transcript(Ok(None)) => break,
                Step::Transcript(Ok(Some(message))) => message,
            };

            let partial = message.partial;
            if partial && !interim_results {
                continue;
            }
            let alternative = to_alternative(message);
            if partial {
                yield Ok(RecognizerEvent::interim_transcript(alternative));
            } else {
                yield Ok(RecognizerEvent::final_transcript(alternative));
                if input_done {
                    yield Ok(RecognizerEvent::end_of_speech());
                    break;
                }
            }
        }
    };

    Box::pin(events)
}

type TranscriptStream = BoxStream<'static, TranscriptMessage>;

/// Transcripts for `session_id`, skipping other sessions and malformed payloads.
fn filter_session(subscriber: Subscriber, session_id: String) -> TranscriptStream {
    subscriber
        .filter_map(move |message| {
            let transcript = match serde_json::from_slice::<TranscriptMessage>(&message.payload) {
                Ok(transcript) if transcript.session_id == session_id => {
                    debug!(
                        "Transcript for {} (partial={}): {}",
                        session_id, transcript.partial, transcript.text
                    );
                    Some(transcript)
                }
                Ok(_) => None,
                Err(e) => {
                    warn!("Failed to parse transcript message: {}", e);
                    None
                }
            };
            future::ready(transcript)
        })
        .boxed()
}

/// `Ok(None)` means the subscription ended.
async fn next_transcript(
    transcripts: &mut TranscriptStream,
    timeout: Duration,
) -> Result<Option<TranscriptMessage>, CollaboratorError> {
    tokio::time::timeout(timeout, transcripts.next())
        .await
        .map_err(|_| CollaboratorError::Timeout(timeout))
}

fn to_alternative(message: TranscriptMessage) -> SpeechAlternative {
    let now = Utc::now().timestamp_micros() as f64 / 1_000_000.0;
    let start_time = message.start_time.unwrap_or(now);
    SpeechAlternative {
        text: message.text,
        confidence: message.confidence,
        start_time,
        end_time: message.end_time.unwrap_or(start_time),
    }
}

fn transport(e: anyhow::Error) -> CollaboratorError {
    CollaboratorError::Transport(format!("{:#}", e))
}

fn unavailable(e: anyhow::Error) -> CollaboratorError {
    CollaboratorError::Unavailable(format!("{:#}", e))
}
