use super::client::NatsClient;
use super::messages::{SynthesisChunkMessage, SynthesisRequestMessage};
use crate::error::CollaboratorError;
use crate::tts::{AudioChunkStream, Synthesizer, TtsConfig, VoiceSettings};
use futures::StreamExt;
use std::time::Duration;
use tracing::warn;
use uuid::Uuid;

/// Remote TTS service reached over NATS
pub struct NatsSynthesizer {
    client: NatsClient,
    voice_id: String,
    model_id: String,
    sample_rate: u32,
    voice: VoiceSettings,
    chunk_timeout: Duration,
}

impl NatsSynthesizer {
    /// `chunk_timeout` bounds the wait for every audio chunk, the first included.
    pub fn new(client: NatsClient, config: &TtsConfig, chunk_timeout: Duration) -> Self {
        Self {
            client,
            voice_id: config.voice_id.clone(),
            model_id: config.model_id.clone(),
            sample_rate: config.sample_rate,
            voice: config.voice,
            chunk_timeout,
        }
    }

    fn request(&self, text: &str) -> SynthesisRequestMessage {
        SynthesisRequestMessage {
            request_id: Uuid::new_v4().to_string(),
            text: text.to_string(),
            voice_id: self.voice_id.clone(),
            model_id: self.model_id.clone(),
            sample_rate: self.sample_rate,
            voice: self.voice,
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

#[async_trait::async_trait]
impl Synthesizer for NatsSynthesizer {
    async fn synthesize(&self, text: &str) -> Result<AudioChunkStream, CollaboratorError> {
        let request = self.request(text);

        let mut chunks = self
            .client
            .subscribe_synthesis_audio(&request.request_id)
            .await
            .map_err(|e| CollaboratorError::Unavailable(format!("{:#}", e)))?;

        self.client
            .publish_synthesis_request(&request)
            .await
            .map_err(|e| CollaboratorError::Transport(format!("{:#}", e)))?;

        let timeout = self.chunk_timeout;
        let audio = async_stream::stream! {
            loop {
                let message = match tokio::time::timeout(timeout, chunks.next()).await {
                    Ok(Some(message)) => message,
                    Ok(None) => {
                        yield Err(CollaboratorError::Unavailable(
                            "audio subscription closed before the final chunk".to_string(),
                        ));
                        break;
                    }
                    Err(_) => {
                        yield Err(CollaboratorError::Timeout(timeout));
                        break;
                    }
                };

                let chunk: SynthesisChunkMessage = match serde_json::from_slice(&message.payload) {
                    Ok(chunk) => chunk,
                    Err(e) => {
                        warn!("Failed to parse synthesis chunk: {}", e);
                        yield Err(CollaboratorError::Decode(e.to_string()));
                        break;
                    }
                };

                let is_final = chunk.final_chunk;
                match chunk.audio() {
                    Ok(pcm) if pcm.is_empty() => {}
                    Ok(pcm) => {
                        yield Ok(pcm);
                    }
                    Err(e) => {
                        yield Err(e);
                        break;
                    }
                }
                if is_final {
                    break;
                }
            }
        };

        Ok(Box::pin(audio))
    }

    fn name(&self) -> &str {
        "nats"
    }
}
