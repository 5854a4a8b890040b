use super::messages::{encode_pcm, AudioFrameMessage, SynthesisRequestMessage};
use anyhow::{Context, Result};
use async_nats::Client;
use tracing::{debug, info};

pub const TRANSCRIPT_SUBJECT: &str = "stt.text.>";
pub const SYNTHESIS_REQUEST_SUBJECT: &str = "tts.request";

#[derive(Clone)]
pub struct NatsClient {
    client: Client,
    session_id: String,
}

impl NatsClient {
    /// Connect to NATS server
    pub async fn connect(url: &str, session_id: String) -> Result<Self> {
        info!("Connecting to NATS at {}", url);

        let client = async_nats::connect(url)
            .await
            .context("Failed to connect to NATS")?;

        info!("Connected to NATS successfully (session={})", session_id);

        Ok(Self { client, session_id })
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    /// Publish audio frame to NATS
    pub async fn publish_audio_frame(
        &self,
        pcm_bytes: &[u8],
        sample_rate: u32,
        channels: u16,
        sequence: u32,
        is_final: bool,
    ) -> Result<()> {
        let subject = format!("audio.frame.{}", self.session_id);

        let message = AudioFrameMessage {
            session_id: self.session_id.clone(),
            sequence,
            pcm: encode_pcm(pcm_bytes),
            sample_rate,
            channels,
            timestamp: chrono::Utc::now().to_rfc3339(),
            final_frame: is_final,
        };

        let payload = serde_json::to_vec(&message)?;

        self.client
            .publish(subject.clone(), payload.into())
            .await
            .context("Failed to publish audio frame")?;

        debug!(
            "Published audio frame to {} (sequence={}, bytes={}, final={})",
            subject,
            sequence,
            pcm_bytes.len(),
            is_final
        );

        Ok(())
    }

    /// Subscribe to transcript messages
    ///
    /// The STT service publishes to `stt.text.partial` and `stt.text.final`;
    /// callers filter by session_id in the payload.
    pub async fn subscribe_transcripts(&self) -> Result<async_nats::Subscriber> {
        info!("Subscribing to transcripts on {}", TRANSCRIPT_SUBJECT);

        let subscriber = self
            .client
            .subscribe(TRANSCRIPT_SUBJECT)
            .await
            .context("Failed to subscribe to transcripts")?;

        Ok(subscriber)
    }

    /// Publish a synthesis request to the TTS service
    pub async fn publish_synthesis_request(&self, request: &SynthesisRequestMessage) -> Result<()> {
        let payload = serde_json::to_vec(request)?;

        self.client
            .publish(SYNTHESIS_REQUEST_SUBJECT.to_string(), payload.into())
            .await
            .context("Failed to publish synthesis request")?;

        debug!(
            "Published synthesis request {} (text_length={})",
            request.request_id,
            request.text.chars().count()
        );

        Ok(())
    }

    /// Subscribe to the audio chunks answering `request_id`
    pub async fn subscribe_synthesis_audio(&self, request_id: &str) -> Result<async_nats::Subscriber> {
        let subject = format!("tts.audio.{}", request_id);

        let subscriber = self
            .client
            .subscribe(subject.clone())
            .await
            .with_context(|| format!("Failed to subscribe to {}", subject))?;

        debug!("Subscribed to {}", subject);

        Ok(subscriber)
    }

    /// Flush pending publishes and close the connection
    pub async fn close(self) -> Result<()> {
        info!("Closing NATS connection");
        self.client
            .flush()
            .await
            .context("Failed to flush NATS connection")?;
        Ok(())
    }
}
