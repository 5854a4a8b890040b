use super::responder::Responder;
use crate::error::VoiceError;
use crate::metrics::{
    LatencyTracker, MetricsHub, PipelineLatencyRecord, PipelinePhase, QualityLevel, QualityTracker,
};
use crate::stt::TranscriptionStage;
use crate::tts::{SynthesisResult, SynthesisStage};
use std::sync::Arc;
use tracing::{error, info};
use uuid::Uuid;

/// Everything one completed turn produced
#[derive(Debug, Clone)]
pub struct TurnOutcome {
    pub transcript: String,
    pub response: String,
    pub synthesis: SynthesisResult,
    pub latency: PipelineLatencyRecord,
}

/// Drives one session's turns through transcription, response and synthesis
///
/// Phases run strictly one after another. The coordinator owns its stages and
/// trackers; run one coordinator per session and share aggregates through a
/// [`MetricsHub`].
pub struct PipelineCoordinator {
    session_id: String,
    transcription: TranscriptionStage,
    responder: Arc<dyn Responder>,
    synthesis: SynthesisStage,
    latency: LatencyTracker,
    quality: QualityTracker,
    hub: Option<MetricsHub>,
}

impl PipelineCoordinator {
    pub fn new(
        transcription: TranscriptionStage,
        responder: Arc<dyn Responder>,
        synthesis: SynthesisStage,
        latency: LatencyTracker,
        quality: QualityTracker,
    ) -> Self {
        let session_id = Uuid::new_v4().to_string();
        info!(
            "Pipeline coordinator created: session={}, responder={}",
            session_id,
            responder.name()
        );

        Self {
            session_id,
            transcription,
            responder,
            synthesis,
            latency,
            quality,
            hub: None,
        }
    }

    /// Publish finished turns and stage metrics to `hub`
    pub fn with_hub(mut self, hub: MetricsHub) -> Self {
        self.hub = Some(hub);
        self
    }

    pub fn with_session_id(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn session_id(&self) -> &str {
        &self.session_id
    }

    pub fn transcription(&self) -> &TranscriptionStage {
        &self.transcription
    }

    pub fn transcription_mut(&mut self) -> &mut TranscriptionStage {
        &mut self.transcription
    }

    pub fn synthesis(&self) -> &SynthesisStage {
        &self.synthesis
    }

    pub fn synthesis_mut(&mut self) -> &mut SynthesisStage {
        &mut self.synthesis
    }

    pub fn latency_tracker(&self) -> &LatencyTracker {
        &self.latency
    }

    pub fn quality_tracker(&self) -> &QualityTracker {
        &self.quality
    }

    /// Run one turn over a complete utterance of 16-bit PCM
    ///
    /// A failed turn leaves no record; its partial markers are discarded by the
    /// next turn's start.
    pub async fn run_turn(
        &mut self,
        audio: &[u8],
        sample_rate: u32,
    ) -> Result<TurnOutcome, VoiceError> {
        let outcome = self.drive_turn(audio, sample_rate).await;

        if let Err(e) = &outcome {
            error!("Turn failed: session={}, error={}", self.session_id, e);
        }

        if let Some(hub) = &self.hub {
            if let Ok(turn) = &outcome {
                hub.publish_latency(turn.latency.clone()).await;
            }
            let stt = self.transcription.get_metrics().clone();
            let tts = self.synthesis.get_metrics().clone();
            hub.publish_stage_metrics(&self.session_id, &stt, &tts).await;
        }

        outcome
    }

    async fn drive_turn(
        &mut self,
        audio: &[u8],
        sample_rate: u32,
    ) -> Result<TurnOutcome, VoiceError> {
        self.latency.start_pipeline();

        self.latency.mark_phase_start(PipelinePhase::SttStart);
        let transcript = self.transcription.transcribe_audio(audio, sample_rate).await?;
        self.latency.mark_phase_end(PipelinePhase::SttEnd);

        self.latency.mark_phase_start(PipelinePhase::ProcessingStart);
        let response = self.responder.respond(&transcript).await?;
        self.latency.mark_phase_end(PipelinePhase::ProcessingEnd);

        self.latency.mark_phase_start(PipelinePhase::TtsStart);
        let synthesis = self.synthesis.synthesize(&response).await?;
        self.latency.mark_phase_end(PipelinePhase::TtsEnd);

        let latency = self.latency.complete_pipeline()?;

        info!(
            "Turn completed: session={}, total={:.2}ms, meets_target={}",
            self.session_id,
            latency.total_latency_ms,
            latency.meets_target()
        );

        Ok(TurnOutcome {
            transcript,
            response,
            synthesis,
            latency,
        })
    }

    /// Score the quality of a turn (0-10, clamped) and return its band
    pub async fn record_quality(&mut self, score: f64) -> QualityLevel {
        let level = self.quality.record_score(score, None);
        if let Some(hub) = &self.hub {
            hub.publish_quality(score).await;
        }
        level
    }

    /// End the session, folding its stage metrics into the hub's retained totals
    pub async fn end_session(self) {
        if let Some(hub) = &self.hub {
            let stt = self.transcription.get_metrics().clone();
            let tts = self.synthesis.get_metrics().clone();
            hub.publish_stage_metrics(&self.session_id, &stt, &tts).await;
            hub.retire_session(&self.session_id).await;
        }
        info!("Session ended: {}", self.session_id);
    }
}
