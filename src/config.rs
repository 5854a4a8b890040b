use crate::metrics::{
    LatencyTargets, LatencyTracker, MetricsHub, QualityThresholds, QualityTracker,
    DEFAULT_LATENCY_WINDOW, DEFAULT_QUALITY_WINDOW,
};
use crate::retry::RetryPolicy;
use crate::stt::SttConfig;
use crate::tts::{TtsConfig, VoiceSettings};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::time::Duration;

/// Environment variables with this prefix override file values,
/// e.g. `LAUNCHPAD__RETRY__MAX_RETRIES=5`.
pub const ENV_PREFIX: &str = "LAUNCHPAD";

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub service: ServiceConfig,
    pub pipeline: PipelineConfig,
    pub retry: RetryConfig,
    pub quality: QualityConfig,
    pub recognizer: RecognizerConfig,
    pub synthesizer: SynthesizerConfig,
    pub nats: NatsConfig,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    pub name: String,
    pub log_level: String,
    pub http: HttpConfig,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            name: "launchpad-voice".to_string(),
            log_level: "info".to_string(),
            http: HttpConfig::default(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub bind: String,
    pub port: u16,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: "127.0.0.1".to_string(),
            port: 8090,
        }
    }
}

/// Latency budgets and history sizes
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub target_total_ms: f64,
    pub target_stt_ms: f64,
    pub target_tts_ms: f64,
    pub latency_window: usize,
    pub quality_window: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        let targets = LatencyTargets::default();
        Self {
            target_total_ms: targets.total_ms,
            target_stt_ms: targets.stt_ms,
            target_tts_ms: targets.tts_ms,
            latency_window: DEFAULT_LATENCY_WINDOW,
            quality_window: DEFAULT_QUALITY_WINDOW,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RetryConfig {
    pub max_retries: u32,
    pub base_delay_secs: f64,
    pub max_delay_secs: f64,
    pub exponential_base: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay_secs: 0.5,
            max_delay_secs: 5.0,
            exponential_base: 2.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct QualityConfig {
    pub excellent: f64,
    pub good: f64,
    pub acceptable: f64,
    /// Average score the pipeline is expected to hold
    pub minimum_standard: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        let thresholds = QualityThresholds::default();
        Self {
            excellent: thresholds.excellent,
            good: thresholds.good,
            acceptable: thresholds.acceptable,
            minimum_standard: 6.0,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct RecognizerConfig {
    pub language: String,
    pub sample_rate: u32,
    pub interim_results: bool,
    pub default_confidence: f32,
    pub min_accuracy: f64,
    /// How long to wait for each transcript message
    pub timeout_ms: u64,
}

impl Default for RecognizerConfig {
    fn default() -> Self {
        let stt = SttConfig::default();
        Self {
            language: stt.language,
            sample_rate: stt.sample_rate,
            interim_results: stt.interim_results,
            default_confidence: stt.default_confidence,
            min_accuracy: stt.min_accuracy,
            timeout_ms: 10_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SynthesizerConfig {
    pub voice_id: String,
    pub model_id: String,
    pub sample_rate: u32,
    pub stability: f32,
    pub similarity_boost: f32,
    pub style: f32,
    pub use_speaker_boost: bool,
    pub optimize_streaming_latency: u8,
    /// How long to wait for each audio chunk
    pub chunk_timeout_ms: u64,
}

impl Default for SynthesizerConfig {
    fn default() -> Self {
        let tts = TtsConfig::default();
        Self {
            voice_id: tts.voice_id,
            model_id: tts.model_id,
            sample_rate: tts.sample_rate,
            stability: tts.voice.stability,
            similarity_boost: tts.voice.similarity_boost,
            style: tts.voice.style,
            use_speaker_boost: tts.voice.use_speaker_boost,
            optimize_streaming_latency: tts.voice.optimize_streaming_latency,
            chunk_timeout_ms: 5_000,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct NatsConfig {
    pub url: String,
}

impl Default for NatsConfig {
    fn default() -> Self {
        Self {
            url: "nats://localhost:4222".to_string(),
        }
    }
}

impl Config {
    /// Load `path` (extension optional) and apply `LAUNCHPAD__` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(
                config::Environment::with_prefix(ENV_PREFIX)
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("Failed to load config from {}", path))?;

        let cfg: Config = settings
            .try_deserialize()
            .context("Invalid configuration")?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn validate(&self) -> Result<()> {
        let q = &self.quality;
        if !(q.excellent >= q.good && q.good >= q.acceptable) {
            anyhow::bail!(
                "quality thresholds must be ordered excellent >= good >= acceptable (got {}/{}/{})",
                q.excellent,
                q.good,
                q.acceptable
            );
        }
        if self.retry.base_delay_secs < 0.0 || self.retry.max_delay_secs < 0.0 {
            anyhow::bail!("retry delays must not be negative");
        }
        if self.retry.exponential_base < 1.0 {
            anyhow::bail!(
                "retry exponential_base must be at least 1.0 (got {})",
                self.retry.exponential_base
            );
        }
        Ok(())
    }

    pub fn latency_targets(&self) -> LatencyTargets {
        LatencyTargets {
            total_ms: self.pipeline.target_total_ms,
            stt_ms: self.pipeline.target_stt_ms,
            tts_ms: self.pipeline.target_tts_ms,
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.retry.max_retries,
            secs(self.retry.base_delay_secs),
            secs(self.retry.max_delay_secs),
            self.retry.exponential_base,
        )
    }

    pub fn quality_thresholds(&self) -> QualityThresholds {
        QualityThresholds {
            excellent: self.quality.excellent,
            good: self.quality.good,
            acceptable: self.quality.acceptable,
        }
    }

    pub fn stt_config(&self) -> SttConfig {
        SttConfig {
            language: self.recognizer.language.clone(),
            interim_results: self.recognizer.interim_results,
            sample_rate: self.recognizer.sample_rate,
            default_confidence: self.recognizer.default_confidence,
            min_accuracy: self.recognizer.min_accuracy,
            retry: self.retry_policy(),
        }
    }

    pub fn tts_config(&self) -> TtsConfig {
        let s = &self.synthesizer;
        TtsConfig {
            voice_id: s.voice_id.clone(),
            model_id: s.model_id.clone(),
            sample_rate: s.sample_rate,
            voice: VoiceSettings {
                stability: s.stability,
                similarity_boost: s.similarity_boost,
                style: s.style,
                use_speaker_boost: s.use_speaker_boost,
                optimize_streaming_latency: s.optimize_streaming_latency,
            },
            retry: self.retry_policy(),
        }
    }

    pub fn latency_tracker(&self) -> LatencyTracker {
        LatencyTracker::with_targets(self.latency_targets(), self.pipeline.latency_window)
    }

    pub fn quality_tracker(&self) -> QualityTracker {
        QualityTracker::new(self.quality_thresholds(), self.pipeline.quality_window)
    }

    pub fn metrics_hub(&self) -> MetricsHub {
        MetricsHub::new(
            self.latency_targets(),
            self.pipeline.latency_window,
            self.quality_thresholds(),
            self.pipeline.quality_window,
            self.quality.minimum_standard,
        )
    }

    pub fn recognizer_timeout(&self) -> Duration {
        Duration::from_millis(self.recognizer.timeout_ms)
    }

    pub fn synthesizer_chunk_timeout(&self) -> Duration {
        Duration::from_millis(self.synthesizer.chunk_timeout_ms)
    }
}

fn secs(value: f64) -> Duration {
    Duration::try_from_secs_f64(value).unwrap_or(Duration::ZERO)
}
