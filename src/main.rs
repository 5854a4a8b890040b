use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use launchpad_voice::audio::write_pcm_wav;
use launchpad_voice::nats::{NatsRecognizer, NatsSynthesizer};
use launchpad_voice::pipeline::{EchoResponder, PipelineCoordinator, TurnOutcome};
use launchpad_voice::stt::TranscriptionStage;
use launchpad_voice::tts::SynthesisStage;
use launchpad_voice::{create_router, AppState, AudioFile, Config, MetricsHub, NatsClient};
use std::path::PathBuf;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "launchpad-voice")]
#[command(about = "Voice pipeline latency and quality instrumentation")]
struct Args {
    /// Config file (extension optional)
    #[arg(short, long, default_value = "config/launchpad-voice")]
    config: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run voice turns over WAV files using the NATS services
    Run {
        /// 16-bit PCM WAV input, one turn per file (repeatable)
        #[arg(long, required = true)]
        wav: Vec<PathBuf>,

        /// Where to write the last synthesized reply as WAV
        #[arg(long)]
        out: Option<PathBuf>,

        /// Session ID (defaults to a random UUID)
        #[arg(long)]
        session: Option<String>,

        /// Serve the metrics API while turns run, and keep serving until Ctrl-C
        #[arg(long)]
        serve: bool,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let cfg = Config::load(&args.config)?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&cfg.service.log_level));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    info!("{} v{}", cfg.service.name, env!("CARGO_PKG_VERSION"));

    match args.command {
        Command::Run {
            wav,
            out,
            session,
            serve,
        } => run(&cfg, wav, out, session, serve).await,
    }
}

/// Serve the metrics API over `hub` in the background
async fn spawn_metrics_api(cfg: &Config, hub: MetricsHub) -> Result<JoinHandle<Result<()>>> {
    let app = create_router(AppState::new(hub));

    let addr = format!("{}:{}", cfg.service.http.bind, cfg.service.http.port);
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("Failed to bind {}", addr))?;

    info!("Metrics API listening on http://{}", addr);
    Ok(tokio::spawn(async move {
        axum::serve(listener, app)
            .await
            .context("HTTP server failed")
    }))
}

async fn run(
    cfg: &Config,
    wavs: Vec<PathBuf>,
    out: Option<PathBuf>,
    session: Option<String>,
    serve: bool,
) -> Result<()> {
    let hub = cfg.metrics_hub();
    let server = if serve {
        Some(spawn_metrics_api(cfg, hub.clone()).await?)
    } else {
        None
    };

    let session_id = session.unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let client = NatsClient::connect(&cfg.nats.url, session_id.clone()).await?;

    let recognizer = NatsRecognizer::new(client.clone(), cfg.recognizer_timeout());
    let tts_config = cfg.tts_config();
    let synthesizer =
        NatsSynthesizer::new(client.clone(), &tts_config, cfg.synthesizer_chunk_timeout());

    let mut coordinator = PipelineCoordinator::new(
        TranscriptionStage::new(Arc::new(recognizer), cfg.stt_config()),
        Arc::new(EchoResponder),
        SynthesisStage::new(Arc::new(synthesizer), tts_config),
        cfg.latency_tracker(),
        cfg.quality_tracker(),
    )
    .with_session_id(session_id)
    .with_hub(hub.clone());

    let mut last_reply = None;
    for wav in &wavs {
        let audio = AudioFile::open(wav)?;
        let pcm = audio.to_mono_pcm_bytes();
        if audio.sample_rate != cfg.recognizer.sample_rate {
            warn!(
                "Input is {}Hz but the recognizer expects {}Hz; sending as-is",
                audio.sample_rate, cfg.recognizer.sample_rate
            );
        }

        let turn = coordinator
            .run_turn(&pcm, audio.sample_rate)
            .await
            .with_context(|| format!("Voice turn failed for {}", wav.display()))?;
        log_turn(&turn);
        last_reply = Some(turn.synthesis);
    }
    coordinator.end_session().await;

    if let (Some(path), Some(reply)) = (out, last_reply) {
        write_pcm_wav(&path, &reply.audio_data, reply.sample_rate)?;
    }
    client.close().await?;

    let snapshot = hub.snapshot().await;
    info!(
        "Session totals: turns={}, p95={:.1}ms, compliance={:.2}",
        snapshot.turns_completed, snapshot.latency.p95_ms, snapshot.latency.target_compliance_rate
    );

    if let Some(server) = server {
        info!("Turns finished; serving metrics until interrupted");
        tokio::select! {
            served = server => served??,
            _ = tokio::signal::ctrl_c() => info!("Shutting down"),
        }
    }

    Ok(())
}

fn log_turn(turn: &TurnOutcome) {
    info!("Transcript: {}", turn.transcript);
    info!("Response: {}", turn.response);
    info!(
        "Latency: stt={:.1}ms processing={:.1}ms tts={:.1}ms total={:.1}ms (meets target: {})",
        turn.latency.stt_latency_ms,
        turn.latency.processing_latency_ms,
        turn.latency.tts_latency_ms,
        turn.latency.total_latency_ms,
        turn.latency.meets_target()
    );
}
