// Integration tests for the metrics HTTP API

mod common;

use anyhow::Result;
use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use common::{MockRecognizer, MockSynthesizer};
use launchpad_voice::metrics::{LatencyTracker, MetricsHub, PipelineLatencyRecord, QualityTracker};
use launchpad_voice::pipeline::{EchoResponder, PipelineCoordinator};
use launchpad_voice::stt::{SttConfig, TranscriptionStage};
use launchpad_voice::tts::{SynthesisStage, TtsConfig};
use launchpad_voice::{create_router, AppState};
use std::sync::Arc;
use serde_json::Value;
use tower::ServiceExt;

async fn get(hub: &MetricsHub, uri: &str) -> Result<(StatusCode, Vec<u8>)> {
    let app = create_router(AppState::new(hub.clone()));
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty())?)
        .await?;

    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await?;
    Ok((status, body.to_vec()))
}

#[tokio::test]
async fn test_health() -> Result<()> {
    let (status, body) = get(&MetricsHub::default(), "/health").await?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, b"OK");

    Ok(())
}

#[tokio::test]
async fn test_health_details() -> Result<()> {
    let (status, body) = get(&MetricsHub::default(), "/health/details").await?;
    let json: Value = serde_json::from_slice(&body)?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["status"], "ok");
    assert_eq!(json["sessions"], 0);

    Ok(())
}

#[tokio::test]
async fn test_metrics_snapshot() -> Result<()> {
    let hub = MetricsHub::default();
    hub.publish_latency(PipelineLatencyRecord::new(120.0, 40.0, 300.0, 500.0, 2000.0))
        .await;
    hub.publish_quality(7.5).await;

    let (status, body) = get(&hub, "/metrics").await?;
    let json: Value = serde_json::from_slice(&body)?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["turns_completed"], 1);
    assert_eq!(json["latency"]["averages"]["total_avg_ms"], 500.0);
    assert_eq!(json["latency"]["latest"]["stt_latency_ms"], 120.0);
    assert_eq!(json["quality"]["stats"]["sample_count"], 1);
    assert_eq!(json["stt"]["total_transcriptions"], 0);

    Ok(())
}

#[tokio::test]
async fn test_latency_summary() -> Result<()> {
    let hub = MetricsHub::default();
    for total in [400.0, 1800.0, 2200.0, 2600.0] {
        hub.publish_latency(PipelineLatencyRecord::new(0.0, 0.0, 0.0, total, 2000.0))
            .await;
    }

    let (status, body) = get(&hub, "/metrics/latency").await?;
    let json: Value = serde_json::from_slice(&body)?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["target_compliance_rate"], 0.5);
    assert_eq!(json["p50_ms"], 2200.0);
    assert_eq!(json["p99_ms"], 2600.0);
    assert_eq!(json["targets"]["total_ms"], 2000.0);

    Ok(())
}

#[tokio::test]
async fn test_quality_summary() -> Result<()> {
    let hub = MetricsHub::default();
    hub.publish_quality(4.0).await;
    hub.publish_quality(5.0).await;

    let (status, body) = get(&hub, "/metrics/quality").await?;
    let json: Value = serde_json::from_slice(&body)?;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["stats"]["average"], 4.5);
    assert_eq!(json["minimum_standard"], 6.0);
    assert_eq!(json["meets_minimum_standard"], false);

    Ok(())
}

#[tokio::test]
async fn test_unknown_route() -> Result<()> {
    let (status, _) = get(&MetricsHub::default(), "/sessions/unknown").await?;

    assert_eq!(status, StatusCode::NOT_FOUND);

    Ok(())
}

#[tokio::test]
async fn test_served_hub_shows_coordinator_turns() -> Result<()> {
    let hub = MetricsHub::default();
    let mut coordinator = PipelineCoordinator::new(
        TranscriptionStage::new(Arc::new(MockRecognizer::always("lights on")), SttConfig::default()),
        Arc::new(EchoResponder),
        SynthesisStage::new(
            Arc::new(MockSynthesizer::always(vec![vec![0u8; 480]])),
            TtsConfig::default(),
        ),
        LatencyTracker::new(),
        QualityTracker::default(),
    )
    .with_session_id("kitchen")
    .with_hub(hub.clone());

    coordinator.run_turn(&[0u8; 320], 16000).await?;

    let (status, body) = get(&hub, "/metrics").await?;
    let json: Value = serde_json::from_slice(&body)?;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(json["turns_completed"], 1);
    assert_eq!(json["stt"]["successful_transcriptions"], 1);
    assert_eq!(json["tts"]["successful_syntheses"], 1);

    let (_, body) = get(&hub, "/health/details").await?;
    let json: Value = serde_json::from_slice(&body)?;
    assert_eq!(json["sessions"], 1);

    // Ending the session keeps its counters in the served totals
    coordinator.end_session().await;
    let (_, body) = get(&hub, "/metrics").await?;
    let json: Value = serde_json::from_slice(&body)?;
    assert_eq!(json["stt"]["successful_transcriptions"], 1);
    assert_eq!(json["tts"]["successful_syntheses"], 1);

    let (_, body) = get(&hub, "/health/details").await?;
    let json: Value = serde_json::from_slice(&body)?;
    assert_eq!(json["sessions"], 0);

    Ok(())
}
