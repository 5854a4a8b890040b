use base64::Engine;
use launchpad_voice::error::CollaboratorError;
use launchpad_voice::nats::messages::{
    decode_pcm, encode_pcm, AudioFrameMessage, SynthesisChunkMessage, SynthesisRequestMessage,
    TranscriptMessage,
};
use launchpad_voice::tts::VoiceSettings;

#[test]
fn test_audio_frame_serialization() {
    let msg = AudioFrameMessage {
        session_id: "test-session".to_string(),
        sequence: 0,
        pcm: base64::engine::general_purpose::STANDARD.encode(&[0u8; 100]),
        sample_rate: 16000,
        channels: 1,
        timestamp: "2025-10-27T14:30:00Z".to_string(),
        final_frame: false,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("test-session"));
    assert!(json.contains("16000"));
    assert!(json.contains("\"final\":false"));
    assert!(json.contains("\"sequence\":0"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert_eq!(deserialized.session_id, "test-session");
    assert_eq!(deserialized.sample_rate, 16000);
    assert_eq!(deserialized.channels, 1);
    assert_eq!(deserialized.sequence, 0);
    assert!(!deserialized.final_frame);
}

#[test]
fn test_audio_frame_final_marker() {
    let msg = AudioFrameMessage {
        session_id: "test-session".to_string(),
        sequence: 10,
        pcm: String::new(), // Empty for final marker
        sample_rate: 16000,
        channels: 1,
        timestamp: "2025-10-27T14:30:00Z".to_string(),
        final_frame: true,
    };

    let json = serde_json::to_string(&msg).unwrap();
    assert!(json.contains("\"final\":true"));

    let deserialized: AudioFrameMessage = serde_json::from_str(&json).unwrap();
    assert!(deserialized.final_frame);
    assert!(deserialized.pcm.is_empty());
    assert_eq!(deserialized.sequence, 10);
}

#[test]
fn test_transcript_deserialization() {
    let json = r#"{
        "session_id": "test-session",
        "text": "Hello world",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.95
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.session_id, "test-session");
    assert_eq!(msg.text, "Hello world");
    assert!(!msg.partial);
    assert_eq!(msg.confidence, Some(0.95));
    assert_eq!(msg.timestamp, "2025-10-27T14:30:05Z");
}

#[test]
fn test_transcript_partial() {
    let json = r#"{
        "session_id": "test-session",
        "text": "This is a partial",
        "partial": true,
        "timestamp": "2025-10-27T14:30:05Z",
        "confidence": 0.87
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert!(msg.partial);
    assert_eq!(msg.text, "This is a partial");
    assert_eq!(msg.confidence, Some(0.87));
}

#[test]
fn test_transcript_no_confidence() {
    let json = r#"{
        "session_id": "test-session",
        "text": "No confidence score",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z"
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.text, "No confidence score");
    assert_eq!(msg.confidence, None);
}

#[test]
fn test_transcript_with_speech_times() {
    let json = r#"{
        "session_id": "test-session",
        "text": "Timed words",
        "partial": false,
        "timestamp": "2025-10-27T14:30:05Z",
        "start_time": 1761575403.5,
        "end_time": 1761575404.75
    }"#;

    let msg: TranscriptMessage = serde_json::from_str(json).unwrap();
    assert_eq!(msg.start_time, Some(1761575403.5));
    assert_eq!(msg.end_time, Some(1761575404.75));
}

#[test]
fn test_synthesis_request_serialization() {
    let msg = SynthesisRequestMessage {
        request_id: "req-1".to_string(),
        text: "Hello there".to_string(),
        voice_id: "21m00Tcm4TlvDq8ikWAM".to_string(),
        model_id: "eleven_turbo_v2".to_string(),
        sample_rate: 24000,
        voice: VoiceSettings::default(),
        timestamp: "2025-10-27T14:30:00Z".to_string(),
    };

    let json: serde_json::Value = serde_json::to_value(&msg).unwrap();
    assert_eq!(json["request_id"], "req-1");
    assert_eq!(json["sample_rate"], 24000);
    assert_eq!(json["voice"]["use_speaker_boost"], true);
    assert_eq!(json["voice"]["optimize_streaming_latency"], 3);
}

#[test]
fn test_synthesis_chunk_audio() {
    let samples: Vec<u8> = [100i16, -200, 300]
        .iter()
        .flat_map(|s| s.to_le_bytes())
        .collect();
    let json = format!(
        r#"{{"request_id": "req-1", "sequence": 0, "pcm": "{}", "final": true}}"#,
        encode_pcm(&samples)
    );

    let chunk: SynthesisChunkMessage = serde_json::from_str(&json).unwrap();
    assert!(chunk.final_chunk);
    assert_eq!(chunk.audio(), Ok(samples));
}

#[test]
fn test_synthesis_chunk_error_is_rejection() {
    let json = r#"{"request_id": "req-1", "sequence": 2, "final": true, "error": "quota exceeded"}"#;

    let chunk: SynthesisChunkMessage = serde_json::from_str(json).unwrap();
    assert!(chunk.pcm.is_empty());
    assert_eq!(
        chunk.audio(),
        Err(CollaboratorError::Rejected("quota exceeded".to_string()))
    );
}

#[test]
fn test_invalid_pcm_is_decode_error() {
    assert!(matches!(
        decode_pcm("not base64!!"),
        Err(CollaboratorError::Decode(_))
    ));
    assert_eq!(decode_pcm(""), Ok(Vec::new()));
}
