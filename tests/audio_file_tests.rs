// Integration tests for audio file processing
//
// These tests write WAV fixtures with hound and verify they load as PCM correctly.

use anyhow::Result;
use hound::{SampleFormat, WavSpec, WavWriter};
use launchpad_voice::audio::{pcm_duration_ms, samples_to_pcm_bytes, write_pcm_wav, AudioFile};
use std::path::{Path, PathBuf};
use tempfile::TempDir;

fn write_fixture(dir: &Path, name: &str, channels: u16, samples: &[i16]) -> Result<PathBuf> {
    let path = dir.join(name);
    let spec = WavSpec {
        channels,
        sample_rate: 16000,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(&path, spec)?;
    for &sample in samples {
        writer.write_sample(sample)?;
    }
    writer.finalize()?;
    Ok(path)
}

#[test]
fn test_audio_file_open() -> Result<()> {
    let dir = TempDir::new()?;
    let samples: Vec<i16> = (0..16000).map(|i| (i % 100) as i16).collect();
    let path = write_fixture(dir.path(), "utterance.wav", 1, &samples)?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 16000);
    assert_eq!(audio.channels, 1);
    assert_eq!(audio.samples, samples);
    assert!((audio.duration_seconds - 1.0).abs() < 1e-9);
    assert!(audio.path.contains("utterance.wav"));

    Ok(())
}

#[test]
fn test_mono_pcm_bytes_match_samples() -> Result<()> {
    let dir = TempDir::new()?;
    let samples = vec![100i16, -200, 300, -400];
    let path = write_fixture(dir.path(), "mono.wav", 1, &samples)?;

    let audio = AudioFile::open(&path)?;
    let pcm = audio.to_mono_pcm_bytes();

    assert_eq!(pcm, samples_to_pcm_bytes(&samples));
    assert_eq!(pcm_duration_ms(pcm.len(), audio.sample_rate), 0.25);

    Ok(())
}

#[test]
fn test_stereo_is_downmixed() -> Result<()> {
    let dir = TempDir::new()?;
    // Interleaved [L, R, L, R]
    let path = write_fixture(dir.path(), "stereo.wav", 2, &[10, 20, -5, -5])?;

    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.channels, 2);
    assert_eq!(audio.to_mono_pcm_bytes(), samples_to_pcm_bytes(&[15, -5]));

    Ok(())
}

#[test]
fn test_write_then_open() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("reply.wav");
    let pcm = samples_to_pcm_bytes(&[1, 2, 3, 4, 5, 6]);

    write_pcm_wav(&path, &pcm, 24000)?;
    let audio = AudioFile::open(&path)?;

    assert_eq!(audio.sample_rate, 24000);
    assert_eq!(audio.samples, vec![1, 2, 3, 4, 5, 6]);

    Ok(())
}

#[test]
fn test_float_wav_is_rejected() -> Result<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("float.wav");
    let spec = WavSpec {
        channels: 1,
        sample_rate: 16000,
        bits_per_sample: 32,
        sample_format: SampleFormat::Float,
    };
    let mut writer = WavWriter::create(&path, spec)?;
    writer.write_sample(0.5f32)?;
    writer.finalize()?;

    assert!(AudioFile::open(&path).is_err());

    Ok(())
}

#[test]
fn test_audio_file_nonexistent() {
    let path = PathBuf::from("/nonexistent/path/to/audio.wav");
    let result = AudioFile::open(&path);

    assert!(result.is_err(), "Opening nonexistent file should fail");
}
