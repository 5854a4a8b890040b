use anyhow::{Context, Result};
use hound::{SampleFormat, WavReader};
use std::path::Path;
use tracing::info;

/// A WAV recording loaded as 16-bit PCM
pub struct AudioFile {
    pub path: String,
    pub duration_seconds: f64,
    pub sample_rate: u32,
    pub channels: u16,
    pub samples: Vec<i16>,
}

impl AudioFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        info!("Opening audio file: {}", path.display());

        let reader = WavReader::open(path)
            .with_context(|| format!("Failed to open WAV file: {}", path.display()))?;

        let spec = reader.spec();
        if spec.sample_format != SampleFormat::Int || spec.bits_per_sample != 16 {
            anyhow::bail!(
                "Unsupported WAV format: {}-bit {:?} (expected 16-bit PCM)",
                spec.bits_per_sample,
                spec.sample_format
            );
        }

        let samples: Vec<i16> = reader
            .into_samples::<i16>()
            .collect::<Result<Vec<_>, _>>()
            .context("Failed to read audio samples")?;

        let duration_seconds =
            samples.len() as f64 / (spec.sample_rate as f64 * spec.channels as f64);

        info!(
            "Audio file loaded: {:.1}s, {}Hz, {} channels, {} samples",
            duration_seconds,
            spec.sample_rate,
            spec.channels,
            samples.len()
        );

        Ok(Self {
            path: path.display().to_string(),
            duration_seconds,
            sample_rate: spec.sample_rate,
            channels: spec.channels,
            samples,
        })
    }

    /// Mono little-endian PCM bytes, ready for a recognizer
    ///
    /// Stereo input is averaged per frame; other layouts keep the first channel.
    pub fn to_mono_pcm_bytes(&self) -> Vec<u8> {
        let mono: Vec<i16> = match self.channels {
            0 | 1 => self.samples.clone(),
            2 => self
                .samples
                .chunks_exact(2)
                .map(|frame| ((frame[0] as i32 + frame[1] as i32) / 2) as i16)
                .collect(),
            n => self
                .samples
                .chunks_exact(n as usize)
                .map(|frame| frame[0])
                .collect(),
        };

        samples_to_pcm_bytes(&mono)
    }
}

/// Encode samples as little-endian 16-bit PCM
pub fn samples_to_pcm_bytes(samples: &[i16]) -> Vec<u8> {
    samples.iter().flat_map(|s| s.to_le_bytes()).collect()
}

/// Playback length of 16-bit mono PCM, in milliseconds
pub fn pcm_duration_ms(byte_len: usize, sample_rate: u32) -> f64 {
    if sample_rate == 0 {
        return 0.0;
    }
    let samples = (byte_len / 2) as f64;
    samples / sample_rate as f64 * 1000.0
}

/// Write 16-bit mono PCM to a WAV file
pub fn write_pcm_wav(path: impl AsRef<Path>, pcm: &[u8], sample_rate: u32) -> Result<()> {
    let path = path.as_ref();
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let mut writer = hound::WavWriter::create(path, spec)
        .with_context(|| format!("Failed to create WAV file: {}", path.display()))?;
    for pair in pcm.chunks_exact(2) {
        writer
            .write_sample(i16::from_le_bytes([pair[0], pair[1]]))
            .context("Failed to write sample to WAV")?;
    }
    writer.finalize().context("Failed to finalize WAV file")?;

    info!("Wrote {} bytes of audio to {}", pcm.len(), path.display());
    Ok(())
}
