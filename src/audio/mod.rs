pub mod file;

pub use file::{pcm_duration_ms, samples_to_pcm_bytes, write_pcm_wav, AudioFile};
