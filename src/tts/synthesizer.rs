use crate::error::CollaboratorError;
use futures::stream::BoxStream;

/// Audio chunks from a synthesizer, 16-bit PCM in arrival order.
pub type AudioChunkStream = BoxStream<'static, Result<Vec<u8>, CollaboratorError>>;

/// Speech synthesis service
///
/// Streaming-first: buffered synthesis is built on top of `synthesize` by
/// collecting every chunk.
#[async_trait::async_trait]
pub trait Synthesizer: Send + Sync {
    /// Start synthesizing `text`, returning its audio as a chunk stream
    async fn synthesize(&self, text: &str) -> Result<AudioChunkStream, CollaboratorError>;

    /// Get synthesizer name for logging
    fn name(&self) -> &str;
}
