use std::time::Duration;
use thiserror::Error;

/// Failure reported by an external collaborator (recognizer, synthesizer, responder).
#[derive(Error, Debug, Clone, PartialEq)]
pub enum CollaboratorError {
    #[error("service unavailable: {0}")]
    Unavailable(String),

    #[error("request timed out after {}ms", .0.as_millis())]
    Timeout(Duration),

    #[error("request rejected: {0}")]
    Rejected(String),

    #[error("transport error: {0}")]
    Transport(String),

    #[error("malformed response: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    #[error("illegal state: {0}")]
    IllegalState(String),

    /// A retried collaborator call that exhausted its retries, surfaced unchanged.
    #[error(transparent)]
    Collaborator(#[from] CollaboratorError),

    #[error("TTS synthesis failed: {source}")]
    SynthesisFailed {
        #[source]
        source: CollaboratorError,
    },

    /// Mid-stream failure. Streams are never retried.
    #[error("stream failed: {0}")]
    Stream(#[source] CollaboratorError),
}

impl VoiceError {
    /// The collaborator failure underneath this error, if there is one.
    pub fn collaborator_cause(&self) -> Option<&CollaboratorError> {
        match self {
            VoiceError::Collaborator(e) => Some(e),
            VoiceError::SynthesisFailed { source } => Some(source),
            VoiceError::Stream(e) => Some(e),
            VoiceError::InvalidArgument(_) | VoiceError::IllegalState(_) => None,
        }
    }
}
