use crate::error::CollaboratorError;

/// Response generation service: turns a transcript into the text to speak back
#[async_trait::async_trait]
pub trait Responder: Send + Sync {
    async fn respond(&self, transcript: &str) -> Result<String, CollaboratorError>;

    fn name(&self) -> &str;
}

/// Development responder that repeats what it heard
#[derive(Debug, Clone, Default)]
pub struct EchoResponder;

impl EchoResponder {
    pub const GREETING: &'static str = "Hello! I'm listening. How can I help you today?";
}

#[async_trait::async_trait]
impl Responder for EchoResponder {
    async fn respond(&self, transcript: &str) -> Result<String, CollaboratorError> {
        let transcript = transcript.trim();
        if transcript.is_empty() {
            return Ok(Self::GREETING.to_string());
        }
        Ok(format!("I heard you say: {}", transcript))
    }

    fn name(&self) -> &str {
        "echo"
    }
}
