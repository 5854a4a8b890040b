//! One voice turn end to end: transcription, response generation, synthesis

mod coordinator;
mod responder;

pub use coordinator::{PipelineCoordinator, TurnOutcome};
pub use responder::{EchoResponder, Responder};
