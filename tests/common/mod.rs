// Scripted collaborators shared by the integration tests
#![allow(dead_code)]

use futures::stream;
use launchpad_voice::error::CollaboratorError;
use launchpad_voice::stt::{
    AudioInputStream, Recognizer, RecognizerEvent, RecognizerEventStream, SpeechAlternative,
    StreamOptions,
};
use launchpad_voice::tts::{AudioChunkStream, Synthesizer};
use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Recognizer that replays queued outcomes, then repeats `fallback`
pub struct MockRecognizer {
    outcomes: Mutex<VecDeque<Result<String, CollaboratorError>>>,
    fallback: Result<String, CollaboratorError>,
    events: Mutex<Vec<Result<RecognizerEvent, CollaboratorError>>>,
    stream_error: Option<CollaboratorError>,
    stream_options: Mutex<Option<StreamOptions>>,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockRecognizer {
    pub fn always(text: &str) -> Self {
        Self::scripted(Vec::new(), Ok(text.to_string()))
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self::scripted(Vec::new(), Err(error))
    }

    pub fn scripted(
        outcomes: Vec<Result<String, CollaboratorError>>,
        fallback: Result<String, CollaboratorError>,
    ) -> Self {
        Self {
            outcomes: Mutex::new(outcomes.into()),
            fallback,
            events: Mutex::new(Vec::new()),
            stream_error: None,
            stream_options: Mutex::new(None),
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    /// Events returned by the next `stream` call
    pub fn with_events(self, events: Vec<Result<RecognizerEvent, CollaboratorError>>) -> Self {
        *self.events.lock().unwrap() = events;
        self
    }

    /// Make every `stream` call fail to open
    pub fn with_stream_error(mut self, error: CollaboratorError) -> Self {
        self.stream_error = Some(error);
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Options passed to the most recent `stream` call
    pub fn last_stream_options(&self) -> Option<StreamOptions> {
        self.stream_options.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl Recognizer for MockRecognizer {
    async fn recognize(&self, _audio: &[u8], _sample_rate: u32) -> Result<String, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let next = self.outcomes.lock().unwrap().pop_front();
        next.unwrap_or_else(|| self.fallback.clone())
    }

    async fn stream(
        &self,
        _audio: AudioInputStream,
        options: StreamOptions,
    ) -> Result<RecognizerEventStream, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self.stream_options.lock().unwrap() = Some(options);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        if let Some(e) = &self.stream_error {
            return Err(e.clone());
        }
        let events = std::mem::take(&mut *self.events.lock().unwrap());
        Ok(Box::pin(stream::iter(events)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// What one `synthesize` call produces
#[derive(Clone)]
pub enum SynthesisScript {
    Chunks(Vec<Vec<u8>>),
    FailToOpen(CollaboratorError),
    FailAfter(Vec<Vec<u8>>, CollaboratorError),
}

/// Synthesizer that replays queued scripts, then repeats `fallback`
pub struct MockSynthesizer {
    scripts: Mutex<VecDeque<SynthesisScript>>,
    fallback: SynthesisScript,
    delay: Duration,
    calls: AtomicUsize,
}

impl MockSynthesizer {
    pub fn always(chunks: Vec<Vec<u8>>) -> Self {
        Self::scripted(Vec::new(), SynthesisScript::Chunks(chunks))
    }

    pub fn failing(error: CollaboratorError) -> Self {
        Self::scripted(Vec::new(), SynthesisScript::FailToOpen(error))
    }

    pub fn scripted(scripts: Vec<SynthesisScript>, fallback: SynthesisScript) -> Self {
        Self {
            scripts: Mutex::new(scripts.into()),
            fallback,
            delay: Duration::ZERO,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait::async_trait]
impl Synthesizer for MockSynthesizer {
    async fn synthesize(&self, _text: &str) -> Result<AudioChunkStream, CollaboratorError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }
        let script = self
            .scripts
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| self.fallback.clone());

        let items: Vec<Result<Vec<u8>, CollaboratorError>> = match script {
            SynthesisScript::Chunks(chunks) => chunks.into_iter().map(Ok).collect(),
            SynthesisScript::FailToOpen(e) => return Err(e),
            SynthesisScript::FailAfter(chunks, e) => chunks
                .into_iter()
                .map(Ok)
                .chain(std::iter::once(Err(e)))
                .collect(),
        };
        Ok(Box::pin(stream::iter(items)))
    }

    fn name(&self) -> &str {
        "mock"
    }
}

/// Seconds since the Unix epoch, as recognizers report speech times
pub fn now_secs() -> f64 {
    chrono::Utc::now().timestamp_micros() as f64 / 1_000_000.0
}

pub fn alternative(text: &str, start_time: f64) -> SpeechAlternative {
    SpeechAlternative {
        text: text.to_string(),
        confidence: Some(0.9),
        start_time,
        end_time: start_time + 1.0,
    }
}

/// No delay between retries, so failure paths run instantly
pub fn fast_retry(max_retries: u32) -> launchpad_voice::RetryPolicy {
    launchpad_voice::RetryPolicy::new(max_retries, Duration::ZERO, Duration::ZERO, 2.0)
}
