use crate::defaults;
use crate::error::{LivecapError, Result};
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

/// One time-aligned piece of a transcription, as reported by the model.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// Segment start, milliseconds from the beginning of the buffer.
    pub start_ms: u64,
    /// Segment end, milliseconds from the beginning of the buffer.
    pub end_ms: u64,
    /// Segment text, trimmed.
    pub text: String,
}

/// Result of one transcription call.
#[derive(Debug, Clone, PartialEq)]
pub struct Transcription {
    /// Full transcribed text, leading/trailing whitespace stripped.
    /// May be empty for silence or noise.
    pub text: String,
    /// Time-aligned segments. Used by batch file transcription; the live
    /// loop only reads `text`.
    pub segments: Vec<Segment>,
}

impl Transcription {
    /// A transcription carrying only text, no segment timing.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            segments: Vec::new(),
        }
    }
}

/// Trait for speech-to-text transcription.
///
/// This trait allows swapping implementations (real Whisper vs mock).
/// A call is synchronous, blocking, and one-shot: there is no streaming or
/// partial-result contract.
pub trait Transcriber: Send + Sync {
    /// Transcribe normalized audio to text.
    ///
    /// # Arguments
    /// * `audio` - f32 samples in [-1, 1], mono, at the configured rate
    fn transcribe(&self, audio: &[f32]) -> Result<Transcription>;

    /// Get the name of the loaded model
    fn model_name(&self) -> &str;

    /// Check if the transcriber is ready
    fn is_ready(&self) -> bool;
}

/// Implement Transcriber for Arc<T> to allow sharing across threads.
impl<T: Transcriber> Transcriber for Arc<T> {
    fn transcribe(&self, audio: &[f32]) -> Result<Transcription> {
        (**self).transcribe(audio)
    }

    fn model_name(&self) -> &str {
        (**self).model_name()
    }

    fn is_ready(&self) -> bool {
        (**self).is_ready()
    }
}

/// Mock transcriber for testing
pub struct MockTranscriber {
    model_name: String,
    response: String,
    should_fail: bool,
    fail_after: Option<usize>,
    calls: AtomicUsize,
}

impl MockTranscriber {
    /// Create a new mock transcriber with default settings
    pub fn new(model_name: &str) -> Self {
        Self {
            model_name: model_name.to_string(),
            response: "mock transcription".to_string(),
            should_fail: false,
            fail_after: None,
            calls: AtomicUsize::new(0),
        }
    }

    /// Configure the mock to return a specific response
    pub fn with_response(mut self, response: &str) -> Self {
        self.response = response.to_string();
        self
    }

    /// Configure the mock to fail on every transcribe call
    pub fn with_failure(mut self) -> Self {
        self.should_fail = true;
        self
    }

    /// Configure the mock to succeed `n` times, then fail
    pub fn with_failure_after(mut self, n: usize) -> Self {
        self.fail_after = Some(n);
        self
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, audio: &[f32]) -> Result<Transcription> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail || self.fail_after.is_some_and(|n| call >= n) {
            return Err(LivecapError::Transcription {
                message: "mock transcription failure".to_string(),
            });
        }

        let duration_ms = audio.len() as u64 * 1000 / defaults::SAMPLE_RATE as u64;
        Ok(Transcription {
            text: self.response.clone(),
            segments: vec![Segment {
                start_ms: 0,
                end_ms: duration_ms,
                text: self.response.clone(),
            }],
        })
    }

    fn model_name(&self) -> &str {
        &self.model_name
    }

    fn is_ready(&self) -> bool {
        !self.should_fail
    }
}
