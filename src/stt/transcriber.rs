//! Transcriber trait and test double.

use crate::error::{CallguardError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// Trait for speech-to-text transcription.
///
/// Implementations receive one chunk's worth of normalized mono samples and
/// return plain text (possibly empty). Blocking is expected; the worker
/// thread issues one call at a time.
pub trait Transcriber: Send + Sync {
    /// Transcribe audio samples to text.
    ///
    /// # Arguments
    /// * `samples` - Normalized mono samples at the pipeline sample rate
    fn transcribe(&self, samples: &[f32]) -> Result<String>;
}

/// Mock transcriber for testing.
///
/// Returns queued responses in order (repeating the last one when the queue
/// runs dry) and can be told to fail on specific calls.
pub struct MockTranscriber {
    responses: Vec<String>,
    fail_on_calls: Vec<usize>,
    delay: Duration,
    call_count: AtomicUsize,
    received_lengths: Mutex<Vec<usize>>,
}

impl MockTranscriber {
    /// Creates a mock that returns an empty transcript.
    pub fn new() -> Self {
        Self {
            responses: Vec::new(),
            fail_on_calls: Vec::new(),
            delay: Duration::ZERO,
            call_count: AtomicUsize::new(0),
            received_lengths: Mutex::new(Vec::new()),
        }
    }

    /// Returns `response` for every call.
    pub fn with_response(mut self, response: &str) -> Self {
        self.responses = vec![response.to_string()];
        self
    }

    /// Returns the given responses in call order, repeating the last.
    pub fn with_responses(mut self, responses: &[&str]) -> Self {
        self.responses = responses.iter().map(|s| s.to_string()).collect();
        self
    }

    /// Fails the call with the given zero-based index.
    pub fn failing_on_call(mut self, call: usize) -> Self {
        self.fail_on_calls.push(call);
        self
    }

    /// Sleeps for `delay` inside every call, simulating a slow backend.
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Number of transcribe calls made so far.
    pub fn call_count(&self) -> usize {
        self.call_count.load(Ordering::SeqCst)
    }

    /// Sample counts of each received chunk, in call order.
    pub fn received_lengths(&self) -> Vec<usize> {
        self.received_lengths
            .lock()
            .map(|l| l.clone())
            .unwrap_or_default()
    }
}

impl Default for MockTranscriber {
    fn default() -> Self {
        Self::new()
    }
}

impl Transcriber for MockTranscriber {
    fn transcribe(&self, samples: &[f32]) -> Result<String> {
        let call = self.call_count.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut lengths) = self.received_lengths.lock() {
            lengths.push(samples.len());
        }

        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }

        if self.fail_on_calls.contains(&call) {
            return Err(CallguardError::Transcription {
                message: format!("mock failure on call {}", call),
            });
        }

        let response = match self.responses.len() {
            0 => String::new(),
            n => self.responses[call.min(n - 1)].clone(),
        };
        Ok(response)
    }
}
