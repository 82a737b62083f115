//! Audio source trait and test double.

use crate::error::{CallguardError, Result};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

/// Trait for audio sample producers.
///
/// Implementations hand back whatever samples have accumulated since the
/// previous read, as normalized mono f32 at the pipeline sample rate. An
/// empty batch means "nothing new yet" for live sources, or end-of-input
/// for finite ones.
pub trait AudioSource: Send {
    /// Start producing audio.
    fn start(&mut self) -> Result<()>;

    /// Stop producing audio.
    fn stop(&mut self) -> Result<()>;

    /// Drain accumulated samples.
    fn read_samples(&mut self) -> Result<Vec<f32>>;

    /// Whether this source ends on its own (file playback) rather than
    /// running until cancelled (microphone).
    fn is_finite(&self) -> bool;
}

/// Mock audio source for testing.
///
/// Plays back a scripted sequence of read batches, then returns empty reads.
/// Failures can be injected on any operation.
#[derive(Debug, Clone)]
pub struct MockAudioSource {
    batches: Vec<Vec<f32>>,
    position: usize,
    finite: bool,
    is_started: bool,
    should_fail_start: bool,
    should_fail_stop: bool,
    should_fail_read: bool,
    error_message: String,
    /// Shared across clones, so a clone kept by the test observes stops
    /// performed by the pipeline's copy.
    stop_calls: Arc<AtomicUsize>,
}

impl MockAudioSource {
    /// Creates a finite mock with no audio.
    pub fn new() -> Self {
        Self {
            batches: Vec::new(),
            position: 0,
            finite: true,
            is_started: false,
            should_fail_start: false,
            should_fail_stop: false,
            should_fail_read: false,
            error_message: "mock audio error".to_string(),
            stop_calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    /// Returns all samples in a single read.
    pub fn with_samples(mut self, samples: Vec<f32>) -> Self {
        self.batches = vec![samples];
        self
    }

    /// Returns the given batches one per read, in order.
    pub fn with_batches(mut self, batches: Vec<Vec<f32>>) -> Self {
        self.batches = batches;
        self
    }

    /// Marks the source as live (never-ending), like a microphone.
    pub fn live(mut self) -> Self {
        self.finite = false;
        self
    }

    /// Fails the next `start` call.
    pub fn with_start_failure(mut self) -> Self {
        self.should_fail_start = true;
        self
    }

    /// Fails the next `stop` call.
    pub fn with_stop_failure(mut self) -> Self {
        self.should_fail_stop = true;
        self
    }

    /// Fails every `read_samples` call.
    pub fn with_read_failure(mut self) -> Self {
        self.should_fail_read = true;
        self
    }

    /// Sets the message used for injected failures.
    pub fn with_error_message(mut self, message: &str) -> Self {
        self.error_message = message.to_string();
        self
    }

    pub fn is_started(&self) -> bool {
        self.is_started
    }

    /// Number of `stop` calls made so far, counting across clones.
    pub fn stop_count(&self) -> usize {
        self.stop_calls.load(Ordering::SeqCst)
    }
}

impl Default for MockAudioSource {
    fn default() -> Self {
        Self::new()
    }
}

impl AudioSource for MockAudioSource {
    fn start(&mut self) -> Result<()> {
        if self.should_fail_start {
            return Err(CallguardError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = true;
        Ok(())
    }

    fn stop(&mut self) -> Result<()> {
        self.stop_calls.fetch_add(1, Ordering::SeqCst);
        if self.should_fail_stop {
            return Err(CallguardError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        self.is_started = false;
        Ok(())
    }

    fn read_samples(&mut self) -> Result<Vec<f32>> {
        if self.should_fail_read {
            return Err(CallguardError::AudioCapture {
                message: self.error_message.clone(),
            });
        }
        if self.position >= self.batches.len() {
            return Ok(Vec::new());
        }
        let batch = self.batches[self.position].clone();
        self.position += 1;
        Ok(batch)
    }

    fn is_finite(&self) -> bool {
        self.finite
    }
}
