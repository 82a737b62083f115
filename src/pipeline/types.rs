//! Data types that flow between the capture thread and the worker.

/// A fixed-size frame of normalized mono samples.
///
/// Produced by the capture thread, consumed exactly once by the worker.
/// Samples are in the range −1.0..1.0; quantization to 16-bit PCM happens
/// only at the backend boundary.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Arrival order, starting at 0.
    pub sequence: u64,
    /// Normalized mono samples.
    pub samples: Vec<f32>,
}

impl Frame {
    /// Creates a new frame.
    pub fn new(sequence: u64, samples: Vec<f32>) -> Self {
        Self { sequence, samples }
    }

    /// Returns the duration of this frame in milliseconds.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        (self.samples.len() as u64 * 1000 / sample_rate as u64) as u32
    }
}

/// A chunk of audio covering exactly `chunk_frames` samples, sent as one
/// transcription request.
///
/// Consecutive chunks share `overlap_frames` samples: this chunk's first
/// `overlap_frames` samples equal the previous chunk's last `overlap_frames`.
#[derive(Debug, Clone)]
pub struct Chunk {
    /// Emission order, starting at 0.
    pub sequence: u64,
    /// Exactly `chunk_frames` normalized mono samples.
    pub samples: Vec<f32>,
}

impl Chunk {
    /// Returns the duration of this chunk in milliseconds.
    pub fn duration_ms(&self, sample_rate: u32) -> u32 {
        (self.samples.len() as u64 * 1000 / sample_rate as u64) as u32
    }
}

/// Raw backend text for one chunk. May be empty (silence, or a failed
/// request downgraded to empty by the worker).
#[derive(Debug, Clone)]
pub struct TranscriptFragment {
    /// Sequence of the chunk this text came from.
    pub chunk_sequence: u64,
    /// Backend output, untrimmed.
    pub text: String,
}
