//! Overlapping chunk extraction.
//!
//! Accumulates frames and emits chunks of exactly `chunk_frames` samples,
//! retaining the trailing `overlap_frames` samples as the seed of the next
//! chunk. The shared audio lets the text-level dedup downstream find a real
//! duplicate at each chunk boundary instead of a coincidental one.

use crate::defaults::{self, ms_to_samples};
use crate::pipeline::types::{Chunk, Frame};

/// Configuration for the chunker.
#[derive(Debug, Clone)]
pub struct ChunkerConfig {
    /// Samples per emitted chunk.
    pub chunk_frames: usize,
    /// Samples shared between consecutive chunks. Must be < `chunk_frames`.
    pub overlap_frames: usize,
}

impl ChunkerConfig {
    /// Builds a config from durations at a given sample rate.
    pub fn from_durations(chunk_ms: u32, overlap_ms: u32, sample_rate: u32) -> Self {
        Self {
            chunk_frames: ms_to_samples(chunk_ms, sample_rate),
            overlap_frames: ms_to_samples(overlap_ms, sample_rate),
        }
    }

    /// Returns true when the overlap is strictly shorter than the chunk and
    /// the chunk is non-empty.
    pub fn is_valid(&self) -> bool {
        self.chunk_frames > 0 && self.overlap_frames < self.chunk_frames
    }
}

impl Default for ChunkerConfig {
    fn default() -> Self {
        Self::from_durations(
            defaults::CHUNK_DURATION_MS,
            defaults::OVERLAP_MS,
            defaults::SAMPLE_RATE,
        )
    }
}

/// Accumulates frames and emits overlapping fixed-size chunks.
pub struct Chunker {
    config: ChunkerConfig,
    /// Samples not yet emitted (includes the retained overlap).
    buffer: Vec<f32>,
    /// Next chunk sequence to emit.
    next_sequence: u64,
}

impl Chunker {
    /// Creates a chunker. The config must satisfy
    /// `overlap_frames < chunk_frames`.
    pub fn new(config: ChunkerConfig) -> Self {
        debug_assert!(config.is_valid());
        Self {
            config,
            buffer: Vec::new(),
            next_sequence: 0,
        }
    }

    /// Number of buffered samples that cannot yet form a chunk.
    pub fn buffered_samples(&self) -> usize {
        self.buffer.len()
    }

    /// Appends a frame and returns every chunk that became complete.
    ///
    /// Each emitted chunk holds exactly `chunk_frames` samples; the buffer
    /// keeps the trailing `overlap_frames` of each emission.
    pub fn push(&mut self, frame: &Frame) -> Vec<Chunk> {
        self.buffer.extend_from_slice(&frame.samples);

        let mut chunks = Vec::new();
        while self.buffer.len() >= self.config.chunk_frames {
            let samples = self.buffer[..self.config.chunk_frames].to_vec();
            let retain_from = self.config.chunk_frames - self.config.overlap_frames;
            self.buffer.drain(..retain_from);

            chunks.push(Chunk {
                sequence: self.next_sequence,
                samples,
            });
            self.next_sequence += 1;
        }
        chunks
    }

    /// Discards buffered samples smaller than one chunk.
    ///
    /// Called at shutdown; leftovers cannot form a full chunk and are never
    /// transcribed.
    pub fn discard_partial(&mut self) -> usize {
        let dropped = self.buffer.len();
        self.buffer.clear();
        dropped
    }
}
