//! Default configuration constants for callguard.
//!
//! Shared across the config, CLI, and pipeline modules so the numbers only
//! live in one place.

/// Default audio sample rate in Hz.
///
/// 16kHz is the standard for speech recognition backends and keeps request
/// payloads small without hurting accuracy for voice.
pub const SAMPLE_RATE: u32 = 16_000;

/// Samples per frame (100ms at 16kHz).
///
/// The capture thread slices the incoming stream into frames of exactly this
/// many samples before enqueueing them.
pub const FRAME_SAMPLES: usize = 1_600;

/// Default chunk duration in milliseconds.
///
/// Each transcription request covers this much audio. Long enough for the
/// backend to produce coherent phrases, short enough for near-real-time
/// flagging.
pub const CHUNK_DURATION_MS: u32 = 4_000;

/// Default overlap between consecutive chunks in milliseconds.
///
/// Consecutive chunks share this much trailing audio so words split across a
/// chunk boundary appear whole in the next chunk; the duplicated text is
/// removed downstream by suffix/prefix matching.
pub const OVERLAP_MS: u32 = 1_000;

/// Characters of already-printed transcript retained for overlap comparison.
pub const PRINTED_TAIL_CHARS: usize = 200;

/// Capacity of the frame queue between the capture and worker threads.
///
/// 256 frames = ~25s of audio headroom while a slow backend call is in
/// flight. A full queue drops frames on live capture (with a warning) rather
/// than blocking the audio callback path.
pub const FRAME_QUEUE_CAPACITY: usize = 256;

/// How long the worker blocks on the frame queue before re-checking the
/// cancellation flag, in milliseconds.
pub const QUEUE_POLL_TIMEOUT_MS: u64 = 100;

/// Request timeout for a single transcription call, in seconds.
///
/// A hung backend otherwise stalls the whole pipeline; after this deadline
/// the per-chunk failure policy applies and the next chunk proceeds.
pub const BACKEND_TIMEOUT_SECS: u64 = 30;

/// Default transcription model name for OpenAI-compatible backends.
pub const BACKEND_MODEL: &str = "whisper-1";

/// Default transcription endpoint.
pub const BACKEND_ENDPOINT: &str = "https://api.openai.com/v1/audio/transcriptions";

/// Default language hint for transcription.
pub const LANGUAGE: &str = "en";

/// Environment variable holding the backend credential.
pub const API_KEY_VAR: &str = "OPENAI_API_KEY";

/// Convert a duration in milliseconds to a sample count at the given rate.
pub const fn ms_to_samples(ms: u32, sample_rate: u32) -> usize {
    (ms as u64 * sample_rate as u64 / 1000) as usize
}
