//! callguard - Real-time call transcription with fraud-intent flagging
//!
//! Streams audio (microphone or WAV file) through overlapping chunks to a
//! remote speech-to-text backend, removes the overlap duplication from the
//! transcript, and scores each emitted delta against a fraud-intent rule
//! table.

#![warn(clippy::unwrap_used)]
#![warn(clippy::expect_used)]
#![warn(clippy::let_underscore_must_use)]

pub mod audio;
pub mod cli;
pub mod config;
pub mod defaults;
pub mod error;
pub mod pipeline;
pub mod risk;
pub mod stt;

// Core traits (source → process → sink)
pub use audio::source::AudioSource;
pub use pipeline::sink::{CollectorSink, StdoutSink, TranscriptSink};
pub use stt::transcriber::Transcriber;

// Pipeline
pub use pipeline::supervisor::{PipelineHandle, PipelineSupervisor, SupervisorConfig};

// Risk scoring
pub use risk::scanner::{RiskFinding, RiskLevel, RiskScanner};

// Error handling
pub use error::{CallguardError, Result};

// Config
pub use config::Config;
