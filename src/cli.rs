//! Command-line interface.
//!
//! Argument parsing via clap derive macros.

use clap::{ArgGroup, Parser, Subcommand};
use std::path::PathBuf;

/// Real-time call transcription with fraud-intent flagging
#[derive(Parser, Debug)]
#[command(
    name = "callguard",
    version,
    about = "Real-time call transcription with fraud-intent flagging"
)]
#[command(group(ArgGroup::new("input").args(["live", "file"])))]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Capture from the microphone (default when no --file is given)
    #[arg(long)]
    pub live: bool,

    /// Process a WAV recording instead of live audio
    #[arg(long, value_name = "PATH")]
    pub file: Option<PathBuf>,

    /// Audio input device (see `callguard devices`)
    #[arg(long, value_name = "DEVICE")]
    pub device: Option<String>,

    /// Chunk duration. Examples: 4s, 2500ms
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub chunk: Option<u32>,

    /// Overlap between consecutive chunks. Examples: 1s, 500ms
    #[arg(long, value_name = "DURATION", value_parser = parse_duration_ms)]
    pub overlap: Option<u32>,

    /// Language hint for the backend (ISO 639-1)
    #[arg(long, value_name = "LANG")]
    pub language: Option<String>,

    /// Backend model name
    #[arg(long, value_name = "MODEL")]
    pub model: Option<String>,

    /// Transcription endpoint URL
    #[arg(long, value_name = "URL")]
    pub endpoint: Option<String>,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Suppress everything except the transcript itself
    #[arg(short, long)]
    pub quiet: bool,
}

/// Parse a duration string into milliseconds.
///
/// Supports any format accepted by `humantime`: bare numbers (milliseconds),
/// single-unit (`4s`, `500ms`), and compound (`1m30s`).
fn parse_duration_ms(s: &str) -> Result<u32, String> {
    let s = s.trim();
    if let Ok(ms) = s.parse::<u32>() {
        return Ok(ms);
    }
    let duration = humantime::parse_duration(s).map_err(|e| e.to_string())?;
    u32::try_from(duration.as_millis()).map_err(|_| format!("duration too long: {}", s))
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// List available audio input devices
    Devices,
}
