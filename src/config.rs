//! Configuration: TOML file, environment overrides, CLI flags on top.

use crate::defaults;
use crate::error::{CallguardError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Root configuration structure.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub audio: AudioConfig,
    pub chunking: ChunkingConfig,
    pub backend: BackendConfig,
}

/// Audio capture configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AudioConfig {
    pub device: Option<String>,
    pub sample_rate: u32,
}

/// Chunk geometry configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChunkingConfig {
    pub chunk_ms: u32,
    pub overlap_ms: u32,
}

/// Transcription backend configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BackendConfig {
    pub endpoint: String,
    pub model: String,
    pub language: String,
    pub timeout_secs: u64,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            device: None,
            sample_rate: defaults::SAMPLE_RATE,
        }
    }
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_ms: defaults::CHUNK_DURATION_MS,
            overlap_ms: defaults::OVERLAP_MS,
        }
    }
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::BACKEND_ENDPOINT.to_string(),
            model: defaults::BACKEND_MODEL.to_string(),
            language: defaults::LANGUAGE.to_string(),
            timeout_secs: defaults::BACKEND_TIMEOUT_SECS,
        }
    }
}

impl Config {
    /// Load configuration from a TOML file.
    ///
    /// Missing fields fall back to defaults; invalid TOML is an error.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                CallguardError::ConfigFileNotFound {
                    path: path.display().to_string(),
                }
            } else {
                CallguardError::Io(e)
            }
        })?;
        let config: Config = toml::from_str(&contents)?;
        Ok(config)
    }

    /// Load configuration from a file, or defaults if the file is missing.
    ///
    /// A file that exists but fails to parse is still an error; silently
    /// ignoring a typo'd config hides user mistakes.
    pub fn load_or_default(path: &Path) -> Result<Self> {
        match Self::load(path) {
            Ok(config) => Ok(config),
            Err(CallguardError::ConfigFileNotFound { .. }) => Ok(Self::default()),
            Err(e) => Err(e),
        }
    }

    /// Apply environment variable overrides.
    ///
    /// Supported variables:
    /// - CALLGUARD_ENDPOINT → backend.endpoint
    /// - CALLGUARD_MODEL → backend.model
    /// - CALLGUARD_LANGUAGE → backend.language
    /// - CALLGUARD_AUDIO_DEVICE → audio.device
    pub fn with_env_overrides(mut self) -> Self {
        if let Ok(endpoint) = std::env::var("CALLGUARD_ENDPOINT") {
            if !endpoint.is_empty() {
                self.backend.endpoint = endpoint;
            }
        }

        if let Ok(model) = std::env::var("CALLGUARD_MODEL") {
            if !model.is_empty() {
                self.backend.model = model;
            }
        }

        if let Ok(language) = std::env::var("CALLGUARD_LANGUAGE") {
            if !language.is_empty() {
                self.backend.language = language;
            }
        }

        if let Ok(device) = std::env::var("CALLGUARD_AUDIO_DEVICE") {
            if !device.is_empty() {
                self.audio.device = Some(device);
            }
        }

        self
    }

    /// Validate cross-field constraints that serde cannot express.
    pub fn validate(&self) -> Result<()> {
        if self.chunking.chunk_ms == 0 {
            return Err(CallguardError::ConfigInvalidValue {
                key: "chunking.chunk_ms".to_string(),
                message: "chunk duration must be non-zero".to_string(),
            });
        }
        if self.chunking.overlap_ms >= self.chunking.chunk_ms {
            return Err(CallguardError::ConfigInvalidValue {
                key: "chunking.overlap_ms".to_string(),
                message: format!(
                    "overlap ({} ms) must be strictly shorter than the chunk ({} ms)",
                    self.chunking.overlap_ms, self.chunking.chunk_ms
                ),
            });
        }
        if self.audio.sample_rate == 0 {
            return Err(CallguardError::ConfigInvalidValue {
                key: "audio.sample_rate".to_string(),
                message: "sample rate must be non-zero".to_string(),
            });
        }
        Ok(())
    }

    /// Default configuration file path: ~/.config/callguard/config.toml.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("callguard").join("config.toml"))
    }
}
