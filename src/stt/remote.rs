//! HTTP client for OpenAI-compatible transcription backends.

use crate::audio::wav::encode_wav;
use crate::defaults;
use crate::error::{CallguardError, Result};
use crate::stt::transcriber::Transcriber;
use reqwest::blocking::multipart::{Form, Part};
use reqwest::blocking::Client;
use std::time::Duration;

/// Connection settings for the remote backend.
#[derive(Debug, Clone)]
pub struct RemoteConfig {
    /// Transcription endpoint, e.g. `https://api.openai.com/v1/audio/transcriptions`.
    pub endpoint: String,
    /// Model name sent with each request.
    pub model: String,
    /// Language hint (ISO 639-1).
    pub language: String,
    /// Sample rate of the submitted audio.
    pub sample_rate: u32,
    /// Per-request deadline.
    pub timeout: Duration,
}

impl Default for RemoteConfig {
    fn default() -> Self {
        Self {
            endpoint: defaults::BACKEND_ENDPOINT.to_string(),
            model: defaults::BACKEND_MODEL.to_string(),
            language: defaults::LANGUAGE.to_string(),
            sample_rate: defaults::SAMPLE_RATE,
            timeout: Duration::from_secs(defaults::BACKEND_TIMEOUT_SECS),
        }
    }
}

/// Synchronous transcription client.
///
/// Each call encodes the chunk as a 16-bit PCM WAV in memory and issues one
/// multipart POST. No retries: a chunk's audio is time-sensitive, and a
/// retried result would arrive too late to be worth printing. Failures are
/// returned to the worker, which logs and substitutes an empty transcript.
pub struct RemoteTranscriber {
    config: RemoteConfig,
    api_key: String,
    client: Client,
}

impl RemoteTranscriber {
    /// Creates a client.
    ///
    /// # Errors
    /// Fails if the HTTP client cannot be constructed.
    pub fn new(config: RemoteConfig, api_key: String) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| CallguardError::Transcription {
                message: format!("failed to build HTTP client: {}", e),
            })?;
        Ok(Self {
            config,
            api_key,
            client,
        })
    }

    /// Reads the backend credential from the environment.
    ///
    /// Missing or empty is a fatal startup condition; callers check this
    /// before any audio is captured.
    pub fn api_key_from_env() -> Result<String> {
        match std::env::var(defaults::API_KEY_VAR) {
            Ok(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(CallguardError::MissingCredential {
                var: defaults::API_KEY_VAR.to_string(),
            }),
        }
    }
}

impl Transcriber for RemoteTranscriber {
    fn transcribe(&self, samples: &[f32]) -> Result<String> {
        let wav_bytes = encode_wav(samples, self.config.sample_rate)?;

        let part = Part::bytes(wav_bytes)
            .file_name("chunk.wav")
            .mime_str("audio/wav")
            .map_err(|e| CallguardError::Transcription {
                message: format!("invalid request part: {}", e),
            })?;

        let form = Form::new()
            .part("file", part)
            .text("model", self.config.model.clone())
            .text("language", self.config.language.clone())
            .text("response_format", "text");

        let response = self
            .client
            .post(&self.config.endpoint)
            .bearer_auth(&self.api_key)
            .multipart(form)
            .send()
            .map_err(|e| CallguardError::Transcription {
                message: e.to_string(),
            })?;

        let status = response.status();
        let body = response.text().map_err(|e| CallguardError::Transcription {
            message: format!("failed to read response body: {}", e),
        })?;

        if !status.is_success() {
            return Err(CallguardError::BackendStatus {
                status: status.as_u16(),
                body: body.chars().take(200).collect(),
            });
        }

        Ok(body)
    }
}
