//! Error types for callguard.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CallguardError {
    // Configuration errors
    #[error("Configuration file not found at {path}")]
    ConfigFileNotFound { path: String },

    #[error("Invalid configuration value for {key}: {message}")]
    ConfigInvalidValue { key: String, message: String },

    #[error("Configuration error: {0}")]
    Config(#[from] toml::de::Error),

    // Startup errors
    #[error("Missing backend credential: set the {var} environment variable")]
    MissingCredential { var: String },

    // Audio capture errors
    #[error("Audio device not found: {device}")]
    AudioDeviceNotFound { device: String },

    #[error("Audio capture failed: {message}")]
    AudioCapture { message: String },

    // Transcription backend errors
    #[error("Audio encoding failed: {message}")]
    AudioEncoding { message: String },

    #[error("Transcription request failed: {message}")]
    Transcription { message: String },

    #[error("Transcription backend returned {status}: {body}")]
    BackendStatus { status: u16, body: String },

    // General I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic error for cases not covered above
    #[error("{0}")]
    Other(String),
}

// Type alias for convenience
pub type Result<T> = std::result::Result<T, CallguardError>;

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_missing_credential_display() {
        let error = CallguardError::MissingCredential {
            var: "OPENAI_API_KEY".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Missing backend credential: set the OPENAI_API_KEY environment variable"
        );
    }

    #[test]
    fn test_audio_device_not_found_display() {
        let error = CallguardError::AudioDeviceNotFound {
            device: "default".to_string(),
        };
        assert_eq!(error.to_string(), "Audio device not found: default");
    }

    #[test]
    fn test_audio_capture_display() {
        let error = CallguardError::AudioCapture {
            message: "buffer overflow".to_string(),
        };
        assert_eq!(error.to_string(), "Audio capture failed: buffer overflow");
    }

    #[test]
    fn test_transcription_display() {
        let error = CallguardError::Transcription {
            message: "connection refused".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transcription request failed: connection refused"
        );
    }

    #[test]
    fn test_backend_status_display() {
        let error = CallguardError::BackendStatus {
            status: 429,
            body: "rate limited".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Transcription backend returned 429: rate limited"
        );
    }

    #[test]
    fn test_config_invalid_value_display() {
        let error = CallguardError::ConfigInvalidValue {
            key: "overlap".to_string(),
            message: "must be shorter than chunk".to_string(),
        };
        assert_eq!(
            error.to_string(),
            "Invalid configuration value for overlap: must be shorter than chunk"
        );
    }

    #[test]
    fn test_from_io_error() {
        let io_error = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let error: CallguardError = io_error.into();
        assert!(error.to_string().contains("file not found"));
    }

    #[test]
    fn test_from_toml_error() {
        let toml_error = toml::from_str::<toml::Value>("invalid = toml = syntax").unwrap_err();
        let error: CallguardError = toml_error.into();
        assert!(error.to_string().contains("Configuration error"));
    }

    #[test]
    fn test_error_is_send_and_sync() {
        fn assert_send<T: Send>() {}
        fn assert_sync<T: Sync>() {}

        assert_send::<CallguardError>();
        assert_sync::<CallguardError>();
    }

    #[test]
    fn test_result_type_alias() {
        fn returns_result() -> Result<i32> {
            Ok(42)
        }
        assert_eq!(returns_result().unwrap(), 42);
    }
}
