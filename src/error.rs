//! VoiceFill Error Types
//!
//! Session-level failures are surfaced through [`VoiceFillError`]. Per-field
//! recognition problems never abort a session; they are described by
//! [`RecognitionErrorKind`] and absorbed by the retry/skip loop.

use std::fmt;
use thiserror::Error;

/// Central error type for VoiceFill
#[derive(Error, Debug)]
pub enum VoiceFillError {
    #[error("No fields configured for voice input")]
    NoFields,

    #[error("Microphone permission denied: {0}")]
    PermissionDenied(String),

    #[error("Speech recognition not supported: {0}")]
    UnsupportedPlatform(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Field schema error: {0}")]
    Schema(String),

    #[error("Channel error: {0}")]
    Channel(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

/// Result type alias for VoiceFill operations
pub type VoiceFillResult<T> = Result<T, VoiceFillError>;

/// Failure codes reported by a speech recognizer for one listening attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecognitionErrorKind {
    /// Nothing was heard (also used when the hard listening timeout expires)
    NoSpeech,
    /// The capture device failed
    AudioCapture,
    /// The attempt was aborted on purpose; never acted upon
    Aborted,
    /// Any other platform failure code
    Other(String),
}

impl RecognitionErrorKind {
    /// Map a platform error code onto a kind
    pub fn from_code(code: &str) -> Self {
        match code {
            "no-speech" => Self::NoSpeech,
            "audio-capture" => Self::AudioCapture,
            "aborted" => Self::Aborted,
            other => Self::Other(other.to_string()),
        }
    }

    /// Transient failures are retried with a spoken re-prompt
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::NoSpeech | Self::AudioCapture)
    }

    pub fn code(&self) -> &str {
        match self {
            Self::NoSpeech => "no-speech",
            Self::AudioCapture => "audio-capture",
            Self::Aborted => "aborted",
            Self::Other(code) => code,
        }
    }
}

impl fmt::Display for RecognitionErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}
