//! Error types for cache service requests.

use std::fmt;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, CacheError>;

/// Which stage of response decoding failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecodeStage {
    /// The body was not a JSON string.
    Json,
    /// The JSON string was not valid base64.
    Base64,
    /// The decoded bytes were not UTF-8.
    Utf8,
}

impl fmt::Display for DecodeStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let stage = match self {
            Self::Json => "json",
            Self::Base64 => "base64",
            Self::Utf8 => "utf-8",
        };
        f.write_str(stage)
    }
}

/// Errors that can occur talking to the cache service.
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Connection failure or an interrupted response body.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The cache answered with a non-success status where the operation treats
    /// that as fatal.
    #[error("Cache service returned unexpected status {status}")]
    UnexpectedStatus {
        /// HTTP status code.
        status: u16,
    },

    /// The response body could not be decoded.
    #[error("Failed to decode cache response ({stage} stage): {message}")]
    Decode {
        /// Stage that rejected the body.
        stage: DecodeStage,
        /// Underlying decoder message.
        message: String,
    },

    /// The instruction could not be serialized.
    #[error("Failed to encode cache instruction: {0}")]
    Encode(String),

    /// Invalid client configuration.
    #[error("Config error: {0}")]
    Config(String),
}

impl CacheError {
    pub(crate) fn decode(stage: DecodeStage, message: impl fmt::Display) -> Self {
        Self::Decode {
            stage,
            message: message.to_string(),
        }
    }

    /// Check if the cache service could not be reached at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_))
    }
}

impl From<reqwest::Error> for CacheError {
    fn from(e: reqwest::Error) -> Self {
        CacheError::Transport(e.to_string())
    }
}
