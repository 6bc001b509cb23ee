//! Error types for session binding.

use tether_cache::CacheError;
use tether_token::{TokenError, WindowViolation};

/// Error type for session operations.
///
/// Every variant names the phase that failed. Nothing is retried.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The token authority rejected the issuance parameters.
    #[error("Token issuance failed: {0}")]
    Issuance(#[source] TokenError),

    /// The cache service could not be reached.
    #[error("Transport error: {0}")]
    Transport(String),

    /// The cache answered with a status the operation treats as fatal.
    #[error("Cache service returned unexpected status {status}")]
    UnexpectedStatus { status: u16 },

    /// A cache response or presented token could not be decoded.
    #[error("Decode error: {0}")]
    Decode(String),

    /// The issued payload could not be serialized for storage.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The cache acknowledged the store without confirming it.
    #[error("Session was not stored")]
    SessionNotStored,

    /// No record exists for the presented token.
    #[error("Session does not exist")]
    SessionDoesNotExist,

    /// The presented token is outside its time window.
    #[error("Invalid token window: {0}")]
    WindowInvalid(WindowViolation),

    /// The requested audience is not among the token's audiences.
    #[error("Audience '{audience}' not found in token")]
    AudienceMismatch { audience: String },

    /// The cached record failed to parse or re-validate.
    #[error("Stored session payload is invalid: {0}")]
    StoredPayloadInvalid(String),

    /// Invalid binder configuration.
    #[error("Config error: {0}")]
    Config(String),
}

impl Error {
    /// Classify a rejection of the presented token.
    pub(crate) fn from_presented_token(err: TokenError) -> Self {
        match err {
            TokenError::WindowInvalid(violation) => Self::WindowInvalid(violation),
            TokenError::AudienceMismatch { audience } => Self::AudienceMismatch { audience },
            other => Self::Decode(other.to_string()),
        }
    }

    /// Check if the presented token was rejected before any cache lookup.
    pub fn is_claims_rejection(&self) -> bool {
        matches!(self, Self::WindowInvalid(_) | Self::AudienceMismatch { .. })
    }

    /// Check if the session is absent or was revoked.
    pub fn is_missing_session(&self) -> bool {
        matches!(self, Self::SessionDoesNotExist)
    }
}

impl From<CacheError> for Error {
    fn from(e: CacheError) -> Self {
        match e {
            CacheError::Transport(msg) => Error::Transport(msg),
            CacheError::UnexpectedStatus { status } => Error::UnexpectedStatus { status },
            CacheError::Decode { .. } => Error::Decode(e.to_string()),
            CacheError::Encode(msg) => Error::Serialization(msg),
            CacheError::Config(msg) => Error::Config(msg),
        }
    }
}

/// Result type for session operations.
pub type Result<T> = std::result::Result<T, Error>;
