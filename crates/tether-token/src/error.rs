//! Error types for token issuance and validation.

use std::fmt;

/// Result type alias for this crate.
pub type Result<T> = std::result::Result<T, TokenError>;

/// Which part of the time window a token falls outside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WindowViolation {
    /// `iat` is later than now.
    IssuedInFuture,
    /// `nbf` is later than now.
    NotYetValid,
    /// `exp` is at or before now.
    Expired,
}

impl fmt::Display for WindowViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::IssuedInFuture => "token is issued in the future",
            Self::NotYetValid => "token was used before its not-before time",
            Self::Expired => "token is expired",
        };
        f.write_str(reason)
    }
}

/// Errors produced by the token authority.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    /// Issuance parameters were rejected.
    #[error("Invalid issuance parameters: {0}")]
    Issuance(String),

    /// The token or payload is not well formed.
    #[error("Failed to decode token: {0}")]
    Decode(String),

    /// The token is outside its validity window.
    #[error("Invalid token window: {0}")]
    WindowInvalid(WindowViolation),

    /// The requested audience is not among the token's audiences.
    #[error("Audience '{audience}' not found in token")]
    AudienceMismatch {
        /// The audience that was asked for.
        audience: String,
    },

    /// The signature does not verify.
    #[error("Invalid signature")]
    Signature,

    /// The recorded claims differ from the claims inside the token.
    #[error("Recorded claims do not match token claims")]
    ClaimsMismatch,

    /// Signing or serializing failed.
    #[error("Failed to encode token: {0}")]
    Encoding(String),
}

impl TokenError {
    /// Check if this error rejects the token's time window or audience.
    pub fn is_claims_rejection(&self) -> bool {
        matches!(self, Self::WindowInvalid(_) | Self::AudienceMismatch { .. })
    }
}

impl From<WindowViolation> for TokenError {
    fn from(v: WindowViolation) -> Self {
        TokenError::WindowInvalid(v)
    }
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        use jsonwebtoken::errors::ErrorKind;

        match err.kind() {
            ErrorKind::InvalidSignature => Self::Signature,
            ErrorKind::ExpiredSignature => Self::WindowInvalid(WindowViolation::Expired),
            ErrorKind::ImmatureSignature => Self::WindowInvalid(WindowViolation::NotYetValid),
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => Self::Signature,
            _ => Self::Decode(err.to_string()),
        }
    }
}
