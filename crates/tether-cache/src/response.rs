//! Raw cache responses and their decoders.
//!
//! String-returning commands (`GET`, `HGET`) answer with a JSON string that is
//! itself base64 (URL-safe alphabet, padded). Acknowledging commands answer
//! either with the JSON string `"OK"` or with nothing but a status code,
//! depending on the command.

use base64::{Engine, engine::general_purpose::URL_SAFE};
use reqwest::StatusCode;

use crate::error::{CacheError, DecodeStage, Result};

/// How an operation treats a non-success HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusPolicy {
    /// Non-success surfaces as [`CacheError::UnexpectedStatus`].
    Fatal,
    /// Non-success is reported as a plain `false` with no error.
    Degrade,
}

/// Status and body of one cache round trip.
#[derive(Debug, Clone)]
pub struct RawResponse {
    status: StatusCode,
    body: String,
}

impl RawResponse {
    pub fn new(status: StatusCode, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn status(&self) -> StatusCode {
        self.status
    }

    pub fn body(&self) -> &str {
        &self.body
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Fail with [`CacheError::UnexpectedStatus`] unless the status is a success.
    pub fn error_for_status(&self) -> Result<&Self> {
        if self.is_success() {
            Ok(self)
        } else {
            Err(CacheError::UnexpectedStatus {
                status: self.status.as_u16(),
            })
        }
    }

    /// Apply a status policy: `Ok(true)` on success, `Ok(false)` or an error on
    /// failure depending on the policy.
    pub fn check_status(&self, policy: StatusPolicy) -> Result<bool> {
        match policy {
            StatusPolicy::Fatal => self.error_for_status().map(|_| true),
            StatusPolicy::Degrade => Ok(self.is_success()),
        }
    }
}

/// Parse the body as a JSON string without further decoding.
pub fn decode_json_string(raw: &RawResponse) -> Result<String> {
    serde_json::from_str::<String>(raw.body()).map_err(|e| CacheError::decode(DecodeStage::Json, e))
}

/// Parse the body as a JSON string, base64-decode it, and return the UTF-8 payload.
///
/// A cache miss comes back as an empty string and decodes to an empty string.
pub fn decode_string_result(raw: &RawResponse) -> Result<String> {
    let encoded = decode_json_string(raw)?;
    let bytes = URL_SAFE
        .decode(encoded.as_bytes())
        .map_err(|e| CacheError::decode(DecodeStage::Base64, e))?;
    String::from_utf8(bytes).map_err(|e| CacheError::decode(DecodeStage::Utf8, e))
}

/// `true` iff the status is a success. The body is not inspected.
pub fn decode_bool_result(raw: &RawResponse) -> bool {
    raw.is_success()
}
