//! Token claims, issuance parameters, and the issued payload.

use serde::{Deserialize, Serialize};

use crate::error::{Result, TokenError};

/// Lifetime used when none is given (one hour).
pub const DEFAULT_LIFETIME_SECS: u64 = 3600;

/// Claims carried inside every token.
///
/// Times are Unix timestamps in seconds.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Claims {
    /// Subject the session was issued for.
    pub sub: String,

    /// Audiences the token may be presented to.
    pub aud: Vec<String>,

    /// Issuer.
    pub iss: String,

    /// Issued at.
    pub iat: i64,

    /// Not before, present only for delayed tokens.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<i64>,

    /// Expiry.
    pub exp: i64,

    /// Unique token id. Keeps tokens issued in the same second distinct.
    pub jti: String,
}

impl Claims {
    /// Check whether `audience` is one of the token's audiences.
    pub fn has_audience(&self, audience: &str) -> bool {
        self.aud.iter().any(|a| a == audience)
    }
}

/// Result of issuance: the signed token plus the claims it was signed over.
///
/// Immutable once issued. Its JSON form is what the session cache stores.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenPayload {
    pub token: String,
    pub claims: Claims,
}

impl TokenPayload {
    /// Canonical string form stored in the cache.
    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string(self)
            .map_err(|e| TokenError::Encoding(format!("Failed to serialize payload: {}", e)))
    }

    /// Parse a payload previously produced by [`to_json`](Self::to_json).
    pub fn from_json(s: &str) -> Result<Self> {
        serde_json::from_str(s)
            .map_err(|e| TokenError::Decode(format!("Failed to parse payload: {}", e)))
    }
}

/// Parameters for issuing a token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IssueParams {
    pub subject: String,
    pub audience: Vec<String>,
    pub issuer: String,
    pub lifetime_secs: u64,
    /// Seconds after issuance before the token becomes usable.
    #[serde(default)]
    pub delay_secs: Option<u64>,
}

impl IssueParams {
    /// Parameters with no audience and the default lifetime.
    pub fn new(subject: impl Into<String>, issuer: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            audience: Vec::new(),
            issuer: issuer.into(),
            lifetime_secs: DEFAULT_LIFETIME_SECS,
            delay_secs: None,
        }
    }

    /// Replace the audience list.
    pub fn with_audience<I, S>(mut self, audience: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.audience = audience.into_iter().map(Into::into).collect();
        self
    }

    /// Append one audience.
    pub fn add_audience(mut self, audience: impl Into<String>) -> Self {
        self.audience.push(audience.into());
        self
    }

    /// Set the lifetime in seconds. Zero yields a token that is already expired.
    pub fn with_lifetime(mut self, secs: u64) -> Self {
        self.lifetime_secs = secs;
        self
    }

    /// Delay the not-before time by `secs` after issuance.
    pub fn with_delay(mut self, secs: u64) -> Self {
        self.delay_secs = Some(secs);
        self
    }

    /// Reject parameters that cannot produce a usable token.
    pub fn validate(&self) -> Result<()> {
        if self.subject.is_empty() {
            return Err(TokenError::Issuance("subject is empty".to_string()));
        }
        if self.issuer.is_empty() {
            return Err(TokenError::Issuance("issuer is empty".to_string()));
        }
        if self.audience.is_empty() {
            return Err(TokenError::Issuance("audience list is empty".to_string()));
        }
        if self.audience.iter().any(String::is_empty) {
            return Err(TokenError::Issuance(
                "audience list contains an empty entry".to_string(),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims() -> Claims {
        Claims {
            sub: "test_person".to_string(),
            aud: vec!["local_sessions_test".to_string(), "admin".to_string()],
            iss: "testIss".to_string(),
            iat: 100,
            nbf: None,
            exp: 200,
            jti: "id".to_string(),
        }
    }

    #[test]
    fn test_has_audience() {
        let c = claims();
        assert!(c.has_audience("admin"));
        assert!(!c.has_audience("not_a_member"));
        assert!(!c.has_audience(""));
    }

    #[test]
    fn test_nbf_omitted_when_absent() {
        let json = serde_json::to_value(claims()).unwrap();
        assert!(json.get("nbf").is_none());

        let delayed = Claims {
            nbf: Some(160),
            ..claims()
        };
        assert_eq!(serde_json::to_value(delayed).unwrap()["nbf"], 160);
    }

    #[test]
    fn test_payload_json_round_trip() {
        let payload = TokenPayload {
            token: "a.b.c".to_string(),
            claims: claims(),
        };
        let parsed = TokenPayload::from_json(&payload.to_json().unwrap()).unwrap();
        assert_eq!(parsed, payload);
    }

    #[test]
    fn test_payload_from_garbage() {
        assert!(matches!(
            TokenPayload::from_json("{not json"),
            Err(TokenError::Decode(_))
        ));
    }

    #[test]
    fn test_issue_params_builder() {
        let params = IssueParams::new("test_person", "testIss")
            .with_audience(["a"])
            .add_audience("b")
            .with_lifetime(60)
            .with_delay(5);
        assert_eq!(params.audience, vec!["a", "b"]);
        assert_eq!(params.lifetime_secs, 60);
        assert_eq!(params.delay_secs, Some(5));
        assert!(params.validate().is_ok());
    }

    #[test]
    fn test_issue_params_validation() {
        let base = IssueParams::new("test_person", "testIss").with_audience(["a"]);

        assert!(IssueParams::new("test_person", "testIss").validate().is_err());
        assert!(base.clone().add_audience("").validate().is_err());
        assert!(
            IssueParams { subject: String::new(), ..base.clone() }
                .validate()
                .is_err()
        );
        assert!(
            IssueParams { issuer: String::new(), ..base }
                .validate()
                .is_err()
        );
    }
}
