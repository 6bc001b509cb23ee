//! Token authority trait and the HS256 implementation.

use std::fmt;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::RngCore;
use tracing::{debug, trace};

use crate::claims::{Claims, IssueParams, TokenPayload};
use crate::error::{Result, TokenError, WindowViolation};

/// Length of generated signing secrets in bytes.
const GENERATED_SECRET_LEN: usize = 32;

// ============================================================================
// Clock
// ============================================================================

/// Source of the current Unix time in seconds.
pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> i64;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> i64 {
        chrono::Utc::now().timestamp()
    }
}

/// A clock frozen at a fixed instant (for testing).
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub i64);

impl Clock for FixedClock {
    fn now(&self) -> i64 {
        self.0
    }
}

// ============================================================================
// TokenAuthority Trait
// ============================================================================

/// Issues and validates session tokens.
pub trait TokenAuthority: Send + Sync + fmt::Debug {
    /// Issue a new token.
    fn issue(&self, params: &IssueParams) -> Result<TokenPayload>;

    /// Read the claims of a token without verifying its signature.
    fn decode_claims(&self, token: &str) -> Result<Claims>;

    /// Check the time window and audience membership of a presented token.
    ///
    /// No signature check happens here.
    fn validate_window_and_audience(&self, token: &str, audience: &str) -> Result<()>;

    /// Verify the signature of a stored payload, re-check its window, and
    /// require its recorded claims to match the token.
    fn validate_full(&self, payload: &TokenPayload) -> Result<()>;
}

/// Shared token authority for use across async contexts.
pub type SharedAuthority = Arc<dyn TokenAuthority>;

/// Apply the window rule: `iat <= now`, `nbf <= now` when present, `exp > now`.
pub fn check_window(claims: &Claims, now: i64) -> std::result::Result<(), WindowViolation> {
    if claims.iat > now {
        return Err(WindowViolation::IssuedInFuture);
    }
    if claims.nbf.is_some_and(|nbf| nbf > now) {
        return Err(WindowViolation::NotYetValid);
    }
    if claims.exp <= now {
        return Err(WindowViolation::Expired);
    }
    Ok(())
}

// ============================================================================
// JwtAuthority
// ============================================================================

/// HS256 token authority keyed by a shared secret.
#[derive(Clone)]
pub struct JwtAuthority {
    encoding: EncodingKey,
    decoding: DecodingKey,
    clock: Arc<dyn Clock>,
}

impl fmt::Debug for JwtAuthority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JwtAuthority")
            .field("algorithm", &"HS256")
            .field("clock", &self.clock)
            .finish_non_exhaustive()
    }
}

impl JwtAuthority {
    /// Create an authority that signs with `secret`.
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            clock: Arc::new(SystemClock),
        }
    }

    /// Create an authority with a random secret.
    ///
    /// Tokens it signs can only be validated by this instance or its clones.
    pub fn generate() -> Self {
        let mut secret = [0u8; GENERATED_SECRET_LEN];
        rand::rng().fill_bytes(&mut secret);
        Self::new(&secret)
    }

    /// Replace the clock.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    fn validation() -> Validation {
        // Window checks are done by `check_window` so `exp == now` counts as expired.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 0;
        validation.validate_exp = false;
        validation.validate_nbf = false;
        validation.validate_aud = false;
        validation
    }
}

impl TokenAuthority for JwtAuthority {
    fn issue(&self, params: &IssueParams) -> Result<TokenPayload> {
        params.validate()?;

        let lifetime = i64::try_from(params.lifetime_secs)
            .map_err(|_| TokenError::Issuance("lifetime is out of range".to_string()))?;
        let delay = params
            .delay_secs
            .map(i64::try_from)
            .transpose()
            .map_err(|_| TokenError::Issuance("delay is out of range".to_string()))?;

        let iat = self.clock.now();
        let claims = Claims {
            sub: params.subject.clone(),
            aud: params.audience.clone(),
            iss: params.issuer.clone(),
            iat,
            nbf: delay.map(|d| iat.saturating_add(d)),
            exp: iat.saturating_add(lifetime),
            jti: uuid::Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)
            .map_err(|e| TokenError::Encoding(e.to_string()))?;

        debug!(jti = %claims.jti, sub = %claims.sub, exp = claims.exp, "Issued token");
        Ok(TokenPayload { token, claims })
    }

    fn decode_claims(&self, token: &str) -> Result<Claims> {
        let mut segments = token.split('.');
        let (Some(_header), Some(body), Some(_signature), None) = (
            segments.next(),
            segments.next(),
            segments.next(),
            segments.next(),
        ) else {
            return Err(TokenError::Decode(
                "token must have three segments".to_string(),
            ));
        };

        let bytes = URL_SAFE_NO_PAD
            .decode(body)
            .map_err(|e| TokenError::Decode(format!("Invalid claims encoding: {}", e)))?;
        serde_json::from_slice(&bytes)
            .map_err(|e| TokenError::Decode(format!("Invalid claims: {}", e)))
    }

    fn validate_window_and_audience(&self, token: &str, audience: &str) -> Result<()> {
        let claims = self.decode_claims(token)?;
        check_window(&claims, self.clock.now())?;

        if !claims.has_audience(audience) {
            return Err(TokenError::AudienceMismatch {
                audience: audience.to_string(),
            });
        }

        trace!(jti = %claims.jti, "Token window and audience accepted");
        Ok(())
    }

    fn validate_full(&self, payload: &TokenPayload) -> Result<()> {
        let data = decode::<Claims>(payload.token.as_str(), &self.decoding, &Self::validation())?;
        check_window(&data.claims, self.clock.now())?;

        if data.claims != payload.claims {
            return Err(TokenError::ClaimsMismatch);
        }
        Ok(())
    }
}
