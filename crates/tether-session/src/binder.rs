//! Session creation, verification and revocation.

use std::sync::Arc;

use tether_cache::CacheClient;
use tether_token::{IssueParams, SharedAuthority, TokenPayload};
use tracing::{debug, info, warn};

use crate::config::BinderConfig;
use crate::error::{Error, Result};
use crate::scheme::{Lookup, SessionRecord, StorageScheme};

/// Binds issued tokens to cache records.
///
/// Holds no mutable state: concurrent calls are independent and consistency
/// between them is whatever the cache's own `SET`/`GET` atomicity provides.
#[derive(Clone)]
pub struct SessionBinder {
    config: BinderConfig,
    cache: CacheClient,
    scheme: Arc<dyn StorageScheme>,
    authority: SharedAuthority,
}

impl std::fmt::Debug for SessionBinder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionBinder")
            .field("cache", &self.cache)
            .field("scheme", &self.scheme)
            .field("authority", &self.authority)
            .finish()
    }
}

impl SessionBinder {
    /// Create a binder using the scheme selected by `config`.
    pub fn new(config: BinderConfig, authority: SharedAuthority) -> Result<Self> {
        let scheme = config.build_scheme();
        Self::with_scheme(config, authority, scheme)
    }

    /// Create a binder with a custom storage scheme.
    pub fn with_scheme(
        config: BinderConfig,
        authority: SharedAuthority,
        scheme: Arc<dyn StorageScheme>,
    ) -> Result<Self> {
        let mut builder = CacheClient::builder().address(config.cache_address.clone());
        if let Some(timeout) = config.request_timeout() {
            builder = builder.timeout(timeout);
        }
        let cache = builder.build()?;

        debug!(
            address = %config.cache_address,
            category = %scheme.category(),
            "Session binder ready"
        );

        Ok(Self {
            config,
            cache,
            scheme,
            authority,
        })
    }

    pub fn config(&self) -> &BinderConfig {
        &self.config
    }

    pub fn scheme(&self) -> &dyn StorageScheme {
        self.scheme.as_ref()
    }

    /// Issue a token for `params` and store its record under `identity`.
    ///
    /// Returns the issued payload so the caller can hand the token out.
    /// Retrying issues a new token; under the flat scheme a blind retry can
    /// leave both records live until they expire.
    pub async fn create_session(
        &self,
        identity: &str,
        params: &IssueParams,
    ) -> Result<TokenPayload> {
        let payload = self.authority.issue(params).map_err(Error::Issuance)?;
        let serialized = payload
            .to_json()
            .map_err(|e| Error::Serialization(e.to_string()))?;

        let record = SessionRecord {
            identity,
            payload: &payload,
            serialized: &serialized,
            lifetime_secs: params.lifetime_secs,
        };

        if !self.scheme.store(&self.cache, &record).await? {
            debug!(identity = %identity, jti = %payload.claims.jti, "Session store not confirmed");
            return Err(Error::SessionNotStored);
        }

        info!(
            identity = %identity,
            jti = %payload.claims.jti,
            exp = payload.claims.exp,
            "Session created"
        );
        Ok(payload)
    }

    /// Check a presented token against its claims and its cache record.
    ///
    /// The claims check runs first and short-circuits: a token outside its
    /// window or audience never causes a cache request. Returns `Ok(true)` when
    /// both phases pass, `Ok(false)` only when the scheme's lookup degrades a
    /// non-success status, and an error naming the failure otherwise.
    pub async fn verify_session(&self, identity: &str, token: &str, audience: &str) -> Result<bool> {
        if let Err(e) = self.authority.validate_window_and_audience(token, audience) {
            debug!(identity = %identity, phase = "claims", error = %e, "Session rejected");
            return Err(Error::from_presented_token(e));
        }

        let stored = match self.scheme.lookup(&self.cache, identity, token).await? {
            Lookup::Found(stored) => stored,
            Lookup::Missing => {
                debug!(identity = %identity, phase = "cache", "Session does not exist");
                return Err(Error::SessionDoesNotExist);
            }
            Lookup::Rejected { status } => {
                warn!(identity = %identity, status, "Session lookup refused by cache");
                return Ok(false);
            }
        };

        let payload = TokenPayload::from_json(&stored)
            .map_err(|e| Error::StoredPayloadInvalid(e.to_string()))?;
        if payload.token != token {
            return Err(Error::StoredPayloadInvalid(
                "stored record belongs to a different token".to_string(),
            ));
        }
        self.authority
            .validate_full(&payload)
            .map_err(|e| Error::StoredPayloadInvalid(e.to_string()))?;

        debug!(identity = %identity, jti = %payload.claims.jti, "Session verified");
        Ok(true)
    }

    /// Remove the record for `token`, revoking it even while its claims are
    /// still valid.
    ///
    /// `Ok(false)` means the cache did not confirm the removal.
    pub async fn revoke_session(&self, identity: &str, token: &str) -> Result<bool> {
        let removed = self.scheme.remove(&self.cache, identity, token).await?;
        if removed {
            info!(identity = %identity, "Session revoked");
        } else {
            warn!(identity = %identity, "Session removal not confirmed");
        }
        Ok(removed)
    }
}
