//! Storage schemes: how a session record is laid out in the cache.
//!
//! The scheme used to store a session must also be used to look it up. Each
//! scheme owns its category sentinel and its per-command status policy.

use std::fmt;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tether_cache::{
    CacheClient, CacheInstruction, StatusPolicy, decode_bool_result, decode_json_string,
    decode_string_result,
};
use tether_token::TokenPayload;
use tracing::{debug, warn};

use crate::error::Result;
use crate::keys::{AVAILABLE_TOKENS, CacheKey, SESSION_TOKENS};

/// Acknowledgement the cache returns for a successful `SET`.
const OK_REPLY: &str = "OK";

/// Outcome of a session lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    /// Serialized payload found under the key.
    Found(String),
    /// No record, or an empty one.
    Missing,
    /// The cache answered with a non-success status under a degrading policy.
    Rejected { status: u16 },
}

/// Everything a scheme needs to store one session.
#[derive(Debug, Clone, Copy)]
pub struct SessionRecord<'a> {
    pub identity: &'a str,
    pub payload: &'a TokenPayload,
    /// Canonical JSON form of `payload`.
    pub serialized: &'a str,
    pub lifetime_secs: u64,
}

impl SessionRecord<'_> {
    pub fn token(&self) -> &str {
        &self.payload.token
    }
}

/// How hash-scheme records are bounded in time.
///
/// `HSET` carries no expiry, so without [`RefreshOnStore`](Self::RefreshOnStore)
/// records live until removed and only the token's own `exp` claim ends them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HashExpiry {
    /// No cache-side expiry.
    #[default]
    Unbounded,
    /// After each `HSET`, `EXPIRE` the whole identity hash for the new token's lifetime.
    RefreshOnStore,
}

/// Strategy for laying out session records in the cache.
#[async_trait]
pub trait StorageScheme: Send + Sync + fmt::Debug {
    /// Category sentinel used in keys.
    fn category(&self) -> &str;

    /// Key the record for `(identity, token)` lives under.
    fn key_for(&self, identity: &str, token: &str) -> CacheKey;

    /// Store a record. `Ok(false)` means the cache did not confirm the write.
    async fn store(&self, cache: &CacheClient, record: &SessionRecord<'_>) -> Result<bool>;

    /// Look up the serialized payload for `(identity, token)`.
    async fn lookup(&self, cache: &CacheClient, identity: &str, token: &str) -> Result<Lookup>;

    /// Remove a record. `Ok(false)` means the cache did not confirm the removal.
    async fn remove(&self, cache: &CacheClient, identity: &str, token: &str) -> Result<bool>;
}

/// Decode a `GET`/`HGET` response body into a lookup outcome.
fn lookup_from_body(raw: &tether_cache::RawResponse) -> Result<Lookup> {
    let value = decode_string_result(raw)?;
    if value.is_empty() {
        Ok(Lookup::Missing)
    } else {
        Ok(Lookup::Found(value))
    }
}

// ============================================================================
// FlatKeyScheme
// ============================================================================

/// One string key per session: `identity:category:token`, stored with
/// `SET ... EX lifetime`.
///
/// `SET` and `GET` treat a non-success status as fatal; `DEL` degrades to `false`.
#[derive(Debug, Clone)]
pub struct FlatKeyScheme {
    category: String,
}

impl Default for FlatKeyScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl FlatKeyScheme {
    pub fn new() -> Self {
        Self {
            category: SESSION_TOKENS.to_string(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }
}

#[async_trait]
impl StorageScheme for FlatKeyScheme {
    fn category(&self) -> &str {
        &self.category
    }

    fn key_for(&self, identity: &str, token: &str) -> CacheKey {
        CacheKey::build([identity, self.category.as_str(), token])
    }

    async fn store(&self, cache: &CacheClient, record: &SessionRecord<'_>) -> Result<bool> {
        let key = self.key_for(record.identity, record.token());
        let instruction =
            CacheInstruction::set_with_expiry(key, record.serialized, record.lifetime_secs);

        let raw = cache.send(&instruction).await?;
        raw.error_for_status()?;

        let reply = decode_json_string(&raw)?;
        if reply != OK_REPLY {
            debug!(identity = %record.identity, reply = %reply, "SET was not acknowledged");
        }
        Ok(reply == OK_REPLY)
    }

    async fn lookup(&self, cache: &CacheClient, identity: &str, token: &str) -> Result<Lookup> {
        let raw = cache
            .send(&CacheInstruction::get(self.key_for(identity, token)))
            .await?;
        raw.error_for_status()?;
        lookup_from_body(&raw)
    }

    async fn remove(&self, cache: &CacheClient, identity: &str, token: &str) -> Result<bool> {
        let raw = cache
            .send(&CacheInstruction::del(self.key_for(identity, token)))
            .await?;
        Ok(raw.check_status(StatusPolicy::Degrade)?)
    }
}

// ============================================================================
// HashScheme
// ============================================================================

/// One hash per identity: key `identity:category`, field = token,
/// value = serialized payload.
///
/// Every hash command degrades a non-success status to `false` (or
/// [`Lookup::Rejected`]); a failed `HSET` is indistinguishable from a benign
/// refusal in this protocol variant. With [`HashExpiry::RefreshOnStore`], a
/// refused `EXPIRE` removes the field again before reporting `false`.
#[derive(Debug, Clone)]
pub struct HashScheme {
    category: String,
    expiry: HashExpiry,
}

impl Default for HashScheme {
    fn default() -> Self {
        Self::new()
    }
}

impl HashScheme {
    pub fn new() -> Self {
        Self {
            category: AVAILABLE_TOKENS.to_string(),
            expiry: HashExpiry::default(),
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = category.into();
        self
    }

    pub fn with_expiry(mut self, expiry: HashExpiry) -> Self {
        self.expiry = expiry;
        self
    }

    pub fn expiry(&self) -> HashExpiry {
        self.expiry
    }

    fn hash_key(&self, identity: &str) -> CacheKey {
        CacheKey::build([identity, self.category.as_str()])
    }

    /// Best-effort removal of a field whose expiry could not be set.
    async fn roll_back(&self, cache: &CacheClient, key: CacheKey, record: &SessionRecord<'_>) {
        match cache
            .send(&CacheInstruction::hdel(key, record.token()))
            .await
        {
            Ok(raw) if decode_bool_result(&raw) => {
                debug!(identity = %record.identity, "Rolled back unexpiring HSET");
            }
            Ok(raw) => {
                warn!(
                    identity = %record.identity,
                    status = raw.status().as_u16(),
                    "HDEL rollback refused; record left without expiry"
                );
            }
            Err(e) => {
                warn!(identity = %record.identity, error = %e, "HDEL rollback failed");
            }
        }
    }
}

#[async_trait]
impl StorageScheme for HashScheme {
    fn category(&self) -> &str {
        &self.category
    }

    fn key_for(&self, identity: &str, _token: &str) -> CacheKey {
        self.hash_key(identity)
    }

    async fn store(&self, cache: &CacheClient, record: &SessionRecord<'_>) -> Result<bool> {
        let key = self.hash_key(record.identity);
        let instruction = CacheInstruction::hset(key.clone(), record.token(), record.serialized);

        let raw = cache.send(&instruction).await?;
        if !decode_bool_result(&raw) {
            warn!(identity = %record.identity, status = raw.status().as_u16(), "HSET refused");
            return Ok(false);
        }

        if self.expiry == HashExpiry::RefreshOnStore {
            let refreshed = cache
                .send(&CacheInstruction::expire(key.clone(), record.lifetime_secs))
                .await;
            match refreshed {
                Ok(raw) if decode_bool_result(&raw) => {}
                Ok(raw) => {
                    warn!(identity = %record.identity, status = raw.status().as_u16(), "EXPIRE refused");
                    self.roll_back(cache, key, record).await;
                    return Ok(false);
                }
                Err(e) => {
                    self.roll_back(cache, key, record).await;
                    return Err(e.into());
                }
            }
        }
        Ok(true)
    }

    async fn lookup(&self, cache: &CacheClient, identity: &str, token: &str) -> Result<Lookup> {
        let raw = cache
            .send(&CacheInstruction::hget(self.hash_key(identity), token))
            .await?;
        if !decode_bool_result(&raw) {
            return Ok(Lookup::Rejected {
                status: raw.status().as_u16(),
            });
        }
        lookup_from_body(&raw)
    }

    async fn remove(&self, cache: &CacheClient, identity: &str, token: &str) -> Result<bool> {
        let raw = cache
            .send(&CacheInstruction::hdel(self.hash_key(identity), token))
            .await?;
        Ok(decode_bool_result(&raw))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flat_keys_include_token() {
        let scheme = FlatKeyScheme::new();
        assert_eq!(scheme.category(), SESSION_TOKENS);
        assert_eq!(
            scheme.key_for("local_sessions_test", "tok").as_str(),
            "local_sessions_test:session_tokens:tok"
        );
    }

    #[test]
    fn test_hash_keys_ignore_token() {
        let scheme = HashScheme::new();
        assert_eq!(scheme.category(), AVAILABLE_TOKENS);
        assert_eq!(scheme.key_for("server", "a"), scheme.key_for("server", "b"));
        assert_eq!(scheme.key_for("server", "a").as_str(), "server:available_tokens");
    }

    #[test]
    fn test_category_override() {
        let scheme = FlatKeyScheme::new().with_category("sid");
        assert_eq!(scheme.key_for("tenant", "tok").as_str(), "tenant:sid:tok");

        let scheme = HashScheme::new()
            .with_category("sid")
            .with_expiry(HashExpiry::RefreshOnStore);
        assert_eq!(scheme.key_for("tenant", "tok").as_str(), "tenant:sid");
        assert_eq!(scheme.expiry(), HashExpiry::RefreshOnStore);
    }

    #[test]
    fn test_hash_expiry_serde_names() {
        let json = serde_json::to_string(&HashExpiry::RefreshOnStore).unwrap();
        assert_eq!(json, "\"refresh_on_store\"");
        let parsed: HashExpiry = serde_json::from_str("\"unbounded\"").unwrap();
        assert_eq!(parsed, HashExpiry::Unbounded);
    }
}
