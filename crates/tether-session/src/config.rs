//! Configuration for the session binder.
//!
//! ```toml
//! cache_address = "http://127.0.0.1:6050"
//! scheme = "hash"                    # "flat" (default) or "hash"
//! category = "sid"                   # optional, overrides the scheme's sentinel
//! hash_expiry = "refresh_on_store"   # hash scheme only; default "unbounded"
//! request_timeout_ms = 1500          # optional; no timeout by default
//! ```

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::scheme::{FlatKeyScheme, HashExpiry, HashScheme, StorageScheme};

/// Environment variable holding the cache service address.
pub const CACHE_ADDRESS_ENV: &str = "LOCAL_CACHE_ADDRESS";

/// Environment variable holding the session category label.
pub const CATEGORY_ENV: &str = "SESSION_COOKIE_LABEL";

/// Which storage scheme a deployment uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SchemeKind {
    /// `identity:session_tokens:token` string keys with expiry.
    #[default]
    Flat,
    /// `identity:available_tokens` hashes keyed by token.
    Hash,
}

/// Configuration for a [`SessionBinder`](crate::SessionBinder).
///
/// One value per process (or per test). Nothing here is global.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BinderConfig {
    /// Address every cache instruction is posted to.
    pub cache_address: String,

    /// Storage scheme.
    #[serde(default)]
    pub scheme: SchemeKind,

    /// Overrides the scheme's category sentinel when set.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,

    /// Lifetime handling for the hash scheme. Ignored by the flat scheme.
    #[serde(default)]
    pub hash_expiry: HashExpiry,

    /// Per-request timeout. Unset leaves timeouts to the host.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub request_timeout_ms: Option<u64>,
}

impl BinderConfig {
    /// Create a flat-scheme configuration for `cache_address`.
    pub fn new(cache_address: impl Into<String>) -> Self {
        Self {
            cache_address: cache_address.into(),
            scheme: SchemeKind::default(),
            category: None,
            hash_expiry: HashExpiry::default(),
            request_timeout_ms: None,
        }
    }

    /// Set the storage scheme.
    pub fn with_scheme(mut self, scheme: SchemeKind) -> Self {
        self.scheme = scheme;
        self
    }

    /// Override the category label.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set hash-scheme expiry handling.
    pub fn with_hash_expiry(mut self, expiry: HashExpiry) -> Self {
        self.hash_expiry = expiry;
        self
    }

    /// Bound every cache request by `timeout`, kept at millisecond precision.
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_ms.map(Duration::from_millis)
    }

    /// Parse from a TOML string.
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| Error::Config(format!("failed to parse binder config: {}", e)))
    }

    /// Load from a TOML file.
    pub fn from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            Error::Config(format!(
                "failed to read config file '{}': {}",
                path.display(),
                e
            ))
        })?;
        Self::from_toml(&content)
    }

    /// Build from [`CACHE_ADDRESS_ENV`] and [`CATEGORY_ENV`].
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let address = lookup(CACHE_ADDRESS_ENV)
            .filter(|v| !v.is_empty())
            .ok_or_else(|| Error::Config(format!("{} is not set", CACHE_ADDRESS_ENV)))?;

        let mut config = Self::new(address);
        if let Some(category) = lookup(CATEGORY_ENV).filter(|v| !v.is_empty()) {
            config.category = Some(category);
        }
        Ok(config)
    }

    /// Build the storage scheme this configuration selects.
    pub fn build_scheme(&self) -> Arc<dyn StorageScheme> {
        match self.scheme {
            SchemeKind::Flat => {
                let mut scheme = FlatKeyScheme::new();
                if let Some(category) = &self.category {
                    scheme = scheme.with_category(category.clone());
                }
                Arc::new(scheme)
            }
            SchemeKind::Hash => {
                let mut scheme = HashScheme::new().with_expiry(self.hash_expiry);
                if let Some(category) = &self.category {
                    scheme = scheme.with_category(category.clone());
                }
                Arc::new(scheme)
            }
        }
    }
}
