//! Cache key construction.
//!
//! Keys are components joined with `:`. Nothing here checks for empty parts or
//! embedded delimiters; identities, categories and tokens must not contain `:`
//! or distinct sessions can collide.

use std::fmt;

/// Separator between key components.
pub const KEY_DELIMITER: &str = ":";

/// Category for the flat-key scheme (`identity:session_tokens:token`).
pub const SESSION_TOKENS: &str = "session_tokens";

/// Category for the hash scheme (`identity:available_tokens`).
pub const AVAILABLE_TOKENS: &str = "available_tokens";

/// Join key components with [`KEY_DELIMITER`].
pub fn build_key<I, S>(parts: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut key = String::new();
    for (i, part) in parts.into_iter().enumerate() {
        if i > 0 {
            key.push_str(KEY_DELIMITER);
        }
        key.push_str(part.as_ref());
    }
    key
}

/// A derived cache key. Recomputed per call, never cached.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn build<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self(build_key(parts))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}
