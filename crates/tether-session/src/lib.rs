//! Server-side session binding for stateless signed tokens.
//!
//! A session is a token issued by a [`TokenAuthority`] plus a copy of its
//! payload stored in the shared cache. Verification requires both: the token
//! must be inside its time window and audience, and its record must still be
//! present in the cache. Deleting the record revokes an otherwise valid token.
//!
//! Two storage schemes are supported and chosen once per deployment:
//!
//! - [`FlatKeyScheme`]: `identity:session_tokens:token` keys with native expiry
//! - [`HashScheme`]: one `identity:available_tokens` hash, token as field
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use tether_session::{BinderConfig, SchemeKind, SessionBinder};
//! use tether_token::{IssueParams, JwtAuthority};
//!
//! let config = BinderConfig::new("http://127.0.0.1:6050").with_scheme(SchemeKind::Flat);
//! let binder = SessionBinder::new(config, Arc::new(JwtAuthority::generate()))?;
//!
//! let params = IssueParams::new("test_person", "tether").with_audience(["local_sessions_test"]);
//! let payload = binder.create_session("local_sessions_test", &params).await?;
//! assert!(binder.verify_session("local_sessions_test", &payload.token, "local_sessions_test").await?);
//! ```
//!
//! [`TokenAuthority`]: tether_token::TokenAuthority

mod binder;
mod config;
mod error;
mod keys;
mod scheme;

pub use binder::SessionBinder;
pub use config::{BinderConfig, CACHE_ADDRESS_ENV, CATEGORY_ENV, SchemeKind};
pub use error::{Error, Result};
pub use keys::{AVAILABLE_TOKENS, CacheKey, KEY_DELIMITER, SESSION_TOKENS, build_key};
pub use scheme::{FlatKeyScheme, HashExpiry, HashScheme, Lookup, SessionRecord, StorageScheme};
