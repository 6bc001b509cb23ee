//! Token authority for session tokens.
//!
//! Issues HS256-signed tokens carrying subject, audience, issuer and a
//! time window, and validates them in two strengths:
//!
//! - [`TokenAuthority::validate_window_and_audience`] reads the claims of a
//!   presented token without checking its signature
//! - [`TokenAuthority::validate_full`] checks the signature of a stored
//!   [`TokenPayload`] and that its recorded claims match the token
//!
//! # Example
//!
//! ```rust,ignore
//! use tether_token::{IssueParams, JwtAuthority, TokenAuthority};
//!
//! let authority = JwtAuthority::generate();
//! let params = IssueParams::new("test_person", "tether")
//!     .with_audience(["local_sessions_test"])
//!     .with_lifetime(3600);
//!
//! let payload = authority.issue(&params)?;
//! authority.validate_window_and_audience(&payload.token, "local_sessions_test")?;
//! ```

pub mod authority;
pub mod claims;
pub mod error;

pub use authority::{
    Clock, FixedClock, JwtAuthority, SharedAuthority, SystemClock, TokenAuthority, check_window,
};
pub use claims::{Claims, DEFAULT_LIFETIME_SECS, IssueParams, TokenPayload};
pub use error::{Result, TokenError, WindowViolation};
