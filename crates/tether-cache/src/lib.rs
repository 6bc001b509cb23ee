//! Client side of the session cache wire protocol.
//!
//! The cache service speaks a tiny request/response protocol over HTTP: each
//! request is a JSON array `[COMMAND, ...args]` POSTed to a single address, and
//! each response is either a bare status or a JSON string whose contents are
//! base64-encoded so arbitrary payloads survive the trip.
//!
//! # Components
//!
//! - [`instruction`]: typed command values that serialize to the wire array
//! - [`client`]: HTTP transport that sends one instruction per round trip
//! - [`response`]: raw responses, status policies, and the two-stage decoder
//!
//! # Example
//!
//! ```no_run
//! use tether_cache::{CacheClient, CacheInstruction, decode_string_result};
//!
//! # async fn example() -> tether_cache::Result<()> {
//! let cache = CacheClient::new("http://127.0.0.1:6050")?;
//! let raw = cache.send(&CacheInstruction::get("tenant:session_tokens:abc")).await?;
//! let value = decode_string_result(raw.error_for_status()?)?;
//! # Ok(())
//! # }
//! ```

pub mod client;
pub mod error;
pub mod instruction;
pub mod response;

pub use client::{CacheClient, CacheClientBuilder};
pub use error::{CacheError, DecodeStage, Result};
pub use instruction::{CacheArg, CacheCommand, CacheInstruction};
pub use response::{
    RawResponse, StatusPolicy, decode_bool_result, decode_json_string, decode_string_result,
};
