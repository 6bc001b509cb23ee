//! Typed cache instructions.
//!
//! An instruction is a command name followed by positional arguments. The
//! constructors below are the only way to build one, so every instruction has
//! the arity its command expects.

use std::fmt;

use serde::ser::{Serialize, SerializeSeq, Serializer};

use crate::error::{CacheError, Result};

/// Argument keyword that attaches an expiry in seconds to `SET`.
const EXPIRY_SECONDS: &str = "EX";

/// Commands understood by the cache service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheCommand {
    Set,
    Get,
    HSet,
    HGet,
    Del,
    HDel,
    Expire,
    Incr,
}

impl CacheCommand {
    /// Wire name of the command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Set => "SET",
            Self::Get => "GET",
            Self::HSet => "HSET",
            Self::HGet => "HGET",
            Self::Del => "DEL",
            Self::HDel => "HDEL",
            Self::Expire => "EXPIRE",
            Self::Incr => "INCR",
        }
    }
}

impl fmt::Display for CacheCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A positional argument. Integers go over the wire as JSON numbers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CacheArg {
    Str(String),
    Int(u64),
}

impl CacheArg {
    /// The argument as a string, if it is one.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            Self::Int(_) => None,
        }
    }
}

impl From<String> for CacheArg {
    fn from(s: String) -> Self {
        Self::Str(s)
    }
}

impl From<&str> for CacheArg {
    fn from(s: &str) -> Self {
        Self::Str(s.to_string())
    }
}

impl From<u64> for CacheArg {
    fn from(n: u64) -> Self {
        Self::Int(n)
    }
}

impl Serialize for CacheArg {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            Self::Str(s) => serializer.serialize_str(s),
            Self::Int(n) => serializer.serialize_u64(*n),
        }
    }
}

/// A single cache request: command name plus ordered arguments.
///
/// Built fresh for every request and never reused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheInstruction {
    command: CacheCommand,
    args: Vec<CacheArg>,
}

impl CacheInstruction {
    fn new(command: CacheCommand, args: Vec<CacheArg>) -> Self {
        Self { command, args }
    }

    /// `SET key value`
    pub fn set(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            CacheCommand::Set,
            vec![CacheArg::Str(key.into()), CacheArg::Str(value.into())],
        )
    }

    /// `SET key value EX seconds`
    pub fn set_with_expiry(key: impl Into<String>, value: impl Into<String>, seconds: u64) -> Self {
        Self::new(
            CacheCommand::Set,
            vec![
                CacheArg::Str(key.into()),
                CacheArg::Str(value.into()),
                CacheArg::from(EXPIRY_SECONDS),
                CacheArg::Int(seconds),
            ],
        )
    }

    /// `GET key`
    pub fn get(key: impl Into<String>) -> Self {
        Self::new(CacheCommand::Get, vec![CacheArg::Str(key.into())])
    }

    /// `HSET key field value`
    pub fn hset(key: impl Into<String>, field: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(
            CacheCommand::HSet,
            vec![
                CacheArg::Str(key.into()),
                CacheArg::Str(field.into()),
                CacheArg::Str(value.into()),
            ],
        )
    }

    /// `HGET key field`
    pub fn hget(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            CacheCommand::HGet,
            vec![CacheArg::Str(key.into()), CacheArg::Str(field.into())],
        )
    }

    /// `DEL key`
    pub fn del(key: impl Into<String>) -> Self {
        Self::new(CacheCommand::Del, vec![CacheArg::Str(key.into())])
    }

    /// `HDEL key field`
    pub fn hdel(key: impl Into<String>, field: impl Into<String>) -> Self {
        Self::new(
            CacheCommand::HDel,
            vec![CacheArg::Str(key.into()), CacheArg::Str(field.into())],
        )
    }

    /// `EXPIRE key seconds`
    pub fn expire(key: impl Into<String>, seconds: u64) -> Self {
        Self::new(
            CacheCommand::Expire,
            vec![CacheArg::Str(key.into()), CacheArg::Int(seconds)],
        )
    }

    /// `INCR key`
    pub fn incr(key: impl Into<String>) -> Self {
        Self::new(CacheCommand::Incr, vec![CacheArg::Str(key.into())])
    }

    pub fn command(&self) -> CacheCommand {
        self.command
    }

    pub fn args(&self) -> &[CacheArg] {
        &self.args
    }

    /// The key this instruction addresses (always the first argument).
    pub fn key(&self) -> Option<&str> {
        self.args.first().and_then(CacheArg::as_str)
    }

    /// Serialize to the JSON array sent as the request body.
    pub fn to_json(&self) -> Result<Vec<u8>> {
        serde_json::to_vec(self).map_err(|e| CacheError::Encode(e.to_string()))
    }
}

impl Serialize for CacheInstruction {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut seq = serializer.serialize_seq(Some(self.args.len() + 1))?;
        seq.serialize_element(self.command.as_str())?;
        for arg in &self.args {
            seq.serialize_element(arg)?;
        }
        seq.end()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn wire(instruction: &CacheInstruction) -> serde_json::Value {
        serde_json::from_slice(&instruction.to_json().unwrap()).unwrap()
    }

    #[test]
    fn test_set_with_expiry_wire_shape() {
        let instruction = CacheInstruction::set_with_expiry("tenant:session_tokens:abc", "{}", 3600);
        assert_eq!(
            wire(&instruction),
            json!(["SET", "tenant:session_tokens:abc", "{}", "EX", 3600])
        );
    }

    #[test]
    fn test_expiry_is_a_json_number() {
        let bytes = CacheInstruction::expire("k", 60).to_json().unwrap();
        assert_eq!(String::from_utf8(bytes).unwrap(), r#"["EXPIRE","k",60]"#);
    }

    #[test]
    fn test_hash_commands() {
        assert_eq!(
            wire(&CacheInstruction::hset("tenant:available_tokens", "tok", "payload")),
            json!(["HSET", "tenant:available_tokens", "tok", "payload"])
        );
        assert_eq!(
            wire(&CacheInstruction::hget("tenant:available_tokens", "tok")),
            json!(["HGET", "tenant:available_tokens", "tok"])
        );
        assert_eq!(
            wire(&CacheInstruction::hdel("tenant:available_tokens", "tok")),
            json!(["HDEL", "tenant:available_tokens", "tok"])
        );
    }

    #[test]
    fn test_payload_is_escaped_not_split() {
        let payload = r#"{"token":"a.b.c","claims":{"aud":["x"]}}"#;
        let instruction = CacheInstruction::set("k", payload);
        let value = wire(&instruction);
        assert_eq!(value[2], json!(payload));
        assert_eq!(value.as_array().unwrap().len(), 3);
    }

    #[test]
    fn test_key_and_command_accessors() {
        let instruction = CacheInstruction::get("a:b:c");
        assert_eq!(instruction.command(), CacheCommand::Get);
        assert_eq!(instruction.key(), Some("a:b:c"));
        assert_eq!(instruction.args().len(), 1);
        assert_eq!(CacheCommand::HGet.to_string(), "HGET");
    }
}
