//! Common test utilities for integration tests.

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;

use base64::{Engine, engine::general_purpose::URL_SAFE};
use parking_lot::Mutex;
use serde_json::Value;
use wiremock::matchers::method;
use wiremock::{Match, Mock, MockServer, Request, Respond, ResponseTemplate};

/// In-memory cache service speaking the JSON command protocol.
///
/// Clones share state, so a test can keep one handle while the mock server
/// owns another.
#[derive(Clone, Default)]
pub struct FakeCache {
    state: Arc<Mutex<FakeState>>,
}

#[derive(Default)]
struct FakeState {
    strings: HashMap<String, String>,
    hashes: HashMap<String, HashMap<String, String>>,
    expiries: HashMap<String, u64>,
}

impl FakeCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn string(&self, key: &str) -> Option<String> {
        self.state.lock().strings.get(key).cloned()
    }

    pub fn hash_field(&self, key: &str, field: &str) -> Option<String> {
        self.state
            .lock()
            .hashes
            .get(key)
            .and_then(|h| h.get(field).cloned())
    }

    pub fn expiry(&self, key: &str) -> Option<u64> {
        self.state.lock().expiries.get(key).copied()
    }

    pub fn put_string(&self, key: &str, value: &str) {
        self.state
            .lock()
            .strings
            .insert(key.to_string(), value.to_string());
    }

    pub fn put_hash_field(&self, key: &str, field: &str, value: &str) {
        self.state
            .lock()
            .hashes
            .entry(key.to_string())
            .or_default()
            .insert(field.to_string(), value.to_string());
    }

    pub fn remove_string(&self, key: &str) {
        self.state.lock().strings.remove(key);
    }

    pub fn hash_len(&self, key: &str) -> usize {
        self.state.lock().hashes.get(key).map_or(0, HashMap::len)
    }

    pub fn string_count(&self) -> usize {
        self.state.lock().strings.len()
    }
}

fn encoded(value: Option<&String>) -> ResponseTemplate {
    let body = value.map(|v| URL_SAFE.encode(v)).unwrap_or_default();
    ResponseTemplate::new(200).set_body_json(body)
}

impl Respond for FakeCache {
    fn respond(&self, request: &Request) -> ResponseTemplate {
        let Ok(args) = serde_json::from_slice::<Vec<Value>>(&request.body) else {
            return ResponseTemplate::new(400);
        };
        let words: Vec<String> = args
            .iter()
            .map(|v| match v {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect();

        let mut state = self.state.lock();
        match words.iter().map(String::as_str).collect::<Vec<_>>().as_slice() {
            ["SET", key, value] => {
                state.strings.insert(key.to_string(), value.to_string());
                ResponseTemplate::new(200).set_body_json("OK")
            }
            ["SET", key, value, "EX", seconds] => {
                let Ok(seconds) = seconds.parse::<u64>() else {
                    return ResponseTemplate::new(400);
                };
                state.strings.insert(key.to_string(), value.to_string());
                state.expiries.insert(key.to_string(), seconds);
                ResponseTemplate::new(200).set_body_json("OK")
            }
            ["GET", key] => encoded(state.strings.get(*key)),
            ["DEL", key] => {
                let removed = state.strings.remove(*key).is_some();
                ResponseTemplate::new(200).set_body_json(u8::from(removed))
            }
            ["HSET", key, field, value] => {
                state
                    .hashes
                    .entry(key.to_string())
                    .or_default()
                    .insert(field.to_string(), value.to_string());
                ResponseTemplate::new(200).set_body_json(1)
            }
            ["HGET", key, field] => encoded(state.hashes.get(*key).and_then(|h| h.get(*field))),
            ["HDEL", key, field] => {
                let removed = state
                    .hashes
                    .get_mut(*key)
                    .and_then(|h| h.remove(*field))
                    .is_some();
                ResponseTemplate::new(200).set_body_json(u8::from(removed))
            }
            ["EXPIRE", key, seconds] => {
                let Ok(seconds) = seconds.parse::<u64>() else {
                    return ResponseTemplate::new(400);
                };
                state.expiries.insert(key.to_string(), seconds);
                ResponseTemplate::new(200).set_body_json(1)
            }
            _ => ResponseTemplate::new(400),
        }
    }
}

/// Start a mock server backed by a fresh [`FakeCache`].
pub async fn start_cache() -> (MockServer, FakeCache) {
    let server = MockServer::start().await;
    let cache = FakeCache::new();
    Mock::given(method("POST"))
        .respond_with(cache.clone())
        .mount(&server)
        .await;
    (server, cache)
}

/// Number of requests the server has seen.
pub async fn request_count(server: &MockServer) -> usize {
    server
        .received_requests()
        .await
        .map(|r| r.len())
        .unwrap_or_default()
}

/// An address nothing is listening on.
pub fn closed_address() -> String {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);
    format!("http://{}", addr)
}

/// Matches requests whose instruction names `command`.
pub struct CommandIs(pub &'static str);

impl Match for CommandIs {
    fn matches(&self, request: &Request) -> bool {
        commands_of(std::slice::from_ref(request)).first().map(String::as_str) == Some(self.0)
    }
}

/// Command names of `requests`, in arrival order.
pub fn commands_of(requests: &[Request]) -> Vec<String> {
    requests
        .iter()
        .filter_map(|r| serde_json::from_slice::<Vec<Value>>(&r.body).ok())
        .filter_map(|args| args.first().and_then(Value::as_str).map(str::to_string))
        .collect()
}

/// Command names the server has received so far.
pub async fn received_commands(server: &MockServer) -> Vec<String> {
    commands_of(&server.received_requests().await.unwrap_or_default())
}
