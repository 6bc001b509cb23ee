//! HTTP transport for cache instructions.

use std::sync::Arc;
use std::time::Duration;

use reqwest::header::{CONTENT_TYPE, HeaderValue};
use tracing::{debug, trace};
use url::Url;

use crate::error::{CacheError, Result};
use crate::instruction::CacheInstruction;
use crate::response::RawResponse;

const APPLICATION_JSON: &str = "application/json";

/// Client for the cache service.
///
/// Each call to [`send`](Self::send) is exactly one POST to the configured
/// address. There is no retry and, unless configured, no timeout: both belong
/// to the host that owns the client.
#[derive(Clone)]
pub struct CacheClient {
    inner: Arc<ClientInner>,
}

struct ClientInner {
    /// HTTP client.
    http: reqwest::Client,
    /// Address every instruction is posted to.
    address: Url,
    /// Per-request timeout, if any.
    timeout: Option<Duration>,
}

impl std::fmt::Debug for CacheClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheClient")
            .field("address", &self.inner.address.as_str())
            .field("timeout", &self.inner.timeout)
            .finish()
    }
}

impl CacheClient {
    /// Create a new client builder.
    pub fn builder() -> CacheClientBuilder {
        CacheClientBuilder::new()
    }

    /// Create a client for `address` with default settings.
    pub fn new(address: &str) -> Result<Self> {
        Self::builder().address(address).build()
    }

    /// The address every instruction is posted to.
    pub fn address(&self) -> &Url {
        &self.inner.address
    }

    /// Send one instruction and return the raw status and body.
    ///
    /// Fails only on transport problems; status interpretation is left to the
    /// caller (see [`RawResponse::check_status`]).
    pub async fn send(&self, instruction: &CacheInstruction) -> Result<RawResponse> {
        let body = instruction.to_json()?;
        debug!(
            command = %instruction.command(),
            address = %self.inner.address,
            "Sending cache instruction"
        );

        let mut request = self
            .inner
            .http
            .post(self.inner.address.clone())
            .header(CONTENT_TYPE, HeaderValue::from_static(APPLICATION_JSON))
            .body(body);
        if let Some(timeout) = self.inner.timeout {
            request = request.timeout(timeout);
        }

        let response = request.send().await.map_err(|e| {
            CacheError::Transport(format!("{} request failed: {}", instruction.command(), e))
        })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            CacheError::Transport(format!(
                "Failed to read {} response body: {}",
                instruction.command(),
                e
            ))
        })?;

        trace!(
            command = %instruction.command(),
            status = status.as_u16(),
            body_len = body.len(),
            "Cache responded"
        );
        Ok(RawResponse::new(status, body))
    }
}

/// Builder for creating a [`CacheClient`].
#[derive(Debug, Default)]
pub struct CacheClientBuilder {
    address: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
}

impl CacheClientBuilder {
    /// Create a new builder with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the cache service address.
    pub fn address(mut self, address: impl Into<String>) -> Self {
        self.address = Some(address.into());
        self
    }

    /// Bound every request by `timeout`.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set a custom user agent.
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Build the client.
    pub fn build(self) -> Result<CacheClient> {
        let address = self
            .address
            .ok_or_else(|| CacheError::Config("cache address is required".to_string()))?;
        let address = Url::parse(&address)
            .map_err(|e| CacheError::Config(format!("Invalid cache address '{}': {}", address, e)))?;

        let user_agent = self
            .user_agent
            .unwrap_or_else(|| format!("tether-cache/{}", env!("CARGO_PKG_VERSION")));

        let http = reqwest::Client::builder()
            .user_agent(user_agent)
            .build()
            .map_err(|e| CacheError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(CacheClient {
            inner: Arc::new(ClientInner {
                http,
                address,
                timeout: self.timeout,
            }),
        })
    }
}
