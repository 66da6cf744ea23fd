// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! HTTP transport for bridge requests.

use std::time::Duration;

use reqwest::Client;
use serde_json::Value;

use crate::error::ProtocolError;
use crate::protocol::Method;
use crate::protocol::api::redact_token;

// ============================================================================
// HttpConfig - Connection parameters for one bridge
// ============================================================================

/// Configuration for reaching a bridge over HTTP.
///
/// # Examples
///
/// ```
/// use homelink::protocol::HttpConfig;
/// use std::time::Duration;
///
/// // Simple configuration
/// let config = HttpConfig::new("192.168.1.2");
///
/// // With all options
/// let config = HttpConfig::new("192.168.1.2")
///     .with_port(8080)
///     .with_https()
///     .with_timeout(Duration::from_secs(5));
/// ```
#[derive(Debug, Clone)]
pub struct HttpConfig {
    host: String,
    port: u16,
    use_https: bool,
    timeout: Duration,
}

impl HttpConfig {
    /// Default HTTP port.
    pub const DEFAULT_PORT: u16 = 80;
    /// Default HTTPS port.
    pub const DEFAULT_HTTPS_PORT: u16 = 443;
    /// Default request timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10);

    /// Creates a new HTTP configuration for the specified host.
    ///
    /// # Arguments
    ///
    /// * `host` - The hostname or IP address of the bridge, optionally with
    ///   a `:port` suffix
    #[must_use]
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: Self::DEFAULT_PORT,
            use_https: false,
            timeout: Self::DEFAULT_TIMEOUT,
        }
    }

    /// Sets a custom port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Enables HTTPS.
    ///
    /// If port hasn't been explicitly set, it will be changed to 443.
    #[must_use]
    pub fn with_https(mut self) -> Self {
        self.use_https = true;
        if self.port == Self::DEFAULT_PORT {
            self.port = Self::DEFAULT_HTTPS_PORT;
        }
        self
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the host.
    #[must_use]
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    #[must_use]
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns whether HTTPS is enabled.
    #[must_use]
    pub fn use_https(&self) -> bool {
        self.use_https
    }

    /// Returns the timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Builds the base URL from this configuration.
    #[must_use]
    pub fn base_url(&self) -> String {
        let scheme = if self.use_https { "https" } else { "http" };
        let port_suffix =
            if (self.use_https && self.port == 443) || (!self.use_https && self.port == 80) {
                String::new()
            } else {
                format!(":{}", self.port)
            };
        format!("{scheme}://{}{port_suffix}", self.host)
    }

    /// Creates a [`BridgeClient`] from this configuration.
    ///
    /// # Errors
    ///
    /// Returns error if the host is empty or the HTTP client cannot be
    /// created.
    pub fn into_client(self) -> Result<BridgeClient, ProtocolError> {
        if self.host.trim().is_empty() {
            return Err(ProtocolError::InvalidAddress(
                "host is required".to_string(),
            ));
        }

        let base_url = self.base_url();
        url::Url::parse(&base_url)
            .map_err(|e| ProtocolError::InvalidAddress(format!("{base_url}: {e}")))?;

        let client = Client::builder()
            .timeout(self.timeout)
            .build()
            .map_err(ProtocolError::Http)?;

        Ok(BridgeClient {
            base_url,
            client,
            timeout: self.timeout,
        })
    }
}

// ============================================================================
// BridgeClient - Pooled HTTP client for one bridge
// ============================================================================

/// HTTP client for one bridge.
///
/// Holds a single pooled `reqwest::Client`, so repeated calls to the same
/// bridge reuse connections.
///
/// # Examples
///
/// ```no_run
/// use homelink::protocol::{ApiPath, HttpConfig, Method};
///
/// # async fn example() -> Result<(), homelink::error::ProtocolError> {
/// let client = HttpConfig::new("192.168.1.2").into_client()?;
/// let lights = client
///     .request(Method::Get, &ApiPath::new("abc123").lights(), None)
///     .await?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone)]
pub struct BridgeClient {
    base_url: String,
    client: Client,
    timeout: Duration,
}

impl BridgeClient {
    /// Returns the base URL of the bridge.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Returns the per-request timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Issues one request and parses the JSON response.
    ///
    /// GET and DELETE are sent without a body. PUT and POST serialize `body`
    /// (an empty object when `None`).
    ///
    /// # Errors
    ///
    /// - `ProtocolError::Timeout` if no response arrives within the timeout
    /// - `ProtocolError::Status` for a non-success HTTP status
    /// - `ProtocolError::InvalidJson` if the body is not JSON
    /// - `ProtocolError::Http` for other transport failures
    pub async fn request(
        &self,
        method: Method,
        path: &str,
        body: Option<&Value>,
    ) -> Result<Value, ProtocolError> {
        let url = format!("{}{path}", self.base_url);
        let redacted = redact_token(path);

        tracing::debug!(%method, path = %redacted, "Sending bridge request");

        let mut builder = self.client.request(method.into(), &url);
        if method.has_body() {
            let empty = Value::Object(serde_json::Map::new());
            builder = builder.json(body.unwrap_or(&empty));
        }

        let response = builder
            .send()
            .await
            .map_err(|e| self.transport_error(method, &redacted, e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::debug!(
                %method,
                path = %redacted,
                status = status.as_u16(),
                "Bridge returned error status"
            );
            return Err(ProtocolError::Status(status.as_u16()));
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| self.transport_error(method, &redacted, e))?;

        tracing::trace!(
            path = %redacted,
            body = %String::from_utf8_lossy(&bytes),
            "Received bridge response"
        );

        serde_json::from_slice(&bytes).map_err(|source| ProtocolError::InvalidJson {
            path: redacted,
            source,
        })
    }

    fn transport_error(&self, method: Method, path: &str, err: reqwest::Error) -> ProtocolError {
        if err.is_timeout() {
            ProtocolError::Timeout {
                method,
                path: path.to_string(),
                after_ms: u64::try_from(self.timeout.as_millis()).unwrap_or(u64::MAX),
            }
        } else {
            ProtocolError::Http(err)
        }
    }
}
