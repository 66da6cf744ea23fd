// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub configuration.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::discovery::DiscoveryOptions;
use crate::error::ConfigError;
use crate::protocol::HttpConfig;
use crate::store::DEFAULT_HISTORY_CAPACITY;
use crate::types::AccountId;

/// Who the hub acts as when it pairs with a bridge.
///
/// Registered bridges and everything imported from them belong to
/// `account`. The `client_id` is sent as the registration device type.
///
/// # Examples
///
/// ```
/// use homelink::hub::ServiceIdentity;
///
/// let identity = ServiceIdentity::new("alice");
/// assert_eq!(identity.client_id, "homelink#hub");
///
/// let identity = ServiceIdentity::new("alice").with_client_id("homelink#kitchen");
/// assert_eq!(identity.account.as_str(), "alice");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceIdentity {
    /// Owning account.
    pub account: AccountId,
    /// Registration device type.
    #[serde(default = "ServiceIdentity::default_client_id")]
    pub client_id: String,
}

impl ServiceIdentity {
    /// Default registration device type.
    pub const DEFAULT_CLIENT_ID: &'static str = "homelink#hub";

    /// Creates an identity for an account with the default client id.
    #[must_use]
    pub fn new(account: impl Into<String>) -> Self {
        Self {
            account: AccountId::new(account),
            client_id: Self::DEFAULT_CLIENT_ID.to_string(),
        }
    }

    /// Sets the client id.
    #[must_use]
    pub fn with_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.client_id = client_id.into();
        self
    }

    fn default_client_id() -> String {
        Self::DEFAULT_CLIENT_ID.to_string()
    }
}

impl Default for ServiceIdentity {
    fn default() -> Self {
        Self::new("hub")
    }
}

/// Discovery settings as stored in the configuration file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Search target.
    pub service: String,
    /// Listen window of each round, in milliseconds.
    pub timeout_ms: u64,
    /// Number of search rounds.
    pub retries: u32,
    /// Maximum answer delay devices may use, in seconds.
    pub mx: u8,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        let options = DiscoveryOptions::default();
        Self {
            service: options.service().to_string(),
            timeout_ms: u64::try_from(options.timeout().as_millis()).unwrap_or(u64::MAX),
            retries: options.retries(),
            mx: options.mx(),
        }
    }
}

/// Configuration of a [`Hub`](super::Hub).
///
/// Every field has a default, so a configuration file only needs the
/// fields it changes.
///
/// # Examples
///
/// ```
/// use homelink::hub::HubConfig;
/// use std::time::Duration;
///
/// let config: HubConfig = serde_json::from_str(
///     r#"{"identity": {"account": "alice"}, "request_timeout_ms": 5000}"#,
/// )
/// .unwrap();
///
/// assert_eq!(config.identity.client_id, "homelink#hub");
/// assert_eq!(config.request_timeout(), Duration::from_secs(5));
/// assert_eq!(config.history_capacity, 100);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HubConfig {
    /// Identity used for registration and ownership.
    pub identity: ServiceIdentity,
    /// Port bridges listen on.
    pub bridge_port: u16,
    /// Deadline of every bridge request, in milliseconds.
    pub request_timeout_ms: u64,
    /// Entries kept per device history.
    pub history_capacity: usize,
    /// Where snapshots are saved, if anywhere.
    pub snapshot_path: Option<PathBuf>,
    /// Bridge discovery.
    pub discovery: DiscoverySettings,
}

impl Default for HubConfig {
    fn default() -> Self {
        Self {
            identity: ServiceIdentity::default(),
            bridge_port: HttpConfig::DEFAULT_PORT,
            request_timeout_ms: u64::try_from(HttpConfig::DEFAULT_TIMEOUT.as_millis())
                .unwrap_or(u64::MAX),
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            snapshot_path: None,
            discovery: DiscoverySettings::default(),
        }
    }
}

impl HubConfig {
    /// Creates a default configuration for an identity.
    #[must_use]
    pub fn new(identity: ServiceIdentity) -> Self {
        Self {
            identity,
            ..Self::default()
        }
    }

    /// Reads a JSON configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read and
    /// `ConfigError::Format` if it is not a valid configuration.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path).await?;
        let config = serde_json::from_str(&text)?;
        tracing::debug!(path = %path.display(), "Hub configuration loaded");
        Ok(config)
    }

    /// Sets the request timeout.
    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout_ms = u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX);
        self
    }

    /// Sets the history capacity.
    #[must_use]
    pub fn with_history_capacity(mut self, capacity: usize) -> Self {
        self.history_capacity = capacity;
        self
    }

    /// Sets the snapshot path.
    #[must_use]
    pub fn with_snapshot_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.snapshot_path = Some(path.into());
        self
    }

    /// Returns the request timeout.
    #[must_use]
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Returns the HTTP settings for a bridge at `address`.
    ///
    /// An address with its own `:port` suffix keeps it.
    #[must_use]
    pub fn http_config(&self, address: &str) -> HttpConfig {
        let config = HttpConfig::new(address).with_timeout(self.request_timeout());
        if self.bridge_port == HttpConfig::DEFAULT_PORT {
            config
        } else {
            config.with_port(self.bridge_port)
        }
    }

    /// Returns the discovery options.
    #[must_use]
    pub fn discovery_options(&self) -> DiscoveryOptions {
        DiscoveryOptions::new()
            .with_service(self.discovery.service.clone())
            .with_timeout(Duration::from_millis(self.discovery.timeout_ms))
            .with_retries(self.discovery.retries)
            .with_mx(self.discovery.mx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = HubConfig::default();
        assert_eq!(config.request_timeout(), Duration::from_secs(10));
        assert_eq!(config.discovery.timeout_ms, 2000);
        assert_eq!(config.discovery.retries, 1);
        assert!(config.snapshot_path.is_none());
    }

    #[test]
    fn http_config_uses_port_and_timeout() {
        let config = HubConfig::default()
            .with_request_timeout(Duration::from_secs(3));
        let http = config.http_config("10.0.0.5");
        assert_eq!(http.base_url(), "http://10.0.0.5");
        assert_eq!(http.timeout(), Duration::from_secs(3));

        let config = HubConfig {
            bridge_port: 8080,
            ..HubConfig::default()
        };
        assert_eq!(config.http_config("10.0.0.5").base_url(), "http://10.0.0.5:8080");
    }

    #[test]
    fn discovery_options_follow_settings() {
        let mut config = HubConfig::default();
        config.discovery.retries = 3;
        config.discovery.timeout_ms = 500;
        let options = config.discovery_options();
        assert_eq!(options.retries(), 3);
        assert_eq!(options.timeout(), Duration::from_millis(500));
    }

    #[tokio::test]
    async fn load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub.json");
        tokio::fs::write(
            &path,
            serde_json::json!({
                "identity": { "account": "alice", "client_id": "homelink#test" },
                "history_capacity": 5
            })
            .to_string(),
        )
        .await
        .unwrap();

        let config = HubConfig::load(&path).await.unwrap();
        assert_eq!(config.identity, ServiceIdentity::new("alice").with_client_id("homelink#test"));
        assert_eq!(config.history_capacity, 5);
        assert_eq!(config.bridge_port, 80);
    }

    #[tokio::test]
    async fn load_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub.json");
        tokio::fs::write(&path, "not json").await.unwrap();
        assert!(matches!(HubConfig::load(&path).await, Err(ConfigError::Format(_))));
        assert!(matches!(
            HubConfig::load(dir.path().join("missing.json")).await,
            Err(ConfigError::Io(_))
        ));
    }
}
