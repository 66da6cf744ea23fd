// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SSDP bridge discovery.
//!
//! Bridges answer a multicast `M-SEARCH` sent to `239.255.255.250:1900`.
//! Each answer carries a `location` URL from which the bridge address is
//! taken.
//!
//! # Discovery Mechanism
//!
//! 1. Sends one search per retry round from a fresh socket (multicast TTL 2)
//! 2. Collects answers until the round's listen window closes
//! 3. Deduplicates answers by `location` across rounds
//!
//! # Examples
//!
//! ```no_run
//! use homelink::discovery::{discover, DiscoveryOptions};
//! use std::time::Duration;
//!
//! # async fn example() -> Result<(), homelink::error::ProtocolError> {
//! let options = DiscoveryOptions::new()
//!     .with_timeout(Duration::from_secs(3))
//!     .with_retries(2);
//!
//! for response in discover(&options).await? {
//!     println!("bridge at {:?}", response.address());
//! }
//! # Ok(())
//! # }
//! ```

mod ssdp;

pub use ssdp::{SsdpResponse, parse_ip_address, search_request};

use std::collections::HashMap;
use std::net::{Ipv4Addr, SocketAddrV4};
use std::time::Duration;

use tokio::net::UdpSocket;
use tokio::time::Instant;

use crate::error::ProtocolError;

/// SSDP multicast group.
pub const SSDP_GROUP: SocketAddrV4 = SocketAddrV4::new(Ipv4Addr::new(239, 255, 255, 250), 1900);

const MULTICAST_TTL: u32 = 2;

/// Options for an SSDP search.
///
/// # Examples
///
/// ```
/// use homelink::discovery::DiscoveryOptions;
/// use std::time::Duration;
///
/// let options = DiscoveryOptions::new();
/// assert_eq!(options.service(), "urn:schemas-upnp-org:device:basic:1");
/// assert_eq!(options.timeout(), Duration::from_secs(2));
/// assert_eq!(options.retries(), 1);
/// assert_eq!(options.mx(), 3);
/// ```
#[derive(Debug, Clone)]
pub struct DiscoveryOptions {
    service: String,
    timeout: Duration,
    retries: u32,
    mx: u8,
}

impl Default for DiscoveryOptions {
    fn default() -> Self {
        Self {
            service: Self::DEFAULT_SERVICE.to_string(),
            timeout: Self::DEFAULT_TIMEOUT,
            retries: 1,
            mx: 3,
        }
    }
}

impl DiscoveryOptions {
    /// Service type bridges answer for.
    pub const DEFAULT_SERVICE: &'static str = "urn:schemas-upnp-org:device:basic:1";

    /// Default listen timeout.
    pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(2);

    /// Creates options with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the search target.
    #[must_use]
    pub fn with_service(mut self, service: impl Into<String>) -> Self {
        self.service = service.into();
        self
    }

    /// Sets the listen timeout of each round.
    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Sets the number of search rounds (at least one).
    #[must_use]
    pub fn with_retries(mut self, retries: u32) -> Self {
        self.retries = retries.max(1);
        self
    }

    /// Sets the maximum delay, in seconds, devices may wait before answering.
    #[must_use]
    pub fn with_mx(mut self, mx: u8) -> Self {
        self.mx = mx;
        self
    }

    /// Returns the search target.
    #[must_use]
    pub fn service(&self) -> &str {
        &self.service
    }

    /// Returns the listen timeout.
    #[must_use]
    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    /// Returns the number of rounds.
    #[must_use]
    pub fn retries(&self) -> u32 {
        self.retries
    }

    /// Returns the MX value.
    #[must_use]
    pub fn mx(&self) -> u8 {
        self.mx
    }

    /// Returns how long each round listens: the longer of timeout and MX.
    #[must_use]
    pub fn listen_window(&self) -> Duration {
        self.timeout.max(Duration::from_secs(u64::from(self.mx)))
    }
}

/// Searches the local network and returns every distinct answer.
///
/// # Errors
///
/// Returns `ProtocolError::Io` if the socket cannot be opened or the search
/// cannot be sent.
pub async fn discover(options: &DiscoveryOptions) -> Result<Vec<SsdpResponse>, ProtocolError> {
    let request = search_request(SSDP_GROUP, options.service(), options.mx());
    let window = options.listen_window();
    let mut responses: HashMap<String, SsdpResponse> = HashMap::new();

    tracing::info!(
        service = %options.service(),
        retries = options.retries(),
        window_ms = u64::try_from(window.as_millis()).unwrap_or(u64::MAX),
        "Starting SSDP discovery"
    );

    for round in 0..options.retries() {
        let socket = UdpSocket::bind((Ipv4Addr::UNSPECIFIED, 0)).await?;
        socket.set_multicast_ttl_v4(MULTICAST_TTL)?;
        socket.send_to(request.as_bytes(), SSDP_GROUP).await?;

        let deadline = Instant::now() + window;
        let mut buf = vec![0u8; 2048];

        loop {
            match tokio::time::timeout_at(deadline, socket.recv_from(&mut buf)).await {
                Ok(Ok((len, from))) => {
                    let raw = String::from_utf8_lossy(&buf[..len]);
                    if let Some(response) = SsdpResponse::parse(&raw) {
                        tracing::debug!(%from, location = %response.location, "SSDP answer");
                        responses.insert(response.location.clone(), response);
                    } else {
                        tracing::trace!(%from, "Ignoring non-SSDP datagram");
                    }
                }
                Ok(Err(e)) => {
                    tracing::warn!(round, error = %e, "SSDP receive failed, ending round");
                    break;
                }
                Err(_) => break,
            }
        }
    }

    tracing::info!(count = responses.len(), "SSDP discovery completed");

    Ok(responses.into_values().collect())
}

/// Searches the local network and returns the distinct bridge addresses.
///
/// # Errors
///
/// Same as [`discover`].
pub async fn discover_addresses(options: &DiscoveryOptions) -> Result<Vec<String>, ProtocolError> {
    let mut addresses: Vec<String> = discover(options)
        .await?
        .iter()
        .filter_map(SsdpResponse::address)
        .collect();
    addresses.sort();
    addresses.dedup();
    Ok(addresses)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn discovery_options_chained() {
        let options = DiscoveryOptions::new()
            .with_service("ssdp:all")
            .with_timeout(Duration::from_secs(5))
            .with_retries(3)
            .with_mx(1);

        assert_eq!(options.service(), "ssdp:all");
        assert_eq!(options.timeout(), Duration::from_secs(5));
        assert_eq!(options.retries(), 3);
        assert_eq!(options.mx(), 1);
    }

    #[test]
    fn retries_never_zero() {
        assert_eq!(DiscoveryOptions::new().with_retries(0).retries(), 1);
    }

    #[test]
    fn listen_window_is_longer_of_timeout_and_mx() {
        let options = DiscoveryOptions::new();
        assert_eq!(options.listen_window(), Duration::from_secs(3));

        let options = options.with_timeout(Duration::from_secs(4));
        assert_eq!(options.listen_window(), Duration::from_secs(4));
    }
}
