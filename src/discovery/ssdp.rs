// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! SSDP message formatting and parsing.

use std::net::SocketAddrV4;
use std::time::Duration;

/// A device's answer to an `M-SEARCH`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SsdpResponse {
    /// URL of the device description, carrying its address.
    pub location: String,
    /// Unique service name.
    pub usn: Option<String>,
    /// Search target the device answered for.
    pub st: Option<String>,
    /// How long the announcement stays valid.
    pub max_age: Option<Duration>,
}

impl SsdpResponse {
    /// Parses a raw HTTP-over-UDP response.
    ///
    /// Header names are matched case-insensitively. Returns `None` when the
    /// status line is not `HTTP/1.x 200` or `location` is missing.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut lines = raw.lines();
        let status = lines.next()?;
        let mut parts = status.split_whitespace();
        if !parts.next()?.starts_with("HTTP/1.") || parts.next()? != "200" {
            return None;
        }

        let mut location = None;
        let mut usn = None;
        let mut st = None;
        let mut max_age = None;

        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            match name.trim().to_ascii_lowercase().as_str() {
                "location" => location = Some(value.to_string()),
                "usn" => usn = Some(value.to_string()),
                "st" => st = Some(value.to_string()),
                "cache-control" => max_age = parse_max_age(value),
                _ => {}
            }
        }

        Some(Self {
            location: location?,
            usn,
            st,
            max_age,
        })
    }

    /// Returns the host part of [`Self::location`].
    #[must_use]
    pub fn address(&self) -> Option<String> {
        parse_ip_address(&self.location)
    }
}

fn parse_max_age(value: &str) -> Option<Duration> {
    value.split(',').find_map(|directive| {
        let (key, secs) = directive.split_once('=')?;
        if key.trim().eq_ignore_ascii_case("max-age") {
            secs.trim().parse().ok().map(Duration::from_secs)
        } else {
            None
        }
    })
}

/// Builds an `M-SEARCH` request for a service type.
#[must_use]
pub fn search_request(group: SocketAddrV4, service: &str, mx: u8) -> String {
    [
        "M-SEARCH * HTTP/1.1".to_string(),
        format!("HOST: {}:{}", group.ip(), group.port()),
        "MAN: \"ssdp:discover\"".to_string(),
        format!("ST: {service}"),
        format!("MX: {mx}"),
        String::new(),
        String::new(),
    ]
    .join("\r\n")
}

/// Extracts the host from a `location` value.
///
/// Accepts full URLs (`http://10.0.0.5:80/description.xml`) and bare
/// addresses (`10.0.0.5:80/description.xml`). Text that is neither yields
/// `None`.
///
/// # Examples
///
/// ```
/// use homelink::discovery::parse_ip_address;
///
/// assert_eq!(
///     parse_ip_address("http://10.0.0.5:80/description.xml").as_deref(),
///     Some("10.0.0.5")
/// );
/// assert_eq!(parse_ip_address("10.0.0.5/x").as_deref(), Some("10.0.0.5"));
/// assert_eq!(parse_ip_address("not an address"), None);
/// ```
#[must_use]
pub fn parse_ip_address(location: &str) -> Option<String> {
    let location = location.trim();

    if location.contains("://") {
        let url = url::Url::parse(location).ok()?;
        return url.host_str().map(ToString::to_string);
    }

    if !location.starts_with(|c: char| c.is_ascii_digit()) {
        return None;
    }

    let end = location
        .find(':')
        .or_else(|| location.find('/'))
        .unwrap_or(location.len());
    Some(location[..end].to_string())
}
