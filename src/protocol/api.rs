// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Path templates for the bridge API.

use std::fmt;
use std::str::FromStr;

use crate::error::ValueError;

/// Builds request paths rooted at `/api/{token}`.
///
/// Collection paths keep the trailing slash bridges accept for listing.
/// Free-form identifiers (scene and schedule ids) are percent-encoded.
///
/// # Examples
///
/// ```
/// use homelink::protocol::ApiPath;
///
/// let api = ApiPath::new("abc123");
/// assert_eq!(api.lights(), "/api/abc123/lights/");
/// assert_eq!(api.light_state(3), "/api/abc123/lights/3/state");
/// assert_eq!(ApiPath::REGISTRATION, "/api");
/// ```
#[derive(Debug, Clone, Copy)]
pub struct ApiPath<'a> {
    token: &'a str,
}

impl<'a> ApiPath<'a> {
    /// Unauthenticated root used by the registration handshake.
    pub const REGISTRATION: &'static str = "/api";

    /// Creates a path builder for a token.
    #[must_use]
    pub fn new(token: &'a str) -> Self {
        Self { token }
    }

    fn root(&self) -> String {
        format!("/api/{}", urlencoding::encode(self.token))
    }

    /// `/api/{token}/config/`
    #[must_use]
    pub fn config(&self) -> String {
        format!("{}/config/", self.root())
    }

    // ========================================================================
    // Lights
    // ========================================================================

    /// `/api/{token}/lights/`
    #[must_use]
    pub fn lights(&self) -> String {
        format!("{}/lights/", self.root())
    }

    /// `/api/{token}/lights/{index}`
    #[must_use]
    pub fn light(&self, index: u16) -> String {
        format!("{}/lights/{index}", self.root())
    }

    /// `/api/{token}/lights/{index}/state`
    #[must_use]
    pub fn light_state(&self, index: u16) -> String {
        format!("{}/lights/{index}/state", self.root())
    }

    // ========================================================================
    // Sensors
    // ========================================================================

    /// `/api/{token}/sensors/`
    #[must_use]
    pub fn sensors(&self) -> String {
        format!("{}/sensors/", self.root())
    }

    /// `/api/{token}/sensors/{index}`
    #[must_use]
    pub fn sensor(&self, index: u16) -> String {
        format!("{}/sensors/{index}", self.root())
    }

    /// `/api/{token}/sensors/{index}/{state|config}`
    #[must_use]
    pub fn sensor_content(&self, index: u16, structure: SensorStructure) -> String {
        format!("{}/sensors/{index}/{structure}", self.root())
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// `/api/{token}/groups/`
    #[must_use]
    pub fn groups(&self) -> String {
        format!("{}/groups/", self.root())
    }

    /// `/api/{token}/groups/{index}`
    #[must_use]
    pub fn group(&self, index: u16) -> String {
        format!("{}/groups/{index}", self.root())
    }

    /// `/api/{token}/groups/{index}/action`
    #[must_use]
    pub fn group_action(&self, index: u16) -> String {
        format!("{}/groups/{index}/action", self.root())
    }

    // ========================================================================
    // Scenes and schedules
    // ========================================================================

    /// `/api/{token}/scenes`
    #[must_use]
    pub fn scenes(&self) -> String {
        format!("{}/scenes", self.root())
    }

    /// `/api/{token}/schedules`
    #[must_use]
    pub fn schedules(&self) -> String {
        format!("{}/schedules", self.root())
    }

    /// `/api/{token}/schedules/{id}`
    #[must_use]
    pub fn schedule(&self, id: &str) -> String {
        format!("{}/schedules/{}", self.root(), urlencoding::encode(id))
    }
}

/// Which writable structure of a sensor to update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SensorStructure {
    /// The `state` object.
    State,
    /// The `config` object.
    Config,
}

impl SensorStructure {
    /// Returns the path segment.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Config => "config",
        }
    }
}

impl fmt::Display for SensorStructure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SensorStructure {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "state" => Ok(Self::State),
            "config" => Ok(Self::Config),
            other => Err(ValueError::InvalidStructure(other.to_string())),
        }
    }
}

/// Replaces the token segment of an `/api/{token}/...` path with `***`.
pub(crate) fn redact_token(path: &str) -> String {
    match path.strip_prefix("/api/") {
        Some(rest) if !rest.is_empty() => match rest.split_once('/') {
            Some((_, tail)) => format!("/api/***/{tail}"),
            None => "/api/***".to_string(),
        },
        _ => path.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn collection_paths() {
        let api = ApiPath::new("abc123");
        assert_eq!(api.config(), "/api/abc123/config/");
        assert_eq!(api.sensors(), "/api/abc123/sensors/");
        assert_eq!(api.groups(), "/api/abc123/groups/");
        assert_eq!(api.scenes(), "/api/abc123/scenes");
        assert_eq!(api.schedules(), "/api/abc123/schedules");
    }

    #[test]
    fn entity_paths() {
        let api = ApiPath::new("abc123");
        assert_eq!(api.light(7), "/api/abc123/lights/7");
        assert_eq!(api.sensor(2), "/api/abc123/sensors/2");
        assert_eq!(
            api.sensor_content(2, SensorStructure::Config),
            "/api/abc123/sensors/2/config"
        );
        assert_eq!(api.group(1), "/api/abc123/groups/1");
        assert_eq!(api.group_action(1), "/api/abc123/groups/1/action");
    }

    #[test]
    fn schedule_id_is_encoded() {
        let api = ApiPath::new("abc123");
        assert_eq!(api.schedule("a b"), "/api/abc123/schedules/a%20b");
    }

    #[test]
    fn sensor_structure_parse() {
        assert_eq!(
            "state".parse::<SensorStructure>().unwrap(),
            SensorStructure::State
        );
        assert_eq!(
            "name".parse::<SensorStructure>().unwrap_err(),
            ValueError::InvalidStructure("name".to_string())
        );
    }

    #[test]
    fn redacts_token_segment() {
        assert_eq!(redact_token("/api/abc123/lights/"), "/api/***/lights/");
        assert_eq!(redact_token("/api/abc123"), "/api/***");
        assert_eq!(redact_token("/api"), "/api");
        assert_eq!(redact_token("/description.xml"), "/description.xml");
    }
}
