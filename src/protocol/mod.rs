// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge protocol client.
//!
//! Bridges expose a JSON-over-HTTP API rooted at `/api/{token}`. This module
//! provides the transport ([`BridgeClient`]), path templates ([`ApiPath`]) and
//! parsing of the result lines returned by mutating calls ([`ApiResults`]).
//!
//! The client is stateless: every call is an independent request. Calls that
//! need a token take it through [`ApiPath`], so a client can be built before
//! registration and reused afterwards.

mod api;
mod http;
mod response;

pub use api::{ApiPath, SensorStructure};
pub use http::{BridgeClient, HttpConfig};
pub use response::{ApiError, ApiResult, ApiResults, parse_registration};

use std::fmt;

use serde::{Deserialize, Serialize};

/// HTTP method of a bridge request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Method {
    /// Read a resource.
    Get,
    /// Update a resource.
    Put,
    /// Create a resource.
    Post,
    /// Delete a resource.
    Delete,
}

impl Method {
    /// Returns `true` if requests with this method carry a JSON body.
    #[must_use]
    pub const fn has_body(&self) -> bool {
        matches!(self, Self::Put | Self::Post)
    }

    /// Returns the method name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Get => "GET",
            Self::Put => "PUT",
            Self::Post => "POST",
            Self::Delete => "DELETE",
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Get => Self::GET,
            Method::Put => Self::PUT,
            Method::Post => Self::POST,
            Method::Delete => Self::DELETE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_put_and_post_carry_bodies() {
        assert!(!Method::Get.has_body());
        assert!(Method::Put.has_body());
        assert!(Method::Post.has_body());
        assert!(!Method::Delete.has_body());
    }

    #[test]
    fn serializes_uppercase() {
        assert_eq!(serde_json::to_string(&Method::Put).unwrap(), "\"PUT\"");
    }
}
