// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Result lines returned by mutating bridge calls.
//!
//! PUT, POST and DELETE answer with an array of single-key objects, each
//! either `{"success": {...}}` or `{"error": {"type", "address",
//! "description"}}`. An HTTP 200 can therefore still carry a failure.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{Error, ProtocolError, RegistrationError};

/// An error object embedded in a bridge response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    /// Vendor error code.
    #[serde(rename = "type")]
    pub code: u32,
    /// Resource the error refers to.
    #[serde(default)]
    pub address: String,
    /// Human-readable description.
    #[serde(default)]
    pub description: String,
}

impl ApiError {
    /// Creates an error object.
    #[must_use]
    pub fn new(code: u32, address: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            code,
            address: address.into(),
            description: description.into(),
        }
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "error {}", self.code)?;
        if !self.address.is_empty() {
            write!(f, " at {}", self.address)?;
        }
        if !self.description.is_empty() {
            write!(f, ": {}", self.description)?;
        }
        Ok(())
    }
}

/// One result line.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiResult {
    /// The bridge applied this part of the request.
    Success(Value),
    /// The bridge rejected this part of the request.
    Error(ApiError),
}

/// All result lines of one response.
///
/// # Examples
///
/// ```
/// use homelink::protocol::ApiResults;
/// use serde_json::json;
///
/// let results = ApiResults::from_value(json!([
///     {"success": {"/lights/1/state/on": true}},
///     {"error": {"type": 201, "address": "/lights/1/state/bri", "description": "device is off"}}
/// ])).unwrap();
///
/// assert!(!results.is_success());
/// assert_eq!(results.errors().len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ApiResults(Vec<ApiResult>);

impl ApiResults {
    /// Parses a response body into result lines.
    ///
    /// Accepts an array of lines or a single line object.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::UnexpectedFormat` if the body is not made of
    /// `success`/`error` lines.
    pub fn from_value(value: Value) -> Result<Self, ProtocolError> {
        let lines = match value {
            Value::Array(lines) => lines,
            line @ Value::Object(_) => vec![line],
            other => {
                return Err(ProtocolError::UnexpectedFormat(format!(
                    "expected result lines, got {other}"
                )));
            }
        };

        lines
            .into_iter()
            .map(|line| {
                serde_json::from_value(line)
                    .map_err(|e| ProtocolError::UnexpectedFormat(format!("result line: {e}")))
            })
            .collect::<Result<Vec<_>, _>>()
            .map(Self)
    }

    /// Returns `true` when no line carries an error.
    #[must_use]
    pub fn is_success(&self) -> bool {
        self.0.iter().all(|r| matches!(r, ApiResult::Success(_)))
    }

    /// Returns every embedded error.
    #[must_use]
    pub fn errors(&self) -> Vec<ApiError> {
        self.0
            .iter()
            .filter_map(|r| match r {
                ApiResult::Error(e) => Some(e.clone()),
                ApiResult::Success(_) => None,
            })
            .collect()
    }

    /// Iterates over success payloads.
    pub fn successes(&self) -> impl Iterator<Item = &Value> {
        self.0.iter().filter_map(|r| match r {
            ApiResult::Success(v) => Some(v),
            ApiResult::Error(_) => None,
        })
    }

    /// Returns the `id` of the first success payload, as sent by create calls.
    #[must_use]
    pub fn created_id(&self) -> Option<String> {
        self.successes().find_map(|v| match v.get("id")? {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        })
    }

    /// Returns the result lines.
    #[must_use]
    pub fn lines(&self) -> &[ApiResult] {
        &self.0
    }
}

/// Extracts the auth token from a registration response.
///
/// The first error line wins, so a refused handshake never yields a token.
///
/// # Errors
///
/// - `Error::Registration` carrying the vendor code for an error line
/// - `ProtocolError::UnexpectedFormat` if no line carries a username
pub fn parse_registration(value: Value) -> Result<String, Error> {
    let results = ApiResults::from_value(value)?;

    if let Some(error) = results.errors().into_iter().next() {
        return Err(RegistrationError::new(error.code, error.description).into());
    }

    results
        .successes()
        .find_map(|v| v.get("username").and_then(Value::as_str))
        .map(ToString::to_string)
        .ok_or_else(|| {
            ProtocolError::UnexpectedFormat("registration response has no username".to_string())
                .into()
        })
}
