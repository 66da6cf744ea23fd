// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Error types for the hub.
//!
//! Every failure the hub can surface is recoverable at the caller's
//! discretion. The taxonomy follows the life of a bridge: talking to it
//! ([`ProtocolError`]), pairing with it ([`RegistrationError`]), pulling its
//! inventory ([`ImportError`]) and driving its devices ([`ControlError`]).

use std::fmt;

use thiserror::Error;

use crate::model::EntityKind;
use crate::protocol::{ApiError, Method};
use crate::types::{ActionId, ConditionId, DeviceId, GroupId, RuleId};

/// The main error type for this library.
#[derive(Debug, Error)]
pub enum Error {
    /// A value was outside its allowed domain.
    #[error("value error: {0}")]
    Value(#[from] ValueError),

    /// Communication with a bridge failed.
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    /// The registration handshake was refused by the bridge.
    #[error("registration failed: {0}")]
    Registration(#[from] RegistrationError),

    /// A single remote entity could not be imported.
    #[error("import error: {0}")]
    Import(#[from] ImportError),

    /// The bridge answered a control command with an embedded error.
    #[error("control error: {0}")]
    Control(#[from] ControlError),

    /// A local record lookup or snapshot operation failed.
    #[error("store error: {0}")]
    Store(#[from] StoreError),

    /// The hub configuration could not be loaded.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// A group member's bridge could not be used.
    #[error("bridge {bridge} unavailable: {reason}")]
    BridgeUnavailable {
        /// The bridge record.
        bridge: DeviceId,
        /// Why it could not be used.
        reason: String,
    },

    /// The device does not support the requested operation.
    #[error("device does not support this capability")]
    CapabilityNotSupported,
}

impl Error {
    /// Returns `true` if retrying the same call may succeed.
    ///
    /// Timeouts and transport failures are retryable; the hub never
    /// retries on its own.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Protocol(e) => e.is_retryable(),
            Self::Registration(e) => e.is_link_button_not_pressed(),
            _ => false,
        }
    }
}

/// Errors related to value validation and constraints.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ValueError {
    /// A numeric value is outside the allowed range.
    #[error("value {actual} is out of range [{min}, {max}]")]
    OutOfRange {
        /// Minimum allowed value.
        min: u16,
        /// Maximum allowed value.
        max: u16,
        /// The actual value that was provided.
        actual: u16,
    },

    /// A comparison operator was not recognised.
    #[error("unknown operator: {0}")]
    UnknownOperator(String),

    /// A device state attribute name was not recognised.
    #[error("unknown state attribute: {0}")]
    UnknownAttribute(String),

    /// A condition or action value could not be parsed.
    #[error("invalid value: {0}")]
    InvalidValue(String),

    /// A sensor structure other than `state` or `config` was requested.
    #[error("invalid sensor structure: {0}")]
    InvalidStructure(String),

    /// The attribute cannot be set on this kind of device.
    #[error("attribute {attribute} cannot be applied to a {category} device")]
    UnsupportedAttribute {
        /// The attribute name.
        attribute: String,
        /// The device category.
        category: String,
    },
}

/// Errors related to bridge communication.
#[derive(Debug, Error)]
pub enum ProtocolError {
    /// HTTP transport failed.
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The bridge did not answer within the deadline.
    #[error("{method} {path} timed out after {after_ms} ms")]
    Timeout {
        /// Request method.
        method: Method,
        /// Request path with the auth token redacted.
        path: String,
        /// Configured deadline in milliseconds.
        after_ms: u64,
    },

    /// The response body was not valid JSON.
    #[error("invalid JSON in response to {path}: {source}")]
    InvalidJson {
        /// Request path with the auth token redacted.
        path: String,
        /// Underlying parse failure.
        #[source]
        source: serde_json::Error,
    },

    /// The bridge answered with a non-success HTTP status.
    #[error("HTTP {0}")]
    Status(u16),

    /// The response was JSON but not shaped as expected.
    #[error("unexpected response format: {0}")]
    UnexpectedFormat(String),

    /// The bridge rejected the request with an error object.
    #[error("bridge rejected request: {0}")]
    Rejected(ApiError),

    /// Invalid URL or address.
    #[error("invalid address: {0}")]
    InvalidAddress(String),

    /// A token-bearing call was attempted before registration.
    #[error("bridge has no auth token; register first")]
    NotRegistered,

    /// Socket error during discovery.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ProtocolError {
    /// Returns `true` for timeouts and transport failures.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Io(_) => true,
            Self::Http(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }
}

/// The bridge refused to issue an auth token.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("bridge error {code}: {description}")]
pub struct RegistrationError {
    /// Vendor error code.
    pub code: u32,
    /// Vendor-supplied description, if any.
    pub description: String,
}

impl RegistrationError {
    /// The link button on the bridge has not been pressed.
    pub const LINK_BUTTON_NOT_PRESSED: u32 = 101;
    /// The bridge does not know the username.
    pub const UNKNOWN_USERNAME: u32 = 7;

    /// Creates a registration error for a vendor code.
    #[must_use]
    pub fn new(code: u32, description: impl Into<String>) -> Self {
        Self {
            code,
            description: description.into(),
        }
    }

    /// Returns `true` if the user must press the bridge link button and retry.
    #[must_use]
    pub fn is_link_button_not_pressed(&self) -> bool {
        self.code == Self::LINK_BUTTON_NOT_PRESSED
    }

    /// Returns `true` if the bridge rejected the username.
    #[must_use]
    pub fn is_unknown_username(&self) -> bool {
        self.code == Self::UNKNOWN_USERNAME
    }
}

/// One remote entity that could not be imported.
///
/// The rest of the batch is unaffected.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("{kind} {entity_id}: {reason}")]
pub struct ImportError {
    /// Which collection the entity came from.
    pub kind: EntityKind,
    /// The bridge's identifier for the entity.
    pub entity_id: String,
    /// What was wrong with the record.
    pub reason: String,
}

impl ImportError {
    /// Creates an import error.
    #[must_use]
    pub fn new(kind: EntityKind, entity_id: impl Into<String>, reason: impl fmt::Display) -> Self {
        Self {
            kind,
            entity_id: entity_id.into(),
            reason: reason.to_string(),
        }
    }
}

/// The bridge accepted the HTTP request but reported an error for the command.
#[derive(Debug, Error, Clone, PartialEq)]
#[error("{target}: {}", describe(.errors))]
pub struct ControlError {
    /// Human-readable target (light or group).
    pub target: String,
    /// Every error object the bridge returned.
    pub errors: Vec<ApiError>,
}

fn describe(errors: &[ApiError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join("; ")
}

/// Errors from the local store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No device with this id.
    #[error("device {0} not found")]
    DeviceNotFound(DeviceId),

    /// No group with this id.
    #[error("group {0} not found")]
    GroupNotFound(GroupId),

    /// No room at this index.
    #[error("room {0} not found")]
    RoomNotFound(usize),

    /// No rule with this id.
    #[error("rule {0} not found")]
    RuleNotFound(RuleId),

    /// No condition with this id in the rule.
    #[error("condition {0} not found")]
    ConditionNotFound(ConditionId),

    /// No action with this id in the rule.
    #[error("action {0} not found")]
    ActionNotFound(ActionId),

    /// The device exists but is not of the expected kind.
    #[error("device {device} is not a {expected}")]
    WrongSpecialization {
        /// The device looked up.
        device: DeviceId,
        /// The expected category.
        expected: &'static str,
    },

    /// A room cannot be connected to itself.
    #[error("room {0} cannot connect to itself")]
    SelfConnection(usize),

    /// Snapshot file I/O failed.
    #[error("snapshot I/O failed: {0}")]
    Io(#[from] std::io::Error),

    /// Snapshot contents could not be (de)serialized.
    #[error("snapshot format error: {0}")]
    Format(#[from] serde_json::Error),
}

/// Errors loading the hub configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The configuration file could not be read.
    #[error("cannot read configuration: {0}")]
    Io(#[from] std::io::Error),

    /// The configuration file is not valid.
    #[error("invalid configuration: {0}")]
    Format(#[from] serde_json::Error),
}

/// A specialized Result type for this library.
pub type Result<T> = std::result::Result<T, Error>;
