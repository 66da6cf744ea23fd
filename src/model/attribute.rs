// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Named device state attributes, as read by rule conditions and written by
//! rule actions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// A device attribute a rule can test or set.
///
/// `State` is the primary state of the device: on/off for lights and
/// outlets, the reading for sensors.
///
/// # Examples
///
/// ```
/// use homelink::model::StateAttribute;
///
/// assert_eq!("bri".parse::<StateAttribute>().unwrap(), StateAttribute::Brightness);
/// assert_eq!("state".parse::<StateAttribute>().unwrap(), StateAttribute::State);
/// assert!("colour".parse::<StateAttribute>().is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StateAttribute {
    /// On/off, or a sensor's reading.
    State,
    /// Light brightness (0-255).
    Brightness,
    /// Light color temperature in mireds.
    ColorTemperature,
    /// Whether the bridge can reach the device.
    Reachable,
    /// Whether the local record is enabled.
    Enabled,
    /// Wi-Fi signal strength.
    SignalStrength,
    /// Wi-Fi link speed.
    Speed,
}

impl StateAttribute {
    /// Returns the canonical attribute name.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Brightness => "brightness",
            Self::ColorTemperature => "color_temperature",
            Self::Reachable => "reachable",
            Self::Enabled => "enabled",
            Self::SignalStrength => "signal_strength",
            Self::Speed => "speed",
        }
    }
}

impl FromStr for StateAttribute {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "state" | "on" => Ok(Self::State),
            "brightness" | "bri" => Ok(Self::Brightness),
            "color_temperature" | "ct" => Ok(Self::ColorTemperature),
            "reachable" => Ok(Self::Reachable),
            "enabled" => Ok(Self::Enabled),
            "signal_strength" => Ok(Self::SignalStrength),
            "speed" => Ok(Self::Speed),
            _ => Err(ValueError::UnknownAttribute(s.to_string())),
        }
    }
}

impl fmt::Display for StateAttribute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A value read from or written to a device attribute.
///
/// Comparisons are numeric, with `true` as 1 and `false` as 0.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AttributeValue {
    /// A flag.
    Bool(bool),
    /// A number.
    Number(f64),
}

impl AttributeValue {
    /// Returns the numeric form of the value.
    #[must_use]
    pub fn as_f64(&self) -> f64 {
        match *self {
            Self::Bool(b) => f64::from(u8::from(b)),
            Self::Number(n) => n,
        }
    }

    /// Returns the value as a flag: non-zero numbers are `true`.
    #[must_use]
    pub fn as_bool(&self) -> bool {
        match *self {
            Self::Bool(b) => b,
            Self::Number(n) => n.abs() > f64::EPSILON,
        }
    }
}

impl FromStr for AttributeValue {
    type Err = ValueError;

    /// Parses `true`/`false`/`on`/`off` as flags and anything else as a number.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "true" | "on" => Ok(Self::Bool(true)),
            "false" | "off" => Ok(Self::Bool(false)),
            _ => trimmed
                .parse::<f64>()
                .ok()
                .filter(|n| n.is_finite())
                .map(Self::Number)
                .ok_or_else(|| ValueError::InvalidValue(s.to_string())),
        }
    }
}

impl From<bool> for AttributeValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<f64> for AttributeValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<u16> for AttributeValue {
    fn from(n: u16) -> Self {
        Self::Number(f64::from(n))
    }
}

impl fmt::Display for AttributeValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Number(n) => write!(f, "{n}"),
        }
    }
}
