// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Control operations accepted by the hub.

use crate::controller::StatePatch;
use crate::error::ValueError;
use crate::model::{AttributeValue, Device, DeviceDetails, StateAttribute};
use crate::state::StateChange;
use crate::types::{BrightnessLevel, ColorTemperature, TransitionTime};

/// One operation on one device.
///
/// Light operations go through the light's bridge. Sensor values, enabled
/// flags and outlets without a bridge are changed locally.
///
/// # Examples
///
/// ```
/// use homelink::control::ControlOp;
/// use homelink::types::{BrightnessLevel, TransitionTime};
///
/// let op = ControlOp::SetBrightness {
///     level: BrightnessLevel::Percent(50),
///     transition: Some(TransitionTime::from_deciseconds(10)),
/// };
/// assert!(op.patch().unwrap().is_some());
/// assert!(ControlOp::SetEnabled(false).patch().unwrap().is_none());
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ControlOp {
    /// Switch on.
    TurnOn {
        /// One-off transition time.
        transition: Option<TransitionTime>,
    },
    /// Switch off.
    TurnOff {
        /// One-off transition time.
        transition: Option<TransitionTime>,
    },
    /// Set the brightness, absolute or as a percentage.
    SetBrightness {
        /// Requested level.
        level: BrightnessLevel,
        /// One-off transition time.
        transition: Option<TransitionTime>,
    },
    /// Set the color temperature.
    SetColorTemperature {
        /// Requested temperature.
        ct: ColorTemperature,
        /// One-off transition time.
        transition: Option<TransitionTime>,
    },
    /// Record a sensor reading.
    SetSensorValue(f64),
    /// Enable or disable the record.
    SetEnabled(bool),
}

impl ControlOp {
    /// Switch on without a transition.
    pub const ON: Self = Self::TurnOn { transition: None };
    /// Switch off without a transition.
    pub const OFF: Self = Self::TurnOff { transition: None };

    /// Builds the operation a rule action stands for.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::UnsupportedAttribute` if the attribute cannot be
    /// set on this device, and `ValueError::OutOfRange` for brightness or
    /// color temperature values outside their range.
    pub fn from_action(
        device: &Device,
        attribute: StateAttribute,
        value: AttributeValue,
    ) -> Result<Self, ValueError> {
        let unsupported = || ValueError::UnsupportedAttribute {
            attribute: attribute.to_string(),
            category: device.category().to_string(),
        };

        match (attribute, &device.details) {
            (StateAttribute::Enabled, _) => Ok(Self::SetEnabled(value.as_bool())),
            (StateAttribute::State, DeviceDetails::Light(_) | DeviceDetails::Outlet(_)) => {
                Ok(if value.as_bool() { Self::ON } else { Self::OFF })
            }
            (StateAttribute::State, DeviceDetails::Sensor(_)) => {
                Ok(Self::SetSensorValue(value.as_f64()))
            }
            (StateAttribute::Brightness, DeviceDetails::Light(_)) => {
                let raw = whole_number(value)?;
                let level = u8::try_from(raw).map_err(|_| ValueError::OutOfRange {
                    min: 0,
                    max: u16::from(u8::MAX),
                    actual: raw,
                })?;
                Ok(Self::SetBrightness {
                    level: BrightnessLevel::Absolute(level),
                    transition: None,
                })
            }
            (StateAttribute::ColorTemperature, DeviceDetails::Light(_)) => {
                let raw = whole_number(value)?;
                Ok(Self::SetColorTemperature {
                    ct: ColorTemperature::new(raw)?,
                    transition: None,
                })
            }
            _ => Err(unsupported()),
        }
    }

    /// Returns the bridge request for light operations, `None` for local
    /// ones.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` for a percentage above 100.
    pub fn patch(&self) -> Result<Option<StatePatch>, ValueError> {
        let patch = match *self {
            Self::TurnOn { transition } => StatePatch::power(true).with_transition(transition),
            Self::TurnOff { transition } => StatePatch::power(false).with_transition(transition),
            Self::SetBrightness { level, transition } => {
                StatePatch::brightness(level.resolve()?).with_transition(transition)
            }
            Self::SetColorTemperature { ct, transition } => {
                StatePatch::color_temperature(ct).with_transition(transition)
            }
            Self::SetSensorValue(_) | Self::SetEnabled(_) => return Ok(None),
        };
        Ok(Some(patch))
    }

    /// Returns the local change for operations that never reach a bridge.
    #[must_use]
    pub fn local_change(&self) -> Option<StateChange> {
        match *self {
            Self::TurnOn { .. } => Some(StateChange::Power(true)),
            Self::TurnOff { .. } => Some(StateChange::Power(false)),
            Self::SetSensorValue(value) => Some(StateChange::SensorValue(value)),
            Self::SetEnabled(enabled) => Some(StateChange::Enabled(enabled)),
            Self::SetBrightness { .. } | Self::SetColorTemperature { .. } => None,
        }
    }
}

fn whole_number(value: AttributeValue) -> Result<u16, ValueError> {
    let n = value.as_f64();
    if n.fract().abs() > f64::EPSILON || n < 0.0 || n > f64::from(u16::MAX) {
        return Err(ValueError::InvalidValue(n.to_string()));
    }
    // Range checked above
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    Ok(n as u16)
}
