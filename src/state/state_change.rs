// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! State change representation.
//!
//! State changes are the building blocks for updating device records. They
//! are produced by confirmed control commands and by imports, applied to a
//! [`Device`], recorded in the store's history and published as events.
//!
//! # Examples
//!
//! ```
//! use homelink::model::{ControllerRef, Device, DeviceDetails, Light, VendorTag};
//! use homelink::state::StateChange;
//! use homelink::types::{AccountId, DeviceId};
//!
//! let light = Light::new(ControllerRef::new(DeviceId::new(), 1), "LCT015", "00:17");
//! let mut device = Device::new(
//!     AccountId::new("alice"),
//!     "Desk",
//!     "10.0.0.5",
//!     VendorTag::hue(),
//!     DeviceDetails::Light(light),
//! );
//!
//! // Apply returns true if state actually changed
//! assert!(StateChange::Power(true).apply(&mut device));
//!
//! // Applying same change again returns false
//! assert!(!StateChange::Power(true).apply(&mut device));
//! ```

use serde::{Deserialize, Serialize};

use crate::model::{Device, DeviceDetails};
use crate::types::{Brightness, CieXy, ColorMode, ColorTemperature};

/// A change to a device's state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum StateChange {
    /// Light or outlet switched.
    Power(bool),

    /// Light brightness changed.
    Brightness(Brightness),

    /// Light color temperature changed; the chromaticity follows.
    ColorTemperature(ColorTemperature),

    /// Light chromaticity changed without a known temperature.
    ColorXy(CieXy),

    /// Light switched color representation.
    ColorMode(ColorMode),

    /// Light alert effect changed.
    Alert(Option<String>),

    /// Reachability changed.
    Reachable(bool),

    /// Sensor reading changed.
    SensorValue(f64),

    /// Record enabled or disabled.
    Enabled(bool),

    /// Display name changed.
    Name(String),

    /// Multiple changes at once.
    Batch(Vec<StateChange>),
}

impl StateChange {
    /// Applies the change to a device.
    ///
    /// Returns `true` if the device changed. Changes that do not fit the
    /// device's category leave it untouched and return `false`.
    pub fn apply(&self, device: &mut Device) -> bool {
        match self {
            Self::Batch(changes) => {
                return changes
                    .iter()
                    .fold(false, |changed, c| c.apply(device) || changed);
            }
            Self::Enabled(enabled) => return replace(&mut device.enabled, *enabled),
            Self::Name(name) => return replace(&mut device.name, name.clone()),
            _ => {}
        }

        match (self, &mut device.details) {
            (Self::Power(on), DeviceDetails::Light(light)) => replace(&mut light.on, *on),
            (Self::Power(on), DeviceDetails::Outlet(outlet)) => replace(&mut outlet.on, *on),
            (Self::Brightness(bri), DeviceDetails::Light(light)) => {
                replace(&mut light.brightness, *bri)
            }
            (Self::ColorTemperature(ct), DeviceDetails::Light(light)) => {
                light.set_color_temperature(*ct)
            }
            (Self::ColorXy(xy), DeviceDetails::Light(light)) => replace(&mut light.color_xy, *xy),
            (Self::ColorMode(mode), DeviceDetails::Light(light)) => {
                replace(&mut light.color_mode, *mode)
            }
            (Self::Alert(alert), DeviceDetails::Light(light)) => {
                replace(&mut light.alert, alert.clone())
            }
            (Self::Reachable(r), DeviceDetails::Light(light)) => replace(&mut light.reachable, *r),
            (Self::Reachable(r), DeviceDetails::Sensor(sensor)) => {
                replace(&mut sensor.reachable, *r)
            }
            (Self::SensorValue(value), DeviceDetails::Sensor(sensor)) => {
                if (sensor.value - value).abs() < f64::EPSILON {
                    false
                } else {
                    sensor.value = *value;
                    true
                }
            }
            _ => false,
        }
    }

    /// Flattens batches into their individual changes.
    #[must_use]
    pub fn flatten(self) -> Vec<StateChange> {
        match self {
            Self::Batch(changes) => changes.into_iter().flat_map(Self::flatten).collect(),
            other => vec![other],
        }
    }
}

fn replace<T: PartialEq>(slot: &mut T, value: T) -> bool {
    if *slot == value {
        false
    } else {
        *slot = value;
        true
    }
}
