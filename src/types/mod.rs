// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Value types for device control.
//!
//! Each type ensures values are within their valid ranges at construction
//! time, so invalid commands are rejected before anything reaches a bridge.
//!
//! # Types
//!
//! - [`Brightness`] - Brightness level (0-255), addressable as a percentage
//! - [`ColorTemperature`] - Color temperature in mireds (153-500)
//! - [`CieXy`] - CIE 1931 chromaticity pair
//! - [`TransitionTime`] - Per-command transition in deciseconds
//! - [`DeviceId`], [`GroupId`], [`RuleId`] - Record identifiers

mod brightness;
mod color;
mod id;
mod transition;

pub use brightness::{Brightness, BrightnessLevel};
pub use color::{CieXy, ColorMode, ColorTemperature};
pub use id::{AccountId, ActionId, ConditionId, DeviceId, GroupId, RuleId};
pub use transition::TransitionTime;
