// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Light capabilities derived from the vendor light type.
//!
//! Bridges report a free-form type string for each light ("Dimmable light",
//! "Extended color light", ...). The control facade consults these flags
//! before sending a command the light cannot honour.

use serde::{Deserialize, Serialize};

/// What a light can do.
///
/// # Examples
///
/// ```
/// use homelink::Capabilities;
///
/// let caps = Capabilities::from_light_type("Dimmable light");
/// assert!(caps.dimming);
/// assert!(!caps.color_temperature);
///
/// // Unknown types are assumed to be fully featured
/// assert_eq!(Capabilities::from_light_type("Mystery lamp"), Capabilities::full());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
// Each boolean represents an independent light feature flag.
#[allow(clippy::struct_excessive_bools)]
pub struct Capabilities {
    /// Supports on/off.
    pub on_off: bool,

    /// Supports brightness control.
    pub dimming: bool,

    /// Supports color temperature control.
    pub color_temperature: bool,

    /// Supports full color (xy or hue/saturation).
    pub color: bool,
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::full()
    }
}

impl Capabilities {
    /// On/off only.
    #[must_use]
    pub const fn on_off() -> Self {
        Self {
            on_off: true,
            dimming: false,
            color_temperature: false,
            color: false,
        }
    }

    /// On/off and brightness.
    #[must_use]
    pub const fn dimmable() -> Self {
        Self {
            on_off: true,
            dimming: true,
            color_temperature: false,
            color: false,
        }
    }

    /// Tunable white.
    #[must_use]
    pub const fn color_temperature_light() -> Self {
        Self {
            on_off: true,
            dimming: true,
            color_temperature: true,
            color: false,
        }
    }

    /// Color without a white channel.
    #[must_use]
    pub const fn color_light() -> Self {
        Self {
            on_off: true,
            dimming: true,
            color_temperature: false,
            color: true,
        }
    }

    /// Everything.
    #[must_use]
    pub const fn full() -> Self {
        Self {
            on_off: true,
            dimming: true,
            color_temperature: true,
            color: true,
        }
    }

    /// Derives capabilities from a bridge light type string.
    ///
    /// Matching is case-insensitive. Unrecognised types get [`Self::full`],
    /// letting the bridge be the one to refuse.
    #[must_use]
    pub fn from_light_type(light_type: &str) -> Self {
        match light_type.to_ascii_lowercase().as_str() {
            "on/off light" | "on/off plug-in unit" => Self::on_off(),
            "dimmable light" | "dimmable plug-in unit" => Self::dimmable(),
            "color temperature light" => Self::color_temperature_light(),
            "color light" => Self::color_light(),
            _ => Self::full(),
        }
    }
}
