// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Brightness type for light control.
//!
//! Lights store brightness as a byte (0-255). Callers may also address it
//! as a percentage, which is scaled by `255 / 100`.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Brightness level (0-255).
///
/// # Examples
///
/// ```
/// use homelink::types::Brightness;
///
/// let bri = Brightness::new(200);
/// assert_eq!(bri.value(), 200);
///
/// let half = Brightness::from_percentage(50).unwrap();
/// assert_eq!(half.value(), 128);
///
/// assert!(Brightness::from_percentage(101).is_err());
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Brightness(u8);

impl Brightness {
    /// Minimum brightness.
    pub const MIN: Self = Self(0);

    /// Maximum brightness.
    pub const MAX: Self = Self(255);

    /// Creates a brightness from an absolute byte value.
    #[must_use]
    pub const fn new(value: u8) -> Self {
        Self(value)
    }

    /// Creates a brightness from a percentage (0-100).
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if the percentage exceeds 100.
    pub fn from_percentage(percent: u8) -> Result<Self, ValueError> {
        if percent > 100 {
            return Err(ValueError::OutOfRange {
                min: 0,
                max: 100,
                actual: u16::from(percent),
            });
        }
        let scaled = (u16::from(percent) * 255 + 50) / 100;
        // percent <= 100 keeps scaled <= 255
        #[allow(clippy::cast_possible_truncation)]
        Ok(Self(scaled as u8))
    }

    /// Returns the absolute brightness value.
    #[must_use]
    pub const fn value(&self) -> u8 {
        self.0
    }

    /// Returns the brightness as a rounded percentage.
    #[must_use]
    pub fn as_percentage(&self) -> u8 {
        let percent = (u16::from(self.0) * 100 + 127) / 255;
        #[allow(clippy::cast_possible_truncation)]
        let percent = percent as u8;
        percent
    }
}

impl From<u8> for Brightness {
    fn from(value: u8) -> Self {
        Self(value)
    }
}

impl fmt::Display for Brightness {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A brightness request, either absolute or as a percentage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BrightnessLevel {
    /// Absolute value (0-255).
    Absolute(u8),
    /// Percentage (0-100), scaled to 0-255.
    Percent(u8),
}

impl BrightnessLevel {
    /// Resolves the request to an absolute brightness.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` for a percentage above 100.
    pub fn resolve(self) -> Result<Brightness, ValueError> {
        match self {
            Self::Absolute(value) => Ok(Brightness::new(value)),
            Self::Percent(percent) => Brightness::from_percentage(percent),
        }
    }
}

impl From<Brightness> for BrightnessLevel {
    fn from(bri: Brightness) -> Self {
        Self::Absolute(bri.value())
    }
}
