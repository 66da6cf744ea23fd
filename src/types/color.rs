// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Color types for light control.
//!
//! Lights report either a color temperature in mireds or a CIE 1931
//! chromaticity pair. The hub stores both and derives the pair from the
//! temperature whenever the temperature is known.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::ValueError;

/// Color temperature in mireds (153-500).
///
/// Lower values are cooler (bluer) and higher values are warmer.
///
/// - 153 (6500K) - Cool daylight
/// - 300 (3333K) - Warm white
/// - 500 (2000K) - Candlelight
///
/// # Examples
///
/// ```
/// use homelink::types::ColorTemperature;
///
/// let ct = ColorTemperature::new(300).unwrap();
/// assert_eq!(ct.value(), 300);
///
/// assert!(ColorTemperature::new(152).is_err());
/// assert!(ColorTemperature::new(501).is_err());
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub struct ColorTemperature(u16);

impl ColorTemperature {
    /// Minimum color temperature (coolest, ~6500K).
    pub const MIN: u16 = 153;

    /// Maximum color temperature (warmest, ~2000K).
    pub const MAX: u16 = 500;

    /// Cool daylight, also the value a light gets before it reports one.
    pub const COOL: Self = Self(153);

    /// Candlelight (~2000K).
    pub const CANDLE: Self = Self(500);

    /// Creates a new color temperature value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::OutOfRange` if value is outside [153, 500].
    pub fn new(value: u16) -> Result<Self, ValueError> {
        if !(Self::MIN..=Self::MAX).contains(&value) {
            return Err(ValueError::OutOfRange {
                min: Self::MIN,
                max: Self::MAX,
                actual: value,
            });
        }
        Ok(Self(value))
    }

    /// Creates a color temperature, clamping to the valid range.
    #[must_use]
    pub const fn clamped(value: u16) -> Self {
        if value < Self::MIN {
            Self(Self::MIN)
        } else if value > Self::MAX {
            Self(Self::MAX)
        } else {
            Self(value)
        }
    }

    /// Returns the color temperature value in mireds.
    #[must_use]
    pub const fn value(&self) -> u16 {
        self.0
    }

    /// Returns the color temperature in Kelvin.
    #[must_use]
    pub fn to_kelvin(&self) -> f64 {
        1_000_000.0 / f64::from(self.0)
    }

    /// Converts the temperature to a CIE 1931 chromaticity pair.
    ///
    /// Uses the CIE daylight-locus polynomial:
    ///
    /// ```text
    /// T = 1e6 / mired
    /// x = -4.607e9/T³ + 2.9678e6/T² + 99.11/T + 0.244063
    /// y = -3x² + 2.87x - 0.275
    /// ```
    ///
    /// # Examples
    ///
    /// ```
    /// use homelink::types::ColorTemperature;
    ///
    /// let xy = ColorTemperature::new(300).unwrap().to_cie_xy();
    /// assert!((xy.x() - 0.4165).abs() < 1e-3);
    /// assert!((xy.y() - 0.3999).abs() < 1e-3);
    /// ```
    #[must_use]
    pub fn to_cie_xy(&self) -> CieXy {
        let t = self.to_kelvin();
        let x = -4.607e9 / t.powi(3) + 2.9678e6 / t.powi(2) + 99.11 / t + 0.244_063;
        let y = -3.0 * x * x + 2.87 * x - 0.275;
        CieXy::new(x, y)
    }
}

impl Default for ColorTemperature {
    fn default() -> Self {
        Self::COOL
    }
}

impl TryFrom<u16> for ColorTemperature {
    type Error = ValueError;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ColorTemperature> for u16 {
    fn from(ct: ColorTemperature) -> Self {
        ct.0
    }
}

impl fmt::Display for ColorTemperature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} mired", self.0)
    }
}

/// A CIE 1931 chromaticity coordinate.
///
/// Serialized as a two-element `[x, y]` array, the shape bridges use on the
/// wire.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct CieXy {
    x: f64,
    y: f64,
}

impl CieXy {
    /// Creates a chromaticity pair, clamping each coordinate to `0..=1`.
    ///
    /// A NaN coordinate becomes 0.
    #[must_use]
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x: unit(x),
            y: unit(y),
        }
    }

    /// Returns the x coordinate.
    #[must_use]
    pub const fn x(&self) -> f64 {
        self.x
    }

    /// Returns the y coordinate.
    #[must_use]
    pub const fn y(&self) -> f64 {
        self.y
    }
}

fn unit(value: f64) -> f64 {
    if value.is_nan() { 0.0 } else { value.clamp(0.0, 1.0) }
}

impl Default for CieXy {
    fn default() -> Self {
        Self::new(0.313_06, 0.323_18)
    }
}

impl From<[f64; 2]> for CieXy {
    fn from([x, y]: [f64; 2]) -> Self {
        Self::new(x, y)
    }
}

impl From<CieXy> for [f64; 2] {
    fn from(xy: CieXy) -> Self {
        [xy.x, xy.y]
    }
}

impl fmt::Display for CieXy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{:.5}, {:.5}]", self.x, self.y)
    }
}

/// Which color representation the light is currently driven by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ColorMode {
    /// Color temperature (`ct`).
    #[default]
    #[serde(rename = "ct")]
    Temperature,
    /// CIE chromaticity (`xy`).
    #[serde(rename = "xy")]
    Xy,
    /// Hue and saturation (`hs`).
    #[serde(rename = "hs")]
    HueSaturation,
}

impl ColorMode {
    /// Parses a bridge color-mode string, returning `None` for unknown modes.
    #[must_use]
    pub fn parse(mode: &str) -> Option<Self> {
        match mode {
            "ct" => Some(Self::Temperature),
            "xy" => Some(Self::Xy),
            "hs" => Some(Self::HueSaturation),
            _ => None,
        }
    }

    /// Returns the wire name of this mode.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Temperature => "ct",
            Self::Xy => "xy",
            Self::HueSaturation => "hs",
        }
    }
}

impl fmt::Display for ColorMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn color_temperature_bounds() {
        assert!(ColorTemperature::new(153).is_ok());
        assert!(ColorTemperature::new(500).is_ok());
        assert!(ColorTemperature::new(152).is_err());
        assert!(ColorTemperature::new(501).is_err());
    }

    #[test]
    fn color_temperature_out_of_range_error() {
        let err = ColorTemperature::new(600).unwrap_err();
        assert_eq!(
            err,
            ValueError::OutOfRange {
                min: 153,
                max: 500,
                actual: 600
            }
        );
    }

    #[test]
    fn color_temperature_clamped() {
        assert_eq!(ColorTemperature::clamped(100).value(), 153);
        assert_eq!(ColorTemperature::clamped(1000).value(), 500);
        assert_eq!(ColorTemperature::clamped(300).value(), 300);
    }

    #[test]
    fn kelvin_conversion() {
        let ct = ColorTemperature::new(250).unwrap();
        assert!((ct.to_kelvin() - 4000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn xy_at_300_mired() {
        let xy = ColorTemperature::new(300).unwrap().to_cie_xy();
        assert!((xy.x() - 0.416_509).abs() < 1e-6);
        assert!((xy.y() - 0.399_942).abs() < 1e-6);
    }

    #[test]
    fn xy_at_range_edges() {
        let cool = ColorTemperature::COOL.to_cie_xy();
        assert!((cool.x() - 0.312_200).abs() < 1e-6);
        assert!((cool.y() - 0.328_607).abs() < 1e-6);

        let warm = ColorTemperature::CANDLE.to_cie_xy();
        assert!((warm.x() - 0.459_693).abs() < 1e-6);
        assert!((warm.y() - 0.410_366).abs() < 1e-6);
    }

    #[test]
    fn serde_rejects_out_of_range() {
        let ok: ColorTemperature = serde_json::from_str("300").unwrap();
        assert_eq!(ok.value(), 300);
        assert!(serde_json::from_str::<ColorTemperature>("20").is_err());
    }

    #[test]
    fn cie_xy_wire_shape() {
        let xy = CieXy::new(0.5, 0.25);
        assert_eq!(serde_json::to_string(&xy).unwrap(), "[0.5,0.25]");

        let parsed: CieXy = serde_json::from_str("[0.31306, 0.32318]").unwrap();
        assert_eq!(parsed, CieXy::default());
    }

    #[test]
    fn cie_xy_is_clamped() {
        let xy = CieXy::new(1.5, -0.2);
        assert!((xy.x() - 1.0).abs() < f64::EPSILON);
        assert!(xy.y().abs() < f64::EPSILON);

        let parsed: CieXy = serde_json::from_str("[2.0, 0.3]").unwrap();
        assert!((parsed.x() - 1.0).abs() < f64::EPSILON);
        assert!((parsed.y() - 0.3).abs() < f64::EPSILON);

        assert!(CieXy::new(f64::NAN, 0.5).x().abs() < f64::EPSILON);
    }

    #[test]
    fn color_mode_parse() {
        assert_eq!(ColorMode::parse("ct"), Some(ColorMode::Temperature));
        assert_eq!(ColorMode::parse("xy"), Some(ColorMode::Xy));
        assert_eq!(ColorMode::parse("hs"), Some(ColorMode::HueSaturation));
        assert_eq!(ColorMode::parse("rgb"), None);
    }
}
