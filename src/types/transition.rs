// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Transition time for light commands.

use std::fmt;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// How long a light takes to reach a new state, in deciseconds.
///
/// A transition applies to the single command it accompanies and is not
/// remembered by the light.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use homelink::types::TransitionTime;
///
/// let t = TransitionTime::from_duration(Duration::from_millis(1500));
/// assert_eq!(t.deciseconds(), 15);
/// ```
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct TransitionTime(u16);

impl TransitionTime {
    /// Change instantly.
    pub const INSTANT: Self = Self(0);

    /// Creates a transition time from deciseconds.
    #[must_use]
    pub const fn from_deciseconds(value: u16) -> Self {
        Self(value)
    }

    /// Creates a transition time from a duration, rounding to the nearest
    /// decisecond and saturating at `u16::MAX`.
    #[must_use]
    pub fn from_duration(duration: Duration) -> Self {
        let tenths = (duration.as_millis() + 50) / 100;
        Self(u16::try_from(tenths).unwrap_or(u16::MAX))
    }

    /// Returns the value in deciseconds.
    #[must_use]
    pub const fn deciseconds(&self) -> u16 {
        self.0
    }

    /// Returns the transition as a duration.
    #[must_use]
    pub fn as_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.0) * 100)
    }
}

impl fmt::Display for TransitionTime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}ms", u64::from(self.0) * 100)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rounds_to_nearest_decisecond() {
        assert_eq!(
            TransitionTime::from_duration(Duration::from_millis(149)).deciseconds(),
            1
        );
        assert_eq!(
            TransitionTime::from_duration(Duration::from_millis(150)).deciseconds(),
            2
        );
    }

    #[test]
    fn saturates() {
        let t = TransitionTime::from_duration(Duration::from_secs(100_000));
        assert_eq!(t.deciseconds(), u16::MAX);
    }

    #[test]
    fn duration_round_trip() {
        let t = TransitionTime::from_deciseconds(4);
        assert_eq!(t.as_duration(), Duration::from_millis(400));
        assert_eq!(t.to_string(), "400ms");
    }
}
