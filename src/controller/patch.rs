// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Request bodies sent to a bridge.

use serde::{Deserialize, Serialize};

use crate::state::StateChange;
use crate::types::{Brightness, CieXy, ColorMode, ColorTemperature, TransitionTime};

/// Body of a light state or group action request.
///
/// Only the fields that are set are sent. The transition time applies to
/// this request alone and is never reflected in local state.
///
/// # Examples
///
/// ```
/// use homelink::controller::StatePatch;
/// use homelink::types::{Brightness, TransitionTime};
///
/// let patch = StatePatch::brightness(Brightness::new(200))
///     .with_transition(Some(TransitionTime::from_deciseconds(4)));
///
/// assert_eq!(
///     serde_json::to_string(&patch).unwrap(),
///     r#"{"bri":200,"transitiontime":4}"#
/// );
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatePatch {
    /// Switch on or off.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub on: Option<bool>,
    /// Brightness.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bri: Option<u8>,
    /// Color temperature in mired.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ct: Option<u16>,
    /// Chromaticity.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub xy: Option<CieXy>,
    /// Alert effect, e.g. "select".
    #[serde(skip_serializing_if = "Option::is_none")]
    pub alert: Option<String>,
    /// Scene to recall (group actions only).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub scene: Option<String>,
    /// Transition time in deciseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub transitiontime: Option<u16>,
}

impl StatePatch {
    /// A patch switching the light on or off.
    #[must_use]
    pub fn power(on: bool) -> Self {
        Self {
            on: Some(on),
            ..Self::default()
        }
    }

    /// A patch setting the brightness.
    #[must_use]
    pub fn brightness(brightness: Brightness) -> Self {
        Self {
            bri: Some(brightness.value()),
            ..Self::default()
        }
    }

    /// A patch setting the color temperature.
    #[must_use]
    pub fn color_temperature(ct: ColorTemperature) -> Self {
        Self {
            ct: Some(ct.value()),
            ..Self::default()
        }
    }

    /// A patch recalling a scene.
    #[must_use]
    pub fn scene(id: impl Into<String>) -> Self {
        Self {
            scene: Some(id.into()),
            ..Self::default()
        }
    }

    /// Adds a one-off transition time.
    #[must_use]
    pub fn with_transition(mut self, transition: Option<TransitionTime>) -> Self {
        self.transitiontime = transition.map(|t| t.deciseconds());
        self
    }

    /// Returns `true` if no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Returns the local state changes this patch causes once confirmed.
    ///
    /// Scene recalls and transition times leave no trace in local state.
    #[must_use]
    pub fn changes(&self) -> Vec<StateChange> {
        let mut changes = Vec::new();
        if let Some(on) = self.on {
            changes.push(StateChange::Power(on));
        }
        if let Some(bri) = self.bri {
            changes.push(StateChange::Brightness(Brightness::new(bri)));
        }
        if let Some(ct) = self.ct {
            changes.push(StateChange::ColorTemperature(ColorTemperature::clamped(ct)));
            changes.push(StateChange::ColorMode(ColorMode::Temperature));
        } else if let Some(xy) = self.xy {
            changes.push(StateChange::ColorXy(xy));
            changes.push(StateChange::ColorMode(ColorMode::Xy));
        }
        if let Some(alert) = &self.alert {
            changes.push(StateChange::Alert(Some(alert.clone())));
        }
        changes
    }
}

/// Body of a group attribute request (name and member list).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupAttributes {
    /// New name.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// New member light indices, as the bridge expects them (strings).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lights: Option<Vec<String>>,
}

impl GroupAttributes {
    /// Attributes renaming a group.
    #[must_use]
    pub fn rename(name: impl Into<String>) -> Self {
        Self {
            name: Some(name.into()),
            lights: None,
        }
    }

    /// Sets the member lights.
    #[must_use]
    pub fn with_lights(mut self, lights: &[u16]) -> Self {
        self.lights = Some(lights.iter().map(ToString::to_string).collect());
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_fields_are_skipped() {
        assert_eq!(
            serde_json::to_string(&StatePatch::power(true)).unwrap(),
            r#"{"on":true}"#
        );
        assert!(StatePatch::default().is_empty());
    }

    #[test]
    fn scene_patch() {
        assert_eq!(
            serde_json::to_value(StatePatch::scene("AB34EF")).unwrap(),
            serde_json::json!({"scene": "AB34EF"})
        );
    }

    #[test]
    fn changes_skip_transition_and_scene() {
        let patch = StatePatch::color_temperature(ColorTemperature::new(300).unwrap())
            .with_transition(Some(TransitionTime::from_deciseconds(10)));
        assert_eq!(
            patch.changes(),
            vec![
                StateChange::ColorTemperature(ColorTemperature::new(300).unwrap()),
                StateChange::ColorMode(ColorMode::Temperature),
            ]
        );
        assert!(StatePatch::scene("x").changes().is_empty());
    }

    #[test]
    fn group_attributes_send_string_indices() {
        let attrs = GroupAttributes::rename("Upstairs").with_lights(&[1, 4]);
        assert_eq!(
            serde_json::to_value(&attrs).unwrap(),
            serde_json::json!({"name": "Upstairs", "lights": ["1", "4"]})
        );
    }
}
