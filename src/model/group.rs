// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device groups and light memberships.

use serde::{Deserialize, Serialize};

use crate::model::{ControllerRef, VendorTag};
use crate::types::{Brightness, ColorTemperature, DeviceId, GroupId};

/// A light's membership in a group, with optional per-membership overrides.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LightMembership {
    /// The member light.
    pub light: DeviceId,
    /// Brightness override.
    pub brightness: Option<Brightness>,
    /// Color temperature override.
    pub color_temperature: Option<ColorTemperature>,
    /// Alert override.
    pub alert: Option<String>,
}

impl LightMembership {
    /// Creates a membership without overrides.
    #[must_use]
    pub fn new(light: DeviceId) -> Self {
        Self {
            light,
            brightness: None,
            color_temperature: None,
            alert: None,
        }
    }
}

/// A named set of devices.
///
/// Vendor-managed groups carry the bridge reference they were imported
/// from; local groups have none.
///
/// # Examples
///
/// ```
/// use homelink::model::{Group, VendorTag};
/// use homelink::types::DeviceId;
///
/// let mut group = Group::new("Living room", VendorTag::local());
/// let lamp = DeviceId::new();
///
/// group.add_light(lamp);
/// group.add_light(lamp);
/// assert_eq!(group.lights.len(), 1);
///
/// assert!(group.remove_light(lamp));
/// assert!(group.lights.is_empty());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
// Each boolean mirrors an independent vendor flag.
#[allow(clippy::struct_excessive_bools)]
pub struct Group {
    /// Local identifier.
    pub id: GroupId,
    /// Display name.
    pub name: String,
    /// Manufacturer tag.
    pub vendor: VendorTag,
    /// Vendor group type, e.g. "LightGroup" or "Room".
    pub group_type: String,
    /// Vendor room class, e.g. "Bedroom".
    pub class: Option<String>,
    /// Every member light is on.
    pub all_on: bool,
    /// At least one member light is on.
    pub any_on: bool,
    /// On state of the group's last action.
    pub action_on: bool,
    /// Bridge reference for vendor-managed groups.
    pub controller: Option<ControllerRef>,
    /// Generic device members.
    pub devices: Vec<DeviceId>,
    /// Light members.
    pub lights: Vec<LightMembership>,
}

impl Group {
    /// Creates an empty group.
    #[must_use]
    pub fn new(name: impl Into<String>, vendor: VendorTag) -> Self {
        Self {
            id: GroupId::new(),
            name: name.into(),
            vendor,
            group_type: "LightGroup".to_string(),
            class: None,
            all_on: false,
            any_on: false,
            action_on: false,
            controller: None,
            devices: Vec::new(),
            lights: Vec::new(),
        }
    }

    /// Sets the bridge reference.
    #[must_use]
    pub fn with_controller(mut self, controller: ControllerRef) -> Self {
        self.controller = Some(controller);
        self
    }

    /// Adds a light, returning its membership. Adding an existing member is
    /// a no-op.
    pub fn add_light(&mut self, light: DeviceId) -> &mut LightMembership {
        let position = match self.lights.iter().position(|m| m.light == light) {
            Some(position) => position,
            None => {
                self.lights.push(LightMembership::new(light));
                self.lights.len() - 1
            }
        };
        &mut self.lights[position]
    }

    /// Removes a light. Returns `true` if it was a member.
    pub fn remove_light(&mut self, light: DeviceId) -> bool {
        let before = self.lights.len();
        self.lights.retain(|m| m.light != light);
        self.lights.len() != before
    }

    /// Removes every light membership.
    pub fn clear_lights(&mut self) {
        self.lights.clear();
    }

    /// Iterates over the member light ids.
    pub fn member_lights(&self) -> impl Iterator<Item = DeviceId> + '_ {
        self.lights.iter().map(|m| m.light)
    }

    /// Adds a generic device member. Adding an existing member is a no-op.
    pub fn add_device(&mut self, device: DeviceId) {
        if !self.devices.contains(&device) {
            self.devices.push(device);
        }
    }

    /// Removes a generic device member. Returns `true` if it was a member.
    pub fn remove_device(&mut self, device: DeviceId) -> bool {
        let before = self.devices.len();
        self.devices.retain(|d| *d != device);
        self.devices.len() != before
    }

    /// Removes a device from both member lists.
    pub(crate) fn forget(&mut self, device: DeviceId) {
        self.remove_light(device);
        self.remove_device(device);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn membership_overrides() {
        let mut group = Group::new("Kitchen", VendorTag::local());
        let lamp = DeviceId::new();

        group.add_light(lamp).brightness = Some(Brightness::new(80));
        assert_eq!(group.lights[0].brightness, Some(Brightness::new(80)));

        // Re-adding keeps the overrides
        group.add_light(lamp);
        assert_eq!(group.lights[0].brightness, Some(Brightness::new(80)));
    }

    #[test]
    fn remove_missing_light() {
        let mut group = Group::new("Kitchen", VendorTag::local());
        assert!(!group.remove_light(DeviceId::new()));
    }

    #[test]
    fn device_members() {
        let mut group = Group::new("Hall", VendorTag::local());
        let sensor = DeviceId::new();
        group.add_device(sensor);
        group.add_device(sensor);
        assert_eq!(group.devices, vec![sensor]);
        assert!(group.remove_device(sensor));
    }

    #[test]
    fn forget_clears_both_lists() {
        let mut group = Group::new("Hall", VendorTag::local());
        let id = DeviceId::new();
        group.add_device(id);
        group.add_light(id);
        group.forget(id);
        assert!(group.devices.is_empty());
        assert!(group.lights.is_empty());
    }
}
