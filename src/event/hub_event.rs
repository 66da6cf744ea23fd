// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub event types.

use serde::{Deserialize, Serialize};

use crate::state::StateChange;
use crate::types::{DeviceId, RuleId};

/// Events emitted by the hub.
///
/// # Examples
///
/// ```
/// use homelink::event::HubEvent;
/// use homelink::state::StateChange;
/// use homelink::types::DeviceId;
///
/// let device = DeviceId::new();
/// let event = HubEvent::state_changed(device, StateChange::Power(true));
///
/// assert_eq!(event.device_id(), Some(device));
/// assert!(event.is_state_change());
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum HubEvent {
    /// A device record was created, by import or registration.
    DeviceAdded {
        /// The new record.
        device: DeviceId,
    },

    /// A device record was deleted.
    DeviceRemoved {
        /// The deleted record.
        device: DeviceId,
    },

    /// A device record's state changed.
    ///
    /// Emitted for confirmed control commands, local updates and imports.
    StateChanged {
        /// The changed record.
        device: DeviceId,
        /// What changed.
        change: StateChange,
    },

    /// A bridge issued the hub an auth token.
    BridgeRegistered {
        /// The bridge record.
        bridge: DeviceId,
    },

    /// A bridge's inventory was imported.
    BridgeSynced {
        /// The bridge record.
        bridge: DeviceId,
        /// Lights imported.
        lights: usize,
        /// Sensors imported.
        sensors: usize,
        /// Groups imported.
        groups: usize,
        /// Entities skipped.
        failures: usize,
    },

    /// A rule fired.
    RuleFired {
        /// The rule.
        rule: RuleId,
    },
}

impl HubEvent {
    /// Returns the device the event is about, if any.
    ///
    /// Bridge events report the bridge record.
    #[must_use]
    pub fn device_id(&self) -> Option<DeviceId> {
        match self {
            Self::DeviceAdded { device }
            | Self::DeviceRemoved { device }
            | Self::StateChanged { device, .. } => Some(*device),
            Self::BridgeRegistered { bridge } | Self::BridgeSynced { bridge, .. } => Some(*bridge),
            Self::RuleFired { .. } => None,
        }
    }

    /// Returns `true` for device added/removed events.
    #[must_use]
    pub fn is_lifecycle(&self) -> bool {
        matches!(self, Self::DeviceAdded { .. } | Self::DeviceRemoved { .. })
    }

    /// Returns `true` for state change events.
    #[must_use]
    pub fn is_state_change(&self) -> bool {
        matches!(self, Self::StateChanged { .. })
    }

    /// Creates a device added event.
    #[must_use]
    pub fn device_added(device: DeviceId) -> Self {
        Self::DeviceAdded { device }
    }

    /// Creates a device removed event.
    #[must_use]
    pub fn device_removed(device: DeviceId) -> Self {
        Self::DeviceRemoved { device }
    }

    /// Creates a state changed event.
    #[must_use]
    pub fn state_changed(device: DeviceId, change: StateChange) -> Self {
        Self::StateChanged { device, change }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn device_id_extraction() {
        let id = DeviceId::new();
        assert_eq!(HubEvent::device_added(id).device_id(), Some(id));
        assert_eq!(HubEvent::BridgeRegistered { bridge: id }.device_id(), Some(id));
        assert_eq!(
            HubEvent::RuleFired {
                rule: RuleId::new()
            }
            .device_id(),
            None
        );
    }

    #[test]
    fn classification() {
        let id = DeviceId::new();
        assert!(HubEvent::device_removed(id).is_lifecycle());
        assert!(!HubEvent::device_removed(id).is_state_change());
        assert!(HubEvent::state_changed(id, StateChange::Reachable(true)).is_state_change());
    }
}
