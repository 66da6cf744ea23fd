// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Local records kept by the hub.
//!
//! A [`Device`] is the common record; its [`DeviceDetails`] hold the
//! category-specific fields (light, sensor, bridge, outlet, Wi-Fi node).
//! Groups, rooms and rules reference devices by [`DeviceId`](crate::types::DeviceId).

mod attribute;
mod device;
mod group;
mod room;
mod rule;

pub use attribute::{AttributeValue, StateAttribute};
pub use device::{
    Bridge, ControllerRef, Device, DeviceCategory, DeviceDetails, Light, Outlet, ReconcileKey,
    Sensor, VendorTag, WifiNode,
};
pub use group::{Group, LightMembership};
pub use room::{ConnectionKind, Room, RoomConnection, RoomGraph, RoomIndex, Side};
pub use rule::{Action, Condition, Operator, Relation, Rule, RulePhase};

use std::fmt;

use serde::{Deserialize, Serialize};

/// The remote collections a bridge exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntityKind {
    /// `/lights`
    Light,
    /// `/sensors`
    Sensor,
    /// `/groups`
    Group,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Light => "light",
            Self::Sensor => "sensor",
            Self::Group => "group",
        })
    }
}
