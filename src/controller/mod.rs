// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge controllers.
//!
//! A bridge vendor plugs into the hub by implementing [`BridgeController`].
//! The importer and the control facade only ever talk to this trait; the
//! vendor-neutral `Remote*` types are what a controller reports back.
//!
//! [`HueBridge`] is the Hue implementation. It also exposes the Hue-only
//! operations (sensor and group management, scenes, schedules) as inherent
//! methods.

mod hue;
mod patch;

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::error::{ImportError, Result};
use crate::model::VendorTag;
use crate::protocol::{ApiResults, HttpConfig};
use crate::types::CieXy;

pub use hue::{HueBridge, NewSchedule, NewSensor, RemoteScene, ScheduleTarget};
pub use patch::{GroupAttributes, StatePatch};

/// Per-entity results of a collection fetch.
///
/// A malformed entity yields an `Err` in its slot; the rest of the
/// collection is unaffected.
pub type Fetched<T> = Vec<std::result::Result<T, ImportError>>;

/// Bridge identity reported by its config resource.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BridgeConfig {
    /// Firmware version.
    pub firmware_version: String,
    /// Hardware id.
    pub bridge_id: String,
    /// MAC address.
    pub mac_address: String,
}

/// A light as a bridge reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteLight {
    /// Bridge index.
    pub index: u16,
    /// Display name.
    pub name: String,
    /// Vendor light type.
    pub light_type: String,
    /// Vendor model id.
    pub model_id: String,
    /// Vendor unique id.
    pub unique_id: String,
    /// On/off state.
    pub on: bool,
    /// Brightness; absent for on/off lights.
    pub brightness: Option<u8>,
    /// Color temperature in mired, when reported.
    pub ct: Option<u16>,
    /// Chromaticity, when reported.
    pub xy: Option<CieXy>,
    /// Active color mode, when reported.
    pub color_mode: Option<String>,
    /// Alert effect.
    pub alert: Option<String>,
    /// Whether the bridge can reach the light.
    pub reachable: bool,
}

/// A sensor as a bridge reports it.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteSensor {
    /// Bridge index.
    pub index: u16,
    /// Display name.
    pub name: String,
    /// Vendor sensor type.
    pub sensor_type: String,
    /// Vendor model id.
    pub model_id: String,
    /// Vendor unique id; virtual sensors have none.
    pub unique_id: Option<String>,
    /// Reading, with flags mapped to 0/1.
    pub value: f64,
    /// Whether the bridge can reach the sensor.
    pub reachable: bool,
}

/// A group as a bridge reports it.
#[derive(Debug, Clone, PartialEq)]
// Each boolean mirrors an independent vendor flag.
#[allow(clippy::struct_excessive_bools)]
pub struct RemoteGroup {
    /// Bridge index.
    pub index: u16,
    /// Display name.
    pub name: String,
    /// Vendor group type.
    pub group_type: String,
    /// Vendor room class.
    pub class: Option<String>,
    /// Member light indices.
    pub lights: Vec<u16>,
    /// Every member is on.
    pub all_on: bool,
    /// At least one member is on.
    pub any_on: bool,
    /// On state of the last group action.
    pub action_on: bool,
}

/// What a bridge vendor must provide to the hub.
///
/// Implementations hold one pooled HTTP client for their bridge. The hub
/// serializes calls against the same bridge, so implementations need no
/// locking of their own.
pub trait BridgeController: Send + Sync + Sized {
    /// Creates a controller for the bridge at `config`, authenticated with
    /// `token` when one has been issued.
    ///
    /// # Errors
    ///
    /// Returns error if the address is invalid or the HTTP client cannot be
    /// built.
    fn connect(config: HttpConfig, token: Option<String>) -> Result<Self>;

    /// Returns the vendor tag given to everything this controller imports.
    fn vendor(&self) -> VendorTag;

    /// Runs the registration handshake and returns the issued token.
    ///
    /// # Errors
    ///
    /// Returns `Error::Registration` if the bridge refuses, carrying the
    /// vendor code.
    fn register(&self, device_type: &str) -> impl Future<Output = Result<String>> + Send;

    /// Reads the bridge's identity.
    fn bridge_config(&self) -> impl Future<Output = Result<BridgeConfig>> + Send;

    /// Fetches every light in one request.
    fn fetch_lights(&self) -> impl Future<Output = Result<Fetched<RemoteLight>>> + Send;

    /// Fetches every sensor in one request.
    fn fetch_sensors(&self) -> impl Future<Output = Result<Fetched<RemoteSensor>>> + Send;

    /// Fetches every group in one request.
    fn fetch_groups(&self) -> impl Future<Output = Result<Fetched<RemoteGroup>>> + Send;

    /// Sends a state patch to one light.
    fn set_light_state(
        &self,
        index: u16,
        patch: &StatePatch,
    ) -> impl Future<Output = Result<ApiResults>> + Send;

    /// Sends a state patch to every light of a group at once.
    fn set_group_action(
        &self,
        index: u16,
        patch: &StatePatch,
    ) -> impl Future<Output = Result<ApiResults>> + Send;

    /// Changes a group's name or members.
    fn set_group_attributes(
        &self,
        index: u16,
        attributes: &GroupAttributes,
    ) -> impl Future<Output = Result<ApiResults>> + Send;
}
