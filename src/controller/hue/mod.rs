// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Philips Hue bridge controller.
//!
//! Besides the [`BridgeController`] operations used by the hub, this
//! controller exposes the rest of the Hue API surface: single-light reads,
//! sensor and group management, scenes and schedules.
//!
//! # Examples
//!
//! ```no_run
//! use homelink::controller::{BridgeController, HueBridge, StatePatch};
//! use homelink::protocol::HttpConfig;
//!
//! # async fn example() -> homelink::Result<()> {
//! let bridge = HueBridge::connect(HttpConfig::new("192.168.1.2"), Some("abc123".into()))?;
//!
//! if let Some(index) = bridge.light_id_by_name("Desk").await? {
//!     bridge.set_light_state(index, &StatePatch::power(true)).await?;
//! }
//! bridge.run_scene("Living room", "Relax").await?;
//! # Ok(())
//! # }
//! ```

mod payload;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

use crate::controller::{
    BridgeConfig, BridgeController, Fetched, GroupAttributes, RemoteGroup, RemoteLight,
    RemoteSensor, StatePatch,
};
use crate::error::{ControlError, Error, ProtocolError, Result};
use crate::model::{EntityKind, VendorTag};
use crate::protocol::{
    ApiPath, ApiResults, BridgeClient, HttpConfig, Method, SensorStructure, parse_registration,
};

/// Top-level light fields; any other parameter is read from `state`.
const LIGHT_FIELDS: [&str; 4] = ["name", "type", "uniqueid", "swversion"];

/// A scene stored on the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteScene {
    /// Scene id.
    pub id: String,
    /// Display name.
    pub name: String,
    /// Light indices the scene covers, sorted.
    pub lights: Vec<u16>,
}

/// Definition of a sensor to create on the bridge.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewSensor {
    /// Display name.
    pub name: String,
    /// Model id.
    #[serde(rename = "modelid")]
    pub model_id: String,
    /// Software version.
    #[serde(rename = "swversion")]
    pub sw_version: String,
    /// Sensor type, e.g. "CLIPGenericStatus".
    #[serde(rename = "type")]
    pub sensor_type: String,
    /// Unique id.
    #[serde(rename = "uniqueid")]
    pub unique_id: String,
    /// Manufacturer name.
    #[serde(rename = "manufacturername")]
    pub manufacturer: String,
    /// Initial state; omitted when empty.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub state: Map<String, Value>,
    /// Initial config; omitted when empty.
    #[serde(skip_serializing_if = "Map::is_empty")]
    pub config: Map<String, Value>,
    /// Let the bridge delete the sensor once nothing references it.
    pub recycle: bool,
}

/// What a schedule acts on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScheduleTarget {
    /// One light's state.
    Light(u16),
    /// A group's action.
    Group(u16),
}

/// Definition of a schedule to create on the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct NewSchedule {
    /// Display name.
    pub name: String,
    /// Bridge-local time expression, e.g. "W124/T07:30:00".
    pub local_time: String,
    /// Description.
    pub description: String,
    /// Light or group the command is sent to.
    pub target: ScheduleTarget,
    /// Command body.
    pub body: StatePatch,
}

/// Controller for one Hue bridge.
#[derive(Debug, Clone)]
pub struct HueBridge {
    client: BridgeClient,
    token: Option<String>,
}

impl HueBridge {
    /// Returns the auth token, if registered.
    #[must_use]
    pub fn token(&self) -> Option<&str> {
        self.token.as_deref()
    }

    fn api(&self) -> std::result::Result<ApiPath<'_>, ProtocolError> {
        self.token
            .as_deref()
            .map(ApiPath::new)
            .ok_or(ProtocolError::NotRegistered)
    }

    async fn get(&self, path: &str) -> Result<Value> {
        let value = self.client.request(Method::Get, path, None).await?;
        payload::reject_error_lines(&value)?;
        Ok(value)
    }

    async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<ApiResults> {
        let value = self.client.request(method, path, body).await?;
        Ok(ApiResults::from_value(value)?)
    }

    async fn put<B: Serialize>(&self, path: &str, body: &B) -> Result<ApiResults> {
        let body = serde_json::to_value(body).map_err(|e| {
            ProtocolError::UnexpectedFormat(format!("request body: {e}"))
        })?;
        self.send(Method::Put, path, Some(&body)).await
    }

    async fn create(&self, path: &str, body: &Value, target: &str) -> Result<String> {
        let results = self.send(Method::Post, path, Some(body)).await?;
        if !results.is_success() {
            return Err(ControlError {
                target: target.to_string(),
                errors: results.errors(),
            }
            .into());
        }
        results.created_id().ok_or_else(|| {
            ProtocolError::UnexpectedFormat(format!("{target}: response has no id")).into()
        })
    }

    async fn id_by_name(&self, path: &str, name: &str) -> Result<Option<u16>> {
        let collection = self.get(path).await?;
        let Value::Object(entries) = collection else {
            return Ok(None);
        };
        Ok(entries
            .iter()
            .find(|(_, entry)| entry.get("name").and_then(Value::as_str) == Some(name))
            .and_then(|(id, _)| id.parse().ok()))
    }

    // ========================================================================
    // Lights
    // ========================================================================

    /// Reads one light.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge rejects it.
    pub async fn light(&self, index: u16) -> Result<Value> {
        self.get(&self.api()?.light(index)).await
    }

    /// Reads one parameter of a light.
    ///
    /// `name`, `type`, `uniqueid` and `swversion` are read from the light
    /// itself, anything else from its state. Returns `None` for a parameter
    /// the light does not report.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge rejects it.
    pub async fn light_parameter(&self, index: u16, parameter: &str) -> Result<Option<Value>> {
        let light = self.light(index).await?;
        let value = if LIGHT_FIELDS.contains(&parameter) {
            light.get(parameter)
        } else {
            light.get("state").and_then(|state| state.get(parameter))
        };
        Ok(value.cloned())
    }

    /// Looks up a light index by its exact name.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge rejects it.
    pub async fn light_id_by_name(&self, name: &str) -> Result<Option<u16>> {
        self.id_by_name(&self.api()?.lights(), name).await
    }

    /// Renames a light.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn rename_light(&self, index: u16, name: &str) -> Result<ApiResults> {
        self.put(&self.api()?.light(index), &json!({ "name": name })).await
    }

    // ========================================================================
    // Sensors
    // ========================================================================

    /// Creates a sensor and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Control` if the bridge refuses the sensor.
    pub async fn create_sensor(&self, sensor: &NewSensor) -> Result<String> {
        let body = serde_json::to_value(sensor)
            .map_err(|e| ProtocolError::UnexpectedFormat(format!("request body: {e}")))?;
        self.create(&self.api()?.sensors(), &body, &format!("sensor {}", sensor.name))
            .await
    }

    /// Reads one sensor, or `None` if the bridge answers with result lines
    /// instead (unknown sensor).
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn sensor(&self, index: u16) -> Result<Option<Value>> {
        let value = self
            .client
            .request(Method::Get, &self.api()?.sensor(index), None)
            .await?;
        Ok((!value.is_array()).then_some(value))
    }

    /// Looks up a sensor index by its exact name.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge rejects it.
    pub async fn sensor_id_by_name(&self, name: &str) -> Result<Option<u16>> {
        self.id_by_name(&self.api()?.sensors(), name).await
    }

    /// Changes a sensor's top-level attributes, e.g. its name.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn set_sensor_attributes(
        &self,
        index: u16,
        attributes: &Map<String, Value>,
    ) -> Result<ApiResults> {
        self.put(&self.api()?.sensor(index), attributes).await
    }

    /// Writes a sensor's `state` or `config` structure.
    ///
    /// The read-only `lastupdated` key is dropped before sending.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidStructure` for any structure other than
    /// `state` or `config`, before touching the network.
    pub async fn set_sensor_content(
        &self,
        index: u16,
        structure: &str,
        content: &Map<String, Value>,
    ) -> Result<ApiResults> {
        let structure: SensorStructure = structure.parse()?;
        let mut content = content.clone();
        content.remove("lastupdated");
        self.put(&self.api()?.sensor_content(index, structure), &content)
            .await
    }

    /// Deletes a sensor.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn delete_sensor(&self, index: u16) -> Result<ApiResults> {
        self.send(Method::Delete, &self.api()?.sensor(index), None)
            .await
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Reads one group.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge rejects it.
    pub async fn group(&self, index: u16) -> Result<Value> {
        self.get(&self.api()?.group(index)).await
    }

    /// Looks up a group index by its exact name.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge rejects it.
    pub async fn group_id_by_name(&self, name: &str) -> Result<Option<u16>> {
        self.id_by_name(&self.api()?.groups(), name).await
    }

    /// Creates a group of lights and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Control` if the bridge refuses the group.
    pub async fn create_group(&self, name: &str, lights: &[u16]) -> Result<String> {
        let attributes = GroupAttributes::rename(name).with_lights(lights);
        let body = serde_json::to_value(&attributes)
            .map_err(|e| ProtocolError::UnexpectedFormat(format!("request body: {e}")))?;
        self.create(&self.api()?.groups(), &body, &format!("group {name}"))
            .await
    }

    /// Deletes a group.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn delete_group(&self, index: u16) -> Result<ApiResults> {
        self.send(Method::Delete, &self.api()?.group(index), None)
            .await
    }

    // ========================================================================
    // Scenes
    // ========================================================================

    /// Lists the scenes stored on the bridge.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the response is not a scene
    /// collection.
    pub async fn scenes(&self) -> Result<Vec<RemoteScene>> {
        let value = self.get(&self.api()?.scenes()).await?;
        let scenes: std::collections::BTreeMap<String, payload::ScenePayload> =
            serde_json::from_value(value)
                .map_err(|e| ProtocolError::UnexpectedFormat(format!("scenes: {e}")))?;

        scenes
            .into_iter()
            .map(|(id, scene)| {
                let mut lights = payload::parse_indices(&scene.lights).map_err(|reason| {
                    ProtocolError::UnexpectedFormat(format!("scene {id}: {reason}"))
                })?;
                lights.sort_unstable();
                Ok(RemoteScene {
                    id,
                    name: scene.name,
                    lights,
                })
            })
            .collect()
    }

    /// Recalls a scene on a group.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn activate_scene(&self, group: u16, scene: &str) -> Result<ApiResults> {
        self.set_group_action(group, &StatePatch::scene(scene)).await
    }

    /// Recalls a scene by group name and scene name.
    ///
    /// The group name must match exactly one group. When several scenes
    /// share the name, the first one covering exactly the group's lights is
    /// used. Returns `false` if nothing matched.
    ///
    /// # Errors
    ///
    /// Returns error if a request fails.
    pub async fn run_scene(&self, group_name: &str, scene_name: &str) -> Result<bool> {
        let groups: Vec<RemoteGroup> = self
            .fetch_groups()
            .await?
            .into_iter()
            .filter_map(std::result::Result::ok)
            .filter(|g| g.name == group_name)
            .collect();
        let [group] = groups.as_slice() else {
            tracing::warn!(
                group = group_name,
                matches = groups.len(),
                "Scene group is ambiguous or missing"
            );
            return Ok(false);
        };

        let scenes: Vec<RemoteScene> = self
            .scenes()
            .await?
            .into_iter()
            .filter(|s| s.name == scene_name)
            .collect();

        let chosen = if let [only] = scenes.as_slice() {
            Some(only)
        } else {
            let mut group_lights = group.lights.clone();
            group_lights.sort_unstable();
            scenes.iter().find(|s| s.lights == group_lights)
        };

        let Some(scene) = chosen else {
            tracing::warn!(group = group_name, scene = scene_name, "No matching scene");
            return Ok(false);
        };

        self.activate_scene(group.index, &scene.id).await?;
        Ok(true)
    }

    // ========================================================================
    // Schedules
    // ========================================================================

    /// Lists the schedules stored on the bridge.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge rejects it.
    pub async fn schedules(&self) -> Result<Value> {
        self.get(&self.api()?.schedules()).await
    }

    /// Reads one schedule.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the bridge rejects it.
    pub async fn schedule(&self, id: &str) -> Result<Value> {
        self.get(&self.api()?.schedule(id)).await
    }

    /// Creates a schedule and returns its id.
    ///
    /// # Errors
    ///
    /// Returns `Error::Control` if the bridge refuses the schedule.
    pub async fn create_schedule(&self, schedule: &NewSchedule) -> Result<String> {
        let api = self.api()?;
        let address = match schedule.target {
            ScheduleTarget::Light(index) => api.light_state(index),
            ScheduleTarget::Group(index) => api.group_action(index),
        };
        let body = json!({
            "name": schedule.name,
            "localtime": schedule.local_time,
            "description": schedule.description,
            "command": {
                "method": Method::Put,
                "address": address,
                "body": schedule.body,
            },
        });
        self.create(
            &api.schedules(),
            &body,
            &format!("schedule {}", schedule.name),
        )
        .await
    }

    /// Deletes a schedule.
    ///
    /// # Errors
    ///
    /// Returns error if the request fails.
    pub async fn delete_schedule(&self, id: &str) -> Result<ApiResults> {
        self.send(Method::Delete, &self.api()?.schedule(id), None)
            .await
    }
}

impl BridgeController for HueBridge {
    fn connect(config: HttpConfig, token: Option<String>) -> Result<Self> {
        Ok(Self {
            client: config.into_client()?,
            token,
        })
    }

    fn vendor(&self) -> VendorTag {
        VendorTag::hue()
    }

    async fn register(&self, device_type: &str) -> Result<String> {
        let body = json!({ "devicetype": device_type });
        let response = self
            .client
            .request(Method::Post, ApiPath::REGISTRATION, Some(&body))
            .await?;

        match parse_registration(response) {
            Ok(token) => {
                tracing::info!(bridge = %self.client.base_url(), "Bridge issued auth token");
                Ok(token)
            }
            Err(Error::Registration(e)) => {
                tracing::info!(
                    bridge = %self.client.base_url(),
                    code = e.code,
                    "Bridge refused registration"
                );
                Err(e.into())
            }
            Err(e) => Err(e),
        }
    }

    async fn bridge_config(&self) -> Result<BridgeConfig> {
        let value = self.get(&self.api()?.config()).await?;
        Ok(payload::bridge_config(value)?)
    }

    async fn fetch_lights(&self) -> Result<Fetched<RemoteLight>> {
        let value = self
            .client
            .request(Method::Get, &self.api()?.lights(), None)
            .await?;
        Ok(payload::parse_collection(
            EntityKind::Light,
            value,
            payload::light,
        )?)
    }

    async fn fetch_sensors(&self) -> Result<Fetched<RemoteSensor>> {
        let value = self
            .client
            .request(Method::Get, &self.api()?.sensors(), None)
            .await?;
        Ok(payload::parse_collection(
            EntityKind::Sensor,
            value,
            payload::sensor,
        )?)
    }

    async fn fetch_groups(&self) -> Result<Fetched<RemoteGroup>> {
        let value = self
            .client
            .request(Method::Get, &self.api()?.groups(), None)
            .await?;
        Ok(payload::parse_collection(
            EntityKind::Group,
            value,
            payload::group,
        )?)
    }

    async fn set_light_state(&self, index: u16, patch: &StatePatch) -> Result<ApiResults> {
        self.put(&self.api()?.light_state(index), patch).await
    }

    async fn set_group_action(&self, index: u16, patch: &StatePatch) -> Result<ApiResults> {
        self.put(&self.api()?.group_action(index), patch).await
    }

    async fn set_group_attributes(
        &self,
        index: u16,
        attributes: &GroupAttributes,
    ) -> Result<ApiResults> {
        self.put(&self.api()?.group(index), attributes).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn calls_require_a_token() {
        let bridge = HueBridge::connect(HttpConfig::new("10.0.0.5"), None).unwrap();
        assert!(matches!(bridge.api(), Err(ProtocolError::NotRegistered)));
        assert_eq!(bridge.vendor(), VendorTag::hue());
    }

    #[test]
    fn new_sensor_omits_empty_structures() {
        let sensor = NewSensor {
            name: "Away".to_string(),
            model_id: "HOMELINK".to_string(),
            sw_version: "1.0".to_string(),
            sensor_type: "CLIPGenericFlag".to_string(),
            unique_id: "homelink-away".to_string(),
            manufacturer: "homelink".to_string(),
            state: Map::new(),
            config: Map::new(),
            recycle: false,
        };
        let body = serde_json::to_value(&sensor).unwrap();
        assert_eq!(body["type"], "CLIPGenericFlag");
        assert_eq!(body["manufacturername"], "homelink");
        assert!(body.get("state").is_none());
        assert!(body.get("config").is_none());
    }
}
