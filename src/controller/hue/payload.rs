// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hue resource payloads and their conversion to remote records.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use crate::controller::{BridgeConfig, Fetched, RemoteGroup, RemoteLight, RemoteSensor};
use crate::error::{ImportError, ProtocolError};
use crate::model::EntityKind;
use crate::protocol::ApiResults;
use crate::types::CieXy;

// ============================================================================
// Wire shapes
// ============================================================================

#[derive(Debug, Deserialize)]
pub(super) struct LightPayload {
    name: String,
    #[serde(rename = "type")]
    light_type: String,
    modelid: String,
    uniqueid: String,
    state: LightStatePayload,
}

#[derive(Debug, Deserialize)]
struct LightStatePayload {
    on: bool,
    bri: Option<u8>,
    ct: Option<u16>,
    xy: Option<CieXy>,
    colormode: Option<String>,
    alert: Option<String>,
    reachable: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct SensorPayload {
    name: String,
    #[serde(rename = "type")]
    sensor_type: String,
    modelid: String,
    uniqueid: Option<String>,
    state: Map<String, Value>,
    #[serde(default)]
    config: Map<String, Value>,
}

#[derive(Debug, Deserialize)]
pub(super) struct GroupPayload {
    name: String,
    lights: Vec<String>,
    #[serde(rename = "type")]
    group_type: String,
    class: Option<String>,
    #[serde(default)]
    state: GroupStatePayload,
    #[serde(default)]
    action: GroupActionPayload,
}

#[derive(Debug, Default, Deserialize)]
struct GroupStatePayload {
    #[serde(default)]
    all_on: bool,
    #[serde(default)]
    any_on: bool,
}

#[derive(Debug, Default, Deserialize)]
struct GroupActionPayload {
    #[serde(default)]
    on: bool,
}

#[derive(Debug, Deserialize)]
pub(super) struct ScenePayload {
    pub(super) name: String,
    #[serde(default)]
    pub(super) lights: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct ConfigPayload {
    swversion: String,
    bridgeid: String,
    mac: String,
}

// ============================================================================
// Conversion
// ============================================================================

/// Fails with the first error line when a GET was answered with result
/// lines instead of the resource.
pub(super) fn reject_error_lines(value: &Value) -> Result<(), ProtocolError> {
    if value.is_array() {
        let results = ApiResults::from_value(value.clone())?;
        if let Some(error) = results.errors().into_iter().next() {
            return Err(ProtocolError::Rejected(error));
        }
    }
    Ok(())
}

/// Splits an id-keyed collection into per-entity results.
pub(super) fn parse_collection<P, T>(
    kind: EntityKind,
    value: Value,
    convert: impl Fn(u16, P) -> Result<T, String>,
) -> Result<Fetched<T>, ProtocolError>
where
    P: DeserializeOwned,
{
    reject_error_lines(&value)?;
    let Value::Object(entries) = value else {
        return Err(ProtocolError::UnexpectedFormat(format!(
            "expected an object of {kind}s"
        )));
    };

    Ok(entries
        .into_iter()
        .map(|(id, entry)| {
            let index = id
                .parse::<u16>()
                .map_err(|_| ImportError::new(kind, &id, "index is not a number"))?;
            let payload: P =
                serde_json::from_value(entry).map_err(|e| ImportError::new(kind, &id, e))?;
            convert(index, payload).map_err(|reason| ImportError::new(kind, &id, reason))
        })
        .collect())
}

pub(super) fn light(index: u16, payload: LightPayload) -> Result<RemoteLight, String> {
    let state = payload.state;
    Ok(RemoteLight {
        index,
        name: payload.name,
        light_type: payload.light_type,
        model_id: payload.modelid,
        unique_id: payload.uniqueid,
        on: state.on,
        brightness: state.bri,
        ct: state.ct,
        xy: state.xy,
        color_mode: state.colormode,
        alert: state.alert,
        reachable: state.reachable,
    })
}

pub(super) fn sensor(index: u16, payload: SensorPayload) -> Result<RemoteSensor, String> {
    let reachable = payload
        .config
        .get("reachable")
        .and_then(Value::as_bool)
        .unwrap_or(true);

    Ok(RemoteSensor {
        index,
        value: sensor_value(&payload.state)?,
        name: payload.name,
        sensor_type: payload.sensor_type,
        model_id: payload.modelid,
        unique_id: payload.uniqueid,
        reachable,
    })
}

pub(super) fn group(index: u16, payload: GroupPayload) -> Result<RemoteGroup, String> {
    let lights = parse_indices(&payload.lights)?;
    Ok(RemoteGroup {
        index,
        name: payload.name,
        group_type: payload.group_type,
        class: payload.class,
        lights,
        all_on: payload.state.all_on,
        any_on: payload.state.any_on,
        action_on: payload.action.on,
    })
}

pub(super) fn bridge_config(value: Value) -> Result<BridgeConfig, ProtocolError> {
    reject_error_lines(&value)?;
    let config: ConfigPayload = serde_json::from_value(value)
        .map_err(|e| ProtocolError::UnexpectedFormat(format!("config: {e}")))?;
    Ok(BridgeConfig {
        firmware_version: config.swversion,
        bridge_id: config.bridgeid,
        mac_address: config.mac,
    })
}

pub(super) fn parse_indices(ids: &[String]) -> Result<Vec<u16>, String> {
    ids.iter()
        .map(|id| {
            id.parse::<u16>()
                .map_err(|_| format!("member index {id:?} is not a number"))
        })
        .collect()
}

/// Reads a sensor's value from the first state entry other than
/// `lastupdated`. Flags map to 0/1; a sensor without state reads 0.
fn sensor_value(state: &Map<String, Value>) -> Result<f64, String> {
    let Some((key, value)) = state.iter().find(|(key, _)| key.as_str() != "lastupdated") else {
        return Ok(0.0);
    };

    match value {
        Value::Bool(flag) => Ok(f64::from(u8::from(*flag))),
        Value::Number(n) => n
            .as_f64()
            .ok_or_else(|| format!("state.{key} is not representable")),
        Value::Null => Ok(0.0),
        Value::String(s) => match s.as_str() {
            "true" => Ok(1.0),
            "false" => Ok(0.0),
            other => other
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("state.{key} is not numeric: {other:?}")),
        },
        Value::Array(_) | Value::Object(_) => Err(format!("state.{key} is not a scalar")),
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn state(value: Value) -> Map<String, Value> {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn sensor_value_kinds() {
        let read = |v: Value| sensor_value(&state(v));

        assert!((read(json!({"presence": true})).unwrap() - 1.0).abs() < f64::EPSILON);
        assert!((read(json!({"flag": "false"})).unwrap()).abs() < f64::EPSILON);
        assert!(
            (read(json!({"lastupdated": "2024-01-01T00:00:00", "temperature": 2150})).unwrap()
                - 2150.0)
                .abs()
                < f64::EPSILON
        );
        assert!((read(json!({"status": "12.5"})).unwrap() - 12.5).abs() < f64::EPSILON);
        assert!((read(json!({"lastupdated": "none"})).unwrap()).abs() < f64::EPSILON);
        assert!((read(json!({"buttonevent": null})).unwrap()).abs() < f64::EPSILON);
        assert!(read(json!({"status": "dark"})).is_err());
    }

    #[test]
    fn collection_isolates_bad_entities() {
        let value = json!({
            "1": {"name": "Desk", "type": "Dimmable light", "modelid": "LWB010",
                  "uniqueid": "00:01", "state": {"on": true, "bri": 10, "reachable": true}},
            "2": {"name": "Broken", "state": {"on": true}},
            "x": {}
        });
        let fetched = parse_collection(EntityKind::Light, value, light).unwrap();
        assert_eq!(fetched.len(), 3);

        let ok: Vec<_> = fetched.iter().filter_map(|r| r.as_ref().ok()).collect();
        assert_eq!(ok.len(), 1);
        assert_eq!(ok[0].index, 1);
        assert_eq!(ok[0].brightness, Some(10));

        let failed: Vec<_> = fetched.iter().filter_map(|r| r.as_ref().err()).collect();
        assert!(failed.iter().any(|e| e.entity_id == "2"));
        assert!(failed.iter().any(|e| e.entity_id == "x"));
    }

    #[test]
    fn error_lines_are_rejected() {
        let value = json!([{
            "error": { "type": 1, "address": "/lights", "description": "unauthorized user" }
        }]);
        assert!(matches!(
            parse_collection(EntityKind::Light, value, light),
            Err(ProtocolError::Rejected(e)) if e.code == 1
        ));
    }

    #[test]
    fn sensor_reachable_defaults_to_true() {
        let payload: SensorPayload = serde_json::from_value(json!({
            "name": "Daylight", "type": "Daylight", "modelid": "PHDL00",
            "state": {"daylight": false}
        }))
        .unwrap();
        let sensor = sensor(1, payload).unwrap();
        assert!(sensor.reachable);
        assert!(sensor.unique_id.is_none());
    }

    #[test]
    fn group_member_indices() {
        let payload: GroupPayload = serde_json::from_value(json!({
            "name": "Kitchen", "lights": ["1", "3"], "type": "Room", "class": "Kitchen",
            "state": {"all_on": false, "any_on": true}, "action": {"on": true}
        }))
        .unwrap();
        let group = group(2, payload).unwrap();
        assert_eq!(group.lights, vec![1, 3]);
        assert!(group.any_on);
        assert!(group.action_on);

        assert!(parse_indices(&["a".to_string()]).is_err());
    }

    #[test]
    fn config_fields() {
        let config = bridge_config(json!({
            "swversion": "1941132080", "bridgeid": "001788FFFE23BFC2", "mac": "00:17:88:23:bf:c2",
            "name": "Philips hue"
        }))
        .unwrap();
        assert_eq!(config.bridge_id, "001788FFFE23BFC2");
        assert_eq!(config.mac_address, "00:17:88:23:bf:c2");
    }
}
