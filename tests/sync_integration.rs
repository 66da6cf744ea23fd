// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Registration and inventory sync against a mocked bridge.

use homelink::event::HubEvent;
use homelink::model::{Bridge, Device, DeviceCategory, DeviceDetails, VendorTag};
use homelink::types::{AccountId, ColorMode};
use homelink::{Error, Hub, HubConfig, ProtocolError, ServiceIdentity};
use serde_json::{Value, json};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn hub() -> Hub {
    Hub::new(HubConfig::new(
        ServiceIdentity::new("alice").with_client_id("homelink#test"),
    ))
}

fn host(server: &MockServer) -> String {
    server.uri().replace("http://", "")
}

async fn mount_json(server: &MockServer, verb: &str, route: &str, body: Value) {
    Mock::given(method(verb))
        .and(path(route))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

async fn mount_bridge(server: &MockServer) {
    mount_json(
        server,
        "POST",
        "/api",
        json!([{ "success": { "username": "abc123" } }]),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/api/abc123/config/",
        json!({
            "name": "Philips hue",
            "swversion": "1941132080",
            "bridgeid": "001788FFFE23BFC2",
            "mac": "00:17:88:23:bf:c2"
        }),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/api/abc123/lights/",
        json!({
            "1": {
                "name": "Desk",
                "type": "Extended color light",
                "modelid": "LCT015",
                "uniqueid": "00:17:88:01:04:6a:01:51-0b",
                "state": {
                    "on": true, "bri": 200, "ct": 300, "colormode": "ct",
                    "alert": "none", "reachable": true
                }
            },
            "2": {
                "name": "Hallway",
                "type": "Dimmable light",
                "modelid": "LWB010",
                "uniqueid": "00:17:88:01:02:9c:55:33-0b",
                "state": { "on": false, "bri": 1, "alert": "none", "reachable": true }
            }
        }),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/api/abc123/sensors/",
        json!({
            "5": {
                "name": "Away",
                "type": "CLIPGenericFlag",
                "modelid": "GenericFlag",
                "uniqueid": "flag-away",
                "state": { "flag": false, "lastupdated": "none" }
            },
            "6": { "name": "Broken sensor" }
        }),
    )
    .await;
    mount_json(
        server,
        "GET",
        "/api/abc123/groups/",
        json!({
            "1": {
                "name": "Office",
                "lights": ["1", "2"],
                "type": "Room",
                "class": "Office",
                "state": { "all_on": false, "any_on": true },
                "action": { "on": true }
            }
        }),
    )
    .await;
}

#[tokio::test]
async fn register_stores_token_and_identity() {
    let server = MockServer::start().await;
    mount_bridge(&server).await;

    let hub = hub();
    let mut events = hub.subscribe();
    let bridge = hub.register_bridge(&host(&server)).await.unwrap();

    let record = hub.store().device(bridge).unwrap();
    assert_eq!(record.owner.as_str(), "alice");
    assert_eq!(record.hardware_address.as_deref(), Some("00:17:88:23:bf:c2"));
    let details = record.as_bridge().unwrap();
    assert_eq!(details.token.as_deref(), Some("abc123"));
    assert_eq!(details.bridge_id.as_deref(), Some("001788FFFE23BFC2"));
    assert_eq!(details.firmware_version.as_deref(), Some("1941132080"));

    assert_eq!(events.recv().await.unwrap(), HubEvent::device_added(bridge));
    assert_eq!(events.recv().await.unwrap(), HubEvent::BridgeRegistered { bridge });

    // Registering again at the same address reuses the record
    let again = hub.register_bridge(&host(&server)).await.unwrap();
    assert_eq!(again, bridge);
    assert_eq!(hub.bridges().len(), 1);
}

#[tokio::test]
async fn sync_imports_inventory() {
    let server = MockServer::start().await;
    mount_bridge(&server).await;

    let hub = hub();
    let bridge = hub.register_bridge(&host(&server)).await.unwrap();
    let report = hub.sync_bridge(bridge).await.unwrap();

    assert_eq!(report.lights.len(), 2);
    assert_eq!(report.sensors.len(), 1);
    assert_eq!(report.groups.len(), 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].entity_id, "6");

    let desk = hub
        .store()
        .devices()
        .into_iter()
        .find(|d| d.name == "Desk")
        .unwrap();
    assert_eq!(desk.owner.as_str(), "alice");
    assert_eq!(desk.hardware_address.as_deref(), Some("00:17:88:23:bf:c2"));
    let light = desk.as_light().unwrap();
    assert!(light.on);
    assert_eq!(light.brightness.value(), 200);
    assert_eq!(light.color_temperature.value(), 300);
    assert_eq!(light.color_mode, ColorMode::Temperature);
    assert!((light.color_xy.x() - 0.416_509).abs() < 1e-4);
    assert!((light.color_xy.y() - 0.399_942).abs() < 1e-4);

    let group = hub.store().group(report.groups[0]).unwrap();
    assert_eq!(group.name, "Office");
    assert_eq!(group.class.as_deref(), Some("Office"));
    assert!(group.any_on && !group.all_on);
    assert_eq!(group.member_lights().count(), 2);

    let away = hub.store().device(report.sensors[0]).unwrap();
    assert_eq!(away.category(), DeviceCategory::Sensor);
    assert!(away.as_sensor().unwrap().value.abs() < f64::EPSILON);
}

#[tokio::test]
async fn resync_is_idempotent() {
    let server = MockServer::start().await;
    mount_bridge(&server).await;

    let hub = hub();
    let bridge = hub.register_bridge(&host(&server)).await.unwrap();
    let first = hub.sync_bridge(bridge).await.unwrap();
    let devices = hub.store().device_count();
    let groups = hub.store().groups().len();

    let mut events = hub.subscribe();
    let second = hub.sync_bridge(bridge).await.unwrap();

    assert_eq!(first.lights, second.lights);
    assert_eq!(first.sensors, second.sensors);
    assert_eq!(first.groups, second.groups);
    assert_eq!(hub.store().device_count(), devices);
    assert_eq!(hub.store().groups().len(), groups);

    // Nothing changed remotely, so the only event is the sync summary
    match events.recv().await.unwrap() {
        HubEvent::BridgeSynced { lights, sensors, groups, failures, .. } => {
            assert_eq!((lights, sensors, groups, failures), (2, 1, 1, 1));
        }
        other => panic!("unexpected event: {other:?}"),
    }
}

#[tokio::test]
async fn sync_refreshes_bridge_identity() {
    let server = MockServer::start().await;
    // Served once, at registration; later reads see the upgraded firmware
    Mock::given(method("GET"))
        .and(path("/api/abc123/config/"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "swversion": "1940094000",
            "bridgeid": "001788FFFE23BFC2",
            "mac": "00:17:88:23:bf:c2"
        })))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    mount_bridge(&server).await;

    let hub = hub();
    let bridge = hub.register_bridge(&host(&server)).await.unwrap();
    let before = hub.store().device(bridge).unwrap();
    assert_eq!(
        before.as_bridge().unwrap().firmware_version.as_deref(),
        Some("1940094000")
    );

    hub.sync_bridge(bridge).await.unwrap();

    let after = hub.store().device(bridge).unwrap();
    assert_eq!(
        after.as_bridge().unwrap().firmware_version.as_deref(),
        Some("1941132080")
    );
    assert!(after.updated > before.updated);
}

#[tokio::test]
async fn sync_requires_registration() {
    let hub = hub();
    let bridge = hub.store().insert_device(Device::new(
        AccountId::new("alice"),
        "Bridge",
        "10.0.0.5",
        VendorTag::hue(),
        DeviceDetails::Bridge(Bridge::default()),
    ));

    assert!(matches!(
        hub.sync_bridge(bridge).await,
        Err(Error::Protocol(ProtocolError::NotRegistered))
    ));
}
