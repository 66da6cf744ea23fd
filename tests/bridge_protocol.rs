// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Integration tests for the Hue bridge client using wiremock.

use std::time::Duration;

use homelink::controller::{BridgeController, HueBridge, NewSchedule, ScheduleTarget, StatePatch};
use homelink::error::{Error, ProtocolError, ValueError};
use homelink::protocol::HttpConfig;
use homelink::types::{Brightness, TransitionTime};
use serde_json::json;
use wiremock::matchers::{body_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const TOKEN: &str = "abc123";

fn host(server: &MockServer) -> String {
    server.uri().replace("http://", "")
}

fn bridge(server: &MockServer) -> HueBridge {
    HueBridge::connect(HttpConfig::new(host(server)), Some(TOKEN.to_string())).unwrap()
}

// ============================================================================
// Registration
// ============================================================================

mod registration {
    use super::*;

    #[tokio::test]
    async fn issued_token() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api"))
            .and(body_json(json!({ "devicetype": "homelink#test" })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "success": { "username": "abc123" } }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let probe = HueBridge::connect(HttpConfig::new(host(&server)), None).unwrap();
        assert_eq!(probe.register("homelink#test").await.unwrap(), "abc123");
    }

    #[tokio::test]
    async fn link_button_not_pressed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "error": { "type": 101, "address": "", "description": "link button not pressed" }
            }])))
            .mount(&server)
            .await;

        let probe = HueBridge::connect(HttpConfig::new(host(&server)), None).unwrap();
        let err = probe.register("homelink#test").await.unwrap_err();
        match &err {
            Error::Registration(e) => {
                assert!(e.is_link_button_not_pressed());
                assert_eq!(e.description, "link button not pressed");
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(err.is_retryable());
    }
}

// ============================================================================
// Collections
// ============================================================================

mod collections {
    use super::*;

    #[tokio::test]
    async fn lights_with_one_malformed_entry() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/abc123/lights/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "1": {
                    "name": "Desk",
                    "type": "Extended color light",
                    "modelid": "LCT001",
                    "uniqueid": "00:17:88:01:00:bd:c7:b9-0b",
                    "state": {
                        "on": true, "bri": 200, "ct": 300, "xy": [0.4, 0.4],
                        "colormode": "ct", "alert": "none", "reachable": true
                    }
                },
                "2": { "name": "Broken" }
            })))
            .mount(&server)
            .await;

        let lights = bridge(&server).fetch_lights().await.unwrap();
        assert_eq!(lights.len(), 2);

        let desk = lights.iter().find_map(|l| l.as_ref().ok()).unwrap();
        assert_eq!(desk.index, 1);
        assert_eq!(desk.brightness, Some(200));
        assert_eq!(desk.ct, Some(300));
        assert_eq!(desk.color_mode.as_deref(), Some("ct"));

        let broken = lights.iter().find_map(|l| l.as_ref().err()).unwrap();
        assert_eq!(broken.entity_id, "2");
    }

    #[tokio::test]
    async fn sensor_flags_become_numbers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/abc123/sensors/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "4": {
                    "name": "Hall presence",
                    "type": "ZLLPresence",
                    "modelid": "SML001",
                    "uniqueid": "00:17:88:01:02:00:af:29-02-0406",
                    "state": { "presence": true, "lastupdated": "2024-01-01T10:00:00" },
                    "config": { "on": true, "reachable": false }
                }
            })))
            .mount(&server)
            .await;

        let sensors = bridge(&server).fetch_sensors().await.unwrap();
        let hall = sensors[0].as_ref().unwrap();
        assert!((hall.value - 1.0).abs() < f64::EPSILON);
        assert!(!hall.reachable);
    }

    #[tokio::test]
    async fn unauthorized_collection_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/abc123/groups/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "error": { "type": 1, "address": "/groups", "description": "unauthorized user" }
            }])))
            .mount(&server)
            .await;

        let err = bridge(&server).fetch_groups().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::Rejected(e)) if e.code == 1));
    }
}

// ============================================================================
// Commands
// ============================================================================

mod commands {
    use super::*;

    #[tokio::test]
    async fn light_state_body() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/abc123/lights/3/state"))
            .and(body_json(json!({ "on": true, "bri": 128, "transitiontime": 20 })))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([
                { "success": { "/lights/3/state/on": true } },
                { "success": { "/lights/3/state/bri": 128 } },
                { "success": { "/lights/3/state/transitiontime": 20 } }
            ])))
            .expect(1)
            .mount(&server)
            .await;

        let mut patch = StatePatch::brightness(Brightness::new(128))
            .with_transition(Some(TransitionTime::from_deciseconds(20)));
        patch.on = Some(true);

        let results = bridge(&server).set_light_state(3, &patch).await.unwrap();
        assert!(results.is_success());
    }

    #[tokio::test]
    async fn embedded_error_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/abc123/lights/3/state"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([{
                "error": {
                    "type": 201,
                    "address": "/lights/3/state/bri",
                    "description": "parameter, bri, is not modifiable. Device is set to off."
                }
            }])))
            .mount(&server)
            .await;

        let results = bridge(&server)
            .set_light_state(3, &StatePatch::brightness(Brightness::new(10)))
            .await
            .unwrap();
        assert!(!results.is_success());
        assert_eq!(results.errors()[0].code, 201);
    }

    #[tokio::test]
    async fn sensor_content_drops_lastupdated() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .and(path("/api/abc123/sensors/7/state"))
            .and(body_json(json!({ "status": 2 })))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!([{ "success": { "/sensors/7/state/status": 2 } }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let content = json!({ "status": 2, "lastupdated": "none" });
        let results = bridge(&server)
            .set_sensor_content(7, "state", content.as_object().unwrap())
            .await
            .unwrap();
        assert!(results.is_success());
    }

    #[tokio::test]
    async fn unknown_sensor_structure_never_sent() {
        let server = MockServer::start().await;
        Mock::given(method("PUT"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!([])))
            .expect(0)
            .mount(&server)
            .await;

        let err = bridge(&server)
            .set_sensor_content(7, "capabilities", &serde_json::Map::new())
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Value(ValueError::InvalidStructure(_))));
    }

    #[tokio::test]
    async fn schedule_for_group() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/abc123/schedules"))
            .and(body_json(json!({
                "name": "Wake up",
                "localtime": "W124/T07:00:00",
                "description": "Weekdays",
                "command": {
                    "method": "PUT",
                    "address": "/api/abc123/groups/2/action",
                    "body": { "on": true }
                }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{ "success": { "id": "5" } }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let schedule = NewSchedule {
            name: "Wake up".to_string(),
            description: "Weekdays".to_string(),
            local_time: "W124/T07:00:00".to_string(),
            target: ScheduleTarget::Group(2),
            body: StatePatch::power(true),
        };
        assert_eq!(bridge(&server).create_schedule(&schedule).await.unwrap(), "5");
    }

    #[tokio::test]
    async fn scene_by_group_and_name() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/abc123/groups/"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "1": { "name": "Living", "lights": ["2", "1"], "type": "Room" },
                "2": { "name": "Kitchen", "lights": ["3"], "type": "Room" }
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/api/abc123/scenes"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "kitchen-relax": { "name": "Relax", "lights": ["3"] },
                "living-relax": { "name": "Relax", "lights": ["1", "2"] }
            })))
            .mount(&server)
            .await;
        Mock::given(method("PUT"))
            .and(path("/api/abc123/groups/1/action"))
            .and(body_json(json!({ "scene": "living-relax" })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!([{
                    "success": { "/groups/1/action/scene": "living-relax" }
                }])),
            )
            .expect(1)
            .mount(&server)
            .await;

        let bridge = bridge(&server);
        assert!(bridge.run_scene("Living", "Relax").await.unwrap());
        assert!(!bridge.run_scene("Garage", "Relax").await.unwrap());
    }
}

// ============================================================================
// Transport failures
// ============================================================================

mod transport {
    use super::*;

    #[tokio::test]
    async fn slow_bridge_times_out() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/abc123/lights/"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({}))
                    .set_delay(Duration::from_secs(2)),
            )
            .mount(&server)
            .await;

        let config = HttpConfig::new(host(&server)).with_timeout(Duration::from_millis(100));
        let bridge = HueBridge::connect(config, Some(TOKEN.to_string())).unwrap();

        let err = bridge.fetch_lights().await.unwrap_err();
        assert!(err.is_retryable());
        match err {
            Error::Protocol(ProtocolError::Timeout { path, .. }) => {
                assert!(!path.contains(TOKEN));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn non_json_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/abc123/config/"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>busy</html>"))
            .mount(&server)
            .await;

        let err = bridge(&server).bridge_config().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::InvalidJson { .. })));
    }

    #[tokio::test]
    async fn http_status_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let err = bridge(&server).fetch_sensors().await.unwrap_err();
        assert!(matches!(err, Error::Protocol(ProtocolError::Status(503))));
    }
}
