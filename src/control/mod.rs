// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device control facade.
//!
//! Every light command follows the same steps:
//!
//! 1. Check the light's capabilities; unsupported commands fail with
//!    [`Error::CapabilityNotSupported`] before anything is sent
//! 2. Send one state patch to the light's bridge
//! 3. Inspect the bridge's result lines; any embedded error fails the call
//!    with a [`ControlError`] and leaves the local record untouched
//! 4. Apply the confirmed changes to the store and publish them
//!
//! Transition times only travel with the request that carries them.
//!
//! # Examples
//!
//! ```no_run
//! use homelink::control::LightControl;
//! use homelink::controller::{BridgeController, HueBridge};
//! use homelink::event::EventBus;
//! use homelink::protocol::HttpConfig;
//! use homelink::store::Store;
//! use homelink::types::{BrightnessLevel, DeviceId, TransitionTime};
//!
//! # async fn example(light: DeviceId) -> homelink::Result<()> {
//! let store = Store::new();
//! let events = EventBus::new();
//! let bridge = HueBridge::connect(HttpConfig::new("10.0.0.5"), Some("abc123".into()))?;
//!
//! let control = LightControl::new(&store, &events, &bridge);
//! control.turn_on(light, None).await?;
//! control
//!     .set_brightness(
//!         light,
//!         BrightnessLevel::Percent(40),
//!         Some(TransitionTime::from_deciseconds(20)),
//!     )
//!     .await?;
//! # Ok(())
//! # }
//! ```

mod group;
mod op;

pub use group::GroupApplyReport;
pub use op::ControlOp;

pub(crate) use group::members_by_bridge;

use crate::capabilities::Capabilities;
use crate::controller::{BridgeController, StatePatch};
use crate::error::{ControlError, Error, Result, StoreError};
use crate::event::{EventBus, HubEvent};
use crate::model::DeviceDetails;
use crate::state::StateChange;
use crate::store::Store;
use crate::types::{BrightnessLevel, ColorTemperature, DeviceId, TransitionTime};

/// Drives the lights of one bridge.
#[derive(Debug)]
pub struct LightControl<'a, C> {
    store: &'a Store,
    events: &'a EventBus,
    controller: &'a C,
}

impl<'a, C: BridgeController> LightControl<'a, C> {
    /// Creates a facade over the bridge the lights belong to.
    #[must_use]
    pub fn new(store: &'a Store, events: &'a EventBus, controller: &'a C) -> Self {
        Self {
            store,
            events,
            controller,
        }
    }

    /// Switches a light on.
    ///
    /// # Errors
    ///
    /// Returns error if the light is unknown, the bridge cannot be reached
    /// or the bridge reports an error.
    pub async fn turn_on(
        &self,
        light: DeviceId,
        transition: Option<TransitionTime>,
    ) -> Result<Vec<StateChange>> {
        self.send(light, &StatePatch::power(true).with_transition(transition))
            .await
    }

    /// Switches a light off.
    ///
    /// # Errors
    ///
    /// Returns error if the light is unknown, the bridge cannot be reached
    /// or the bridge reports an error.
    pub async fn turn_off(
        &self,
        light: DeviceId,
        transition: Option<TransitionTime>,
    ) -> Result<Vec<StateChange>> {
        self.send(light, &StatePatch::power(false).with_transition(transition))
            .await
    }

    /// Sets a light's brightness.
    ///
    /// # Errors
    ///
    /// Returns `Error::Value` for a percentage above 100 and
    /// `Error::CapabilityNotSupported` for lights without dimming.
    pub async fn set_brightness(
        &self,
        light: DeviceId,
        level: BrightnessLevel,
        transition: Option<TransitionTime>,
    ) -> Result<Vec<StateChange>> {
        let patch = StatePatch::brightness(level.resolve()?).with_transition(transition);
        self.send(light, &patch).await
    }

    /// Sets a light's color temperature.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityNotSupported` for lights without tunable
    /// white.
    pub async fn set_color_temperature(
        &self,
        light: DeviceId,
        ct: ColorTemperature,
        transition: Option<TransitionTime>,
    ) -> Result<Vec<StateChange>> {
        let patch = StatePatch::color_temperature(ct).with_transition(transition);
        self.send(light, &patch).await
    }

    /// Runs a light operation.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityNotSupported` for operations that do not
    /// address a light, otherwise as [`send`](Self::send).
    pub async fn run(&self, light: DeviceId, op: ControlOp) -> Result<Vec<StateChange>> {
        let Some(patch) = op.patch()? else {
            return Err(Error::CapabilityNotSupported);
        };
        self.send(light, &patch).await
    }

    /// Sends a patch to a light and records the confirmed changes.
    ///
    /// Returns the changes that altered the local record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DeviceNotFound` or
    /// `StoreError::WrongSpecialization` if `light` is not a known light,
    /// `Error::CapabilityNotSupported` if the light cannot honour the patch,
    /// `Error::Protocol` if the bridge cannot be reached and
    /// `Error::Control` if the bridge reports an error.
    pub async fn send(&self, light: DeviceId, patch: &StatePatch) -> Result<Vec<StateChange>> {
        let device = self
            .store
            .device(light)
            .ok_or(StoreError::DeviceNotFound(light))?;
        let Some(state) = device.as_light() else {
            return Err(StoreError::WrongSpecialization {
                device: light,
                expected: "light",
            }
            .into());
        };
        check_capabilities(state.capabilities(), patch)?;

        let index = state.controller.index;
        let results = self.controller.set_light_state(index, patch).await?;
        if !results.is_success() {
            let error = ControlError {
                target: format!("light {index}"),
                errors: results.errors(),
            };
            tracing::warn!(device = %light, error = %error, "Bridge refused light command");
            return Err(error.into());
        }

        tracing::debug!(device = %light, index, "Light command confirmed");
        Ok(record_changes(self.store, self.events, light, patch.changes()))
    }
}

/// Runs an operation that never reaches a bridge.
///
/// Covers enabling or disabling any record, sensor readings and switching
/// outlets that have no bridge.
///
/// # Errors
///
/// Returns `StoreError::DeviceNotFound` for an unknown device and
/// `Error::CapabilityNotSupported` if the operation needs a bridge.
pub fn apply_local(
    store: &Store,
    events: &EventBus,
    device: DeviceId,
    op: ControlOp,
) -> Result<Vec<StateChange>> {
    let record = store
        .device(device)
        .ok_or(StoreError::DeviceNotFound(device))?;

    let local = match (&op, &record.details) {
        (ControlOp::SetEnabled(_), _)
        | (ControlOp::SetSensorValue(_), DeviceDetails::Sensor(_)) => true,
        (ControlOp::TurnOn { .. } | ControlOp::TurnOff { .. }, DeviceDetails::Outlet(outlet)) => {
            outlet.controller.is_none()
        }
        _ => false,
    };
    let Some(change) = op.local_change().filter(|_| local) else {
        return Err(Error::CapabilityNotSupported);
    };

    Ok(record_changes(store, events, device, vec![change]))
}

/// Applies confirmed changes, publishing the ones that altered the record.
pub(crate) fn record_changes(
    store: &Store,
    events: &EventBus,
    device: DeviceId,
    changes: Vec<StateChange>,
) -> Vec<StateChange> {
    let mut applied = Vec::new();
    for change in changes {
        match store.apply_change(device, &change) {
            Ok(true) => {
                events.publish(HubEvent::state_changed(device, change.clone()));
                applied.push(change);
            }
            Ok(false) => {}
            Err(e) => {
                tracing::debug!(
                    %device,
                    error = %e,
                    "Device vanished before the change was recorded"
                );
                break;
            }
        }
    }
    applied
}

fn check_capabilities(caps: Capabilities, patch: &StatePatch) -> Result<()> {
    let supported = (patch.on.is_none() || caps.on_off)
        && (patch.bri.is_none() || caps.dimming)
        && (patch.ct.is_none() || caps.color_temperature)
        && (patch.xy.is_none() || caps.color);
    if supported {
        Ok(())
    } else {
        Err(Error::CapabilityNotSupported)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::controller::{
        BridgeConfig, Fetched, GroupAttributes, RemoteGroup, RemoteLight, RemoteSensor,
    };
    use crate::model::{ControllerRef, Device, Light, Outlet, VendorTag};
    use crate::protocol::{ApiError, ApiResults, HttpConfig};
    use crate::types::{AccountId, Brightness};

    /// Answers every light command with a fixed result.
    struct ScriptedBridge {
        reply: serde_json::Value,
        calls: AtomicUsize,
    }

    impl ScriptedBridge {
        fn replying(reply: serde_json::Value) -> Self {
            Self {
                reply,
                calls: AtomicUsize::new(0),
            }
        }
    }

    impl BridgeController for ScriptedBridge {
        fn connect(_config: HttpConfig, _token: Option<String>) -> Result<Self> {
            Ok(Self::replying(serde_json::json!([])))
        }

        fn vendor(&self) -> VendorTag {
            VendorTag::hue()
        }

        async fn register(&self, _device_type: &str) -> Result<String> {
            Ok(String::new())
        }

        async fn bridge_config(&self) -> Result<BridgeConfig> {
            Err(Error::CapabilityNotSupported)
        }

        async fn fetch_lights(&self) -> Result<Fetched<RemoteLight>> {
            Ok(Vec::new())
        }

        async fn fetch_sensors(&self) -> Result<Fetched<RemoteSensor>> {
            Ok(Vec::new())
        }

        async fn fetch_groups(&self) -> Result<Fetched<RemoteGroup>> {
            Ok(Vec::new())
        }

        async fn set_light_state(&self, _index: u16, _patch: &StatePatch) -> Result<ApiResults> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(ApiResults::from_value(self.reply.clone())?)
        }

        async fn set_group_action(&self, _index: u16, _patch: &StatePatch) -> Result<ApiResults> {
            Ok(ApiResults::from_value(self.reply.clone())?)
        }

        async fn set_group_attributes(
            &self,
            _index: u16,
            _attributes: &GroupAttributes,
        ) -> Result<ApiResults> {
            Ok(ApiResults::from_value(self.reply.clone())?)
        }
    }

    fn light(store: &Store, light_type: &str) -> DeviceId {
        let mut light = Light::new(ControllerRef::new(DeviceId::new(), 2), "LCT015", "00:17");
        light.light_type = light_type.to_string();
        store.insert_device(Device::new(
            AccountId::new("alice"),
            "Desk",
            "10.0.0.5",
            VendorTag::hue(),
            DeviceDetails::Light(light),
        ))
    }

    #[tokio::test]
    async fn confirmed_command_updates_record() {
        let store = Store::new();
        let events = EventBus::new();
        let id = light(&store, "Extended color light");
        let bridge = ScriptedBridge::replying(serde_json::json!([
            {"success": {"/lights/2/state/bri": 128}}
        ]));
        let control = LightControl::new(&store, &events, &bridge);

        let mut rx = events.subscribe();
        let changes = control
            .set_brightness(id, BrightnessLevel::Percent(50), None)
            .await
            .unwrap();
        assert_eq!(changes, vec![StateChange::Brightness(Brightness::new(128))]);
        assert_eq!(
            store.device(id).unwrap().as_light().unwrap().brightness,
            Brightness::new(128)
        );
        assert!(rx.recv().await.unwrap().is_state_change());
    }

    #[tokio::test]
    async fn refused_command_leaves_record_unchanged() {
        let store = Store::new();
        let events = EventBus::new();
        let id = light(&store, "Extended color light");
        let before = store.device(id).unwrap();
        let bridge = ScriptedBridge::replying(serde_json::json!([
            {"error": {
                "type": 201,
                "address": "/lights/2/state/on",
                "description": "parameter not available"
            }}
        ]));
        let control = LightControl::new(&store, &events, &bridge);

        let err = control.turn_on(id, None).await.unwrap_err();
        let Error::Control(control_error) = err else {
            panic!("expected a control error, got {err:?}");
        };
        assert_eq!(control_error.target, "light 2");
        assert_eq!(
            control_error.errors,
            vec![ApiError::new(201, "/lights/2/state/on", "parameter not available")]
        );
        assert_eq!(store.device(id).unwrap(), before);
        assert!(store.history(id).is_empty());
    }

    #[tokio::test]
    async fn unsupported_command_is_not_sent() {
        let store = Store::new();
        let events = EventBus::new();
        let id = light(&store, "Dimmable light");
        let bridge = ScriptedBridge::replying(serde_json::json!([]));
        let control = LightControl::new(&store, &events, &bridge);

        let result = control
            .set_color_temperature(id, ColorTemperature::new(300).unwrap(), None)
            .await;
        assert!(matches!(result, Err(Error::CapabilityNotSupported)));
        assert_eq!(bridge.calls.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn local_outlet_and_enabled() {
        let store = Store::new();
        let events = EventBus::new();
        let outlet = store.insert_device(Device::new(
            AccountId::new("alice"),
            "Heater",
            "10.0.0.9",
            VendorTag::local(),
            DeviceDetails::Outlet(Outlet::default()),
        ));

        let changes = apply_local(&store, &events, outlet, ControlOp::ON).unwrap();
        assert_eq!(changes, vec![StateChange::Power(true)]);
        assert!(store.device(outlet).unwrap().as_outlet().unwrap().on);

        apply_local(&store, &events, outlet, ControlOp::SetEnabled(false)).unwrap();
        assert!(!store.device(outlet).unwrap().enabled);

        assert!(matches!(
            apply_local(&store, &events, outlet, ControlOp::SetSensorValue(1.0)),
            Err(Error::CapabilityNotSupported)
        ));
    }

    #[test]
    fn lights_are_never_switched_locally() {
        let store = Store::new();
        let events = EventBus::new();
        let id = light(&store, "Extended color light");
        assert!(matches!(
            apply_local(&store, &events, id, ControlOp::ON),
            Err(Error::CapabilityNotSupported)
        ));
    }
}
