// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Bridge inventory import.
//!
//! The [`Importer`] pulls a bridge's lights, sensors and groups through a
//! [`BridgeController`] and merges them into the [`Store`]:
//!
//! - A remote light or sensor is matched against local records by its
//!   import key (owner, vendor, category, model, unique id, controller
//!   reference and name). A match receives the remote state as
//!   [`StateChange`]s; anything else becomes a new record.
//! - A remote group is matched by controller reference. Its light
//!   memberships are rebuilt from the lights already imported for the same
//!   bridge, so members the bridge reports but the store does not know yet
//!   are skipped until the next sync.
//! - A malformed remote entity is reported in [`SyncReport::failures`] and
//!   the rest of the batch carries on.
//!
//! Lights are imported before groups so a single sync completes every
//! membership.

use crate::controller::{BridgeController, RemoteGroup, RemoteLight, RemoteSensor};
use crate::error::{ImportError, Result};
use crate::event::{EventBus, HubEvent};
use crate::model::{
    ControllerRef, Device, DeviceCategory, DeviceDetails, Group, Light, Sensor, VendorTag,
};
use crate::state::StateChange;
use crate::store::{Store, Upsert};
use crate::types::{AccountId, Brightness, ColorMode, ColorTemperature, DeviceId, GroupId};

/// Outcome of a bridge sync.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SyncReport {
    /// Lights inserted or updated.
    pub lights: Vec<DeviceId>,
    /// Sensors inserted or updated.
    pub sensors: Vec<DeviceId>,
    /// Groups inserted or updated.
    pub groups: Vec<GroupId>,
    /// Remote entities that were skipped.
    pub failures: Vec<ImportError>,
}

impl SyncReport {
    /// Returns `true` if every remote entity was imported.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Merges one bridge's inventory into the store.
#[derive(Debug)]
pub struct Importer<'a> {
    store: &'a Store,
    events: &'a EventBus,
    bridge: DeviceId,
    owner: AccountId,
    address: String,
    hardware_address: Option<String>,
}

impl<'a> Importer<'a> {
    /// Creates an importer for the bridge record `bridge`.
    ///
    /// Imported records inherit the bridge's owner and addresses.
    #[must_use]
    pub fn new(store: &'a Store, events: &'a EventBus, bridge: &Device) -> Self {
        Self {
            store,
            events,
            bridge: bridge.id,
            owner: bridge.owner.clone(),
            address: bridge.network_address.clone(),
            hardware_address: bridge.hardware_address.clone(),
        }
    }

    /// Imports lights, sensors and groups, in that order.
    ///
    /// # Errors
    ///
    /// Returns error if a collection cannot be fetched at all. Per-entity
    /// failures are collected in the report instead.
    pub async fn import_all<C: BridgeController>(&self, controller: &C) -> Result<SyncReport> {
        let mut report = SyncReport::default();

        let (lights, failures) = self.import_lights(controller).await?;
        report.lights = lights;
        report.failures.extend(failures);

        let (sensors, failures) = self.import_sensors(controller).await?;
        report.sensors = sensors;
        report.failures.extend(failures);

        let (groups, failures) = self.import_groups(controller).await?;
        report.groups = groups;
        report.failures.extend(failures);

        tracing::info!(
            bridge = %self.bridge,
            lights = report.lights.len(),
            sensors = report.sensors.len(),
            groups = report.groups.len(),
            failures = report.failures.len(),
            "Bridge inventory imported"
        );
        Ok(report)
    }

    /// Imports every light of the bridge.
    ///
    /// # Errors
    ///
    /// Returns error if the light collection cannot be fetched.
    pub async fn import_lights<C: BridgeController>(
        &self,
        controller: &C,
    ) -> Result<(Vec<DeviceId>, Vec<ImportError>)> {
        let vendor = controller.vendor();
        let fetched = controller.fetch_lights().await?;
        Ok(self.collect(fetched, |remote| {
            let (candidate, changes) = self.light_record(&vendor, &remote);
            self.upsert(candidate, &changes)
        }))
    }

    /// Imports every sensor of the bridge.
    ///
    /// # Errors
    ///
    /// Returns error if the sensor collection cannot be fetched.
    pub async fn import_sensors<C: BridgeController>(
        &self,
        controller: &C,
    ) -> Result<(Vec<DeviceId>, Vec<ImportError>)> {
        let vendor = controller.vendor();
        let fetched = controller.fetch_sensors().await?;
        Ok(self.collect(fetched, |remote| {
            let (candidate, changes) = self.sensor_record(&vendor, remote);
            self.upsert(candidate, &changes)
        }))
    }

    /// Imports every group of the bridge and rebuilds its light memberships.
    ///
    /// # Errors
    ///
    /// Returns error if the group collection cannot be fetched.
    pub async fn import_groups<C: BridgeController>(
        &self,
        controller: &C,
    ) -> Result<(Vec<GroupId>, Vec<ImportError>)> {
        let vendor = controller.vendor();
        let fetched = controller.fetch_groups().await?;
        Ok(self.collect(fetched, |remote| self.upsert_group(&vendor, remote)))
    }

    fn collect<T, R>(
        &self,
        fetched: Vec<std::result::Result<T, ImportError>>,
        mut import: impl FnMut(T) -> R,
    ) -> (Vec<R>, Vec<ImportError>) {
        let mut imported = Vec::new();
        let mut failures = Vec::new();
        for entry in fetched {
            match entry {
                Ok(remote) => imported.push(import(remote)),
                Err(e) => {
                    tracing::warn!(bridge = %self.bridge, error = %e, "Skipping remote entity");
                    failures.push(e);
                }
            }
        }
        (imported, failures)
    }

    fn reference(&self, index: u16) -> ControllerRef {
        ControllerRef::new(self.bridge, index)
    }

    fn device(&self, name: &str, vendor: &VendorTag, details: DeviceDetails) -> Device {
        let device = Device::new(
            self.owner.clone(),
            name,
            self.address.clone(),
            vendor.clone(),
            details,
        );
        match &self.hardware_address {
            Some(mac) => device.with_hardware_address(mac.clone()),
            None => device,
        }
    }

    fn light_record(&self, vendor: &VendorTag, remote: &RemoteLight) -> (Device, Vec<StateChange>) {
        let mut changes = vec![StateChange::Power(remote.on)];
        if let Some(bri) = remote.brightness {
            changes.push(StateChange::Brightness(Brightness::new(bri)));
        }
        if let Some(ct) = remote.ct {
            let clamped = ColorTemperature::clamped(ct);
            if clamped.value() != ct {
                tracing::debug!(index = remote.index, ct, "Clamping reported color temperature");
            }
            changes.push(StateChange::ColorTemperature(clamped));
        } else if let Some(xy) = remote.xy {
            changes.push(StateChange::ColorXy(xy));
        }
        if let Some(mode) = remote.color_mode.as_deref().and_then(ColorMode::parse) {
            changes.push(StateChange::ColorMode(mode));
        }
        changes.push(StateChange::Alert(remote.alert.clone()));
        changes.push(StateChange::Reachable(remote.reachable));

        let mut light = Light::new(
            self.reference(remote.index),
            remote.model_id.clone(),
            remote.unique_id.clone(),
        );
        light.light_type.clone_from(&remote.light_type);

        let mut candidate = self.device(&remote.name, vendor, DeviceDetails::Light(light));
        for change in &changes {
            change.apply(&mut candidate);
        }
        (candidate, changes)
    }

    fn sensor_record(
        &self,
        vendor: &VendorTag,
        remote: RemoteSensor,
    ) -> (Device, Vec<StateChange>) {
        let changes = vec![
            StateChange::SensorValue(remote.value),
            StateChange::Reachable(remote.reachable),
        ];
        let sensor = Sensor {
            value: remote.value,
            sensor_type: remote.sensor_type,
            reachable: remote.reachable,
            model_id: remote.model_id,
            unique_id: remote.unique_id,
            controller: self.reference(remote.index),
        };
        (
            self.device(&remote.name, vendor, DeviceDetails::Sensor(sensor)),
            changes,
        )
    }

    fn upsert(&self, candidate: Device, changes: &[StateChange]) -> DeviceId {
        let name = candidate.name.clone();
        match self.store.upsert_device(candidate, changes) {
            Upsert::Inserted(id) => {
                tracing::debug!(device = %id, %name, "Imported new device");
                self.events.publish(HubEvent::device_added(id));
                id
            }
            Upsert::Updated { id, changes } => {
                for change in changes {
                    self.events.publish(HubEvent::state_changed(id, change));
                }
                id
            }
        }
    }

    fn upsert_group(&self, vendor: &VendorTag, remote: RemoteGroup) -> GroupId {
        let reference = self.reference(remote.index);
        let members: Vec<DeviceId> = remote
            .lights
            .iter()
            .filter_map(|&index| {
                let found = self
                    .store
                    .find_by_controller(DeviceCategory::Light, self.reference(index));
                if found.is_none() {
                    tracing::debug!(
                        group = remote.index,
                        light = index,
                        "Member light not imported yet"
                    );
                }
                found.map(|light| light.id)
            })
            .collect();

        let fill = |group: &mut Group| {
            group.name.clone_from(&remote.name);
            group.group_type.clone_from(&remote.group_type);
            group.class.clone_from(&remote.class);
            group.all_on = remote.all_on;
            group.any_on = remote.any_on;
            group.action_on = remote.action_on;
            group.clear_lights();
            for &light in &members {
                group.add_light(light);
            }
        };

        if let Some(existing) = self.store.find_group_by_controller(reference)
            && self.store.update_group(existing.id, &fill).is_ok()
        {
            return existing.id;
        }

        let mut group = Group::new(remote.name.clone(), vendor.clone()).with_controller(reference);
        fill(&mut group);
        self.store.insert_group(group)
    }
}
