// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! The hub: one entry point over bridges, devices, groups and rules.

mod config;

pub use config::{DiscoverySettings, HubConfig, ServiceIdentity};

use std::collections::HashMap;
use std::fmt;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{Mutex, RwLock, broadcast, watch};
use tokio::time::MissedTickBehavior;

use crate::control::{ControlOp, GroupApplyReport, LightControl, apply_local, members_by_bridge};
use crate::controller::{BridgeController, HueBridge};
use crate::discovery::discover_addresses;
use crate::error::{Error, ProtocolError, Result, StoreError};
use crate::event::{EventBus, HubEvent};
use crate::import::{Importer, SyncReport};
use crate::model::{
    Action, Bridge, ConnectionKind, Device, DeviceCategory, DeviceDetails, Group, RoomConnection,
    RoomIndex, Rule, Side, VendorTag,
};
use crate::rules::{ActionExecutor, RuleEngine};
use crate::state::StateChange;
use crate::store::{Snapshot, Store};
use crate::types::{ConditionId, DeviceId, GroupId, RuleId};

/// A bridge controller and the lock serializing calls against it.
struct BridgeHandle<C> {
    controller: C,
    lock: Mutex<()>,
}

impl<C> BridgeHandle<C> {
    fn new(controller: C) -> Self {
        Self {
            controller,
            lock: Mutex::new(()),
        }
    }
}

/// Home-automation hub.
///
/// The `Hub` owns the device store, the event bus and the rule engine, and
/// keeps one controller per registered bridge. Calls against the same
/// bridge are serialized; different bridges proceed in parallel.
///
/// Controllers are created lazily from the bridge records, so a hub
/// restored from a snapshot can talk to its bridges without registering
/// again.
///
/// # Examples
///
/// ```no_run
/// use homelink::control::ControlOp;
/// use homelink::hub::{Hub, HubConfig, ServiceIdentity};
///
/// #[tokio::main]
/// async fn main() -> homelink::Result<()> {
///     let hub: Hub = Hub::new(HubConfig::new(ServiceIdentity::new("alice")));
///
///     let mut events = hub.subscribe();
///     tokio::spawn(async move {
///         while let Ok(event) = events.recv().await {
///             println!("{event:?}");
///         }
///     });
///
///     for address in hub.discover_bridges().await? {
///         // The bridge's link button must have been pressed
///         let bridge = hub.register_bridge(&address).await?;
///         let report = hub.sync_bridge(bridge).await?;
///
///         for light in report.lights {
///             hub.control_device(light, ControlOp::ON).await?;
///         }
///     }
///
///     hub.evaluate_rules().await;
///     Ok(())
/// }
/// ```
pub struct Hub<C = HueBridge> {
    config: HubConfig,
    store: Store,
    events: EventBus,
    rules: RuleEngine,
    bridges: Arc<RwLock<HashMap<DeviceId, Arc<BridgeHandle<C>>>>>,
}

impl<C> fmt::Debug for Hub<C> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hub")
            .field("config", &self.config)
            .field("devices", &self.store.device_count())
            .finish_non_exhaustive()
    }
}

impl<C: BridgeController> Hub<C> {
    /// Creates a hub with an empty store.
    #[must_use]
    pub fn new(config: HubConfig) -> Self {
        Self::with_store(config.clone(), Store::with_history_capacity(config.history_capacity))
    }

    /// Creates a hub over an existing store.
    #[must_use]
    pub fn with_store(config: HubConfig, store: Store) -> Self {
        let events = EventBus::new();
        Self {
            rules: RuleEngine::new(store.clone(), events.clone()),
            config,
            store,
            events,
            bridges: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Creates a hub and restores the configured snapshot, if the file
    /// exists.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Format` if the snapshot
    /// exists but cannot be read.
    pub async fn open(config: HubConfig) -> Result<Self> {
        let hub = Self::new(config);
        if let Some(path) = hub.config.snapshot_path.clone()
            && tokio::fs::try_exists(&path).await.map_err(StoreError::Io)?
        {
            hub.load_snapshot(&path).await?;
        }
        Ok(hub)
    }

    /// Returns the configuration.
    #[must_use]
    pub fn config(&self) -> &HubConfig {
        &self.config
    }

    /// Returns the device store.
    #[must_use]
    pub fn store(&self) -> &Store {
        &self.store
    }

    // =========================================================================
    // Subscription
    // =========================================================================

    /// Subscribes to hub events.
    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<HubEvent> {
        self.events.subscribe()
    }

    /// Returns the number of active event subscribers.
    #[must_use]
    pub fn subscriber_count(&self) -> usize {
        self.events.subscriber_count()
    }

    // =========================================================================
    // Bridges
    // =========================================================================

    /// Searches the local network for bridges and returns their addresses.
    ///
    /// # Errors
    ///
    /// Returns `ProtocolError::Io` if the discovery socket cannot be used.
    pub async fn discover_bridges(&self) -> Result<Vec<String>> {
        Ok(discover_addresses(&self.config.discovery_options()).await?)
    }

    /// Pairs with the bridge at `address` and returns its record.
    ///
    /// A bridge already registered at the same address keeps its record;
    /// only its token and identity are refreshed. Nothing is stored when
    /// the bridge refuses.
    ///
    /// # Errors
    ///
    /// Returns `Error::Registration` if the bridge refuses (for example
    /// because its link button was not pressed) and `Error::Protocol` if it
    /// cannot be reached.
    pub async fn register_bridge(&self, address: &str) -> Result<DeviceId> {
        let http = self.config.http_config(address);
        let probe = C::connect(http.clone(), None)?;
        let vendor = probe.vendor();

        let token = match probe.register(&self.config.identity.client_id).await {
            Ok(token) => token,
            Err(e) => {
                tracing::warn!(%address, error = %e, "Bridge registration refused");
                return Err(e);
            }
        };

        let (bridge, created) = self.find_or_create_bridge(address, vendor);
        self.store.update_device(bridge, |d| {
            if let Some(record) = d.as_bridge_mut() {
                record.token = Some(token.clone());
            }
        })?;

        let controller = C::connect(http, Some(token))?;
        self.refresh_identity(bridge, &controller).await?;

        self.bridges
            .write()
            .await
            .insert(bridge, Arc::new(BridgeHandle::new(controller)));

        if created {
            self.events.publish(HubEvent::device_added(bridge));
        }
        self.events.publish(HubEvent::BridgeRegistered { bridge });
        tracing::info!(%address, %bridge, created, "Bridge registered");
        Ok(bridge)
    }

    /// Imports a registered bridge's lights, sensors and groups.
    ///
    /// The bridge record's firmware, bridge id and MAC address are re-read
    /// first.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DeviceNotFound` or
    /// `StoreError::WrongSpecialization` if `bridge` is not a bridge record,
    /// `ProtocolError::NotRegistered` if it has no token, and any error
    /// that prevents a whole collection from being fetched.
    pub async fn sync_bridge(&self, bridge: DeviceId) -> Result<SyncReport> {
        let record = self.bridge_record(bridge)?;
        let handle = self.handle(bridge).await?;
        let _guard = handle.lock.lock().await;

        self.refresh_identity(bridge, &handle.controller).await?;
        let report = Importer::new(&self.store, &self.events, &record)
            .import_all(&handle.controller)
            .await?;

        self.events.publish(HubEvent::BridgeSynced {
            bridge,
            lights: report.lights.len(),
            sensors: report.sensors.len(),
            groups: report.groups.len(),
            failures: report.failures.len(),
        });
        Ok(report)
    }

    /// Returns every bridge record.
    #[must_use]
    pub fn bridges(&self) -> Vec<Device> {
        self.store
            .devices()
            .into_iter()
            .filter(|d| d.category() == DeviceCategory::Controller)
            .collect()
    }

    // =========================================================================
    // Device Control
    // =========================================================================

    /// Runs an operation on a device.
    ///
    /// Light operations go through the light's bridge and are recorded once
    /// the bridge confirms them. Everything else is applied locally.
    ///
    /// Returns the changes that altered the device record.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DeviceNotFound` for an unknown device,
    /// `Error::CapabilityNotSupported` if the device cannot perform the
    /// operation, and `Error::Control` or `Error::Protocol` if the bridge
    /// refuses or cannot be reached.
    pub async fn control_device(
        &self,
        device: DeviceId,
        op: ControlOp,
    ) -> Result<Vec<StateChange>> {
        let record = self
            .store
            .device(device)
            .ok_or(StoreError::DeviceNotFound(device))?;
        let bridge = record.as_light().map(|l| l.controller.controller);

        match (bridge, op.patch()?) {
            (Some(bridge), Some(_)) => {
                let handle = self.handle(bridge).await?;
                let _guard = handle.lock.lock().await;
                LightControl::new(&self.store, &self.events, &handle.controller)
                    .run(device, op)
                    .await
            }
            _ => apply_local(&self.store, &self.events, device, op),
        }
    }

    /// Runs a light operation on every light of a group, one request per
    /// light.
    ///
    /// Members are grouped by bridge. A failing member never stops the
    /// others, and confirmed members are not rolled back.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` for an unknown group and
    /// `Error::CapabilityNotSupported` for operations that do not address
    /// lights.
    pub async fn control_group(&self, group: GroupId, op: ControlOp) -> Result<GroupApplyReport> {
        let record = self
            .store
            .group(group)
            .ok_or(StoreError::GroupNotFound(group))?;
        let patch = op.patch()?.ok_or(Error::CapabilityNotSupported)?;

        let mut report = GroupApplyReport::default();
        for (bridge, lights) in members_by_bridge(&self.store, &record) {
            let handle = match self.handle(bridge).await {
                Ok(handle) => handle,
                Err(e) => {
                    tracing::warn!(%group, %bridge, error = %e, "Group member bridge unavailable");
                    let reason = e.to_string();
                    report.failures.extend(lights.into_iter().map(|light| {
                        (
                            light,
                            Error::BridgeUnavailable {
                                bridge,
                                reason: reason.clone(),
                            },
                        )
                    }));
                    continue;
                }
            };
            let _guard = handle.lock.lock().await;
            let control = LightControl::new(&self.store, &self.events, &handle.controller);
            report.merge(control.apply_each(&lights, &patch).await);
        }

        tracing::debug!(
            %group,
            succeeded = report.succeeded.len(),
            failed = report.failures.len(),
            "Group command finished"
        );
        Ok(report)
    }

    /// Sends a light operation to a bridge-managed group in one request.
    ///
    /// Returns the member lights whose record changed.
    ///
    /// # Errors
    ///
    /// Returns `Error::CapabilityNotSupported` for local groups and for
    /// operations that do not address lights, and `Error::Control` if the
    /// bridge refuses.
    pub async fn set_group_action(&self, group: GroupId, op: ControlOp) -> Result<Vec<DeviceId>> {
        let bridge = self.group_bridge(group)?.ok_or(Error::CapabilityNotSupported)?;
        let patch = op.patch()?.ok_or(Error::CapabilityNotSupported)?;

        let handle = self.handle(bridge).await?;
        let _guard = handle.lock.lock().await;
        LightControl::new(&self.store, &self.events, &handle.controller)
            .set_group_action(group, &patch)
            .await
    }

    /// Renames a group, on its bridge first when it has one.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` for an unknown group and
    /// `Error::Control` if the bridge refuses.
    pub async fn rename_group(&self, group: GroupId, name: &str) -> Result<()> {
        let Some(bridge) = self.group_bridge(group)? else {
            self.store.update_group(group, |g| g.name = name.to_string())?;
            tracing::info!(%group, name, "Local group renamed");
            return Ok(());
        };

        let handle = self.handle(bridge).await?;
        let _guard = handle.lock.lock().await;
        LightControl::new(&self.store, &self.events, &handle.controller)
            .rename_group(group, name)
            .await
    }

    // =========================================================================
    // Rooms & Groups
    // =========================================================================

    /// Creates a local group of lights.
    pub fn create_group(&self, name: impl Into<String>, lights: &[DeviceId]) -> GroupId {
        let mut group = Group::new(name, VendorTag::local());
        for &light in lights {
            group.add_light(light);
        }
        self.store.insert_group(group)
    }

    /// Creates a room.
    pub fn add_room(&self, name: impl Into<String>, room_type: impl Into<String>) -> RoomIndex {
        self.store.add_room(name, room_type)
    }

    /// Connects two rooms.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RoomNotFound` for unknown rooms and
    /// `StoreError::SelfConnection` if both are the same room.
    pub fn connect_rooms(
        &self,
        from: RoomIndex,
        to: RoomIndex,
        kind: ConnectionKind,
        side: Side,
    ) -> Result<RoomConnection> {
        Ok(self.store.connect_rooms(from, to, kind, side)?)
    }

    // =========================================================================
    // Rules
    // =========================================================================

    /// Stores a rule.
    pub fn add_rule(&self, rule: Rule) -> RuleId {
        self.store.insert_rule(rule)
    }

    /// Enables or disables a rule.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` if the id is unknown.
    pub fn set_rule_enabled(&self, rule: RuleId, enabled: bool) -> Result<()> {
        Ok(self.store.set_rule_enabled(rule, enabled)?)
    }

    /// Enables or disables one condition of a rule.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` or `StoreError::ConditionNotFound`.
    pub fn set_condition_enabled(
        &self,
        rule: RuleId,
        condition: ConditionId,
        enabled: bool,
    ) -> Result<()> {
        Ok(self.store.set_condition_enabled(rule, condition, enabled)?)
    }

    /// Clears a latched rule so it can fire again.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` if the id is unknown.
    pub fn reset_rule(&self, rule: RuleId) -> Result<()> {
        Ok(self.rules.reset_rule(rule)?)
    }

    /// Runs one rule sweep and returns the rules that fired.
    pub async fn evaluate_rules(&self) -> Vec<RuleId> {
        self.rules.evaluate(self).await
    }

    /// Sweeps the rules every `period` until `shutdown` becomes `true` or
    /// its sender is dropped.
    pub async fn run_rule_sweeps(&self, period: Duration, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(period);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        tracing::info!(period_ms = period.as_millis(), "Rule sweeps started");

        while !*shutdown.borrow() {
            tokio::select! {
                _ = ticker.tick() => {
                    let fired = self.evaluate_rules().await;
                    if !fired.is_empty() {
                        tracing::debug!(fired = fired.len(), "Rule sweep finished");
                    }
                }
                changed = shutdown.changed() => {
                    if changed.is_err() {
                        break;
                    }
                }
            }
        }

        tracing::info!("Rule sweeps stopped");
    }

    // =========================================================================
    // Persistence
    // =========================================================================

    /// Writes the store to `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Format` on failure.
    pub async fn save_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        Ok(self.store.snapshot().save(path).await?)
    }

    /// Replaces the store's contents with the snapshot at `path`.
    ///
    /// Bridge controllers are rebuilt from the restored records on next use.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` or `StoreError::Format` on failure.
    pub async fn load_snapshot(&self, path: impl AsRef<Path>) -> Result<()> {
        let snapshot = Snapshot::load(path).await?;
        self.store.restore(snapshot);
        self.bridges.write().await.clear();
        Ok(())
    }

    /// Writes the store to the configured snapshot path, if any.
    ///
    /// # Errors
    ///
    /// As [`save_snapshot`](Self::save_snapshot).
    pub async fn persist(&self) -> Result<()> {
        match &self.config.snapshot_path {
            Some(path) => self.save_snapshot(path).await,
            None => {
                tracing::debug!("No snapshot path configured");
                Ok(())
            }
        }
    }

    // =========================================================================
    // Internals
    // =========================================================================

    /// Copies the bridge's reported identity onto its record.
    ///
    /// A bridge that cannot report its config keeps the previous values.
    async fn refresh_identity(&self, bridge: DeviceId, controller: &C) -> Result<()> {
        let identity = match controller.bridge_config().await {
            Ok(identity) => identity,
            Err(e) => {
                tracing::warn!(%bridge, error = %e, "Could not read bridge identity");
                return Ok(());
            }
        };
        self.store.update_device(bridge, |d| {
            d.hardware_address = Some(identity.mac_address);
            if let Some(record) = d.as_bridge_mut() {
                record.bridge_id = Some(identity.bridge_id);
                record.firmware_version = Some(identity.firmware_version);
            }
        })?;
        Ok(())
    }

    fn find_or_create_bridge(&self, address: &str, vendor: VendorTag) -> (DeviceId, bool) {
        if let Some(existing) = self.store.find_bridge(address, &vendor) {
            return (existing.id, false);
        }
        let record = Device::new(
            self.config.identity.account.clone(),
            format!("Bridge {address}"),
            address,
            vendor,
            DeviceDetails::Bridge(Bridge::default()),
        );
        (self.store.insert_device(record), true)
    }

    fn bridge_record(&self, bridge: DeviceId) -> Result<Device> {
        let record = self
            .store
            .device(bridge)
            .ok_or(StoreError::DeviceNotFound(bridge))?;
        if record.as_bridge().is_none() {
            return Err(StoreError::WrongSpecialization {
                device: bridge,
                expected: "bridge",
            }
            .into());
        }
        Ok(record)
    }

    fn group_bridge(&self, group: GroupId) -> Result<Option<DeviceId>> {
        let record = self
            .store
            .group(group)
            .ok_or(StoreError::GroupNotFound(group))?;
        Ok(record.controller.map(|reference| reference.controller))
    }

    async fn handle(&self, bridge: DeviceId) -> Result<Arc<BridgeHandle<C>>> {
        if let Some(handle) = self.bridges.read().await.get(&bridge) {
            return Ok(Arc::clone(handle));
        }

        let record = self.bridge_record(bridge)?;
        let token = record
            .as_bridge()
            .and_then(|b| b.token.clone())
            .ok_or(ProtocolError::NotRegistered)?;
        let controller = C::connect(self.config.http_config(&record.network_address), Some(token))?;

        let mut bridges = self.bridges.write().await;
        let handle = bridges
            .entry(bridge)
            .or_insert_with(|| Arc::new(BridgeHandle::new(controller)));
        Ok(Arc::clone(handle))
    }
}

impl<C: BridgeController> ActionExecutor for Hub<C> {
    async fn execute(&self, action: &Action) -> Result<()> {
        let device = self
            .store
            .device(action.device)
            .ok_or(StoreError::DeviceNotFound(action.device))?;
        let op = ControlOp::from_action(&device, action.attribute, action.parsed_value()?)?;
        self.control_device(action.device, op).await?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{
        Condition, ControllerRef, Light, Operator, Outlet, Relation, Sensor, StateAttribute,
    };
    use crate::types::AccountId;

    fn hub() -> Hub {
        Hub::new(HubConfig::new(ServiceIdentity::new("alice")))
    }

    fn outlet(hub: &Hub) -> DeviceId {
        hub.store().insert_device(Device::new(
            AccountId::new("alice"),
            "Kettle",
            "10.0.0.40",
            VendorTag::local(),
            DeviceDetails::Outlet(Outlet::default()),
        ))
    }

    fn sensor(hub: &Hub, value: f64) -> DeviceId {
        hub.store().insert_device(Device::new(
            AccountId::new("alice"),
            "Presence",
            "10.0.0.5",
            VendorTag::hue(),
            DeviceDetails::Sensor(Sensor {
                value,
                sensor_type: "CLIPGenericStatus".to_string(),
                reachable: true,
                model_id: "m".to_string(),
                unique_id: None,
                controller: ControllerRef::new(DeviceId::new(), 3),
            }),
        ))
    }

    #[tokio::test]
    async fn local_outlet_control() {
        let hub = hub();
        let kettle = outlet(&hub);
        let mut events = hub.subscribe();

        let changes = hub.control_device(kettle, ControlOp::ON).await.unwrap();
        assert_eq!(changes, vec![StateChange::Power(true)]);
        assert!(hub.store().device(kettle).unwrap().as_outlet().unwrap().on);
        assert_eq!(
            events.recv().await.unwrap(),
            HubEvent::state_changed(kettle, StateChange::Power(true))
        );

        // Already on: nothing changes
        assert!(
            hub.control_device(kettle, ControlOp::ON)
                .await
                .unwrap()
                .is_empty()
        );
    }

    #[tokio::test]
    async fn unknown_device_and_bridge() {
        let hub = hub();
        let missing = DeviceId::new();
        assert!(matches!(
            hub.control_device(missing, ControlOp::ON).await,
            Err(Error::Store(StoreError::DeviceNotFound(_)))
        ));

        let kettle = outlet(&hub);
        assert!(matches!(
            hub.sync_bridge(kettle).await,
            Err(Error::Store(StoreError::WrongSpecialization {
                expected: "bridge",
                ..
            }))
        ));
    }

    #[tokio::test]
    async fn light_without_registered_bridge() {
        let hub = hub();
        let bridge = hub.store().insert_device(Device::new(
            AccountId::new("alice"),
            "Bridge",
            "10.0.0.5",
            VendorTag::hue(),
            DeviceDetails::Bridge(Bridge::default()),
        ));
        let lamp = hub.store().insert_device(Device::new(
            AccountId::new("alice"),
            "Lamp",
            "10.0.0.5",
            VendorTag::hue(),
            DeviceDetails::Light(Light::new(ControllerRef::new(bridge, 1), "LCT001", "u1")),
        ));

        assert!(matches!(
            hub.control_device(lamp, ControlOp::ON).await,
            Err(Error::Protocol(ProtocolError::NotRegistered))
        ));

        // Enabling never needs the bridge
        let changes = hub
            .control_device(lamp, ControlOp::SetEnabled(false))
            .await
            .unwrap();
        assert_eq!(changes, vec![StateChange::Enabled(false)]);

        let group = hub.create_group("Desk", &[lamp]);
        let report = hub.control_group(group, ControlOp::OFF).await.unwrap();
        assert!(report.succeeded.is_empty());
        assert!(matches!(
            report.failures.as_slice(),
            [(light, Error::BridgeUnavailable { .. })] if *light == lamp
        ));
    }

    #[tokio::test]
    async fn rule_actions_run_locally() {
        let hub = hub();
        let presence = sensor(&hub, 1.0);
        let kettle = outlet(&hub);
        let rule = hub.add_rule(
            Rule::new("Kettle on arrival", Relation::All)
                .with_recycle(false)
                .with_condition(Condition::new(
                    presence,
                    StateAttribute::State,
                    Operator::Eq,
                    1.0,
                ))
                .with_action(Action::new(kettle, StateAttribute::State, "on")),
        );

        assert_eq!(hub.evaluate_rules().await, vec![rule]);
        assert!(hub.store().device(kettle).unwrap().as_outlet().unwrap().on);

        // Latched until reset
        assert!(hub.evaluate_rules().await.is_empty());
        hub.reset_rule(rule).unwrap();
        assert_eq!(hub.evaluate_rules().await, vec![rule]);
    }

    #[tokio::test]
    async fn local_group_rename() {
        let hub = hub();
        let group = hub.create_group("Desk", &[]);
        hub.rename_group(group, "Office").await.unwrap();
        assert_eq!(hub.store().group(group).unwrap().name, "Office");

        assert!(matches!(
            hub.set_group_action(group, ControlOp::ON).await,
            Err(Error::CapabilityNotSupported)
        ));
    }

    #[tokio::test]
    async fn snapshot_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("hub.json");
        let config = HubConfig::new(ServiceIdentity::new("alice")).with_snapshot_path(&path);

        let hub: Hub = Hub::new(config.clone());
        let kettle = outlet(&hub);
        hub.add_room("Kitchen", "kitchen");
        hub.persist().await.unwrap();

        let restored: Hub = Hub::open(config).await.unwrap();
        assert!(restored.store().device(kettle).is_some());
        assert_eq!(restored.store().rooms().len(), 1);
    }

    #[tokio::test]
    async fn open_without_snapshot_file() {
        let dir = tempfile::tempdir().unwrap();
        let config = HubConfig::default().with_snapshot_path(dir.path().join("absent.json"));
        let hub: Hub = Hub::open(config).await.unwrap();
        assert_eq!(hub.store().device_count(), 0);
    }

    #[tokio::test]
    async fn sweeps_stop_on_shutdown() {
        let hub = hub();
        let (tx, rx) = watch::channel(false);
        let presence = sensor(&hub, 1.0);
        let rule = hub.add_rule(
            Rule::new("Count", Relation::Any)
                .with_recycle(true)
                .with_condition(Condition::new(presence, StateAttribute::State, Operator::Gt, 0.0)),
        );

        let sweeps = hub.run_rule_sweeps(Duration::from_millis(10), rx);
        let stop = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            tx.send(true).unwrap();
        };
        tokio::join!(sweeps, stop);

        assert!(hub.store().rule(rule).unwrap().last_triggered.is_some());
    }
}
