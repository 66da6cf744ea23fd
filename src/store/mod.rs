// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! In-memory record store.
//!
//! The [`Store`] holds every device, group, room and rule the hub knows
//! about. It is cheap to clone; clones share the same records. Each call
//! takes the lock once, so single-record reads and writes are atomic, and
//! the lock is never held across an `.await`.
//!
//! # Examples
//!
//! ```
//! use homelink::model::{Device, DeviceDetails, Outlet, VendorTag};
//! use homelink::state::StateChange;
//! use homelink::store::Store;
//! use homelink::types::AccountId;
//!
//! let store = Store::new();
//! let id = store.insert_device(Device::new(
//!     AccountId::new("alice"),
//!     "Kettle",
//!     "10.0.0.40",
//!     VendorTag::local(),
//!     DeviceDetails::Outlet(Outlet::default()),
//! ));
//!
//! assert!(store.apply_change(id, &StateChange::Power(true)).unwrap());
//! assert_eq!(store.history(id).len(), 1);
//! ```

mod snapshot;

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

use parking_lot::RwLock;

use crate::error::StoreError;
use crate::model::{
    Action, Condition, ConnectionKind, ControllerRef, Device, DeviceCategory, DeviceDetails,
    Group, ReconcileKey, Room, RoomConnection, RoomGraph, RoomIndex, Rule, Side, VendorTag,
};
use crate::state::{HistoryEntry, StateChange};
use crate::types::{AccountId, ActionId, ConditionId, DeviceId, GroupId, RuleId};

pub use snapshot::Snapshot;

/// Default number of history entries kept per device.
pub const DEFAULT_HISTORY_CAPACITY: usize = 100;

#[derive(Debug, Default)]
struct StoreData {
    devices: HashMap<DeviceId, Device>,
    groups: HashMap<GroupId, Group>,
    rooms: RoomGraph,
    rules: HashMap<RuleId, Rule>,
    history: HashMap<DeviceId, VecDeque<HistoryEntry>>,
}

impl StoreData {
    fn device_mut(&mut self, id: DeviceId) -> Result<&mut Device, StoreError> {
        self.devices
            .get_mut(&id)
            .ok_or(StoreError::DeviceNotFound(id))
    }

    /// Finds the record its controller knows by the same index as `candidate`.
    fn same_entity(&self, candidate: &Device) -> Option<DeviceId> {
        let controller = candidate.controller()?;
        self.devices
            .values()
            .filter(|d| {
                d.owner == candidate.owner
                    && d.vendor == candidate.vendor
                    && d.category() == candidate.category()
                    && d.controller() == Some(controller)
            })
            .min_by_key(|d| d.created)
            .map(|d| d.id)
    }

    fn rule_mut(&mut self, id: RuleId) -> Result<&mut Rule, StoreError> {
        self.rules.get_mut(&id).ok_or(StoreError::RuleNotFound(id))
    }

    fn record(&mut self, id: DeviceId, change: StateChange, capacity: usize) {
        if capacity == 0 {
            return;
        }
        let ring = self.history.entry(id).or_default();
        while ring.len() >= capacity {
            ring.pop_front();
        }
        ring.push_back(HistoryEntry::now(change));
    }
}

/// Outcome of [`Store::upsert_device`].
#[derive(Debug, Clone, PartialEq)]
pub enum Upsert {
    /// No record matched; the candidate was inserted.
    Inserted(DeviceId),
    /// An existing record was updated.
    Updated {
        /// The matched record.
        id: DeviceId,
        /// Changes that actually modified it.
        changes: Vec<StateChange>,
    },
}

impl Upsert {
    /// Returns the id of the inserted or updated record.
    #[must_use]
    pub fn id(&self) -> DeviceId {
        match self {
            Self::Inserted(id) | Self::Updated { id, .. } => *id,
        }
    }

    /// Returns `true` if a new record was created.
    #[must_use]
    pub fn is_inserted(&self) -> bool {
        matches!(self, Self::Inserted(_))
    }
}

/// Shared in-memory store.
#[derive(Debug, Clone)]
pub struct Store {
    data: Arc<RwLock<StoreData>>,
    history_capacity: usize,
}

impl Default for Store {
    fn default() -> Self {
        Self::new()
    }
}

impl Store {
    /// Creates an empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::with_history_capacity(DEFAULT_HISTORY_CAPACITY)
    }

    /// Creates an empty store keeping at most `capacity` history entries
    /// per device. Zero disables history.
    #[must_use]
    pub fn with_history_capacity(capacity: usize) -> Self {
        Self {
            data: Arc::new(RwLock::new(StoreData::default())),
            history_capacity: capacity,
        }
    }

    /// Returns the per-device history capacity.
    #[must_use]
    pub fn history_capacity(&self) -> usize {
        self.history_capacity
    }

    // ========================================================================
    // Devices
    // ========================================================================

    /// Inserts a device record and returns its id.
    pub fn insert_device(&self, device: Device) -> DeviceId {
        let id = device.id;
        self.data.write().devices.insert(id, device);
        tracing::debug!(device = %id, "Device inserted");
        id
    }

    /// Returns a copy of a device record.
    #[must_use]
    pub fn device(&self, id: DeviceId) -> Option<Device> {
        self.data.read().devices.get(&id).cloned()
    }

    /// Returns every device record, oldest first.
    #[must_use]
    pub fn devices(&self) -> Vec<Device> {
        let mut devices: Vec<_> = self.data.read().devices.values().cloned().collect();
        devices.sort_by_key(|d| d.created);
        devices
    }

    /// Returns the number of device records.
    #[must_use]
    pub fn device_count(&self) -> usize {
        self.data.read().devices.len()
    }

    /// Runs `f` on a device record and marks it updated.
    ///
    /// Changes made this way are not recorded in the history; use
    /// [`apply_change`](Self::apply_change) for state updates.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DeviceNotFound` if the id is unknown.
    pub fn update_device<R>(
        &self,
        id: DeviceId,
        f: impl FnOnce(&mut Device) -> R,
    ) -> Result<R, StoreError> {
        let mut data = self.data.write();
        let device = data.device_mut(id)?;
        let result = f(device);
        device.touch();
        Ok(result)
    }

    /// Applies a state change to a device.
    ///
    /// Returns `true` if the record changed, in which case the change is
    /// appended to the device's history.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DeviceNotFound` if the id is unknown.
    pub fn apply_change(&self, id: DeviceId, change: &StateChange) -> Result<bool, StoreError> {
        let mut data = self.data.write();
        let device = data.device_mut(id)?;
        if !change.apply(device) {
            return Ok(false);
        }
        device.touch();
        data.record(id, change.clone(), self.history_capacity);
        Ok(true)
    }

    /// Removes a device along with every group membership, rule condition
    /// and rule action that refers to it.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::DeviceNotFound` if the id is unknown.
    pub fn remove_device(&self, id: DeviceId) -> Result<Device, StoreError> {
        let mut data = self.data.write();
        let device = data
            .devices
            .remove(&id)
            .ok_or(StoreError::DeviceNotFound(id))?;
        for group in data.groups.values_mut() {
            group.forget(id);
        }
        for rule in data.rules.values_mut() {
            rule.forget_device(id);
        }
        data.history.remove(&id);
        tracing::debug!(device = %id, "Device removed");
        Ok(device)
    }

    /// Returns the enabled devices of an account at a network address.
    #[must_use]
    pub fn find_by_address(&self, owner: &AccountId, address: &str) -> Vec<Device> {
        let mut found: Vec<_> = self
            .data
            .read()
            .devices
            .values()
            .filter(|d| d.enabled && &d.owner == owner && d.network_address == address)
            .cloned()
            .collect();
        found.sort_by_key(|d| d.created);
        found
    }

    /// Returns the bridge record registered at an address for a vendor.
    #[must_use]
    pub fn find_bridge(&self, address: &str, vendor: &VendorTag) -> Option<Device> {
        self.data
            .read()
            .devices
            .values()
            .filter(|d| {
                matches!(d.details, DeviceDetails::Bridge(_))
                    && &d.vendor == vendor
                    && d.network_address == address
            })
            .min_by_key(|d| d.created)
            .cloned()
    }

    /// Returns the device of a category a controller knows by `reference`.
    #[must_use]
    pub fn find_by_controller(
        &self,
        category: DeviceCategory,
        reference: ControllerRef,
    ) -> Option<Device> {
        self.data
            .read()
            .devices
            .values()
            .filter(|d| d.category() == category && d.controller() == Some(reference))
            .min_by_key(|d| d.created)
            .cloned()
    }

    /// Returns the device matching an import key.
    #[must_use]
    pub fn find_by_key(&self, key: &ReconcileKey) -> Option<Device> {
        self.data
            .read()
            .devices
            .values()
            .find(|d| d.reconcile_key().as_ref() == Some(key))
            .cloned()
    }

    /// Inserts `candidate` unless a record with the same import key exists,
    /// in which case `changes` are applied to that record instead.
    ///
    /// A record the same controller knows by the same index is the same
    /// entity under a new name: it is renamed in place rather than
    /// duplicated.
    ///
    /// Lookup and write happen under one lock, so concurrent upserts of the
    /// same entity never create duplicates.
    pub fn upsert_device(&self, candidate: Device, changes: &[StateChange]) -> Upsert {
        let mut data = self.data.write();

        let existing = candidate.reconcile_key().and_then(|key| {
            data.devices
                .values()
                .find(|d| d.reconcile_key().as_ref() == Some(&key))
                .map(|d| d.id)
        });
        let renamed = existing
            .is_none()
            .then(|| data.same_entity(&candidate))
            .flatten();

        let Some(id) = existing.or(renamed) else {
            let id = candidate.id;
            data.devices.insert(id, candidate);
            return Upsert::Inserted(id);
        };

        let mut applied = Vec::new();
        if let Some(device) = data.devices.get_mut(&id) {
            if renamed.is_some() {
                tracing::debug!(
                    device = %id,
                    from = %device.name,
                    to = %candidate.name,
                    "Device renamed by its controller"
                );
                device.name = candidate.name;
                device.touch();
            }
            for change in changes {
                if change.apply(device) {
                    applied.push(change.clone());
                }
            }
            if !applied.is_empty() {
                device.touch();
            }
        }
        for change in &applied {
            data.record(id, change.clone(), self.history_capacity);
        }
        Upsert::Updated {
            id,
            changes: applied,
        }
    }

    /// Returns a device's history, oldest first.
    #[must_use]
    pub fn history(&self, id: DeviceId) -> Vec<HistoryEntry> {
        self.data
            .read()
            .history
            .get(&id)
            .map(|ring| ring.iter().cloned().collect())
            .unwrap_or_default()
    }

    // ========================================================================
    // Groups
    // ========================================================================

    /// Inserts a group and returns its id.
    pub fn insert_group(&self, group: Group) -> GroupId {
        let id = group.id;
        self.data.write().groups.insert(id, group);
        id
    }

    /// Returns a copy of a group.
    #[must_use]
    pub fn group(&self, id: GroupId) -> Option<Group> {
        self.data.read().groups.get(&id).cloned()
    }

    /// Returns every group, sorted by name.
    #[must_use]
    pub fn groups(&self) -> Vec<Group> {
        let mut groups: Vec<_> = self.data.read().groups.values().cloned().collect();
        groups.sort_by(|a, b| a.name.cmp(&b.name));
        groups
    }

    /// Runs `f` on a group.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` if the id is unknown.
    pub fn update_group<R>(
        &self,
        id: GroupId,
        f: impl FnOnce(&mut Group) -> R,
    ) -> Result<R, StoreError> {
        let mut data = self.data.write();
        let group = data
            .groups
            .get_mut(&id)
            .ok_or(StoreError::GroupNotFound(id))?;
        Ok(f(group))
    }

    /// Removes a group, and the room it backs if any.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` if the id is unknown.
    pub fn remove_group(&self, id: GroupId) -> Result<Group, StoreError> {
        let mut data = self.data.write();
        let group = data
            .groups
            .remove(&id)
            .ok_or(StoreError::GroupNotFound(id))?;
        let backed: Vec<_> = data
            .rooms
            .rooms()
            .filter(|(_, room)| room.group == id)
            .map(|(index, _)| index)
            .collect();
        for index in backed {
            data.rooms.remove_room(index);
        }
        Ok(group)
    }

    /// Returns the group a controller knows by `reference`.
    #[must_use]
    pub fn find_group_by_controller(&self, reference: ControllerRef) -> Option<Group> {
        self.data
            .read()
            .groups
            .values()
            .find(|g| g.controller == Some(reference))
            .cloned()
    }

    /// Adds a device to a group. Lights become light members, everything
    /// else a generic member.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` or `StoreError::DeviceNotFound`
    /// if either id is unknown.
    pub fn add_group_member(&self, group: GroupId, device: DeviceId) -> Result<(), StoreError> {
        let mut data = self.data.write();
        let is_light = data
            .devices
            .get(&device)
            .ok_or(StoreError::DeviceNotFound(device))?
            .as_light()
            .is_some();
        let group = data
            .groups
            .get_mut(&group)
            .ok_or(StoreError::GroupNotFound(group))?;
        if is_light {
            group.add_light(device);
        } else {
            group.add_device(device);
        }
        Ok(())
    }

    /// Removes a device from a group. Returns `true` if it was a member.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` if the group is unknown.
    pub fn remove_group_member(
        &self,
        group: GroupId,
        device: DeviceId,
    ) -> Result<bool, StoreError> {
        self.update_group(group, |g| {
            let light = g.remove_light(device);
            g.remove_device(device) || light
        })
    }

    // ========================================================================
    // Rooms
    // ========================================================================

    /// Creates a room together with the local group holding its devices.
    pub fn add_room(&self, name: impl Into<String>, room_type: impl Into<String>) -> RoomIndex {
        let name = name.into();
        let mut group = Group::new(name.clone(), VendorTag::local());
        group.group_type = "Room".to_string();

        let mut data = self.data.write();
        let group_id = group.id;
        data.groups.insert(group_id, group);
        data.rooms.add_room(Room::new(name, room_type, group_id))
    }

    /// Returns a copy of a room.
    #[must_use]
    pub fn room(&self, index: RoomIndex) -> Option<Room> {
        self.data.read().rooms.room(index).cloned()
    }

    /// Returns every room with its index.
    #[must_use]
    pub fn rooms(&self) -> Vec<(RoomIndex, Room)> {
        self.data
            .read()
            .rooms
            .rooms()
            .map(|(index, room)| (index, room.clone()))
            .collect()
    }

    /// Runs `f` on a room.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RoomNotFound` if the index is unknown.
    pub fn update_room<R>(
        &self,
        index: RoomIndex,
        f: impl FnOnce(&mut Room) -> R,
    ) -> Result<R, StoreError> {
        let mut data = self.data.write();
        let room = data
            .rooms
            .room_mut(index)
            .ok_or(StoreError::RoomNotFound(index.get()))?;
        Ok(f(room))
    }

    /// Removes a room, its connections and its backing group.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RoomNotFound` if the index is unknown.
    pub fn remove_room(&self, index: RoomIndex) -> Result<Room, StoreError> {
        let mut data = self.data.write();
        let room = data
            .rooms
            .remove_room(index)
            .ok_or(StoreError::RoomNotFound(index.get()))?;
        data.groups.remove(&room.group);
        Ok(room)
    }

    /// Connects two rooms in both directions.
    ///
    /// # Errors
    ///
    /// See [`RoomGraph::add_connection`].
    pub fn connect_rooms(
        &self,
        from: RoomIndex,
        to: RoomIndex,
        kind: ConnectionKind,
        side: Side,
    ) -> Result<RoomConnection, StoreError> {
        self.data.write().rooms.add_connection(from, to, kind, side)
    }

    /// Removes the connection between two rooms in both directions.
    pub fn disconnect_rooms(&self, a: RoomIndex, b: RoomIndex) -> usize {
        self.data.write().rooms.remove_connection(a, b)
    }

    /// Returns the connections leaving a room.
    #[must_use]
    pub fn room_connections(&self, room: RoomIndex) -> Vec<RoomConnection> {
        self.data.read().rooms.connections(room)
    }

    /// Returns the connections leaving a room on one side.
    #[must_use]
    pub fn room_connections_on(&self, room: RoomIndex, side: Side) -> Vec<RoomConnection> {
        self.data.read().rooms.connections_on(room, side)
    }

    // ========================================================================
    // Rules
    // ========================================================================

    /// Inserts a rule and returns its id.
    pub fn insert_rule(&self, rule: Rule) -> RuleId {
        let id = rule.id;
        self.data.write().rules.insert(id, rule);
        id
    }

    /// Returns a copy of a rule.
    #[must_use]
    pub fn rule(&self, id: RuleId) -> Option<Rule> {
        self.data.read().rules.get(&id).cloned()
    }

    /// Returns every rule, oldest first.
    #[must_use]
    pub fn rules(&self) -> Vec<Rule> {
        let mut rules: Vec<_> = self.data.read().rules.values().cloned().collect();
        rules.sort_by_key(|r| r.created);
        rules
    }

    /// Runs `f` on a rule.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` if the id is unknown.
    pub fn update_rule<R>(
        &self,
        id: RuleId,
        f: impl FnOnce(&mut Rule) -> R,
    ) -> Result<R, StoreError> {
        let mut data = self.data.write();
        Ok(f(data.rule_mut(id)?))
    }

    /// Removes a rule with its conditions and actions.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` if the id is unknown.
    pub fn remove_rule(&self, id: RuleId) -> Result<Rule, StoreError> {
        self.data
            .write()
            .rules
            .remove(&id)
            .ok_or(StoreError::RuleNotFound(id))
    }

    /// Adds a condition to a rule.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` or `StoreError::DeviceNotFound`
    /// if the rule or the condition's device is unknown.
    pub fn add_condition(
        &self,
        rule: RuleId,
        condition: Condition,
    ) -> Result<ConditionId, StoreError> {
        let mut data = self.data.write();
        if !data.devices.contains_key(&condition.device) {
            return Err(StoreError::DeviceNotFound(condition.device));
        }
        let id = condition.id;
        data.rule_mut(rule)?.conditions.push(condition);
        Ok(id)
    }

    /// Removes a condition from a rule.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` or `StoreError::ConditionNotFound`.
    pub fn remove_condition(&self, rule: RuleId, condition: ConditionId) -> Result<(), StoreError> {
        let mut data = self.data.write();
        if data.rule_mut(rule)?.remove_condition(condition) {
            Ok(())
        } else {
            Err(StoreError::ConditionNotFound(condition))
        }
    }

    /// Adds an action to a rule.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` or `StoreError::DeviceNotFound`
    /// if the rule or the action's device is unknown.
    pub fn add_action(&self, rule: RuleId, action: Action) -> Result<ActionId, StoreError> {
        let mut data = self.data.write();
        if !data.devices.contains_key(&action.device) {
            return Err(StoreError::DeviceNotFound(action.device));
        }
        let id = action.id;
        data.rule_mut(rule)?.actions.push(action);
        Ok(id)
    }

    /// Removes an action from a rule.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` or `StoreError::ActionNotFound`.
    pub fn remove_action(&self, rule: RuleId, action: ActionId) -> Result<(), StoreError> {
        let mut data = self.data.write();
        if data.rule_mut(rule)?.remove_action(action) {
            Ok(())
        } else {
            Err(StoreError::ActionNotFound(action))
        }
    }

    /// Enables or disables a rule.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` if the id is unknown.
    pub fn set_rule_enabled(&self, rule: RuleId, enabled: bool) -> Result<(), StoreError> {
        self.update_rule(rule, |r| r.enabled = enabled)
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
    ) -> Result<(), StoreError> {
        let mut data = self.data.write();
        let condition = data
            .rule_mut(rule)?
            .condition_mut(condition)
            .ok_or(StoreError::ConditionNotFound(condition))?;
        condition.enabled = enabled;
        Ok(())
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Copies every record into a snapshot.
    #[must_use]
    pub fn snapshot(&self) -> Snapshot {
        let data = self.data.read();

        let mut devices: Vec<_> = data.devices.values().cloned().collect();
        devices.sort_by_key(|d| d.created);
        let mut groups: Vec<_> = data.groups.values().cloned().collect();
        groups.sort_by_key(|g| g.id.as_uuid());
        let mut rules: Vec<_> = data.rules.values().cloned().collect();
        rules.sort_by_key(|r| r.created);

        Snapshot {
            devices,
            groups,
            rooms: data.rooms.clone(),
            rules,
        }
    }

    /// Replaces every record with the contents of a snapshot.
    ///
    /// History is cleared.
    pub fn restore(&self, snapshot: Snapshot) {
        let mut data = self.data.write();
        *data = StoreData {
            devices: snapshot.devices.into_iter().map(|d| (d.id, d)).collect(),
            groups: snapshot.groups.into_iter().map(|g| (g.id, g)).collect(),
            rooms: snapshot.rooms,
            rules: snapshot.rules.into_iter().map(|r| (r.id, r)).collect(),
            history: HashMap::new(),
        };
    }
}
