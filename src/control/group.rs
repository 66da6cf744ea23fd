// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Group-wide control.
//!
//! [`apply_each`](LightControl::apply_each) sends the same patch to every
//! member light, one request per light, and reports each outcome. Successful
//! members are never rolled back when a later member fails.
//!
//! Bridge-managed groups also have a single group endpoint for actions and
//! renames; those calls go through [`set_group_action`](LightControl::set_group_action)
//! and [`rename_group`](LightControl::rename_group).

use super::{LightControl, check_capabilities, record_changes};
use crate::controller::{BridgeController, GroupAttributes, StatePatch};
use crate::error::{ControlError, Error, Result, StoreError};
use crate::model::Group;
use crate::state::StateChange;
use crate::store::Store;
use crate::types::{DeviceId, GroupId};

/// Per-member outcome of a group command.
#[derive(Debug, Default)]
pub struct GroupApplyReport {
    /// Lights whose command was confirmed.
    pub succeeded: Vec<DeviceId>,
    /// Lights whose command failed, with the reason.
    pub failures: Vec<(DeviceId, Error)>,
}

impl GroupApplyReport {
    /// Returns `true` if every member succeeded.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.failures.is_empty()
    }

    /// Appends another report's outcomes.
    pub fn merge(&mut self, other: Self) {
        self.succeeded.extend(other.succeeded);
        self.failures.extend(other.failures);
    }
}

impl<C: BridgeController> LightControl<'_, C> {
    /// Sends `patch` to each light in turn.
    pub async fn apply_each(&self, lights: &[DeviceId], patch: &StatePatch) -> GroupApplyReport {
        let mut report = GroupApplyReport::default();
        for &light in lights {
            match self.send(light, patch).await {
                Ok(_) => report.succeeded.push(light),
                Err(e) => {
                    tracing::warn!(device = %light, error = %e, "Group member command failed");
                    report.failures.push((light, e));
                }
            }
        }
        report
    }

    /// Sends an action to a bridge-managed group in one request.
    ///
    /// On success the group's flags and its member lights are updated with
    /// what the action changed. Returns the members whose record changed.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` for an unknown group,
    /// `Error::CapabilityNotSupported` for a group the bridge does not know,
    /// and `Error::Control` if the bridge reports an error.
    pub async fn set_group_action(
        &self,
        group: GroupId,
        patch: &StatePatch,
    ) -> Result<Vec<DeviceId>> {
        let record = self.group(group)?;
        let index = bridge_index(&record)?;

        let results = self.controller.set_group_action(index, patch).await?;
        if !results.is_success() {
            return Err(ControlError {
                target: format!("group {index}"),
                errors: results.errors(),
            }
            .into());
        }

        if let Some(on) = patch.on {
            self.store.update_group(group, |g| {
                g.action_on = on;
                g.all_on = on;
                g.any_on = on;
            })?;
        }

        let mut touched = Vec::new();
        for light in record.member_lights() {
            let Some(device) = self.store.device(light) else {
                continue;
            };
            let Some(state) = device.as_light() else {
                continue;
            };
            let changes = if check_capabilities(state.capabilities(), patch).is_ok() {
                patch.changes()
            } else {
                patch.on.map(StateChange::Power).into_iter().collect()
            };
            if !record_changes(self.store, self.events, light, changes).is_empty() {
                touched.push(light);
            }
        }

        tracing::debug!(%group, index, members = touched.len(), "Group action confirmed");
        Ok(touched)
    }

    /// Renames a bridge-managed group on the bridge, then locally.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::GroupNotFound` for an unknown group,
    /// `Error::CapabilityNotSupported` for a group the bridge does not know,
    /// and `Error::Control` if the bridge reports an error.
    pub async fn rename_group(&self, group: GroupId, name: &str) -> Result<()> {
        let record = self.group(group)?;
        let index = bridge_index(&record)?;

        let results = self
            .controller
            .set_group_attributes(index, &GroupAttributes::rename(name))
            .await?;
        if !results.is_success() {
            return Err(ControlError {
                target: format!("group {index}"),
                errors: results.errors(),
            }
            .into());
        }

        self.store.update_group(group, |g| g.name = name.to_string())?;
        tracing::info!(%group, index, name, "Group renamed");
        Ok(())
    }

    fn group(&self, id: GroupId) -> Result<Group> {
        Ok(self.store.group(id).ok_or(StoreError::GroupNotFound(id))?)
    }
}

fn bridge_index(group: &Group) -> Result<u16> {
    group
        .controller
        .map(|reference| reference.index)
        .ok_or(Error::CapabilityNotSupported)
}

/// Splits a group's member lights by the bridge that controls them.
pub(crate) fn members_by_bridge(store: &Store, group: &Group) -> Vec<(DeviceId, Vec<DeviceId>)> {
    let mut split: Vec<(DeviceId, Vec<DeviceId>)> = Vec::new();
    for light in group.member_lights() {
        let Some(reference) = store
            .device(light)
            .and_then(|d| d.as_light().map(|l| l.controller))
        else {
            continue;
        };
        match split.iter_mut().find(|(bridge, _)| *bridge == reference.controller) {
            Some((_, lights)) => lights.push(light),
            None => split.push((reference.controller, vec![light])),
        }
    }
    split
}
