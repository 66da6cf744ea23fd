// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! JSON snapshots of the store.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tokio::fs;

use crate::error::StoreError;
use crate::model::{Device, Group, RoomGraph, Rule};

/// Current snapshot format version.
pub const SNAPSHOT_VERSION: u32 = 1;

/// Every record of a [`Store`](super::Store) at one point in time.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Device records.
    pub devices: Vec<Device>,
    /// Groups, including the ones backing rooms.
    pub groups: Vec<Group>,
    /// Rooms and their connections.
    pub rooms: RoomGraph,
    /// Rules with their conditions and actions.
    pub rules: Vec<Rule>,
}

#[derive(Serialize, Deserialize)]
struct SnapshotFile {
    version: u32,
    data: Snapshot,
}

impl Snapshot {
    /// Writes the snapshot to `path`.
    ///
    /// The file is written next to its destination first and then renamed
    /// into place, so readers never see a partial snapshot.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if writing fails and `StoreError::Format`
    /// if serialization fails.
    pub async fn save(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let content = serde_json::to_string_pretty(&SnapshotFile {
            version: SNAPSHOT_VERSION,
            data: self.clone(),
        })?;

        let temp_path = path.with_extension("tmp");
        fs::write(&temp_path, content).await?;
        fs::rename(&temp_path, path).await?;

        tracing::debug!(
            path = %path.display(),
            devices = self.devices.len(),
            rules = self.rules.len(),
            "Snapshot saved"
        );
        Ok(())
    }

    /// Reads a snapshot from `path`.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::Io` if the file cannot be read and
    /// `StoreError::Format` if it is not a snapshot.
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, StoreError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path).await?;
        let file: SnapshotFile = serde_json::from_str(&content)?;

        if file.version != SNAPSHOT_VERSION {
            tracing::warn!(
                path = %path.display(),
                found = file.version,
                expected = SNAPSHOT_VERSION,
                "Snapshot version differs"
            );
        }
        Ok(file.data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ConnectionKind, DeviceDetails, Outlet, Relation, Side, VendorTag};
    use crate::store::Store;
    use crate::types::AccountId;
    use tempfile::TempDir;

    #[tokio::test]
    async fn save_then_load_restores_records() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("hub.json");

        let store = Store::new();
        let outlet = store.insert_device(Device::new(
            AccountId::new("alice"),
            "Kettle",
            "10.0.0.40",
            VendorTag::local(),
            DeviceDetails::Outlet(Outlet::default()),
        ));
        let a = store.add_room("Kitchen", "Kitchen");
        let b = store.add_room("Hall", "Hallway");
        store
            .connect_rooms(a, b, ConnectionKind::Door, Side::Left)
            .unwrap();
        store.insert_rule(Rule::new("Evening", Relation::Any));

        store.snapshot().save(&path).await.unwrap();
        assert!(!path.with_extension("tmp").exists());

        let restored = Store::new();
        restored.restore(Snapshot::load(&path).await.unwrap());

        assert_eq!(restored.device(outlet).unwrap().name, "Kettle");
        assert_eq!(restored.rooms().len(), 2);
        assert_eq!(restored.groups().len(), 2);
        assert_eq!(restored.room_connections_on(b, Side::Right).len(), 1);
        assert_eq!(restored.rules().len(), 1);
    }

    #[tokio::test]
    async fn load_missing_file_is_io_error() {
        let temp_dir = TempDir::new().unwrap();
        let result = Snapshot::load(temp_dir.path().join("missing.json")).await;
        assert!(matches!(result, Err(StoreError::Io(_))));
    }

    #[tokio::test]
    async fn load_garbage_is_format_error() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("bad.json");
        fs::write(&path, "not json").await.unwrap();
        assert!(matches!(
            Snapshot::load(&path).await,
            Err(StoreError::Format(_))
        ));
    }
}
