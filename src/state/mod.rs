// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Device state changes and their history.
//!
//! A [`StateChange`] describes one update to a device record. Every change
//! that actually modifies a record is appended to the device's history as a
//! timestamped [`HistoryEntry`].
//!
//! # Examples
//!
//! ```
//! use homelink::state::{HistoryEntry, StateChange};
//!
//! let entry = HistoryEntry::now(StateChange::Reachable(false));
//! assert_eq!(entry.change, StateChange::Reachable(false));
//! ```

mod state_change;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub use state_change::StateChange;

/// A recorded change with the time it was applied.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// When the change was applied.
    pub at: DateTime<Utc>,
    /// What changed.
    pub change: StateChange,
}

impl HistoryEntry {
    /// Creates an entry stamped with the current time.
    #[must_use]
    pub fn now(change: StateChange) -> Self {
        Self {
            at: Utc::now(),
            change,
        }
    }
}
