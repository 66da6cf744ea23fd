// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Hub events.
//!
//! The hub publishes a [`HubEvent`] on its [`EventBus`] whenever a record is
//! added or removed, a device's state changes, a bridge registers or syncs,
//! or a rule fires.

mod event_bus;
mod hub_event;

pub use event_bus::EventBus;
pub use hub_event::HubEvent;
