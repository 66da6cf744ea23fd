// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! `homelink` - the core of a home-automation hub.
//!
//! This library discovers smart-home bridges on the local network, pairs
//! with them, mirrors their lights, sensors and groups in a local store,
//! drives those devices, and evaluates condition-action rules against the
//! stored state.
//!
//! # Supported Features
//!
//! - **Discovery**: SSDP search for bridges on the local network
//! - **Registration**: Link-button pairing and token storage per bridge
//! - **Sync**: Idempotent import of lights, sensors and groups
//! - **Control**: On/off, brightness, color temperature, group actions
//! - **Rules**: All/any conditions over device attributes, latching or
//!   recycling
//! - **Rooms**: Rooms with typed connections between them
//!
//! The Philips Hue bridge is the reference vendor; other vendors plug in by
//! implementing [`controller::BridgeController`].
//!
//! # Quick Start
//!
//! ```no_run
//! use homelink::control::ControlOp;
//! use homelink::{Hub, HubConfig, ServiceIdentity};
//!
//! #[tokio::main]
//! async fn main() -> homelink::Result<()> {
//!     let hub: Hub = Hub::new(HubConfig::new(ServiceIdentity::new("alice")));
//!
//!     // Press the bridge's link button first
//!     let bridge = hub.register_bridge("192.168.1.2").await?;
//!     let report = hub.sync_bridge(bridge).await?;
//!
//!     for light in &report.lights {
//!         hub.control_device(*light, ControlOp::ON).await?;
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Rules
//!
//! ```no_run
//! use homelink::model::{Action, Condition, Operator, Relation, Rule, StateAttribute};
//! use homelink::types::DeviceId;
//! use homelink::Hub;
//!
//! # async fn example(hub: Hub, sensor: DeviceId, lamp: DeviceId) {
//! let rule = Rule::new("Lights on arrival", Relation::All)
//!     .with_condition(Condition::new(sensor, StateAttribute::State, Operator::Eq, 1.0))
//!     .with_action(Action::new(lamp, StateAttribute::State, "on"));
//! hub.add_rule(rule);
//!
//! for rule in hub.evaluate_rules().await {
//!     println!("fired {rule}");
//! }
//! # }
//! ```
//!
//! ## Events
//!
//! ```no_run
//! use homelink::event::HubEvent;
//! use homelink::Hub;
//!
//! # async fn example(hub: Hub) {
//! let mut events = hub.subscribe();
//! while let Ok(event) = events.recv().await {
//!     if let HubEvent::StateChanged { device, change } = event {
//!         println!("{device}: {change:?}");
//!     }
//! }
//! # }
//! ```
//!
//! # Logging
//!
//! Diagnostics are emitted through [`tracing`]; install a subscriber in the
//! host application to see them. Auth tokens never appear in log output.

mod capabilities;
pub mod control;
pub mod controller;
pub mod discovery;
pub mod error;
pub mod event;
pub mod hub;
pub mod import;
pub mod model;
pub mod protocol;
pub mod rules;
pub mod state;
pub mod store;
pub mod types;

pub use capabilities::Capabilities;
pub use control::{ControlOp, GroupApplyReport, LightControl};
pub use controller::{BridgeController, HueBridge, StatePatch};
pub use error::{
    ConfigError, ControlError, Error, ImportError, ProtocolError, RegistrationError, Result,
    StoreError, ValueError,
};
pub use event::{EventBus, HubEvent};
pub use hub::{Hub, HubConfig, ServiceIdentity};
pub use import::{Importer, SyncReport};
pub use protocol::HttpConfig;
pub use rules::{ActionExecutor, RuleEngine};
pub use store::Store;
pub use types::{Brightness, BrightnessLevel, ColorTemperature, DeviceId, GroupId, RuleId};
