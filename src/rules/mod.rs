// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Condition/action automation.
//!
//! A sweep reads every enabled rule's enabled conditions against the
//! devices' cached state, combines them with the rule's [`Relation`] and
//! fires the rule's actions through an [`ActionExecutor`] when the result
//! turns true.
//!
//! Per rule the sweep moves through [`RulePhase`]: a rule is `Idle` until its
//! conditions hold, fires, and then either re-arms at once (`recycle`) or
//! stays `Triggered` until [`RuleEngine::reset_rule`] clears it.
//!
//! [`Relation`]: crate::model::Relation
//! [`RulePhase`]: crate::model::RulePhase

mod engine;

pub use engine::RuleEngine;

use std::future::Future;

use crate::error::Result;
use crate::model::Action;

/// Carries out the actions of fired rules.
pub trait ActionExecutor: Send + Sync {
    /// Applies one action to its device.
    ///
    /// # Errors
    ///
    /// Returns error if the value does not fit the device or the device
    /// could not be driven. The sweep logs the failure and carries on.
    fn execute(&self, action: &Action) -> impl Future<Output = Result<()>> + Send;
}
