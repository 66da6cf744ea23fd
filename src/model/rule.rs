// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Automation rules: conditions over device state and actions to run.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::ValueError;
use crate::model::{AttributeValue, StateAttribute};
use crate::types::{ActionId, ConditionId, DeviceId, RuleId};

/// Comparison applied by a condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Operator {
    /// `<`
    #[serde(rename = "<")]
    Lt,
    /// `<=`
    #[serde(rename = "<=")]
    Le,
    /// `>`
    #[serde(rename = ">")]
    Gt,
    /// `>=`
    #[serde(rename = ">=")]
    Ge,
    /// `==`
    #[serde(rename = "==")]
    Eq,
    /// `!=`
    #[serde(rename = "!=")]
    Ne,
}

impl Operator {
    /// Applies the comparison `actual <op> expected` numerically.
    #[must_use]
    pub fn compare(self, actual: AttributeValue, expected: AttributeValue) -> bool {
        let (a, b) = (actual.as_f64(), expected.as_f64());
        let equal = (a - b).abs() < f64::EPSILON;
        match self {
            Self::Lt => a < b,
            Self::Le => a < b || equal,
            Self::Gt => a > b,
            Self::Ge => a > b || equal,
            Self::Eq => equal,
            Self::Ne => !equal,
        }
    }

    /// Returns the operator symbol.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::Eq => "==",
            Self::Ne => "!=",
        }
    }
}

impl FromStr for Operator {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "<" => Ok(Self::Lt),
            "<=" => Ok(Self::Le),
            ">" => Ok(Self::Gt),
            ">=" => Ok(Self::Ge),
            "==" | "=" => Ok(Self::Eq),
            "!=" => Ok(Self::Ne),
            other => Err(ValueError::UnknownOperator(other.to_string())),
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How a rule combines its conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    /// Every enabled condition must hold.
    #[default]
    All,
    /// At least one enabled condition must hold.
    Any,
}

impl FromStr for Relation {
    type Err = ValueError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" | "and" => Ok(Self::All),
            "any" | "or" => Ok(Self::Any),
            other => Err(ValueError::InvalidValue(other.to_string())),
        }
    }
}

/// A predicate over one device attribute.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Condition {
    /// Identifier.
    pub id: ConditionId,
    /// Device whose state is read.
    pub device: DeviceId,
    /// Attribute read from the device.
    pub attribute: StateAttribute,
    /// Comparison.
    pub operator: Operator,
    /// Value compared against.
    pub value: AttributeValue,
    /// Disabled conditions are ignored entirely.
    pub enabled: bool,
    /// Result of the last evaluation.
    pub status: bool,
}

impl Condition {
    /// Creates an enabled condition.
    #[must_use]
    pub fn new(
        device: DeviceId,
        attribute: StateAttribute,
        operator: Operator,
        value: impl Into<AttributeValue>,
    ) -> Self {
        Self {
            id: ConditionId::new(),
            device,
            attribute,
            operator,
            value: value.into(),
            enabled: true,
            status: false,
        }
    }

    /// Tests a value read from the device.
    #[must_use]
    pub fn test(&self, actual: AttributeValue) -> bool {
        self.operator.compare(actual, self.value)
    }
}

/// What to set on a device when a rule fires.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Action {
    /// Identifier.
    pub id: ActionId,
    /// Device to act on.
    pub device: DeviceId,
    /// Attribute to set.
    pub attribute: StateAttribute,
    /// Value to apply, as entered.
    pub value: String,
}

impl Action {
    /// Creates an action.
    #[must_use]
    pub fn new(device: DeviceId, attribute: StateAttribute, value: impl Into<String>) -> Self {
        Self {
            id: ActionId::new(),
            device,
            attribute,
            value: value.into(),
        }
    }

    /// Parses the stored value.
    ///
    /// # Errors
    ///
    /// Returns `ValueError::InvalidValue` if the value is neither a flag nor
    /// a number.
    pub fn parsed_value(&self) -> Result<AttributeValue, ValueError> {
        self.value.parse()
    }
}

/// Where a rule is in its firing cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RulePhase {
    /// Waiting for its conditions to hold.
    Idle,
    /// Conditions are being read.
    Evaluating,
    /// Fired and latched until reset.
    Triggered,
}

/// A named set of conditions with the actions to run when they hold.
///
/// # Examples
///
/// ```
/// use homelink::model::{Action, Condition, Operator, Relation, Rule, StateAttribute};
/// use homelink::types::DeviceId;
///
/// let sensor = DeviceId::new();
/// let lamp = DeviceId::new();
///
/// let rule = Rule::new("Dark hallway", Relation::All)
///     .with_condition(Condition::new(sensor, StateAttribute::State, Operator::Lt, 10.0))
///     .with_action(Action::new(lamp, StateAttribute::State, "on"));
///
/// assert!(rule.recycle);
/// assert_eq!(rule.conditions.len(), 1);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Rule {
    /// Identifier.
    pub id: RuleId,
    /// Display name.
    pub name: String,
    /// Creation time.
    pub created: DateTime<Utc>,
    /// Last time the rule fired.
    pub last_triggered: Option<DateTime<Utc>>,
    /// Disabled rules are skipped by sweeps.
    pub enabled: bool,
    /// Re-arm right after firing instead of latching.
    pub recycle: bool,
    /// Latched after a non-recycling rule fires.
    pub status: bool,
    /// How conditions combine.
    pub relation: Relation,
    /// Conditions owned by the rule.
    pub conditions: Vec<Condition>,
    /// Actions owned by the rule.
    pub actions: Vec<Action>,
}

impl Rule {
    /// Creates an enabled, recycling rule with no conditions.
    #[must_use]
    pub fn new(name: impl Into<String>, relation: Relation) -> Self {
        Self {
            id: RuleId::new(),
            name: name.into(),
            created: Utc::now(),
            last_triggered: None,
            enabled: true,
            recycle: true,
            status: false,
            relation,
            conditions: Vec::new(),
            actions: Vec::new(),
        }
    }

    /// Sets the recycle flag.
    #[must_use]
    pub fn with_recycle(mut self, recycle: bool) -> Self {
        self.recycle = recycle;
        self
    }

    /// Adds a condition.
    #[must_use]
    pub fn with_condition(mut self, condition: Condition) -> Self {
        self.conditions.push(condition);
        self
    }

    /// Adds an action.
    #[must_use]
    pub fn with_action(mut self, action: Action) -> Self {
        self.actions.push(action);
        self
    }

    /// Returns the current phase outside of a sweep.
    #[must_use]
    pub fn phase(&self) -> RulePhase {
        if self.status {
            RulePhase::Triggered
        } else {
            RulePhase::Idle
        }
    }

    /// Clears the latch so the rule can fire again.
    pub fn reset(&mut self) {
        self.status = false;
    }

    /// Returns a condition mutably.
    pub fn condition_mut(&mut self, id: ConditionId) -> Option<&mut Condition> {
        self.conditions.iter_mut().find(|c| c.id == id)
    }

    /// Removes a condition. Returns `true` if it existed.
    pub fn remove_condition(&mut self, id: ConditionId) -> bool {
        let before = self.conditions.len();
        self.conditions.retain(|c| c.id != id);
        self.conditions.len() != before
    }

    /// Removes an action. Returns `true` if it existed.
    pub fn remove_action(&mut self, id: ActionId) -> bool {
        let before = self.actions.len();
        self.actions.retain(|a| a.id != id);
        self.actions.len() != before
    }

    /// Drops every condition and action that targets a device.
    pub(crate) fn forget_device(&mut self, device: DeviceId) {
        self.conditions.retain(|c| c.device != device);
        self.actions.retain(|a| a.device != device);
    }
}
