// SPDX-License-Identifier: MPL-2.0
// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Rule sweeps.

use chrono::Utc;
use tokio::sync::Mutex;

use super::ActionExecutor;
use crate::error::StoreError;
use crate::event::{EventBus, HubEvent};
use crate::model::{Relation, Rule};
use crate::store::Store;
use crate::types::{ConditionId, RuleId};

/// Evaluates the store's rules.
///
/// Sweeps never overlap: a sweep started while another runs waits for it.
/// Device state is read with ordinary store reads, so control commands may
/// land between two conditions of the same rule.
#[derive(Debug)]
pub struct RuleEngine {
    store: Store,
    events: EventBus,
    sweep: Mutex<()>,
}

impl RuleEngine {
    /// Creates an engine over `store`, announcing firings on `events`.
    #[must_use]
    pub fn new(store: Store, events: EventBus) -> Self {
        Self {
            store,
            events,
            sweep: Mutex::new(()),
        }
    }

    /// Runs one sweep and returns the rules that fired, oldest rule first.
    ///
    /// Action failures are logged; the rule still counts as fired.
    pub async fn evaluate<E: ActionExecutor>(&self, executor: &E) -> Vec<RuleId> {
        let _sweep = self.sweep.lock().await;
        let mut fired = Vec::new();

        for rule in self.store.rules() {
            if !rule.enabled {
                continue;
            }

            let statuses = self.condition_statuses(&rule);
            let holds = combine(rule.relation, &statuses);
            let recorded = self.store.update_rule(rule.id, |r| {
                for (id, status) in &statuses {
                    if let Some(condition) = r.condition_mut(*id) {
                        condition.status = *status;
                    }
                }
            });
            if recorded.is_err() {
                // Removed while the sweep was running
                continue;
            }

            if !holds || rule.status {
                continue;
            }

            for action in &rule.actions {
                if let Err(e) = executor.execute(action).await {
                    tracing::warn!(
                        rule = %rule.id,
                        action = %action.id,
                        device = %action.device,
                        error = %e,
                        "Rule action failed"
                    );
                }
            }

            let now = Utc::now();
            if let Err(e) = self.store.update_rule(rule.id, |r| {
                r.last_triggered = Some(now);
                r.status = !r.recycle;
            }) {
                tracing::debug!(rule = %rule.id, error = %e, "Fired rule removed during sweep");
            }

            tracing::info!(
                rule = %rule.id,
                name = %rule.name,
                actions = rule.actions.len(),
                "Rule fired"
            );
            self.events.publish(HubEvent::RuleFired { rule: rule.id });
            fired.push(rule.id);
        }

        fired
    }

    /// Clears a latched rule so it can fire again.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::RuleNotFound` if the id is unknown.
    pub fn reset_rule(&self, rule: RuleId) -> Result<(), StoreError> {
        self.store.update_rule(rule, Rule::reset)
    }

    fn condition_statuses(&self, rule: &Rule) -> Vec<(ConditionId, bool)> {
        rule.conditions
            .iter()
            .filter(|c| c.enabled)
            .map(|c| {
                let status = self
                    .store
                    .device(c.device)
                    .and_then(|d| d.attribute(c.attribute))
                    .is_some_and(|actual| c.test(actual));
                (c.id, status)
            })
            .collect()
    }
}

/// Combines condition results. A rule without enabled conditions never holds.
fn combine(relation: Relation, statuses: &[(ConditionId, bool)]) -> bool {
    if statuses.is_empty() {
        return false;
    }
    match relation {
        Relation::All => statuses.iter().all(|(_, s)| *s),
        Relation::Any => statuses.iter().any(|(_, s)| *s),
    }
}
