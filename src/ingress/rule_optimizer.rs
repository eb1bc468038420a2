//! Listener rule optimization.
//!
//! Rules keep their canonical order. A rule whose conditions repeat an earlier
//! rule's exactly can never match; it still becomes a listener rule but sinks
//! behind the reachable ones. Nothing else moves.

use crate::model::RuleCondition;

/// A listener rule before its action and priority are fixed.
#[derive(Debug, Clone, PartialEq)]
pub struct RuleDraft<T> {
    pub conditions: Vec<RuleCondition>,
    pub target: T,
}

impl<T> RuleDraft<T> {
    pub fn new(conditions: Vec<RuleCondition>, target: T) -> Self {
        Self { conditions, target }
    }
}

pub fn optimize<T>(rules: Vec<RuleDraft<T>>) -> Vec<RuleDraft<T>> {
    let mut reachable: Vec<RuleDraft<T>> = Vec::with_capacity(rules.len());
    let mut shadowed: Vec<RuleDraft<T>> = Vec::new();
    for rule in rules {
        if reachable.iter().any(|earlier| same_conditions(&earlier.conditions, &rule.conditions)) {
            tracing::debug!(conditions = ?rule.conditions, "shadowed listener rule moved last");
            shadowed.push(rule);
        } else {
            reachable.push(rule);
        }
    }
    reachable.extend(shadowed);
    reachable
}

fn same_conditions(a: &[RuleCondition], b: &[RuleCondition]) -> bool {
    a.len() == b.len() && a.iter().all(|condition| b.contains(condition))
}
