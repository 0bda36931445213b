//! Caller-owned memory of dismissed typo advisories, and the "Correct" action.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::graph::{MeasurementKey, MeasurementMap};

use super::types::{IssueKind, ValidationIssue, ValidationResult};

/// Dismissed keys with the exact value they had when dismissed.
///
/// A dismissal holds only while the key keeps that value; editing the key
/// re-arms its advisory.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct DismissalLedger {
    dismissed: BTreeMap<MeasurementKey, u64>,
}

impl DismissalLedger {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember the current value of `key`; `false` if the key is not entered.
    pub fn dismiss(&mut self, key: MeasurementKey, map: &MeasurementMap) -> bool {
        match map.get(key) {
            Some(v) => {
                self.dismissed.insert(key, v.to_bits());
                true
            }
            None => false,
        }
    }

    pub fn is_dismissed(&self, key: MeasurementKey, map: &MeasurementMap) -> bool {
        match (self.dismissed.get(&key), map.get(key)) {
            (Some(bits), Some(v)) => *bits == v.to_bits(),
            _ => false,
        }
    }

    /// Drop dismissals whose key has since changed or been cleared.
    pub fn prune(&mut self, map: &MeasurementMap) {
        self.dismissed
            .retain(|k, bits| map.get(*k).map(f64::to_bits) == Some(*bits));
    }

    pub fn len(&self) -> usize {
        self.dismissed.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dismissed.is_empty()
    }

    /// Copy of `result` without typo advisories for dismissed keys.
    pub fn filter(&self, result: &ValidationResult, map: &MeasurementMap) -> ValidationResult {
        let issues = result
            .issues
            .iter()
            .filter(|i| {
                !(i.kind == IssueKind::SuspectedTypo
                    && i.suspect.is_some_and(|k| self.is_dismissed(k, map)))
            })
            .cloned()
            .collect();
        ValidationResult {
            issues,
            ..result.clone()
        }
    }
}

/// New map with the issue's suggested value applied to its suspect key.
/// `None` when the issue carries no suggestion.
pub fn apply_correction(map: &MeasurementMap, issue: &ValidationIssue) -> Option<MeasurementMap> {
    let key = issue.suspect?;
    let mm = issue.suggested_correction_mm?;
    let mut next = map.clone();
    next.insert(key, mm).then_some(next)
}
