//! Result types of the validator.

use serde::{Deserialize, Serialize};

use crate::graph::MeasurementKey;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum IssueKind {
    /// Fan measurements still missing.
    Incomplete,
    /// A fan triangle cannot close.
    Infeasible,
    /// Redundant measurements disagree; one entry is likely mistyped.
    SuspectedTypo,
    /// Perimeter above the configured ceiling.
    PerimeterExceedsLimit,
}

impl IssueKind {
    /// Blocking issues make the configuration invalid; the rest are advisory.
    #[inline]
    pub fn is_blocking(self) -> bool {
        matches!(self, IssueKind::Incomplete | IssueKind::Infeasible)
    }
}

/// Open interval a length must fall in for its triangle to close.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FeasibleRange {
    pub min_mm: f64,
    pub max_mm: f64,
}

impl FeasibleRange {
    /// `(|x − y|, x + y)` for the third side of a triangle with sides `x`, `y`.
    pub fn third_side(x: f64, y: f64) -> Self {
        Self {
            min_mm: (x - y).abs(),
            max_mm: x + y,
        }
    }

    #[inline]
    pub fn contains(&self, mm: f64) -> bool {
        mm > self.min_mm && mm < self.max_mm
    }

    pub fn intersect(&self, other: &FeasibleRange) -> Option<FeasibleRange> {
        let min_mm = self.min_mm.max(other.min_mm);
        let max_mm = self.max_mm.min(other.max_mm);
        (min_mm < max_mm).then_some(FeasibleRange { min_mm, max_mm })
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationIssue {
    pub kind: IssueKind,
    /// Every measurement the issue was derived from.
    pub involved_keys: Vec<MeasurementKey>,
    /// The single measurement most likely at fault.
    pub suspect: Option<MeasurementKey>,
    /// Fan triangle corners for `Infeasible`.
    pub triangle: Option<[usize; 3]>,
    pub message: String,
    /// Replacement value in mm, snapped to the display precision.
    pub suggested_correction_mm: Option<f64>,
    pub feasible_range: Option<FeasibleRange>,
}

impl ValidationIssue {
    pub(crate) fn new(kind: IssueKind, involved_keys: Vec<MeasurementKey>, message: String) -> Self {
        Self {
            kind,
            involved_keys,
            suspect: None,
            triangle: None,
            message,
            suggested_correction_mm: None,
            feasible_range: None,
        }
    }
}

/// Whether the fan needed for reconstruction is fully entered.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case", tag = "state", content = "missing")]
pub enum Completeness {
    Complete,
    Missing(Vec<MeasurementKey>),
    /// Corner count outside the supported range.
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ValidationResult {
    pub is_valid: bool,
    pub completeness: Completeness,
    pub issues: Vec<ValidationIssue>,
}

impl ValidationResult {
    pub(crate) fn unsupported() -> Self {
        Self {
            is_valid: false,
            completeness: Completeness::Unsupported,
            issues: Vec::new(),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.completeness == Completeness::Complete
    }

    pub fn blocking(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.kind.is_blocking())
    }

    pub fn advisories(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| !i.kind.is_blocking())
    }

    /// Suggested value for `key` from a typo advisory, if any.
    pub fn suggestion_for(&self, key: MeasurementKey) -> Option<f64> {
        self.issues
            .iter()
            .filter(|i| i.kind == IssueKind::SuspectedTypo && i.suspect == Some(key))
            .find_map(|i| i.suggested_correction_mm)
    }

    pub fn typo_keys(&self) -> Vec<MeasurementKey> {
        self.issues
            .iter()
            .filter(|i| i.kind == IssueKind::SuspectedTypo)
            .filter_map(|i| i.suspect)
            .collect()
    }
}
