//! Tolerances for feasibility and cross-check comparisons.
//!
//! Policy
//! - Constants are fixed defaults. The cross-check pair (relative, floor) is
//!   tunable per call through `ValidationCfg`; the triangle slack is not.
//! - All lengths are canonical millimeters.

use serde::{Deserialize, Serialize};

use crate::units::Unit;

/// Relative slack for the strict triangle inequality `a + b > c`.
/// A triangle is rejected when `a + b - c <= TRIANGLE_SLACK_REL * (a + b + c)`.
pub const TRIANGLE_SLACK_REL: f64 = 1e-9;
/// Cross-check mismatch threshold, relative to the entered value.
pub const CROSS_CHECK_REL_TOL: f64 = 0.02;
/// Cross-check mismatch threshold floor in mm; the larger of the two applies.
pub const CROSS_CHECK_FLOOR_MM: f64 = 10.0;
/// Clamp for `cos` values fed to `acos` after rounding noise.
pub(crate) const COS_CLAMP: f64 = 1.0;

/// Strict triangle inequality with relative slack.
#[inline]
pub fn closes(a: f64, b: f64, c: f64) -> bool {
    let slack = TRIANGLE_SLACK_REL * (a + b + c);
    a + b - c > slack && b + c - a > slack && a + c - b > slack
}

/// Mismatch threshold (mm) for an entered value under `(rel, floor)`.
#[inline]
pub fn cross_check_threshold(entered_mm: f64, rel: f64, floor_mm: f64) -> f64 {
    (rel * entered_mm).max(floor_mm)
}

/// Validation policy.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ValidationCfg {
    pub rel_tol: f64,
    pub floor_mm: f64,
    /// Display unit; decides suggestion rounding and message formatting.
    pub unit: Unit,
    /// Optional ceiling on the perimeter; exceeding it is advisory.
    pub max_perimeter_mm: Option<f64>,
}

impl Default for ValidationCfg {
    fn default() -> Self {
        Self {
            rel_tol: CROSS_CHECK_REL_TOL,
            floor_mm: CROSS_CHECK_FLOOR_MM,
            unit: Unit::Metric,
            max_perimeter_mm: None,
        }
    }
}

impl ValidationCfg {
    pub fn with_unit(unit: Unit) -> Self {
        Self {
            unit,
            ..Self::default()
        }
    }

    #[inline]
    pub fn mismatch(&self, entered_mm: f64, computed_mm: f64) -> bool {
        (entered_mm - computed_mm).abs() > cross_check_threshold(entered_mm, self.rel_tol, self.floor_mm)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn degenerate_triangle_does_not_close() {
        assert!(!closes(1000.0, 1000.0, 2000.0));
        assert!(!closes(1000.0, 1000.0, 5000.0));
        assert!(closes(3000.0, 4000.0, 5000.0));
    }

    #[test]
    fn slack_is_relative_to_size() {
        // 1 mm short of degenerate on a 20 m triangle still closes.
        assert!(closes(10_000.0, 10_000.0, 19_999.0));
        let slack = TRIANGLE_SLACK_REL * 60_000.0;
        assert!(slack < 1e-3);
    }

    #[test]
    fn threshold_uses_larger_of_relative_and_floor() {
        assert!((cross_check_threshold(100.0, 0.02, 10.0) - 10.0).abs() < 1e-12);
        assert!((cross_check_threshold(5000.0, 0.02, 10.0) - 100.0).abs() < 1e-12);
        let cfg = ValidationCfg::default();
        assert!(!cfg.mismatch(5000.0, 5099.0));
        assert!(cfg.mismatch(5000.0, 5101.0));
    }
}
