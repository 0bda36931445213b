//! Geometry validation: fan feasibility, then redundant cross-checks.
//!
//! Phases
//! - Phase 1 checks the strict triangle inequality on every fan triangle
//!   whose sides are entered. Failures are blocking and carry the feasible
//!   range of the most likely culprit.
//! - Phase 2 runs only once the fan is complete and closes: it places the
//!   corners and compares every other entered diagonal with the placement.
//!   Mismatches are advisory typo suggestions.
//!
//! `is_valid` is true iff the fan is complete and every fan triangle closes.
//! Everything is returned as data; nothing here panics on odd input.

mod crosscheck;
mod dismiss;
mod feasibility;
mod typo;
mod types;

pub use dismiss::{apply_correction, DismissalLedger};
pub use types::{Completeness, FeasibleRange, IssueKind, ValidationIssue, ValidationResult};

use crate::graph::{edge_keys, MeasurementGraph, MeasurementMap};
use crate::reconstruct::{reconstruct, Placement};
use crate::tolerance::ValidationCfg;
use crate::units::format_primary;

/// Validate with the default policy (metric display).
pub fn validate_geometry(map: &MeasurementMap, corner_count: usize) -> ValidationResult {
    validate(map, corner_count, &ValidationCfg::default())
}

pub fn validate(map: &MeasurementMap, corner_count: usize, cfg: &ValidationCfg) -> ValidationResult {
    match MeasurementGraph::new(corner_count, map) {
        Some(graph) => validate_graph(&graph, cfg).0,
        None => ValidationResult::unsupported(),
    }
}

/// Validation plus the placement it was checked against (when Phase 1 passed).
pub(crate) fn validate_graph(
    graph: &MeasurementGraph<'_>,
    cfg: &ValidationCfg,
) -> (ValidationResult, Option<Placement>) {
    let foreign = graph.foreign_keys();
    if !foreign.is_empty() {
        tracing::debug!(count = foreign.len(), "ignoring keys outside the polygon");
    }

    let mut issues = feasibility::check_fan(graph, cfg);
    let closes = issues.is_empty();

    let missing = graph.missing_fan();
    let completeness = if missing.is_empty() {
        Completeness::Complete
    } else {
        let message = format!(
            "Enter {} to complete the shape",
            missing
                .iter()
                .map(|k| k.to_string())
                .collect::<Vec<_>>()
                .join(", ")
        );
        issues.push(ValidationIssue::new(IssueKind::Incomplete, missing.clone(), message));
        Completeness::Missing(missing)
    };

    if let Some(issue) = perimeter_limit(graph, cfg) {
        issues.push(issue);
    }

    let mut placement = None;
    if closes && completeness == Completeness::Complete {
        match reconstruct(graph) {
            Ok(p) => {
                issues.extend(crosscheck::cross_check(graph, &p, cfg));
                placement = Some(p);
            }
            Err(err) => tracing::debug!(%err, "placement failed after phase 1"),
        }
    }

    let is_valid = placement.is_some();
    // Blocking issues first, then advisories, each in discovery order.
    issues.sort_by_key(|i| !i.kind.is_blocking());
    (
        ValidationResult {
            is_valid,
            completeness,
            issues,
        },
        placement,
    )
}

fn perimeter_limit(graph: &MeasurementGraph<'_>, cfg: &ValidationCfg) -> Option<ValidationIssue> {
    let limit = cfg.max_perimeter_mm?;
    let edges = graph.entered_edges();
    if edges.len() != graph.corner_count() {
        return None;
    }
    let perimeter: f64 = edges.iter().map(|(_, v)| v).sum();
    (perimeter > limit).then(|| {
        ValidationIssue::new(
            IssueKind::PerimeterExceedsLimit,
            edge_keys(graph.corner_count()),
            format!(
                "Perimeter {} exceeds the maximum of {}",
                format_primary(perimeter, cfg.unit),
                format_primary(limit, cfg.unit)
            ),
        )
    })
}
