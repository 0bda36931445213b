//! Phase 1: every fan triangle must satisfy the strict triangle inequality.

use crate::graph::{KeyKind, MeasurementGraph, MeasurementKey};
use crate::reconstruct::{fan_triangle_sides, FanTriangle};
use crate::tolerance::ValidationCfg;
use crate::units::format_primary;

use super::typo::one_keystroke_variants;
use super::types::{FeasibleRange, IssueKind, ValidationIssue};

/// Index (0..3) of the side most likely mistyped in a failing triangle.
///
/// Edges are measured more reliably than diagonals, so only fan diagonals are
/// candidates (c before a); a three-corner sail has none and considers all
/// sides, longest first. A candidate that one keystroke would bring inside
/// its feasible range wins over the plain order.
pub(crate) fn suspect_side(tri: &FanTriangle, graph: &MeasurementGraph<'_>, cfg: &ValidationCfg) -> usize {
    let n = graph.corner_count();
    let is_diagonal = |s: usize| tri.keys[s].kind(n) == Some(KeyKind::Diagonal);
    let mut candidates: Vec<usize> = [2, 0].into_iter().filter(|&s| is_diagonal(s)).collect();
    if candidates.is_empty() {
        candidates = vec![0, 1, 2];
        candidates.sort_by(|&x, &y| tri.sides[y].total_cmp(&tri.sides[x]));
    }
    candidates
        .iter()
        .copied()
        .find(|&s| one_keystroke_fix(graph, tri.keys[s], tri.sides[s], cfg))
        .unwrap_or(candidates[0])
}

fn one_keystroke_fix(
    graph: &MeasurementGraph<'_>,
    key: MeasurementKey,
    entered: f64,
    cfg: &ValidationCfg,
) -> bool {
    let Some(range) = fan_range(graph, key) else {
        return false;
    };
    one_keystroke_variants(entered, cfg.unit)
        .into_iter()
        .any(|v| range.contains(v))
}

/// Feasible range of fan measurement `key` across every entered fan triangle
/// it sides; `None` when the triangles admit no common value.
pub(crate) fn fan_range(graph: &MeasurementGraph<'_>, key: MeasurementKey) -> Option<FeasibleRange> {
    let map = graph.map();
    let mut range: Option<FeasibleRange> = None;
    for tri in fan_triangle_sides(graph.corner_count(), |k| map.get(k))
        .into_iter()
        .filter_map(Result::ok)
    {
        if let Some(s) = tri.keys.iter().position(|k| *k == key) {
            let r = range_for_side(&tri, s);
            range = Some(match range {
                None => r,
                Some(acc) => acc.intersect(&r)?,
            });
        }
    }
    range
}

/// Range for side `s` given the other two sides of the triangle.
pub(crate) fn range_for_side(tri: &FanTriangle, s: usize) -> FeasibleRange {
    let x = tri.sides[(s + 1) % 3];
    let y = tri.sides[(s + 2) % 3];
    FeasibleRange::third_side(x, y)
}

/// Check each fan triangle whose three sides are entered.
pub(crate) fn check_fan(graph: &MeasurementGraph<'_>, cfg: &ValidationCfg) -> Vec<ValidationIssue> {
    let n = graph.corner_count();
    let map = graph.map();
    fan_triangle_sides(n, |k| map.get(k))
        .into_iter()
        .filter_map(Result::ok)
        .filter(|tri| !tri.closes())
        .map(|tri| {
            let s = suspect_side(&tri, graph, cfg);
            let range = range_for_side(&tri, s);
            let suspect = tri.keys[s];
            let entered = tri.sides[s];
            let message = format!(
                "Triangle {} cannot close: {} is {} but must be more than {} and less than {}",
                tri.label(),
                suspect,
                format_primary(entered, cfg.unit),
                format_primary(range.min_mm, cfg.unit),
                format_primary(range.max_mm, cfg.unit),
            );
            tracing::debug!(triangle = %tri.label(), %suspect, entered, "fan triangle open");
            let mut issue = ValidationIssue::new(IssueKind::Infeasible, tri.keys.to_vec(), message);
            issue.suspect = Some(suspect);
            issue.triangle = Some(tri.corners);
            issue.feasible_range = Some(range);
            issue
        })
        .collect()
}
