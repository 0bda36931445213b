//! Phase 2: compare every entered cross-check diagonal with the placement.
//!
//! Attribution
//! - Default: each mismatched cross-check diagonal is flagged and offered the
//!   placed distance as its correction. A flag costs one keystroke when a
//!   single dropped, doubled or swapped digit of the entered value lands
//!   within tolerance of the placed distance.
//! - A single wrong fan measurement bends the whole placement and usually
//!   shows up as several mismatches. A fan measurement is a candidate culprit
//!   when one of its one-keystroke variants brings every cross-check within
//!   tolerance. A-diagonals may also be re-fit over their feasible range;
//!   edges are only blamed through a one-keystroke variant.
//! - Candidates are ranked by (flagged keys, keystroke distance, diagonal
//!   before edge, key). A candidate replaces the default only when it flags
//!   fewer keys, or as many keys with fewer keystrokes.

use crate::graph::{KeyKind, MeasurementGraph, MeasurementKey};
use crate::reconstruct::{reconstruct_with, Placement};
use crate::tolerance::{cross_check_threshold, ValidationCfg};
use crate::units::{format_primary, round_to_display_precision};

use super::feasibility::fan_range;
use super::typo::{keystrokes, one_keystroke_variants};
use super::types::{FeasibleRange, IssueKind, ValidationIssue};

/// Coarse samples across a candidate's feasible range.
const GRID_SAMPLES: usize = 64;
/// Golden-section steps around the best sample.
const REFINE_STEPS: usize = 48;

#[derive(Clone, Copy, Debug)]
struct Check {
    key: MeasurementKey,
    entered: f64,
}

impl Check {
    fn placed(&self, p: &Placement) -> f64 {
        let (i, j) = self.key.corners();
        p.distance(i, j)
    }

    fn misfit(&self, p: &Placement, cfg: &ValidationCfg) -> bool {
        cfg.mismatch(self.entered, self.placed(p))
    }

    /// Residual in units of the mismatch threshold.
    fn scaled_residual(&self, p: &Placement, cfg: &ValidationCfg) -> f64 {
        let t = cross_check_threshold(self.entered, cfg.rel_tol, cfg.floor_mm);
        (self.placed(p) - self.entered) / t
    }
}

#[derive(Clone, Debug)]
struct Flag {
    key: MeasurementKey,
    entered: f64,
    suggested: f64,
    keystrokes: usize,
    /// Cross-checks that pointed at `key` (empty when the key flags itself).
    evidence: Vec<MeasurementKey>,
}

#[derive(Clone, Debug)]
struct Explanation {
    flags: Vec<Flag>,
    keystrokes: usize,
    touches_edge: bool,
}

impl Explanation {
    fn new(flags: Vec<Flag>, n: usize) -> Self {
        let keystrokes = flags.iter().map(|f| f.keystrokes).sum();
        let touches_edge = flags.iter().any(|f| f.key.kind(n) == Some(KeyKind::Edge));
        Self {
            flags,
            keystrokes,
            touches_edge,
        }
    }

    fn rank(&self) -> (usize, usize) {
        (self.flags.len(), self.keystrokes)
    }

    fn order_key(&self) -> (usize, usize, bool, Option<MeasurementKey>) {
        (
            self.flags.len(),
            self.keystrokes,
            self.touches_edge,
            self.flags.first().map(|f| f.key),
        )
    }
}

pub(crate) fn cross_check(
    graph: &MeasurementGraph<'_>,
    placement: &Placement,
    cfg: &ValidationCfg,
) -> Vec<ValidationIssue> {
    let checks: Vec<Check> = graph
        .cross_checks()
        .into_iter()
        .map(|(key, entered)| Check { key, entered })
        .collect();
    let mismatched: Vec<(Check, f64)> = checks
        .iter()
        .filter(|c| c.misfit(placement, cfg))
        .map(|c| (*c, c.placed(placement)))
        .collect();
    if mismatched.is_empty() {
        return Vec::new();
    }

    let n = graph.corner_count();
    let baseline = Explanation::new(
        mismatched
            .iter()
            .map(|(c, placed)| {
                let suggested = round_to_display_precision(*placed, cfg.unit);
                let keystrokes = if one_keystroke_from(c.entered, *placed, cfg) {
                    1
                } else {
                    keystrokes(c.entered, suggested, cfg.unit)
                };
                Flag {
                    key: c.key,
                    entered: c.entered,
                    suggested,
                    keystrokes,
                    evidence: Vec::new(),
                }
            })
            .collect(),
        n,
    );
    let evidence: Vec<MeasurementKey> = mismatched.iter().map(|(c, _)| c.key).collect();
    let best_alternative = graph
        .fan_keys()
        .into_iter()
        .filter_map(|f| refit(graph, &checks, f, &evidence, cfg))
        .min_by(|a, b| a.order_key().cmp(&b.order_key()));

    let chosen = match best_alternative {
        Some(alt) if alt.rank() < baseline.rank() => alt,
        _ => baseline,
    };
    tracing::debug!(
        mismatched = mismatched.len(),
        flagged = chosen.flags.len(),
        keystrokes = chosen.keystrokes,
        "cross-check attribution"
    );
    chosen.flags.into_iter().map(|f| to_issue(f, cfg)).collect()
}

fn to_issue(flag: Flag, cfg: &ValidationCfg) -> ValidationIssue {
    let message = if flag.evidence.is_empty() {
        format!(
            "{} does not match the other measurements: they give {}, entered {}",
            flag.key,
            format_primary(flag.suggested, cfg.unit),
            format_primary(flag.entered, cfg.unit),
        )
    } else {
        format!(
            "{} looks mistyped: the other measurements fit {}, entered {}",
            flag.key,
            format_primary(flag.suggested, cfg.unit),
            format_primary(flag.entered, cfg.unit),
        )
    };
    let mut involved = vec![flag.key];
    involved.extend(flag.evidence.iter().copied().filter(|k| *k != flag.key));
    let mut issue = ValidationIssue::new(IssueKind::SuspectedTypo, involved, message);
    issue.suspect = Some(flag.key);
    issue.suggested_correction_mm = Some(flag.suggested);
    issue
}

/// Whether one keystroke on `entered` gives a value within tolerance of `target`.
fn one_keystroke_from(entered: f64, target: f64, cfg: &ValidationCfg) -> bool {
    one_keystroke_variants(entered, cfg.unit)
        .into_iter()
        .any(|v| !cfg.mismatch(target, v))
}

/// Sum of squared scaled residuals over all cross-checks with `f` set to `x`.
fn misfit_score(
    graph: &MeasurementGraph<'_>,
    checks: &[Check],
    f: MeasurementKey,
    x: f64,
    cfg: &ValidationCfg,
) -> f64 {
    match reconstruct_with(graph, Some((f, x))) {
        Ok(p) => checks
            .iter()
            .map(|c| c.scaled_residual(&p, cfg).powi(2))
            .sum::<f64>(),
        Err(_) => f64::INFINITY,
    }
}

/// Whether every cross-check holds with `f` set to `x`.
fn closes_all(
    graph: &MeasurementGraph<'_>,
    checks: &[Check],
    f: MeasurementKey,
    x: f64,
    cfg: &ValidationCfg,
) -> bool {
    reconstruct_with(graph, Some((f, x)))
        .map(|p| !checks.iter().any(|c| c.misfit(&p, cfg)))
        .unwrap_or(false)
}

/// Best explanation of all cross-checks by fan measurement `f` alone, if any.
fn refit(
    graph: &MeasurementGraph<'_>,
    checks: &[Check],
    f: MeasurementKey,
    evidence: &[MeasurementKey],
    cfg: &ValidationCfg,
) -> Option<Explanation> {
    let n = graph.corner_count();
    let entered = graph.map().get(f)?;
    let range = fan_range(graph, f)?;

    let variant = one_keystroke_variants(entered, cfg.unit)
        .into_iter()
        .filter(|v| range.contains(*v) && closes_all(graph, checks, f, *v, cfg))
        .map(|v| (v, misfit_score(graph, checks, f, v, cfg)))
        .min_by(|a, b| a.1.total_cmp(&b.1));
    let (suggested, strokes) = match variant {
        Some((v, _)) => (v, 1),
        None if f.kind(n) == Some(KeyKind::Edge) => return None,
        None => {
            let x = minimize_in(range, |x| misfit_score(graph, checks, f, x, cfg));
            let suggested = round_to_display_precision(x, cfg.unit);
            if !cfg.mismatch(entered, suggested) || !closes_all(graph, checks, f, suggested, cfg) {
                return None;
            }
            (suggested, keystrokes(entered, suggested, cfg.unit))
        }
    };
    let flag = Flag {
        key: f,
        entered,
        suggested,
        keystrokes: strokes,
        evidence: evidence.to_vec(),
    };
    Some(Explanation::new(vec![flag], n))
}

/// Grid scan over the open range, then golden-section refinement around the
/// best sample. Deterministic and bounded.
fn minimize_in<F: Fn(f64) -> f64>(range: FeasibleRange, objective: F) -> f64 {
    let width = range.max_mm - range.min_mm;
    let step = width / GRID_SAMPLES as f64;
    let at = |k: usize| range.min_mm + step * (k as f64 + 0.5);
    let mut best_k = 0;
    let mut best_v = f64::INFINITY;
    for k in 0..GRID_SAMPLES {
        let v = objective(at(k));
        if v < best_v {
            best_k = k;
            best_v = v;
        }
    }

    let inner = width * 1e-9;
    let mut a = (at(best_k) - step).max(range.min_mm + inner);
    let mut b = (at(best_k) + step).min(range.max_mm - inner);
    let inv_phi = (5f64.sqrt() - 1.0) / 2.0;
    let mut c = b - inv_phi * (b - a);
    let mut d = a + inv_phi * (b - a);
    let mut fc = objective(c);
    let mut fd = objective(d);
    for _ in 0..REFINE_STEPS {
        if fc < fd {
            b = d;
            d = c;
            fd = fc;
            c = b - inv_phi * (b - a);
            fc = objective(c);
        } else {
            a = c;
            c = d;
            fc = fd;
            d = a + inv_phi * (b - a);
            fd = objective(d);
        }
    }
    let x = 0.5 * (a + b);
    if objective(x) <= best_v {
        x
    } else {
        at(best_k)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn minimizer_finds_interior_parabola_minimum() {
        let range = FeasibleRange {
            min_mm: 0.0,
            max_mm: 6000.0,
        };
        let x = minimize_in(range, |x| (x - 4242.64).powi(2));
        assert!((x - 4242.64).abs() < 1e-3);
    }

    #[test]
    fn minimizer_stays_inside_open_range() {
        let range = FeasibleRange {
            min_mm: 100.0,
            max_mm: 200.0,
        };
        let x = minimize_in(range, |x| x);
        assert!(x > 100.0 && x < 200.0);
    }
}
