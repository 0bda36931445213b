//! Measurement graph: corners as nodes, entered lengths as weighted edges.
//!
//! Purpose
//! - Generate the canonical edge/diagonal key sets for an N-corner sail.
//! - Answer "which lengths are known" questions for the reconstruction and
//!   the cross-checks without per-corner-count literal lists.
//!
//! Conventions
//! - Corners are indexed 0..N in polygon order and labelled A, B, C, ….
//! - Every diagonal is tracked, not only the N−3 that triangulate; the extra
//!   ones over-determine the shape for cross-validation.
//! - The fan is anchored at A: all N edges plus A–C … A–(N−2).

mod key;
mod map;

use std::ops::RangeInclusive;

pub use key::{corner_label, KeyError, KeyKind, MeasurementKey, MAX_LABELS};
pub use map::MeasurementMap;

/// Corner counts the engine accepts.
pub const SUPPORTED_CORNERS: RangeInclusive<usize> = 3..=6;

#[inline]
pub fn is_supported(n: usize) -> bool {
    SUPPORTED_CORNERS.contains(&n)
}

/// Edge keys in polygon order for any `3 <= n <= MAX_LABELS`.
pub(crate) fn edge_keys_any(n: usize) -> Vec<MeasurementKey> {
    if !(3..=MAX_LABELS).contains(&n) {
        return Vec::new();
    }
    (0..n)
        .filter_map(|i| MeasurementKey::new(i, (i + 1) % n))
        .collect()
}

/// Diagonal keys sorted canonically for any `3 <= n <= MAX_LABELS`.
pub(crate) fn diagonal_keys_any(n: usize) -> Vec<MeasurementKey> {
    if !(3..=MAX_LABELS).contains(&n) {
        return Vec::new();
    }
    let mut out = Vec::with_capacity(n * (n - 3) / 2);
    for i in 0..n {
        for j in (i + 1)..n {
            if let Some(k) = MeasurementKey::new(i, j) {
                if k.kind(n) == Some(KeyKind::Diagonal) {
                    out.push(k);
                }
            }
        }
    }
    out
}

/// The N consecutive-pair keys in polygon order (AB, BC, …, closing A–last).
/// Empty for unsupported corner counts.
pub fn edge_keys(n: usize) -> Vec<MeasurementKey> {
    if !is_supported(n) {
        return Vec::new();
    }
    edge_keys_any(n)
}

/// All non-adjacent pairs, sorted (4 → [AC, BD]). Empty for unsupported counts.
pub fn diagonal_keys(n: usize) -> Vec<MeasurementKey> {
    if !is_supported(n) {
        return Vec::new();
    }
    diagonal_keys_any(n)
}

/// Diagonals from A to every non-adjacent corner (A–C … A–(N−2)).
pub fn fan_diagonal_keys(n: usize) -> Vec<MeasurementKey> {
    if !is_supported(n) {
        return Vec::new();
    }
    (2..n - 1).filter_map(|j| MeasurementKey::new(0, j)).collect()
}

/// Corner triples of the fan triangles `(A, i, i+1)` for `i in 1..n-1`.
pub fn fan_triangles(n: usize) -> impl Iterator<Item = [usize; 3]> {
    (1..n.saturating_sub(1)).map(|i| [0, i, i + 1])
}

/// Read-only view of a measurement map for one corner count.
#[derive(Clone, Copy, Debug)]
pub struct MeasurementGraph<'a> {
    n: usize,
    map: &'a MeasurementMap,
}

impl<'a> MeasurementGraph<'a> {
    /// `None` when `n` is unsupported.
    pub fn new(n: usize, map: &'a MeasurementMap) -> Option<Self> {
        is_supported(n).then_some(Self { n, map })
    }

    #[inline]
    pub fn corner_count(&self) -> usize {
        self.n
    }

    #[inline]
    pub fn map(&self) -> &'a MeasurementMap {
        self.map
    }

    /// Entered length between corners `i` and `j`, if any.
    #[inline]
    pub fn length(&self, i: usize, j: usize) -> Option<f64> {
        MeasurementKey::new(i, j)
            .filter(|k| k.fits(self.n))
            .and_then(|k| self.map.get(k))
    }

    /// Fan measurements in placement order: AB, then per triangle the edge
    /// i–(i+1) and the A–(i+1) side.
    pub fn fan_keys(&self) -> Vec<MeasurementKey> {
        let mut out = Vec::with_capacity(2 * self.n - 3);
        out.extend(MeasurementKey::new(0, 1));
        for [a, i, j] in fan_triangles(self.n) {
            out.extend(MeasurementKey::new(i, j));
            out.extend(MeasurementKey::new(a, j));
        }
        out
    }

    pub fn missing_fan(&self) -> Vec<MeasurementKey> {
        self.fan_keys()
            .into_iter()
            .filter(|k| !self.map.contains(*k))
            .collect()
    }

    pub fn is_fan_complete(&self) -> bool {
        self.fan_keys().into_iter().all(|k| self.map.contains(k))
    }

    /// Entered diagonals not anchored at A, in canonical order.
    pub fn cross_checks(&self) -> Vec<(MeasurementKey, f64)> {
        diagonal_keys_any(self.n)
            .into_iter()
            .filter(|k| !k.is_fan_diagonal(self.n))
            .filter_map(|k| self.map.get(k).map(|v| (k, v)))
            .collect()
    }

    /// Entered edges in polygon order.
    pub fn entered_edges(&self) -> Vec<(MeasurementKey, f64)> {
        edge_keys_any(self.n)
            .into_iter()
            .filter_map(|k| self.map.get(k).map(|v| (k, v)))
            .collect()
    }

    /// Known neighbours of corner `i` with their lengths.
    pub fn neighbours(&self, i: usize) -> impl Iterator<Item = (usize, f64)> + '_ {
        (0..self.n)
            .filter(move |&j| j != i)
            .filter_map(move |j| self.length(i, j).map(|len| (j, len)))
    }

    /// Entered keys that do not belong to this polygon (e.g. "AF" on four corners).
    pub fn foreign_keys(&self) -> Vec<MeasurementKey> {
        self.map
            .iter()
            .map(|(k, _)| k)
            .filter(|k| !k.fits(self.n))
            .collect()
    }
}

#[cfg(test)]
mod tests;
