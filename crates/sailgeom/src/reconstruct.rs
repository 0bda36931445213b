//! Fan reconstruction: corner coordinates from the fan measurements.
//!
//! Model
//! - A sits at the origin, B on the +x ray at |AB|.
//! - Each fan triangle (A, i, i+1) contributes the angle at A from the law of
//!   cosines; the angles accumulate counter-clockwise and place corner i+1 at
//!   distance |A(i+1)| on the accumulated ray.
//! - O(N), no iteration. The fan diagonals are assumed to run inside the sail
//!   (convex sails), so every fan angle is taken as positive.
//!
//! Failure
//! - Missing fan measurement → `Incomplete` (not attempted).
//! - A fan triangle that does not close → `Infeasible`.

use nalgebra::Vector2;
use thiserror::Error;

use crate::graph::{fan_triangles, MeasurementGraph, MeasurementKey};
use crate::tolerance::{closes, COS_CLAMP};

/// One fan triangle with sides a = |A·i|, b = |i·(i+1)|, c = |A·(i+1)|.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FanTriangle {
    pub corners: [usize; 3],
    pub keys: [MeasurementKey; 3],
    pub sides: [f64; 3],
}

impl FanTriangle {
    pub fn closes(&self) -> bool {
        let [a, b, c] = self.sides;
        closes(a, b, c)
    }

    /// Interior angle at A (radians).
    pub fn angle_at_anchor(&self) -> f64 {
        let [a, b, c] = self.sides;
        let cos = ((a * a + c * c - b * b) / (2.0 * a * c)).clamp(-COS_CLAMP, COS_CLAMP);
        cos.acos()
    }

    pub fn label(&self) -> String {
        self.corners
            .iter()
            .filter_map(|&i| crate::graph::corner_label(i))
            .collect()
    }
}

/// Heron's formula; 0 for triangles that do not close.
pub fn heron_area(a: f64, b: f64, c: f64) -> f64 {
    let s = 0.5 * (a + b + c);
    let sq = s * (s - a) * (s - b) * (s - c);
    if sq > 0.0 {
        sq.sqrt()
    } else {
        0.0
    }
}

/// Why a placement could not be produced.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ReconstructError {
    #[error("missing fan measurements: {}", join_keys(.missing))]
    Incomplete { missing: Vec<MeasurementKey> },
    #[error("fan triangle {label} does not close")]
    Infeasible { triangle: [usize; 3], label: String },
}

fn join_keys(keys: &[MeasurementKey]) -> String {
    keys.iter()
        .map(|k| k.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Planar corner coordinates in mm, counter-clockwise from A.
#[derive(Clone, Debug, PartialEq)]
pub struct Placement {
    pub points: Vec<Vector2<f64>>,
}

impl Placement {
    #[inline]
    pub fn distance(&self, i: usize, j: usize) -> f64 {
        (self.points[i] - self.points[j]).norm()
    }

    /// Signed shoelace area (mm²), positive for counter-clockwise order.
    pub fn signed_area_mm2(&self) -> f64 {
        let n = self.points.len();
        let twice: f64 = (0..n)
            .map(|k| {
                let p = self.points[k];
                let q = self.points[(k + 1) % n];
                p.x * q.y - p.y * q.x
            })
            .sum();
        0.5 * twice
    }

    pub fn area_mm2(&self) -> f64 {
        self.signed_area_mm2().abs()
    }
}

/// Fan triangles in fan order; `Err(corners)` where a side is not known.
/// `lookup` supplies each length so callers can substitute one measurement.
pub(crate) fn fan_triangle_sides<F>(n: usize, lookup: F) -> Vec<Result<FanTriangle, [usize; 3]>>
where
    F: Fn(MeasurementKey) -> Option<f64>,
{
    fan_triangles(n)
        .map(|corners| {
            let [a, i, j] = corners;
            let keys = match (
                MeasurementKey::new(a, i),
                MeasurementKey::new(i, j),
                MeasurementKey::new(a, j),
            ) {
                (Some(ka), Some(kb), Some(kc)) => [ka, kb, kc],
                _ => return Err(corners),
            };
            match (lookup(keys[0]), lookup(keys[1]), lookup(keys[2])) {
                (Some(sa), Some(sb), Some(sc)) => Ok(FanTriangle {
                    corners,
                    keys,
                    sides: [sa, sb, sc],
                }),
                _ => Err(corners),
            }
        })
        .collect()
}

/// Place every corner from the graph's fan measurements.
pub fn reconstruct(graph: &MeasurementGraph<'_>) -> Result<Placement, ReconstructError> {
    reconstruct_with(graph, None)
}

/// As `reconstruct`, with one measurement replaced by `(key, mm)`.
pub fn reconstruct_with(
    graph: &MeasurementGraph<'_>,
    substitute: Option<(MeasurementKey, f64)>,
) -> Result<Placement, ReconstructError> {
    let map = graph.map();
    let lookup = |k: MeasurementKey| match substitute {
        Some((sk, v)) if sk == k => Some(v),
        _ => map.get(k),
    };
    let missing: Vec<MeasurementKey> = graph
        .fan_keys()
        .into_iter()
        .filter(|k| lookup(*k).is_none())
        .collect();
    if !missing.is_empty() {
        return Err(ReconstructError::Incomplete { missing });
    }

    let n = graph.corner_count();
    let mut points = vec![Vector2::zeros(); n];
    let ab = MeasurementKey::new(0, 1)
        .and_then(lookup)
        .ok_or_else(|| ReconstructError::Incomplete {
            missing: MeasurementKey::new(0, 1).into_iter().collect(),
        })?;
    points[1] = Vector2::new(ab, 0.0);

    let mut heading = 0.0_f64;
    for tri in fan_triangle_sides(n, lookup) {
        let tri = tri.map_err(|_| ReconstructError::Incomplete {
            missing: graph.missing_fan(),
        })?;
        if !tri.closes() {
            return Err(ReconstructError::Infeasible {
                triangle: tri.corners,
                label: tri.label(),
            });
        }
        heading += tri.angle_at_anchor();
        let c = tri.sides[2];
        points[tri.corners[2]] = Vector2::new(c * heading.cos(), c * heading.sin());
    }
    tracing::trace!(corners = n, heading, "fan placed");
    Ok(Placement { points })
}
