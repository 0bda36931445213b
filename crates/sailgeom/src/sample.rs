//! Random convex sails (radial jitter + replay tokens) and typo injection.
//!
//! Model
//! - `n` equally spaced angles on [0, 2π) with bounded angular and radial
//!   jitter, counter-clockwise, so corner order is polygon order.
//! - Draws that are not strictly convex are retried from the same stream.
//! - Determinism: a replay token `(seed, index)` is mixed into one `StdRng`.
//!
//! Used by tests, benches and the CLI `sample` command.

use nalgebra::Vector2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};

use crate::graph::{MeasurementKey, MeasurementMap};
use crate::units::{display_digits, Unit};

/// Corner count distribution.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum CornerSpec {
    Fixed(usize),
    Uniform { min: usize, max: usize },
}

impl CornerSpec {
    fn sample<R: Rng>(&self, rng: &mut R) -> usize {
        match *self {
            CornerSpec::Fixed(n) => n.clamp(3, 6),
            CornerSpec::Uniform { min, max } => {
                let lo = min.clamp(3, 6);
                let hi = max.clamp(lo, 6);
                rng.gen_range(lo..=hi)
            }
        }
    }
}

#[derive(Clone, Copy, Debug, Serialize, Deserialize)]
pub struct SailCfg {
    pub corners: CornerSpec,
    /// Angular jitter as a fraction of the base spacing 2π/n. Clamped to [0, 0.45].
    pub angle_jitter_frac: f64,
    /// Relative radial jitter; radii are `span/2 * (1 + u)`, `u ∈ [-j, j]`.
    pub radial_jitter: f64,
    /// Nominal diameter of the sail in mm.
    pub span_mm: f64,
    /// Round every measurement to whole mm, as a tape would be read.
    pub whole_mm: bool,
}

impl Default for SailCfg {
    fn default() -> Self {
        Self {
            corners: CornerSpec::Uniform { min: 3, max: 6 },
            angle_jitter_frac: 0.25,
            radial_jitter: 0.15,
            span_mm: 6000.0,
            whole_mm: true,
        }
    }
}

/// Replay token to make draws reproducible and indexable.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReplayToken {
    pub seed: u64,
    pub index: u64,
}

impl ReplayToken {
    pub fn new(seed: u64, index: u64) -> Self {
        Self { seed, index }
    }

    fn rng(self) -> StdRng {
        fn mix(mut x: u64) -> u64 {
            x ^= x >> 30;
            x = x.wrapping_mul(0xbf58476d1ce4e5b9);
            x ^= x >> 27;
            x = x.wrapping_mul(0x94d049bb133111eb);
            x ^ (x >> 31)
        }
        StdRng::seed_from_u64(mix(self.seed ^ mix(self.index.wrapping_add(0x9e3779b97f4a7c15))))
    }
}

/// A drawn sail: true corner positions and every pairwise measurement.
#[derive(Clone, Debug)]
pub struct SampledSail {
    pub corners: Vec<Vector2<f64>>,
    pub measurements: MeasurementMap,
}

impl SampledSail {
    pub fn corner_count(&self) -> usize {
        self.corners.len()
    }

    /// Shoelace area of the true corners (mm²).
    pub fn area_mm2(&self) -> f64 {
        let n = self.corners.len();
        0.5 * (0..n)
            .map(|k| {
                let p = self.corners[k];
                let q = self.corners[(k + 1) % n];
                p.x * q.y - p.y * q.x
            })
            .sum::<f64>()
    }
}

const MAX_ATTEMPTS: usize = 32;

/// Draw a convex sail; `None` if no convex draw was found.
pub fn draw_sail(cfg: SailCfg, tok: ReplayToken) -> Option<SampledSail> {
    let mut rng = tok.rng();
    let n = cfg.corners.sample(&mut rng);
    let aj = cfg.angle_jitter_frac.clamp(0.0, 0.45);
    let rj = cfg.radial_jitter.clamp(0.0, 0.9);
    let r0 = (0.5 * cfg.span_mm).max(1.0);
    let delta = std::f64::consts::TAU / n as f64;

    for attempt in 0..MAX_ATTEMPTS {
        let corners: Vec<Vector2<f64>> = (0..n)
            .map(|k| {
                let theta = k as f64 * delta + (rng.gen::<f64>() * 2.0 - 1.0) * aj * delta;
                let r = r0 * (1.0 + (rng.gen::<f64>() * 2.0 - 1.0) * rj);
                Vector2::new(r * theta.cos(), r * theta.sin())
            })
            .collect();
        if is_strictly_convex(&corners) {
            let mut measurements = measure_all(&corners);
            if cfg.whole_mm {
                measurements = measurements.iter().map(|(k, v)| (k, v.round())).collect();
            }
            tracing::trace!(corners = n, attempt, "sail drawn");
            return Some(SampledSail {
                corners,
                measurements,
            });
        }
    }
    None
}

/// Counter-clockwise and strictly convex.
pub fn is_strictly_convex(points: &[Vector2<f64>]) -> bool {
    let n = points.len();
    n >= 3
        && (0..n).all(|k| {
            let a = points[k];
            let b = points[(k + 1) % n];
            let c = points[(k + 2) % n];
            let ab = b - a;
            let bc = c - b;
            ab.x * bc.y - ab.y * bc.x > 0.0
        })
}

/// Every pairwise distance between `points`, keyed canonically.
pub fn measure_all(points: &[Vector2<f64>]) -> MeasurementMap {
    let mut map = MeasurementMap::new();
    for i in 0..points.len() {
        for j in (i + 1)..points.len() {
            if let Some(k) = MeasurementKey::new(i, j) {
                map.insert(k, (points[i] - points[j]).norm());
            }
        }
    }
    map
}

/// Typical slips when typing a length in whole millimeters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TypoKind {
    /// Last digit lost ("4243" → "424").
    DroppedDigit,
    /// First digit typed twice ("4243" → "44243").
    DoubledDigit,
    /// Second and third digits swapped ("4243" → "4423").
    SwappedDigits,
}

/// Copy of `map` with `key` mistyped; `None` if the key is absent or the slip
/// would not change the value.
pub fn inject_typo(map: &MeasurementMap, key: MeasurementKey, kind: TypoKind) -> Option<MeasurementMap> {
    let entered = map.get(key)?;
    let mut digits: Vec<char> = display_digits(entered, Unit::Metric).chars().collect();
    match kind {
        TypoKind::DroppedDigit => {
            digits.pop();
        }
        TypoKind::DoubledDigit => {
            let first = *digits.first()?;
            digits.insert(0, first);
        }
        TypoKind::SwappedDigits => {
            if digits.len() < 3 || digits[1] == digits[2] {
                return None;
            }
            digits.swap(1, 2);
        }
    }
    let typed: f64 = digits.iter().collect::<String>().parse().ok()?;
    if typed == entered.round() {
        return None;
    }
    let mut next = map.clone();
    next.insert(key, typed).then_some(next)
}
