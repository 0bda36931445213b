//! Canonical corner-pair keys ("AC", "BD", …).

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Letters available for corner labels.
pub const MAX_LABELS: usize = 26;

/// Label for corner `index` (0 → 'A').
#[inline]
pub fn corner_label(index: usize) -> Option<char> {
    (index < MAX_LABELS).then(|| (b'A' + index as u8) as char)
}

fn corner_index(label: char) -> Option<usize> {
    label
        .is_ascii_uppercase()
        .then(|| (label as u8 - b'A') as usize)
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum KeyError {
    #[error("measurement key must be exactly two letters, got {0:?}")]
    Length(String),
    #[error("measurement key {0:?} contains a non-corner character")]
    Label(String),
    #[error("measurement key {0:?} joins a corner to itself")]
    SameCorner(String),
}

/// Unordered corner pair, stored with the lower index first.
///
/// Invariant: `lo < hi < MAX_LABELS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MeasurementKey {
    lo: u8,
    hi: u8,
}

/// Edge or diagonal, relative to a corner count.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum KeyKind {
    Edge,
    Diagonal,
}

impl MeasurementKey {
    /// Pair in either order; `None` for `i == j` or labels beyond 'Z'.
    pub fn new(i: usize, j: usize) -> Option<Self> {
        if i == j || i >= MAX_LABELS || j >= MAX_LABELS {
            return None;
        }
        let (lo, hi) = if i < j { (i, j) } else { (j, i) };
        Some(Self {
            lo: lo as u8,
            hi: hi as u8,
        })
    }

    #[inline]
    pub fn corners(self) -> (usize, usize) {
        (self.lo as usize, self.hi as usize)
    }

    /// Whether both corners exist on an `n`-corner polygon.
    #[inline]
    pub fn fits(self, n: usize) -> bool {
        (self.hi as usize) < n
    }

    /// `None` when the key does not belong to an `n`-corner polygon.
    pub fn kind(self, n: usize) -> Option<KeyKind> {
        if n < 3 || !self.fits(n) {
            return None;
        }
        let (lo, hi) = self.corners();
        if hi - lo == 1 || (lo == 0 && hi == n - 1) {
            Some(KeyKind::Edge)
        } else {
            Some(KeyKind::Diagonal)
        }
    }

    /// Diagonals from corner A.
    #[inline]
    pub fn is_fan_diagonal(self, n: usize) -> bool {
        self.lo == 0 && self.kind(n) == Some(KeyKind::Diagonal)
    }
}

impl fmt::Display for MeasurementKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (lo, hi) = self.corners();
        // Invariant guarantees both labels exist.
        let a = corner_label(lo).unwrap_or('?');
        let b = corner_label(hi).unwrap_or('?');
        write!(f, "{a}{b}")
    }
}

impl FromStr for MeasurementKey {
    type Err = KeyError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut chars = s.chars();
        let (Some(a), Some(b), None) = (chars.next(), chars.next(), chars.next()) else {
            return Err(KeyError::Length(s.to_string()));
        };
        let (Some(i), Some(j)) = (corner_index(a), corner_index(b)) else {
            return Err(KeyError::Label(s.to_string()));
        };
        Self::new(i, j).ok_or_else(|| KeyError::SameCorner(s.to_string()))
    }
}

impl TryFrom<String> for MeasurementKey {
    type Error = KeyError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MeasurementKey> for String {
    fn from(key: MeasurementKey) -> Self {
        key.to_string()
    }
}
