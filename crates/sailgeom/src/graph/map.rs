//! Sparse measurement storage.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::key::MeasurementKey;

/// Entered lengths in canonical mm.
///
/// Invariants:
/// - Every stored value is finite and `> 0`; absence means "not entered".
/// - Ordered by key, so iteration and hashing are deterministic.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "BTreeMap<MeasurementKey, f64>", into = "BTreeMap<MeasurementKey, f64>")]
pub struct MeasurementMap {
    lengths: BTreeMap<MeasurementKey, f64>,
}

#[inline]
fn acceptable(mm: f64) -> bool {
    mm.is_finite() && mm > 0.0
}

impl MeasurementMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `mm` under `key`; refuses (returns `false`) non-finite or non-positive values.
    pub fn insert(&mut self, key: MeasurementKey, mm: f64) -> bool {
        if !acceptable(mm) {
            return false;
        }
        self.lengths.insert(key, mm);
        true
    }

    /// Builder form of `insert`; silently skips refused values.
    pub fn with(mut self, key: MeasurementKey, mm: f64) -> Self {
        self.insert(key, mm);
        self
    }

    pub fn remove(&mut self, key: MeasurementKey) -> Option<f64> {
        self.lengths.remove(&key)
    }

    #[inline]
    pub fn get(&self, key: MeasurementKey) -> Option<f64> {
        self.lengths.get(&key).copied()
    }

    #[inline]
    pub fn contains(&self, key: MeasurementKey) -> bool {
        self.lengths.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.lengths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lengths.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (MeasurementKey, f64)> + '_ {
        self.lengths.iter().map(|(k, v)| (*k, *v))
    }

    /// Content hash over keys and exact bit patterns of the lengths.
    /// Computed with `DefaultHasher`: equal maps agree within one process, but
    /// values are not stable across builds and must not be persisted.
    pub fn content_hash(&self) -> u64 {
        let mut h = std::collections::hash_map::DefaultHasher::new();
        self.hash_into(&mut h);
        h.finish()
    }

    pub(crate) fn hash_into<H: Hasher>(&self, state: &mut H) {
        self.lengths.len().hash(state);
        for (k, v) in &self.lengths {
            k.hash(state);
            v.to_bits().hash(state);
        }
    }
}

impl From<BTreeMap<MeasurementKey, f64>> for MeasurementMap {
    fn from(raw: BTreeMap<MeasurementKey, f64>) -> Self {
        let lengths = raw.into_iter().filter(|(_, v)| acceptable(*v)).collect();
        Self { lengths }
    }
}

impl From<MeasurementMap> for BTreeMap<MeasurementKey, f64> {
    fn from(map: MeasurementMap) -> Self {
        map.lengths
    }
}

impl FromIterator<(MeasurementKey, f64)> for MeasurementMap {
    fn from_iter<I: IntoIterator<Item = (MeasurementKey, f64)>>(iter: I) -> Self {
        let mut map = Self::new();
        for (k, v) in iter {
            map.insert(k, v);
        }
        map
    }
}
