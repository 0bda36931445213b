//! Caller-owned cache of evaluations keyed by configuration content.
//!
//! A memo owns the engine it evaluates with, so every cached entry was priced
//! by the same rate table and tolerances.

use std::collections::HashMap;

use crate::config::ShadeConfiguration;
use crate::engine::{Engine, Evaluation};
use crate::metrics::{RateTable, TieredRates};

const DEFAULT_CAPACITY: usize = 64;

#[derive(Clone, Debug)]
pub struct CalcMemo<R = TieredRates> {
    engine: Engine<R>,
    entries: HashMap<u64, (ShadeConfiguration, Evaluation)>,
    capacity: usize,
    hits: u64,
    misses: u64,
}

impl<R: RateTable + Default> Default for CalcMemo<R> {
    fn default() -> Self {
        Self::new(Engine::default())
    }
}

impl<R: RateTable> CalcMemo<R> {
    pub fn new(engine: Engine<R>) -> Self {
        Self::with_capacity(engine, DEFAULT_CAPACITY)
    }

    pub fn with_capacity(engine: Engine<R>, capacity: usize) -> Self {
        Self {
            engine,
            entries: HashMap::new(),
            capacity: capacity.max(1),
            hits: 0,
            misses: 0,
        }
    }

    pub fn engine(&self) -> &Engine<R> {
        &self.engine
    }

    /// Cached evaluation of `config`, computing it on a miss.
    /// A hash hit whose stored configuration differs counts as a miss.
    pub fn evaluate(&mut self, config: &ShadeConfiguration) -> Evaluation {
        let key = config.content_hash();
        if let Some((stored, eval)) = self.entries.get(&key) {
            if stored == config {
                self.hits += 1;
                return eval.clone();
            }
        }
        self.misses += 1;
        let eval = self.engine.evaluate(config);
        if self.entries.len() >= self.capacity && !self.entries.contains_key(&key) {
            tracing::trace!(capacity = self.capacity, "memo full, clearing");
            self.entries.clear();
        }
        self.entries.insert(key, (config.clone(), eval.clone()));
        eval
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// (hits, misses)
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::FixingPoint;

    fn triangle(ca: f64) -> ShadeConfiguration {
        let mut cfg = ShadeConfiguration::new(3);
        for (k, v) in [("AB", 3000.0), ("BC", 4000.0), ("CA", ca)] {
            cfg.measurements.insert(k.parse().unwrap(), v);
        }
        cfg
    }

    #[test]
    fn repeated_configuration_hits() {
        let mut memo = CalcMemo::<TieredRates>::default();
        let a = memo.evaluate(&triangle(5000.0));
        let b = memo.evaluate(&triangle(5000.0));
        assert_eq!(a, b);
        assert_eq!(a, memo.engine().evaluate(&triangle(5000.0)));
        assert_eq!(memo.stats(), (1, 1));
    }

    #[test]
    fn changed_value_misses() {
        let mut memo = CalcMemo::<TieredRates>::default();
        let a = memo.evaluate(&triangle(5000.0));
        let b = memo.evaluate(&triangle(4500.0));
        assert_ne!(a.calculations.area_m2, b.calculations.area_m2);
        assert_eq!(memo.stats(), (0, 2));
        assert_eq!(memo.len(), 2);
    }

    #[test]
    fn unhashed_fields_are_still_compared() {
        let mut memo = CalcMemo::<TieredRates>::default();
        memo.evaluate(&triangle(5000.0));
        let mut other = triangle(5000.0);
        other.fixing_points.push(FixingPoint::default());
        memo.evaluate(&other);
        assert_eq!(memo.stats(), (0, 2));
        assert_eq!(memo.len(), 1);
    }

    #[test]
    fn capacity_is_bounded() {
        let mut memo = CalcMemo::with_capacity(Engine::new(TieredRates::default()), 2);
        for ca in [5000.0, 4900.0, 4800.0] {
            memo.evaluate(&triangle(ca));
        }
        assert!(memo.len() <= 2);
        memo.clear();
        assert!(memo.is_empty());
    }

    #[test]
    fn each_memo_prices_with_its_own_rates() {
        let mut pricey = TieredRates::default();
        for tier in &mut pricey.tiers {
            tier.cabled_price_per_m *= 10.0;
        }
        let cfg = triangle(5000.0);
        let mut cheap_memo = CalcMemo::new(Engine::new(TieredRates::default()));
        let mut pricey_memo = CalcMemo::new(Engine::new(pricey.clone()));

        let cheap = cheap_memo.evaluate(&cfg).calculations.total_price_minor;
        let dear = pricey_memo.evaluate(&cfg).calculations.total_price_minor;
        assert_ne!(cheap, dear);
        assert_eq!(dear, Engine::new(pricey).compute(&cfg).total_price_minor);
        assert_eq!(pricey_memo.evaluate(&cfg).calculations.total_price_minor, dear);
        assert_eq!(pricey_memo.stats(), (1, 1));
    }
}
