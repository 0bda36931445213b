//! Derived quantities: area, perimeter, edge hardware, weight, price.
//!
//! Everything area-based is zero while the geometry is incomplete or
//! infeasible; perimeter is always the sum of the entered edges.
//! Manufacturing rates come from an injected `RateTable`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::config::{EdgeFinish, ShadeConfiguration};
use crate::graph::MeasurementGraph;
use crate::reconstruct::Placement;
use crate::units::MM2_PER_M2;

/// Edge reinforcement size for the chosen finish.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum EdgeHardware {
    WireThickness { mm: f64 },
    WebbingWidth { mm: f64 },
}

impl EdgeHardware {
    pub fn mm(&self) -> f64 {
        match *self {
            EdgeHardware::WireThickness { mm } | EdgeHardware::WebbingWidth { mm } => mm,
        }
    }
}

/// Edge sizing plus its running price (base currency per metre).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct EdgeSizing {
    pub hardware: EdgeHardware,
    pub price_per_m: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HardwarePack {
    pub price: f64,
    pub weight_grams: f64,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CurrencyRate {
    /// Units of this currency per unit of the base currency.
    pub per_base: f64,
    /// Digits of the minor unit (2 for cents, 0 for yen).
    pub minor_digits: u32,
}

impl Default for CurrencyRate {
    fn default() -> Self {
        Self {
            per_base: 1.0,
            minor_digits: 2,
        }
    }
}

/// Manufacturing and pricing lookups.
///
/// Implementations must keep `edge_sizing` monotonic: a larger area never
/// selects thinner wire or narrower webbing.
pub trait RateTable {
    fn edge_sizing(&self, finish: EdgeFinish, area_m2: f64, perimeter_mm: f64) -> EdgeSizing;
    fn hardware_pack(&self, corner_count: usize) -> Option<HardwarePack>;
    fn currency(&self, code: &str) -> Option<CurrencyRate>;
}

/// One size band of edge hardware, selected by area.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EdgeTier {
    pub max_area_m2: f64,
    pub wire_mm: f64,
    pub webbing_mm: f64,
    pub cabled_price_per_m: f64,
    pub webbing_price_per_m: f64,
}

/// Table-driven rates, loadable from JSON.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TieredRates {
    pub tiers: Vec<EdgeTier>,
    pub hardware_packs: BTreeMap<usize, HardwarePack>,
    pub currencies: BTreeMap<String, CurrencyRate>,
}

impl TieredRates {
    /// Tiers sorted by area, for stable JSON output.
    pub fn normalized(mut self) -> Self {
        self.tiers
            .sort_by(|a, b| a.max_area_m2.total_cmp(&b.max_area_m2));
        self
    }
}

impl Default for TieredRates {
    fn default() -> Self {
        let tier = |max_area_m2, wire_mm, webbing_mm, cabled_price_per_m, webbing_price_per_m| EdgeTier {
            max_area_m2,
            wire_mm,
            webbing_mm,
            cabled_price_per_m,
            webbing_price_per_m,
        };
        let pack = |price, weight_grams| HardwarePack {
            price,
            weight_grams,
        };
        let rate = |per_base, minor_digits| CurrencyRate {
            per_base,
            minor_digits,
        };
        Self {
            tiers: vec![
                tier(12.0, 4.0, 50.0, 6.0, 4.5),
                tier(25.0, 5.0, 50.0, 7.5, 5.5),
                tier(40.0, 6.0, 75.0, 9.0, 7.0),
                tier(1.0e6, 8.0, 75.0, 12.0, 9.0),
            ],
            hardware_packs: BTreeMap::from([
                (3, pack(89.0, 1800.0)),
                (4, pack(109.0, 2400.0)),
                (5, pack(129.0, 3000.0)),
                (6, pack(149.0, 3600.0)),
            ]),
            currencies: BTreeMap::from([
                ("USD".to_string(), rate(1.0, 2)),
                ("AUD".to_string(), rate(1.52, 2)),
                ("CAD".to_string(), rate(1.36, 2)),
                ("EUR".to_string(), rate(0.92, 2)),
                ("GBP".to_string(), rate(0.79, 2)),
                ("NZD".to_string(), rate(1.65, 2)),
                ("JPY".to_string(), rate(149.0, 0)),
            ]),
        }
    }
}

impl RateTable for TieredRates {
    fn edge_sizing(&self, finish: EdgeFinish, area_m2: f64, _perimeter_mm: f64) -> EdgeSizing {
        // Smallest band covering the area, else the largest band.
        let by_area = |a: &&EdgeTier, b: &&EdgeTier| a.max_area_m2.total_cmp(&b.max_area_m2);
        let tier = self
            .tiers
            .iter()
            .filter(|t| area_m2 <= t.max_area_m2)
            .min_by(by_area)
            .or_else(|| self.tiers.iter().max_by(by_area))
            .copied()
            .unwrap_or(EdgeTier {
                max_area_m2: f64::MAX,
                wire_mm: 0.0,
                webbing_mm: 0.0,
                cabled_price_per_m: 0.0,
                webbing_price_per_m: 0.0,
            });
        match finish {
            EdgeFinish::Cabled => EdgeSizing {
                hardware: EdgeHardware::WireThickness { mm: tier.wire_mm },
                price_per_m: tier.cabled_price_per_m,
            },
            EdgeFinish::Webbing => EdgeSizing {
                hardware: EdgeHardware::WebbingWidth { mm: tier.webbing_mm },
                price_per_m: tier.webbing_price_per_m,
            },
        }
    }

    fn hardware_pack(&self, corner_count: usize) -> Option<HardwarePack> {
        self.hardware_packs.get(&corner_count).copied()
    }

    fn currency(&self, code: &str) -> Option<CurrencyRate> {
        self.currencies.get(&code.to_ascii_uppercase()).copied()
    }
}

/// Results derived from one configuration. Never persisted by the engine.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadeCalculations {
    pub area_m2: f64,
    pub perimeter_mm: f64,
    pub total_price_minor: i64,
    pub total_weight_grams: f64,
    pub edge_hardware: Option<EdgeHardware>,
}

impl ShadeCalculations {
    pub fn wire_thickness_mm(&self) -> Option<f64> {
        match self.edge_hardware {
            Some(EdgeHardware::WireThickness { mm }) => Some(mm),
            _ => None,
        }
    }

    pub fn webbing_width_mm(&self) -> Option<f64> {
        match self.edge_hardware {
            Some(EdgeHardware::WebbingWidth { mm }) => Some(mm),
            _ => None,
        }
    }
}

/// Round a base-currency amount into the minor unit of `rate`.
pub fn to_minor_units(amount_base: f64, rate: CurrencyRate) -> i64 {
    let scale = 10f64.powi(rate.minor_digits as i32);
    (amount_base * rate.per_base * scale).round() as i64
}

/// Derive all quantities; `placement` is `None` when the geometry is not valid.
pub fn derive<R: RateTable + ?Sized>(
    config: &ShadeConfiguration,
    graph: Option<&MeasurementGraph<'_>>,
    placement: Option<&Placement>,
    rates: &R,
) -> ShadeCalculations {
    let perimeter_mm: f64 = graph
        .map(|g| g.entered_edges().iter().map(|(_, v)| v).sum())
        .unwrap_or(0.0);
    let Some(placement) = placement else {
        return ShadeCalculations {
            perimeter_mm,
            ..ShadeCalculations::default()
        };
    };

    let area_m2 = placement.area_mm2() / MM2_PER_M2;
    let sizing = rates.edge_sizing(config.edge_finish, area_m2, perimeter_mm);
    let pack = if config.semantics.includes_hardware() {
        rates.hardware_pack(config.corner_count)
    } else {
        None
    };
    if config.semantics.includes_hardware() && pack.is_none() {
        tracing::warn!(corners = config.corner_count, "no hardware pack in rate table");
    }

    let fabric_cost = area_m2 * config.fabric.price_per_m2;
    let edge_cost = perimeter_mm / 1000.0 * sizing.price_per_m;
    let hardware_cost = pack.map_or(0.0, |p| p.price);
    let currency = rates.currency(&config.currency).unwrap_or_else(|| {
        tracing::warn!(currency = %config.currency, "unknown currency, pricing in base");
        CurrencyRate::default()
    });
    let total_price_minor = to_minor_units(fabric_cost + edge_cost + hardware_cost, currency);

    let total_weight_grams =
        area_m2 * config.fabric.grams_per_m2 + pack.map_or(0.0, |p| p.weight_grams);

    ShadeCalculations {
        area_m2,
        perimeter_mm,
        total_price_minor,
        total_weight_grams,
        edge_hardware: Some(sizing.hardware),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_are_monotonic_in_area() {
        let rates = TieredRates::default();
        let mut last = 0.0;
        for area in [1.0, 12.0, 12.5, 30.0, 80.0] {
            let mm = rates.edge_sizing(EdgeFinish::Cabled, area, 0.0).hardware.mm();
            assert!(mm >= last);
            last = mm;
        }
        assert_eq!(
            rates.edge_sizing(EdgeFinish::Webbing, 5.0, 0.0).hardware,
            EdgeHardware::WebbingWidth { mm: 50.0 }
        );
    }

    #[test]
    fn minor_units_follow_currency() {
        let usd = CurrencyRate::default();
        assert_eq!(to_minor_units(12.345, usd), 1235);
        let jpy = CurrencyRate {
            per_base: 149.0,
            minor_digits: 0,
        };
        assert_eq!(to_minor_units(10.0, jpy), 1490);
    }

    #[test]
    fn normalized_sorts_tiers() {
        let mut rates = TieredRates::default();
        rates.tiers.reverse();
        let rates = rates.normalized();
        assert_eq!(rates.tiers[0].max_area_m2, 12.0);
    }

    #[test]
    fn unsorted_tiers_size_like_sorted_ones() {
        let sorted = TieredRates::default();
        let mut shuffled = TieredRates::default();
        shuffled.tiers.reverse();
        shuffled.tiers.swap(0, 2);
        for area in [0.5, 12.0, 12.5, 30.0, 41.0, 2.0e6] {
            for finish in [EdgeFinish::Cabled, EdgeFinish::Webbing] {
                assert_eq!(
                    shuffled.edge_sizing(finish, area, 0.0),
                    sorted.edge_sizing(finish, area, 0.0),
                    "{area} m²"
                );
            }
        }
        assert_eq!(
            shuffled.edge_sizing(EdgeFinish::Cabled, 2.0e6, 0.0).hardware,
            EdgeHardware::WireThickness { mm: 8.0 }
        );
    }

    #[test]
    fn rates_round_trip_through_json() {
        let rates = TieredRates::default();
        let json = serde_json::to_string(&rates).unwrap();
        let back: TieredRates = serde_json::from_str(&json).unwrap();
        assert_eq!(rates, back);
    }
}
