//! One-call evaluation of a configuration: validation plus derived metrics.

use serde::{Deserialize, Serialize};

use crate::config::ShadeConfiguration;
use crate::graph::MeasurementGraph;
use crate::metrics::{derive, RateTable, ShadeCalculations, TieredRates};
use crate::tolerance::ValidationCfg;
use crate::validate::{validate_graph, DismissalLedger, ValidationResult};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Evaluation {
    pub validation: ValidationResult,
    pub calculations: ShadeCalculations,
}

/// Stateless evaluator over an injected rate table.
#[derive(Clone, Debug, Default)]
pub struct Engine<R = TieredRates> {
    rates: R,
    policy: ValidationCfg,
}

impl<R: RateTable> Engine<R> {
    pub fn new(rates: R) -> Self {
        Self {
            rates,
            policy: ValidationCfg::default(),
        }
    }

    /// Override tolerances; the display unit still comes from each configuration.
    pub fn with_policy(mut self, policy: ValidationCfg) -> Self {
        self.policy = policy;
        self
    }

    pub fn rates(&self) -> &R {
        &self.rates
    }

    pub fn policy_for(&self, config: &ShadeConfiguration) -> ValidationCfg {
        ValidationCfg {
            unit: config.unit,
            ..self.policy
        }
    }

    pub fn evaluate(&self, config: &ShadeConfiguration) -> Evaluation {
        let cfg = self.policy_for(config);
        let Some(graph) = MeasurementGraph::new(config.corner_count, &config.measurements) else {
            tracing::debug!(corners = config.corner_count, "unsupported corner count");
            return Evaluation {
                validation: ValidationResult::unsupported(),
                calculations: ShadeCalculations::default(),
            };
        };
        let (validation, placement) = validate_graph(&graph, &cfg);
        let calculations = derive(config, Some(&graph), placement.as_ref(), &self.rates);
        tracing::trace!(
            corners = config.corner_count,
            valid = validation.is_valid,
            issues = validation.issues.len(),
            area_m2 = calculations.area_m2,
            "evaluated"
        );
        Evaluation {
            validation,
            calculations,
        }
    }

    /// As `evaluate`, with advisories for dismissed keys removed.
    pub fn evaluate_with(&self, config: &ShadeConfiguration, ledger: &DismissalLedger) -> Evaluation {
        let mut eval = self.evaluate(config);
        eval.validation = ledger.filter(&eval.validation, &config.measurements);
        eval
    }

    pub fn compute(&self, config: &ShadeConfiguration) -> ShadeCalculations {
        self.evaluate(config).calculations
    }

    pub fn validate(&self, config: &ShadeConfiguration) -> ValidationResult {
        self.evaluate(config).validation
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{EdgeFinish, FabricSelection, MeasurementSemantics};
    use crate::graph::{MeasurementKey, MeasurementMap};
    use crate::metrics::EdgeHardware;
    use crate::units::Unit;
    use crate::validate::IssueKind;

    fn key(s: &str) -> MeasurementKey {
        s.parse().unwrap()
    }

    fn config(n: usize, entries: &[(&str, f64)]) -> ShadeConfiguration {
        let mut cfg = ShadeConfiguration::new(n);
        cfg.measurements = entries.iter().map(|(k, v)| (key(k), *v)).collect::<MeasurementMap>();
        cfg.fabric = FabricSelection {
            id: "shadecloth-320".to_string(),
            color: None,
            grams_per_m2: 320.0,
            price_per_m2: 20.0,
        };
        cfg
    }

    fn right_triangle() -> ShadeConfiguration {
        config(3, &[("AB", 3000.0), ("BC", 4000.0), ("CA", 5000.0)])
    }

    #[test]
    fn right_triangle_metrics() {
        let eval = Engine::<TieredRates>::default().evaluate(&right_triangle());
        assert!(eval.validation.is_valid);
        let c = eval.calculations;
        assert!((c.area_m2 - 6.0).abs() < 1e-9);
        assert_eq!(c.perimeter_mm, 12_000.0);
        assert_eq!(c.edge_hardware, Some(EdgeHardware::WireThickness { mm: 4.0 }));
        // 6 m² × 20 + 12 m × 6.0 + 89 pack
        assert_eq!(c.total_price_minor, 28_100);
        assert!((c.total_weight_grams - (6.0 * 320.0 + 1800.0)).abs() < 1e-6);
    }

    #[test]
    fn finished_dimensions_exclude_hardware() {
        let mut cfg = right_triangle();
        cfg.semantics = MeasurementSemantics::FinishedSailDimensions;
        cfg.edge_finish = EdgeFinish::Webbing;
        let c = Engine::<TieredRates>::default().compute(&cfg);
        assert_eq!(c.total_price_minor, 12_000 + 5_400);
        assert!((c.total_weight_grams - 6.0 * 320.0).abs() < 1e-6);
        assert_eq!(c.webbing_width_mm(), Some(50.0));
        assert_eq!(c.wire_thickness_mm(), None);
    }

    #[test]
    fn square_area() {
        let cfg = config(
            4,
            &[
                ("AB", 3000.0),
                ("BC", 3000.0),
                ("CD", 3000.0),
                ("DA", 3000.0),
                ("AC", 4242.64),
                ("BD", 4242.64),
            ],
        );
        let c = Engine::<TieredRates>::default().compute(&cfg);
        assert!((c.area_m2 - 9.0).abs() < 0.01);
    }

    #[test]
    fn incomplete_geometry_reports_perimeter_only() {
        let cfg = config(4, &[("AB", 3000.0), ("BC", 3000.0), ("CD", 3000.0), ("DA", 3000.0)]);
        let c = Engine::<TieredRates>::default().compute(&cfg);
        assert_eq!(c.area_m2, 0.0);
        assert_eq!(c.perimeter_mm, 12_000.0);
        assert_eq!(c.total_price_minor, 0);
        assert_eq!(c.edge_hardware, None);
    }

    #[test]
    fn infeasible_geometry_has_zero_area() {
        let cfg = config(3, &[("AB", 1000.0), ("BC", 1000.0), ("CA", 5000.0)]);
        let eval = Engine::<TieredRates>::default().evaluate(&cfg);
        assert!(!eval.validation.is_valid);
        assert_eq!(eval.calculations.area_m2, 0.0);
        assert_eq!(eval.calculations.perimeter_mm, 7000.0);
    }

    #[test]
    fn unsupported_corner_count_is_empty() {
        let cfg = config(7, &[("AB", 3000.0)]);
        let eval = Engine::<TieredRates>::default().evaluate(&cfg);
        assert!(!eval.validation.is_valid);
        assert_eq!(eval.calculations, ShadeCalculations::default());
    }

    #[test]
    fn unknown_currency_prices_in_base() {
        let mut cfg = right_triangle();
        cfg.currency = "XXX".to_string();
        let base = Engine::<TieredRates>::default().compute(&right_triangle());
        let c = Engine::<TieredRates>::default().compute(&cfg);
        assert_eq!(c.total_price_minor, base.total_price_minor);
    }

    #[test]
    fn currency_conversion_uses_minor_digits() {
        let mut cfg = right_triangle();
        cfg.currency = "jpy".to_string();
        let c = Engine::<TieredRates>::default().compute(&cfg);
        assert_eq!(c.total_price_minor, (281.0f64 * 149.0).round() as i64);
    }

    #[test]
    fn evaluation_is_bit_identical() {
        let mut cfg = config(
            4,
            &[
                ("AB", 3000.0),
                ("BC", 3000.0),
                ("CD", 3000.0),
                ("DA", 3000.0),
                ("AC", 424.0),
                ("BD", 4242.64),
            ],
        );
        cfg.unit = Unit::Imperial;
        let engine = Engine::<TieredRates>::default();
        let a = engine.evaluate(&cfg);
        let b = engine.evaluate(&cfg);
        assert_eq!(a.calculations.area_m2.to_bits(), b.calculations.area_m2.to_bits());
        assert_eq!(a, b);
    }

    #[test]
    fn dismissed_advisories_are_filtered() {
        let cfg = config(
            4,
            &[
                ("AB", 3000.0),
                ("BC", 3000.0),
                ("CD", 3000.0),
                ("DA", 3000.0),
                ("AC", 424.0),
                ("BD", 4242.64),
            ],
        );
        let engine = Engine::<TieredRates>::default();
        let mut ledger = DismissalLedger::new();
        ledger.dismiss(key("AC"), &cfg.measurements);
        assert!(!engine.evaluate(&cfg).validation.typo_keys().is_empty());
        assert!(engine.evaluate_with(&cfg, &ledger).validation.typo_keys().is_empty());
    }

    #[test]
    fn policy_unit_follows_configuration() {
        let mut cfg = right_triangle();
        cfg.unit = Unit::Imperial;
        let engine = Engine::new(TieredRates::default());
        assert_eq!(engine.policy_for(&cfg).unit, Unit::Imperial);
    }

    #[test]
    fn policy_overrides_tolerances_but_not_unit() {
        let mut cfg = right_triangle();
        cfg.unit = Unit::Imperial;
        let engine = Engine::new(TieredRates::default()).with_policy(ValidationCfg {
            max_perimeter_mm: Some(10_000.0),
            ..ValidationCfg::default()
        });
        assert_eq!(engine.policy_for(&cfg).unit, Unit::Imperial);
        let eval = engine.evaluate(&cfg);
        assert!(eval.validation.is_valid);
        assert!(eval
            .validation
            .issues
            .iter()
            .any(|i| i.kind == IssueKind::PerimeterExceedsLimit));
        assert!(Engine::<TieredRates>::default().validate(&cfg).issues.is_empty());
    }

    #[test]
    fn looser_policy_accepts_small_cross_check_drift() {
        let cfg = config(
            4,
            &[
                ("AB", 3000.0),
                ("BC", 3000.0),
                ("CD", 3000.0),
                ("DA", 3000.0),
                ("AC", 4242.64),
                ("BD", 4370.0),
            ],
        );
        let strict = Engine::<TieredRates>::default();
        let loose = Engine::new(TieredRates::default()).with_policy(ValidationCfg {
            rel_tol: 0.05,
            ..ValidationCfg::default()
        });
        assert!(!strict.validate(&cfg).issues.is_empty());
        assert!(loose.validate(&cfg).issues.is_empty());
    }
}
