//! Flat entry points for UI bindings, using the built-in rate table.

use crate::config::ShadeConfiguration;
use crate::engine::Engine;
use crate::graph::{diagonal_keys, MeasurementKey, MeasurementMap};
use crate::metrics::{ShadeCalculations, TieredRates};
use crate::units::{self, Unit};
use crate::validate::{self, ValidationResult};

/// Derived metrics for `config`; never panics on malformed geometry.
pub fn compute_shade_calculations(config: &ShadeConfiguration) -> ShadeCalculations {
    Engine::new(TieredRates::default()).compute(config)
}

pub fn validate_geometry(measurements: &MeasurementMap, corner_count: usize) -> ValidationResult {
    validate::validate_geometry(measurements, corner_count)
}

/// Diagonals in canonical order; empty for unsupported counts.
pub fn diagonal_keys_for(corner_count: usize) -> Vec<MeasurementKey> {
    diagonal_keys(corner_count)
}

pub fn convert_unit(value: f64, from: Unit, to: Unit) -> Option<f64> {
    units::convert_unit(value, from, to)
}

pub fn format_measurement(mm: f64, unit: Unit) -> String {
    units::format_primary(mm, unit)
}

pub fn format_dual_measurement(mm: f64) -> String {
    units::format_dual(mm)
}

pub fn format_area(m2: f64, unit: Unit) -> String {
    units::format_area(m2 * units::MM2_PER_M2, unit)
}
