//! Canonical millimeters ↔ display units.
//!
//! Lengths are stored in mm as entered (after a linear conversion); rounding
//! happens only when formatting or when a suggestion is snapped to the display
//! step.

use serde::{Deserialize, Serialize};

pub const MM_PER_INCH: f64 = 25.4;
pub const MM2_PER_M2: f64 = 1_000_000.0;
pub const MM2_PER_FT2: f64 = 92_903.04;
pub const LB_PER_KG: f64 = 2.20462;

/// Display unit selected by the user.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Unit {
    #[default]
    Metric,
    Imperial,
}

impl Unit {
    /// Length of one display unit in mm.
    #[inline]
    pub fn mm_per_unit(self) -> f64 {
        match self {
            Unit::Metric => 1.0,
            Unit::Imperial => MM_PER_INCH,
        }
    }

    /// Smallest step shown to the user, in display units.
    #[inline]
    pub fn display_step(self) -> f64 {
        match self {
            Unit::Metric => 1.0,
            Unit::Imperial => 0.01,
        }
    }

    pub fn length_suffix(self) -> &'static str {
        match self {
            Unit::Metric => "mm",
            Unit::Imperial => "in",
        }
    }
}

#[inline]
pub fn to_display(mm: f64, unit: Unit) -> f64 {
    mm / unit.mm_per_unit()
}

/// `None` for non-finite or non-positive input (field still empty or mid-edit).
#[inline]
pub fn to_canonical_mm(value: f64, unit: Unit) -> Option<f64> {
    if !value.is_finite() || value <= 0.0 {
        return None;
    }
    Some(value * unit.mm_per_unit())
}

/// Converts between display units through canonical mm.
pub fn convert_unit(value: f64, from: Unit, to: Unit) -> Option<f64> {
    to_canonical_mm(value, from).map(|mm| to_display(mm, to))
}

/// Snap a mm value to the display unit's natural precision (result in mm).
pub fn round_to_display_precision(mm: f64, unit: Unit) -> f64 {
    let step = unit.display_step();
    let shown = (to_display(mm, unit) / step).round() * step;
    shown * unit.mm_per_unit()
}

/// Display-rounded value as the digits a user would type (no separators).
pub(crate) fn display_digits(mm: f64, unit: Unit) -> String {
    match unit {
        Unit::Metric => format!("{:.0}", to_display(mm, unit)),
        Unit::Imperial => format!("{:.2}", to_display(mm, unit)),
    }
}

pub fn format_primary(mm: f64, unit: Unit) -> String {
    format!("{} {}", display_digits(mm, unit), unit.length_suffix())
}

/// Both systems, metric first; used in manufacturing records.
pub fn format_dual(mm: f64) -> String {
    format!(
        "{} ({})",
        format_primary(mm, Unit::Metric),
        format_primary(mm, Unit::Imperial)
    )
}

pub fn format_area(mm2: f64, unit: Unit) -> String {
    match unit {
        Unit::Metric => format!("{:.2} m²", mm2 / MM2_PER_M2),
        Unit::Imperial => format!("{:.2} ft²", mm2 / MM2_PER_FT2),
    }
}

pub fn format_weight(grams: f64, unit: Unit) -> String {
    let kg = grams / 1000.0;
    match unit {
        Unit::Metric => format!("{:.1} kg", kg),
        Unit::Imperial => format!("{:.1} lb", kg * LB_PER_KG),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn canonical_rejects_empty_like_input() {
        assert_eq!(to_canonical_mm(0.0, Unit::Metric), None);
        assert_eq!(to_canonical_mm(-3.0, Unit::Imperial), None);
        assert_eq!(to_canonical_mm(f64::NAN, Unit::Metric), None);
        assert_eq!(to_canonical_mm(f64::INFINITY, Unit::Metric), None);
        assert_eq!(to_canonical_mm(10.0, Unit::Imperial), Some(254.0));
    }

    #[test]
    fn formats() {
        assert_eq!(format_primary(3000.0, Unit::Metric), "3000 mm");
        assert_eq!(format_primary(254.0, Unit::Imperial), "10.00 in");
        assert_eq!(format_dual(2540.0), "2540 mm (100.00 in)");
        assert_eq!(format_area(6_000_000.0, Unit::Metric), "6.00 m²");
        assert_eq!(format_area(MM2_PER_FT2 * 4.0, Unit::Imperial), "4.00 ft²");
        assert_eq!(format_weight(2500.0, Unit::Metric), "2.5 kg");
        assert_eq!(format_weight(1000.0, Unit::Imperial), "2.2 lb");
    }

    #[test]
    fn display_rounding_snaps_to_step() {
        assert!((round_to_display_precision(4242.64, Unit::Metric) - 4243.0).abs() < 1e-9);
        let snapped = round_to_display_precision(4242.64, Unit::Imperial);
        assert!((to_display(snapped, Unit::Imperial) - 167.03).abs() < 1e-9);
        assert_eq!(convert_unit(1.0, Unit::Imperial, Unit::Metric), Some(25.4));
    }

    proptest! {
        #[test]
        fn round_trip_within_display_step(x in 0.5f64..200_000.0, imperial in any::<bool>()) {
            let unit = if imperial { Unit::Imperial } else { Unit::Metric };
            let shown = to_display(x, unit);
            let back = to_canonical_mm(shown, unit).unwrap();
            prop_assert!((back - x).abs() <= unit.display_step() * unit.mm_per_unit());
            // and through the display rounding step as the user would see it
            let typed = (shown / unit.display_step()).round() * unit.display_step();
            if let Some(mm) = to_canonical_mm(typed, unit) {
                prop_assert!((mm - x).abs() <= unit.display_step() * unit.mm_per_unit());
            }
        }
    }
}
