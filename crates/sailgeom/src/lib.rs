//! Shade sail measurement geometry and validation.
//!
//! A sail with 3 to 6 corners is described by the distances a customer
//! measured between its fixing points. This crate turns those into a planar
//! placement, checks them for consistency, points at likely typos, and derives
//! area, perimeter, edge hardware, weight and price.
//!
//! Layout
//! - `graph`: canonical measurement keys, the measurement map, fan queries.
//! - `reconstruct`: fan triangulation from corner A into 2-D coordinates.
//! - `validate`: triangle feasibility, cross-checks, typo attribution.
//! - `metrics`, `engine`: derived quantities over an injected rate table.
//! - `units`, `tolerance`: unit conversion, display rounding, named tolerances.
//! - `record`, `memo`, `sample`: manufacturing sheet, cache, random sails.
//!
//! Conventions
//! - Lengths are canonical millimetres internally; the display unit only
//!   affects rounding and text.
//! - Geometry failures are data in `ValidationResult`, never panics.
//! - Every call is pure; nothing is retained between configurations.

pub mod api;
pub mod config;
pub mod engine;
pub mod graph;
pub mod memo;
pub mod metrics;
pub mod reconstruct;
pub mod record;
pub mod sample;
pub mod tolerance;
pub mod units;
pub mod validate;

/// Library version string.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

pub use nalgebra::Vector2 as Vec2;

/// Common exports for callers.
pub mod prelude {
    pub use crate::config::{
        Attachment, EdgeFinish, FabricSelection, FixingPoint, MeasurementSemantics,
        ShadeConfiguration,
    };
    pub use crate::engine::{Engine, Evaluation};
    pub use crate::graph::{diagonal_keys, edge_keys, MeasurementKey, MeasurementMap};
    pub use crate::memo::CalcMemo;
    pub use crate::metrics::{EdgeHardware, RateTable, ShadeCalculations, TieredRates};
    pub use crate::record::ManufacturingRecord;
    pub use crate::sample::{draw_sail, inject_typo, ReplayToken, SailCfg, TypoKind};
    pub use crate::tolerance::ValidationCfg;
    pub use crate::units::Unit;
    pub use crate::validate::{
        apply_correction, validate, validate_geometry, DismissalLedger, IssueKind, ValidationIssue,
        ValidationResult,
    };
    pub use nalgebra::Vector2 as Vec2;
}
