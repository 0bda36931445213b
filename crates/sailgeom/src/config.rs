//! Immutable configuration snapshot handed to the engine on every call.
//!
//! The UI owns and mutates its live configuration; the engine only ever sees
//! a value of this type and keeps nothing between calls.

use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use crate::graph::{corner_label, MeasurementMap};
use crate::units::Unit;

/// What the entered lengths describe.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeasurementSemantics {
    /// Gap between the fixing points; tensioning hardware ships with the sail.
    #[default]
    SpaceBetweenFixingPoints,
    /// Dimensions of the finished sail; no hardware.
    FinishedSailDimensions,
}

impl MeasurementSemantics {
    #[inline]
    pub fn includes_hardware(self) -> bool {
        self == MeasurementSemantics::SpaceBetweenFixingPoints
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EdgeFinish {
    #[default]
    Cabled,
    Webbing,
}

impl EdgeFinish {
    pub fn label(self) -> &'static str {
        match self {
            EdgeFinish::Cabled => "Cabled Edge",
            EdgeFinish::Webbing => "Webbing Reinforced",
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Attachment {
    #[default]
    Post,
    Building,
}

/// Optional per-corner installation details.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct FixingPoint {
    pub height_mm: Option<f64>,
    pub attachment: Option<Attachment>,
    /// Canvas position; display only, never used for geometry.
    pub display: Option<[f64; 2]>,
}

/// Fabric as resolved by the UI from its catalogue.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FabricSelection {
    pub id: String,
    #[serde(default)]
    pub color: Option<String>,
    pub grams_per_m2: f64,
    /// Price per m² in the rate table's base currency.
    pub price_per_m2: f64,
}

impl Default for FabricSelection {
    fn default() -> Self {
        Self {
            id: "standard".to_string(),
            color: None,
            grams_per_m2: 0.0,
            price_per_m2: 0.0,
        }
    }
}

/// A corner as presented to callers.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Corner {
    pub index: usize,
    pub label: char,
    pub display: Option<[f64; 2]>,
    pub height_mm: Option<f64>,
    pub attachment: Attachment,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ShadeConfiguration {
    pub corner_count: usize,
    #[serde(default)]
    pub unit: Unit,
    #[serde(default)]
    pub semantics: MeasurementSemantics,
    #[serde(default)]
    pub measurements: MeasurementMap,
    #[serde(default)]
    pub fabric: FabricSelection,
    #[serde(default)]
    pub edge_finish: EdgeFinish,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default)]
    pub fixing_points: Vec<FixingPoint>,
}

fn default_currency() -> String {
    "USD".to_string()
}

impl ShadeConfiguration {
    /// Empty configuration with default choices.
    pub fn new(corner_count: usize) -> Self {
        Self {
            corner_count,
            unit: Unit::default(),
            semantics: MeasurementSemantics::default(),
            measurements: MeasurementMap::new(),
            fabric: FabricSelection::default(),
            edge_finish: EdgeFinish::default(),
            currency: default_currency(),
            fixing_points: Vec::new(),
        }
    }

    pub fn corners(&self) -> Vec<Corner> {
        (0..self.corner_count)
            .filter_map(|i| {
                let label = corner_label(i)?;
                let fp = self.fixing_points.get(i).cloned().unwrap_or_default();
                Some(Corner {
                    index: i,
                    label,
                    display: fp.display,
                    height_mm: fp.height_mm.filter(|h| h.is_finite() && *h > 0.0),
                    attachment: fp.attachment.unwrap_or_default(),
                })
            })
            .collect()
    }

    /// Any corner has a usable height.
    pub fn heights_provided(&self) -> bool {
        self.corners().iter().any(|c| c.height_mm.is_some())
    }

    /// Hash of everything the calculations depend on. Per-process only, like
    /// `MeasurementMap::content_hash`.
    pub fn content_hash(&self) -> u64 {
        let mut h = std::collections::hash_map::DefaultHasher::new();
        self.corner_count.hash(&mut h);
        self.unit.hash(&mut h);
        self.semantics.hash(&mut h);
        self.measurements.hash_into(&mut h);
        self.fabric.id.hash(&mut h);
        self.fabric.grams_per_m2.to_bits().hash(&mut h);
        self.fabric.price_per_m2.to_bits().hash(&mut h);
        self.edge_finish.hash(&mut h);
        self.currency.hash(&mut h);
        h.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deserializes_with_defaults() {
        let cfg: ShadeConfiguration = serde_json::from_str(
            r#"{"cornerCount": 3, "measurements": {"AB": 3000, "BC": 4000, "CA": 5000}}"#,
        )
        .unwrap();
        assert_eq!(cfg.unit, Unit::Metric);
        assert_eq!(cfg.currency, "USD");
        assert!(cfg.semantics.includes_hardware());
        assert_eq!(cfg.measurements.len(), 3);
    }

    #[test]
    fn corners_carry_labels_and_default_attachment() {
        let mut cfg = ShadeConfiguration::new(4);
        cfg.fixing_points = vec![FixingPoint {
            height_mm: Some(2400.0),
            attachment: Some(Attachment::Building),
            display: None,
        }];
        let corners = cfg.corners();
        assert_eq!(corners.len(), 4);
        assert_eq!(corners[0].label, 'A');
        assert_eq!(corners[0].attachment, Attachment::Building);
        assert_eq!(corners[3].label, 'D');
        assert_eq!(corners[3].attachment, Attachment::Post);
        assert!(cfg.heights_provided());
    }

    #[test]
    fn content_hash_ignores_fixing_points() {
        let a = ShadeConfiguration::new(4);
        let mut b = a.clone();
        b.fixing_points.push(FixingPoint::default());
        assert_eq!(a.content_hash(), b.content_hash());
        b.edge_finish = EdgeFinish::Webbing;
        assert_ne!(a.content_hash(), b.content_hash());
    }
}
