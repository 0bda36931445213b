//! Manufacturing record: what the workshop receives with an order.
//!
//! Lengths are written in both systems so the sheet reads the same whichever
//! unit the customer measured in. Area and weight follow the configuration
//! unit.

use serde::{Deserialize, Serialize};

use crate::config::{Attachment, ShadeConfiguration};
use crate::graph::{diagonal_keys, edge_keys, MeasurementKey};
use crate::metrics::{EdgeHardware, ShadeCalculations};
use crate::units::{format_area, format_dual, format_weight, MM2_PER_M2, MM_PER_INCH};

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LengthLine {
    pub key: String,
    pub mm: f64,
    pub text: String,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FixingLine {
    pub corner: char,
    pub height: String,
    pub attachment: Attachment,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManufacturingRecord {
    pub corner_count: usize,
    pub fabric: String,
    pub color: Option<String>,
    pub edges: Vec<LengthLine>,
    pub diagonals: Vec<LengthLine>,
    pub area: String,
    pub perimeter: String,
    pub weight: String,
    pub edge_finish: String,
    pub hardware: String,
    pub fixing_points: Option<Vec<FixingLine>>,
}

impl ManufacturingRecord {
    pub fn build(config: &ShadeConfiguration, calc: &ShadeCalculations) -> Self {
        let lines = |keys: Vec<MeasurementKey>| -> Vec<LengthLine> {
            keys.into_iter()
                .filter_map(|k| {
                    let mm = config.measurements.get(k)?;
                    Some(LengthLine {
                        key: k.to_string(),
                        mm,
                        text: format_dual(mm),
                    })
                })
                .collect()
        };
        let n = config.corner_count;
        let hardware_included = config.semantics.includes_hardware();

        let fixing_points = (n > 3 && hardware_included && config.heights_provided()).then(|| {
            config
                .corners()
                .into_iter()
                .map(|c| FixingLine {
                    corner: c.label,
                    height: c.height_mm.map_or_else(|| "-".to_string(), format_dual),
                    attachment: c.attachment,
                })
                .collect()
        });

        Self {
            corner_count: n,
            fabric: config.fabric.id.clone(),
            color: config.fabric.color.clone(),
            edges: lines(edge_keys(n)),
            diagonals: lines(diagonal_keys(n)),
            area: format_area(calc.area_m2 * MM2_PER_M2, config.unit),
            perimeter: format_dual(calc.perimeter_mm),
            weight: format_weight(calc.total_weight_grams, config.unit),
            edge_finish: edge_finish_text(config, calc),
            hardware: if hardware_included { "Included" } else { "Not Included" }.to_string(),
            fixing_points,
        }
    }
}

fn edge_finish_text(config: &ShadeConfiguration, calc: &ShadeCalculations) -> String {
    let label = config.edge_finish.label();
    match calc.edge_hardware {
        Some(EdgeHardware::WireThickness { mm }) => {
            format!("{label}, {mm:.1} mm ({:.2} in) wire", mm / MM_PER_INCH)
        }
        Some(EdgeHardware::WebbingWidth { mm }) => {
            format!("{label}, {mm:.0} mm ({:.2} in) webbing", mm / MM_PER_INCH)
        }
        None => label.to_string(),
    }
}
