//! Tabular sail data: one row per sail, one column per measurement key.

use std::fs::File;
use std::path::Path;

use anyhow::{bail, Context, Result};
use polars::prelude::*;
use sailgeom::graph::{MeasurementKey, MeasurementMap, MAX_LABELS};
use sailgeom::prelude::{Evaluation, IssueKind};

/// Largest corner count with a column per pair in sample output.
const MAX_TABLE_CORNERS: usize = 6;

#[derive(Clone, Debug)]
pub struct SailRow {
    pub id: String,
    pub corners: usize,
    pub measurements: MeasurementMap,
}

fn pair_keys() -> Vec<MeasurementKey> {
    (0..MAX_TABLE_CORNERS)
        .flat_map(|i| ((i + 1)..MAX_TABLE_CORNERS).filter_map(move |j| MeasurementKey::new(i, j)))
        .collect()
}

pub fn sails_frame(rows: &[SailRow]) -> PolarsResult<DataFrame> {
    let mut columns = vec![
        Series::new("id".into(), rows.iter().map(|r| r.id.clone()).collect::<Vec<_>>()),
        Series::new(
            "corners".into(),
            rows.iter().map(|r| r.corners as i64).collect::<Vec<_>>(),
        ),
    ];
    for key in pair_keys() {
        let values: Vec<Option<f64>> = rows.iter().map(|r| r.measurements.get(key)).collect();
        columns.push(Series::new(key.to_string().as_str().into(), values));
    }
    DataFrame::new(columns)
}

/// Read sails from CSV. Columns named like measurement keys are lengths in mm;
/// `corners` is required, `id` optional.
pub fn read_sails(path: &Path) -> Result<Vec<SailRow>> {
    let df = LazyCsvReader::new(path)
        .with_infer_schema_length(Some(100))
        .finish()
        .and_then(|lf| lf.collect())
        .with_context(|| format!("reading {}", path.display()))?;

    let corners = df
        .column("corners")
        .context("input has no `corners` column")?
        .cast(&DataType::Int64)?;
    let corners = corners.i64()?;
    let ids = match df.column("id") {
        Ok(s) => Some(s.cast(&DataType::String)?),
        Err(_) => None,
    };

    let mut key_columns = Vec::new();
    for s in df.get_columns() {
        if let Ok(key) = s.name().to_string().parse::<MeasurementKey>() {
            key_columns.push((key, s.cast(&DataType::Float64)?));
        }
    }
    if key_columns.is_empty() {
        bail!("input has no measurement columns (AB, BC, ...)");
    }

    let mut rows = Vec::with_capacity(df.height());
    for i in 0..df.height() {
        let Some(n) = corners.get(i) else {
            tracing::warn!(row = i, "skipping row without corner count");
            continue;
        };
        let id = ids
            .as_ref()
            .and_then(|s| s.str().ok().and_then(|ca| ca.get(i).map(str::to_string)))
            .unwrap_or_else(|| i.to_string());
        let mut measurements = MeasurementMap::new();
        for (key, s) in &key_columns {
            if let Some(v) = s.f64()?.get(i) {
                measurements.insert(*key, v);
            }
        }
        rows.push(SailRow {
            id,
            corners: usize::try_from(n).unwrap_or(0).min(MAX_LABELS),
            measurements,
        });
    }
    Ok(rows)
}

pub fn results_frame(rows: &[SailRow], evals: &[Evaluation]) -> PolarsResult<DataFrame> {
    let count = |e: &Evaluation, blocking: bool| {
        e.validation
            .issues
            .iter()
            .filter(|i| i.kind.is_blocking() == blocking)
            .count() as u32
    };
    df!(
        "id" => rows.iter().map(|r| r.id.clone()).collect::<Vec<_>>(),
        "corners" => rows.iter().map(|r| r.corners as i64).collect::<Vec<_>>(),
        "is_valid" => evals.iter().map(|e| e.validation.is_valid).collect::<Vec<_>>(),
        "complete" => evals.iter().map(|e| e.validation.is_complete()).collect::<Vec<_>>(),
        "blocking" => evals.iter().map(|e| count(e, true)).collect::<Vec<_>>(),
        "advisories" => evals.iter().map(|e| count(e, false)).collect::<Vec<_>>(),
        "typo_keys" => evals
            .iter()
            .map(|e| {
                e.validation
                    .typo_keys()
                    .iter()
                    .map(|k| k.to_string())
                    .collect::<Vec<_>>()
                    .join(" ")
            })
            .collect::<Vec<_>>(),
        "infeasible" => evals
            .iter()
            .map(|e| e.validation.issues.iter().any(|i| i.kind == IssueKind::Infeasible))
            .collect::<Vec<_>>(),
        "area_m2" => evals.iter().map(|e| e.calculations.area_m2).collect::<Vec<_>>(),
        "perimeter_mm" => evals.iter().map(|e| e.calculations.perimeter_mm).collect::<Vec<_>>(),
        "price_minor" => evals.iter().map(|e| e.calculations.total_price_minor).collect::<Vec<_>>(),
        "weight_g" => evals.iter().map(|e| e.calculations.total_weight_grams).collect::<Vec<_>>(),
        "edge_hardware_mm" => evals
            .iter()
            .map(|e| e.calculations.edge_hardware.map(|h| h.mm()))
            .collect::<Vec<_>>(),
    )
}

/// Write as Parquet when the extension says so, CSV otherwise.
pub fn write_frame(df: &mut DataFrame, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating output dir {}", parent.display()))?;
        }
    }
    let mut file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    match path.extension().and_then(|e| e.to_str()) {
        Some("parquet") => {
            ParquetWriter::new(&mut file).finish(df)?;
        }
        _ => CsvWriter::new(&mut file).include_header(true).finish(df)?,
    }
    Ok(())
}
