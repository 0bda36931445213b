use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use sailgeom::graph::{edge_keys, fan_diagonal_keys, MeasurementKey};
use sailgeom::prelude::*;
use sailgeom::sample::{CornerSpec, SampledSail};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing_subscriber::fmt::SubscriberBuilder;

mod manifest;
mod table;

use manifest::{write_sidecar, Manifest};
use table::SailRow;

#[derive(Parser)]
#[command(name = "sailcalc")]
#[command(about = "Shade sail geometry checks and derived metrics")]
struct Cmd {
    #[command(subcommand)]
    action: Action,
}

#[derive(Subcommand)]
enum Action {
    /// Validate one configuration (JSON) and print the evaluation
    Evaluate {
        #[arg(long)]
        config: PathBuf,
        /// Rate table JSON; built-in rates when omitted
        #[arg(long)]
        rates: Option<PathBuf>,
        /// Keys whose typo advisories were dismissed at their current value
        #[arg(long, value_delimiter = ',')]
        dismiss: Vec<String>,
        /// Print the manufacturing record instead of the evaluation
        #[arg(long)]
        record: bool,
    },
    /// List measurement keys for a corner count
    Keys {
        #[arg(long)]
        corners: usize,
    },
    /// Draw random convex sails and write them as a table
    Sample {
        /// Fixed corner count; uniform over 3..=6 when omitted
        #[arg(long)]
        corners: Option<usize>,
        #[arg(long, default_value_t = 0)]
        seed: u64,
        #[arg(long, default_value_t = 100)]
        count: u64,
        #[arg(long)]
        out: PathBuf,
        /// Mistype one fan measurement per sail
        #[arg(long, value_enum)]
        typo: Option<TypoArg>,
    },
    /// Evaluate every sail in a CSV table and write one result row per sail
    Batch {
        #[arg(long)]
        input: PathBuf,
        #[arg(long)]
        out: PathBuf,
        #[arg(long)]
        rates: Option<PathBuf>,
        #[arg(long, value_enum, default_value_t = UnitArg::Metric)]
        unit: UnitArg,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum TypoArg {
    Dropped,
    Doubled,
    Swapped,
}

impl From<TypoArg> for TypoKind {
    fn from(t: TypoArg) -> Self {
        match t {
            TypoArg::Dropped => TypoKind::DroppedDigit,
            TypoArg::Doubled => TypoKind::DoubledDigit,
            TypoArg::Swapped => TypoKind::SwappedDigits,
        }
    }
}

#[derive(Clone, Copy, ValueEnum)]
enum UnitArg {
    Metric,
    Imperial,
}

impl From<UnitArg> for Unit {
    fn from(u: UnitArg) -> Self {
        match u {
            UnitArg::Metric => Unit::Metric,
            UnitArg::Imperial => Unit::Imperial,
        }
    }
}

fn main() -> Result<()> {
    SubscriberBuilder::default().with_target(false).init();
    let cmd = Cmd::parse();
    match cmd.action {
        Action::Evaluate {
            config,
            rates,
            dismiss,
            record,
        } => evaluate(&config, rates.as_deref(), &dismiss, record),
        Action::Keys { corners } => keys(corners),
        Action::Sample {
            corners,
            seed,
            count,
            out,
            typo,
        } => sample(corners, seed, count, &out, typo),
        Action::Batch {
            input,
            out,
            rates,
            unit,
        } => batch(&input, &out, rates.as_deref(), unit.into()),
    }
}

fn load_rates(path: Option<&Path>) -> Result<TieredRates> {
    let Some(path) = path else {
        return Ok(TieredRates::default());
    };
    let bytes = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let rates: TieredRates = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing rate table {}", path.display()))?;
    Ok(rates.normalized())
}

fn evaluate(config: &Path, rates: Option<&Path>, dismiss: &[String], record: bool) -> Result<()> {
    let bytes = std::fs::read(config).with_context(|| format!("reading {}", config.display()))?;
    let config: ShadeConfiguration = serde_json::from_slice(&bytes)
        .with_context(|| format!("parsing configuration {}", config.display()))?;
    let engine = Engine::new(load_rates(rates)?);

    let mut ledger = DismissalLedger::new();
    for raw in dismiss {
        let key: MeasurementKey = raw.parse().with_context(|| format!("dismissed key {raw:?}"))?;
        if !ledger.dismiss(key, &config.measurements) {
            tracing::warn!(%key, "nothing entered for dismissed key");
        }
    }

    let eval = engine.evaluate_with(&config, &ledger);
    tracing::info!(
        corners = config.corner_count,
        valid = eval.validation.is_valid,
        issues = eval.validation.issues.len(),
        "evaluate"
    );
    let out = if record {
        serde_json::to_string_pretty(&ManufacturingRecord::build(&config, &eval.calculations))?
    } else {
        serde_json::to_string_pretty(&eval)?
    };
    println!("{out}");
    Ok(())
}

#[derive(Serialize)]
struct KeyListing {
    corners: usize,
    edges: Vec<MeasurementKey>,
    diagonals: Vec<MeasurementKey>,
    fan_diagonals: Vec<MeasurementKey>,
}

fn keys(corners: usize) -> Result<()> {
    let edges = edge_keys(corners);
    if edges.is_empty() {
        anyhow::bail!("corner count {corners} is not supported (3 to 6)");
    }
    let listing = KeyListing {
        corners,
        edges,
        diagonals: diagonal_keys(corners),
        fan_diagonals: fan_diagonal_keys(corners),
    };
    println!("{}", serde_json::to_string_pretty(&listing)?);
    Ok(())
}

/// Fan measurement mistyped for draw `index`: cycles over edges and A-diagonals.
fn typo_target(n: usize, index: u64) -> Option<MeasurementKey> {
    let mut fan = fan_diagonal_keys(n);
    fan.extend(edge_keys(n));
    let len = fan.len() as u64;
    (len > 0).then(|| fan[(index % len) as usize])
}

fn sample(corners: Option<usize>, seed: u64, count: u64, out: &Path, typo: Option<TypoArg>) -> Result<()> {
    tracing::info!(?corners, seed, count, out = %out.display(), "sample");
    let cfg = SailCfg {
        corners: corners.map_or(SailCfg::default().corners, CornerSpec::Fixed),
        ..SailCfg::default()
    };

    let mut rows = Vec::with_capacity(count as usize);
    for index in 0..count {
        let Some(SampledSail { corners: points, measurements }) = draw_sail(cfg, ReplayToken::new(seed, index)) else {
            tracing::warn!(index, "no convex draw, skipping");
            continue;
        };
        let n = points.len();
        let mut row = SailRow {
            id: format!("{seed}-{index}"),
            corners: n,
            measurements,
        };
        if let Some(kind) = typo {
            let mistyped = typo_target(n, index)
                .and_then(|key| inject_typo(&row.measurements, key, kind.into()));
            if let Some(m) = mistyped {
                row.measurements = m;
            }
        }
        rows.push(row);
    }

    let mut df = table::sails_frame(&rows)?;
    table::write_frame(&mut df, out)?;
    let manifest = Manifest::new(
        "sample",
        serde_json::json!({
            "corners": corners,
            "seed": seed,
            "count": count,
            "typo": typo.map(|t| format!("{:?}", TypoKind::from(t))),
        }),
    )
    .rows(df.height());
    let path = write_sidecar(out, manifest)?;
    tracing::info!(rows = df.height(), manifest = %path.display(), "sample written");
    Ok(())
}

fn batch(input: &Path, out: &Path, rates: Option<&Path>, unit: Unit) -> Result<()> {
    tracing::info!(input = %input.display(), out = %out.display(), "batch");
    let engine = Engine::new(load_rates(rates)?);
    let rows = table::read_sails(input)?;

    let evals: Vec<Evaluation> = rows
        .iter()
        .map(|row| {
            let mut config = ShadeConfiguration::new(row.corners);
            config.unit = unit;
            config.measurements = row.measurements.clone();
            engine.evaluate(&config)
        })
        .collect();
    let invalid = evals.iter().filter(|e| !e.validation.is_valid).count();

    let mut df = table::results_frame(&rows, &evals)?;
    table::write_frame(&mut df, out)?;
    let manifest = Manifest::new(
        "batch",
        serde_json::json!({
            "input": input.to_string_lossy(),
            "rates": rates.map(|p| p.to_string_lossy().into_owned()),
            "unit": unit,
        }),
    )
    .rows(df.height());
    write_sidecar(out, manifest)?;
    tracing::info!(rows = df.height(), invalid, "batch written");
    Ok(())
}
