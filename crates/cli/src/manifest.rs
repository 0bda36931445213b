//! `<stem>.manifest.json` sidecars recording how a table was produced.

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;
use std::ffi::OsString;
use std::fs;
use std::panic::Location;
use std::path::{Path, PathBuf};
use std::process::Command;

/// Environment variable that pins the recorded code revision (release builds, CI).
const REV_ENV: &str = "SAILCALC_REV";

/// What produced a table: the subcommand, its parameters and row count.
pub struct Manifest {
    pub command: &'static str,
    pub params: Value,
    pub rows: usize,
}

impl Manifest {
    pub fn new(command: &'static str, params: Value) -> Self {
        Self {
            command,
            params,
            rows: 0,
        }
    }

    pub fn rows(mut self, rows: usize) -> Self {
        self.rows = rows;
        self
    }
}

#[derive(Serialize)]
struct Callsite {
    file: &'static str,
    line: u32,
}

#[derive(Serialize)]
struct SidecarDoc<'a> {
    engine_version: &'static str,
    /// `None` outside a checkout when no revision was pinned.
    code_rev: Option<String>,
    callsite: Callsite,
    command: &'a str,
    params: &'a Value,
    rows: usize,
    outputs: Vec<String>,
}

/// Write the sidecar next to `artifact` and return its path.
#[track_caller]
pub fn write_sidecar<P: AsRef<Path>>(artifact: P, manifest: Manifest) -> Result<PathBuf> {
    let callsite = Location::caller();
    let artifact = artifact.as_ref();
    let path = manifest_path(artifact);
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        fs::create_dir_all(dir).with_context(|| format!("creating manifest dir {}", dir.display()))?;
    }

    let doc = SidecarDoc {
        engine_version: sailgeom::VERSION,
        code_rev: code_rev(dir.unwrap_or_else(|| Path::new("."))),
        callsite: Callsite {
            file: callsite.file(),
            line: callsite.line(),
        },
        command: manifest.command,
        params: &manifest.params,
        rows: manifest.rows,
        outputs: vec![artifact.to_string_lossy().into_owned()],
    };
    fs::write(&path, serde_json::to_vec_pretty(&doc)?)
        .with_context(|| format!("writing {}", path.display()))?;
    Ok(path)
}

fn manifest_path(artifact: &Path) -> PathBuf {
    let mut name = artifact
        .file_stem()
        .map(|s| s.to_os_string())
        .unwrap_or_else(|| OsString::from("table"));
    name.push(".manifest.json");
    artifact.with_file_name(name)
}

/// Pinned revision if set, else `git describe` of the checkout holding `dir`.
fn code_rev(dir: &Path) -> Option<String> {
    pinned_rev(std::env::var(REV_ENV).ok()).or_else(|| describe_checkout(dir))
}

fn pinned_rev(raw: Option<String>) -> Option<String> {
    raw.map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
}

fn describe_checkout(dir: &Path) -> Option<String> {
    let out = Command::new("git")
        .arg("-C")
        .arg(dir)
        .args(["describe", "--always", "--dirty"])
        .output()
        .ok()?;
    if !out.status.success() {
        tracing::debug!(dir = %dir.display(), "no git checkout for manifest");
        return None;
    }
    pinned_rev(String::from_utf8(out.stdout).ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use tempfile::tempdir;

    #[test]
    fn manifest_path_replaces_extension() {
        let base = Path::new("/tmp/out/sails.parquet");
        assert_eq!(manifest_path(base), Path::new("/tmp/out/sails.manifest.json"));
    }

    #[test]
    fn pinned_revision_is_trimmed_and_blank_is_unset() {
        let pinned = pinned_rev(Some(" v0.3.1-4-gabc123\n".to_string()));
        assert_eq!(pinned.as_deref(), Some("v0.3.1-4-gabc123"));
        assert_eq!(pinned_rev(Some("  ".to_string())), None);
        assert_eq!(pinned_rev(None), None);
    }

    #[test]
    fn write_sidecar_records_command_and_rows() {
        let dir = tempdir().unwrap();
        let artifact = dir.path().join("nested").join("results.csv");
        let manifest = Manifest::new("batch", json!({"input": "sails.csv"})).rows(12);
        let path = write_sidecar(&artifact, manifest).unwrap();
        assert_eq!(path, dir.path().join("nested").join("results.manifest.json"));
        let parsed: Value = serde_json::from_slice(&fs::read(path).unwrap()).unwrap();
        assert_eq!(parsed["command"], "batch");
        assert_eq!(parsed["params"]["input"], "sails.csv");
        assert_eq!(parsed["rows"], 12);
        assert_eq!(parsed["engine_version"], sailgeom::VERSION);
        assert!(parsed["code_rev"].is_null() || parsed["code_rev"].is_string());
        assert_eq!(parsed["callsite"]["file"], file!());
        assert_eq!(parsed["outputs"][0], artifact.to_string_lossy().as_ref());
    }
}
