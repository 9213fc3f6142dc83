use anyhow::{Context, Result};
use dashboard_core::config::WorkspaceConfig;
use dashboard_core::content::Workspace;
use dashboard_core::scanner;
use dashboard_core::snapshot;
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::info;

#[derive(Debug, Serialize)]
pub struct ExportSummary {
    pub output: PathBuf,
    pub minified: PathBuf,
    pub departments: usize,
    pub active_departments: usize,
    pub files: usize,
}

/// Scans the configured workspace and writes the snapshot files.
/// `output` overrides `workspace.output` from the config.
pub fn run_export(cfg: &WorkspaceConfig, output: Option<&Path>) -> Result<ExportSummary> {
    let workspace = Workspace::from_config(cfg);
    scanner::probe_root(workspace.root())
        .with_context(|| format!("workspace root {:?} is not readable", workspace.root()))?;

    info!("Generating workspace data file...");
    let snap = workspace.scan();

    let output = output
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(&cfg.output));
    let minified = snapshot::write_snapshot(&snap, &output)
        .with_context(|| format!("Failed to write snapshot to {:?}", output))?;

    info!(
        "Generated {:?} with data from {} departments and {} files",
        output, snap.stats.total_departments, snap.stats.total_files
    );
    Ok(ExportSummary {
        output,
        minified,
        departments: snap.stats.total_departments,
        active_departments: snap.stats.active_departments,
        files: snap.stats.total_files,
    })
}
