use crate::export;
use anyhow::{Context, Result};
use dashboard_core::config::WorkspaceConfig;
use dashboard_core::scanner::is_ignored;
use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::{info, warn};

/// Rewrites the snapshot whenever something under the workspace root changes.
/// Bursts of events are collapsed: a rescan starts once `debounce` passes quietly.
pub fn watch_workspace(cfg: WorkspaceConfig, output: Option<PathBuf>, debounce: Duration) -> Result<()> {
    let summary = export::run_export(&cfg, output.as_deref())?;
    let root = fs::canonicalize(&cfg.root)
        .with_context(|| format!("workspace root {:?} is not readable", cfg.root))?;
    let written: Vec<PathBuf> = [&summary.output, &summary.minified]
        .iter()
        .filter_map(|p| fs::canonicalize(p).ok())
        .collect();

    let (tx, rx) = channel();
    let mut watcher: RecommendedWatcher = Watcher::new(
        tx,
        notify::Config::default().with_poll_interval(Duration::from_secs(2)),
    )?;
    watcher.watch(&root, RecursiveMode::Recursive)?;

    info!("Watching {:?} for changes...", root);
    loop {
        match rx.recv() {
            Ok(Ok(event)) => {
                if !should_rescan(&root, &event.paths, &written) {
                    continue;
                }
                while rx.recv_timeout(debounce).is_ok() {}
                if let Err(e) = export::run_export(&cfg, output.as_deref()) {
                    warn!("Rescan failed: {:#}", e);
                }
            }
            Ok(Err(e)) => warn!("watch error: {:?}", e),
            Err(_) => break,
        }
    }
    Ok(())
}

/// True when a changed path is visible to the scanner: inside `root`, not one
/// of our own output files, and not under a hidden or ignored directory.
pub fn should_rescan(root: &Path, paths: &[PathBuf], written: &[PathBuf]) -> bool {
    paths.iter().any(|path| {
        if written.contains(path) {
            return false;
        }
        match path.strip_prefix(root) {
            Ok(rel) => !rel.components().any(|c| is_ignored(c.as_os_str())),
            Err(_) => false,
        }
    })
}
