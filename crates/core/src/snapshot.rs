//! Snapshot export and validated loading.

use crate::classifier::classify;
use crate::models::WorkspaceSnapshot;
use crate::scanner::{format_size, RECENT_ACTIVITY_LIMIT};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum SnapshotError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("malformed snapshot JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("inconsistent snapshot: {0}")]
    Invalid(String),
}

fn io_err(path: &Path) -> impl FnOnce(io::Error) -> SnapshotError + '_ {
    move |source| SnapshotError::Io {
        path: path.to_path_buf(),
        source,
    }
}

/// `workspace-data.json` -> `workspace-data.min.json`.
pub fn minified_path(output: &Path) -> PathBuf {
    let stem = output
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "workspace-data".to_string());
    output.with_file_name(format!("{stem}.min.json"))
}

/// Writes pretty JSON to `output` and a minified copy next to it.
/// Returns the minified path.
pub fn write_snapshot(snapshot: &WorkspaceSnapshot, output: &Path) -> Result<PathBuf, SnapshotError> {
    if let Some(parent) = output.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(io_err(parent))?;
    }
    let pretty = serde_json::to_string_pretty(snapshot)?;
    fs::write(output, pretty).map_err(io_err(output))?;

    let min_path = minified_path(output);
    let compact = serde_json::to_string(snapshot)?;
    fs::write(&min_path, compact).map_err(io_err(&min_path))?;
    Ok(min_path)
}

pub fn load_snapshot(path: &Path) -> Result<WorkspaceSnapshot, SnapshotError> {
    let text = fs::read_to_string(path).map_err(io_err(path))?;
    parse_snapshot(&text)
}

pub fn parse_snapshot(text: &str) -> Result<WorkspaceSnapshot, SnapshotError> {
    let snapshot: WorkspaceSnapshot = serde_json::from_str(text)?;
    validate(&snapshot)?;
    Ok(snapshot)
}

/// Checks the derived fields and aggregates against the data they derive from.
pub fn validate(snapshot: &WorkspaceSnapshot) -> Result<(), SnapshotError> {
    let invalid = |msg: String| -> Result<(), SnapshotError> { Err(SnapshotError::Invalid(msg)) };

    for (key, dept) in &snapshot.departments {
        if &dept.key != key {
            return invalid(format!("department {key} carries key {}", dept.key));
        }
        if dept.file_count != dept.files.len() {
            return invalid(format!(
                "department {key}: fileCount {} but {} files",
                dept.file_count,
                dept.files.len()
            ));
        }
        if dept.last_modified != dept.files.iter().map(|f| f.modified_at).max() {
            return invalid(format!("department {key}: lastModified does not match files"));
        }
        for file in &dept.files {
            if file.size_display != format_size(file.size_bytes) {
                return invalid(format!(
                    "{}: sizeDisplay {:?} does not match {} bytes",
                    file.relative_path, file.size_display, file.size_bytes
                ));
            }
            if file.file_type != classify(&file.extension) {
                return invalid(format!(
                    "{}: type {} does not match extension {:?}",
                    file.relative_path, file.file_type, file.extension
                ));
            }
        }
    }

    let recent = &snapshot.recent_activity;
    if recent.len() > RECENT_ACTIVITY_LIMIT {
        return invalid(format!("recentActivity has {} entries", recent.len()));
    }
    if recent
        .windows(2)
        .any(|w| w[0].file.modified_at < w[1].file.modified_at)
    {
        return invalid("recentActivity is not sorted newest first".to_string());
    }

    let stats = &snapshot.stats;
    let total_files: usize = snapshot.departments.values().map(|d| d.file_count).sum();
    let active = snapshot
        .departments
        .values()
        .filter(|d| d.file_count > 0)
        .count();
    if stats.total_files != total_files
        || stats.total_departments != snapshot.departments.len()
        || stats.active_departments != active
    {
        return invalid(format!(
            "stats {}/{}/{} do not match departments",
            stats.total_files, stats.total_departments, stats.active_departments
        ));
    }
    if recent.len() != total_files.min(RECENT_ACTIVITY_LIMIT) {
        return invalid(format!(
            "recentActivity has {} entries for {} files",
            recent.len(),
            total_files
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Department;
    use crate::scanner::{build_snapshot, department_scan, new_file_entry};
    use chrono::{TimeZone, Utc};

    fn sample() -> WorkspaceSnapshot {
        let t = |s| Utc.timestamp_opt(s, 0).unwrap();
        let dept = Department::new("seo-boss", "SEO & Search");
        let files = vec![
            new_file_entry("plan.md".into(), "plan.md".into(), 2048, t(1_700_000_000)),
            new_file_entry("data.json".into(), "raw/data.json".into(), 10, t(1_700_000_500)),
        ];
        let scan = department_scan(&dept, Path::new("/ws/workspace-seo-boss"), files);
        build_snapshot(t(1_700_001_000), vec![scan])
    }

    #[test]
    fn write_then_load_preserves_snapshot() {
        let temp = tempfile::tempdir().unwrap();
        let output = temp.path().join("out/workspace-data.json");
        let snapshot = sample();

        let min_path = write_snapshot(&snapshot, &output).unwrap();
        assert_eq!(min_path, temp.path().join("out/workspace-data.min.json"));
        assert!(!fs::read_to_string(&min_path).unwrap().contains('\n'));

        assert_eq!(load_snapshot(&output).unwrap(), snapshot);
        assert_eq!(load_snapshot(&min_path).unwrap(), snapshot);
    }

    #[test]
    fn json_uses_dashboard_field_names() {
        let value = serde_json::to_value(sample()).unwrap();
        let dept = &value["departments"]["seo-boss"];
        assert_eq!(dept["fileCount"], 2);
        assert_eq!(dept["files"][0]["sizeDisplay"], "2.0 KB");
        assert_eq!(dept["files"][0]["type"], "document");
        assert_eq!(dept["files"][1]["relativePath"], "raw/data.json");
        assert_eq!(value["recentActivity"][0]["departmentKey"], "seo-boss");
        assert_eq!(value["recentActivity"][0]["department"], "SEO & Search");
        assert_eq!(value["stats"]["activeDepartments"], 1);
        assert!(value["timestamp"].as_str().unwrap().starts_with("2023-11-14T"));
    }

    #[test]
    fn rejects_unknown_file_type() {
        let mut value = serde_json::to_value(sample()).unwrap();
        value["departments"]["seo-boss"]["files"][0]["type"] = "spreadsheet".into();
        let err = parse_snapshot(&value.to_string()).unwrap_err();
        assert!(matches!(err, SnapshotError::Json(_)));
    }

    #[test]
    fn rejects_mismatched_file_count() {
        let mut snapshot = sample();
        snapshot.departments.get_mut("seo-boss").unwrap().file_count = 5;
        let err = validate(&snapshot).unwrap_err();
        assert!(matches!(err, SnapshotError::Invalid(_)));
    }

    #[test]
    fn rejects_stale_size_display() {
        let mut snapshot = sample();
        snapshot.departments.get_mut("seo-boss").unwrap().files[0].size_display = "9 KB".into();
        assert!(validate(&snapshot).is_err());
    }

    #[test]
    fn rejects_unsorted_activity() {
        let mut snapshot = sample();
        snapshot.recent_activity.reverse();
        assert!(validate(&snapshot).is_err());
    }

    #[test]
    fn missing_file_is_io_error() {
        let temp = tempfile::tempdir().unwrap();
        let err = load_snapshot(&temp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, SnapshotError::Io { .. }));
    }
}
