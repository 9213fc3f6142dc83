//! Walks department workspaces and builds a [`WorkspaceSnapshot`].
//!
//! Each configured department lives under `<root>/workspace-<key>`. Files are
//! collected at most [`MAX_PATH_SEGMENTS`] path segments below the department
//! root; read failures are logged and skipped so a scan always produces a
//! snapshot.

use crate::classifier::{classify, extension_of};
use crate::config::Department;
use crate::models::{ActivityEntry, DepartmentScan, FileEntry, WorkspaceSnapshot, WorkspaceStats};
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

/// `report.md` and `sub/notes.md` are kept, `sub/deep/old.txt` is not.
pub const MAX_PATH_SEGMENTS: usize = 2;
pub const RECENT_ACTIVITY_LIMIT: usize = 20;

const IGNORED_NAMES: [&str; 3] = ["node_modules", "__pycache__", ".git"];
const SIZE_UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];

pub fn department_root(root: &Path, key: &str) -> PathBuf {
    root.join(format!("workspace-{key}"))
}

/// Fails when the workspace root itself cannot be listed.
pub fn probe_root(root: &Path) -> std::io::Result<()> {
    fs::read_dir(root).map(|_| ())
}

pub fn scan(root: &Path, departments: &[Department]) -> WorkspaceSnapshot {
    let now = Utc::now();
    if let Err(e) = probe_root(root) {
        warn!("Workspace root {:?} unreadable: {}", root, e);
        return WorkspaceSnapshot::empty(now);
    }

    let mut scans = Vec::with_capacity(departments.len());
    for dept in departments {
        let path = department_root(root, &dept.key);
        if !path.is_dir() {
            debug!("Skipping {}: {:?} not found", dept.key, path);
            continue;
        }
        if scans.iter().any(|s: &DepartmentScan| s.key == dept.key) {
            warn!("Department {} configured twice, keeping the first", dept.key);
            continue;
        }
        info!("Scanning {}...", dept.key);
        let files = scan_department(&path);
        scans.push(department_scan(dept, &path, files));
    }

    build_snapshot(now, scans)
}

/// Files under one department root in walk order (sorted by name per directory).
pub fn scan_department(dept_root: &Path) -> Vec<FileEntry> {
    let mut files = Vec::new();
    let walker = WalkDir::new(dept_root)
        .follow_links(true)
        .min_depth(1)
        .max_depth(MAX_PATH_SEGMENTS)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_ignored(e.file_name()));

    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(e) => {
                warn!("Error scanning {:?}: {}", dept_root, e);
                continue;
            }
        };
        if entry.file_type().is_dir() {
            continue;
        }
        match file_entry(dept_root, &entry) {
            Ok(file) => files.push(file),
            Err(e) => warn!("Error accessing {:?}: {}", entry.path(), e),
        }
    }
    files
}

pub fn is_ignored(name: &OsStr) -> bool {
    let name = name.to_string_lossy();
    name.starts_with('.') || IGNORED_NAMES.contains(&&*name)
}

fn file_entry(dept_root: &Path, entry: &DirEntry) -> walkdir::Result<FileEntry> {
    let meta = entry.metadata()?;
    let name = entry.file_name().to_string_lossy().into_owned();
    let relative_path = entry
        .path()
        .strip_prefix(dept_root)
        .map(posix_path)
        .unwrap_or_else(|_| name.clone());
    let modified_at = meta
        .modified()
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(UNIX_EPOCH));
    Ok(new_file_entry(name, relative_path, meta.len(), modified_at))
}

/// Builds a [`FileEntry`], deriving the display size, extension and type.
pub fn new_file_entry(
    name: String,
    relative_path: String,
    size_bytes: u64,
    modified_at: DateTime<Utc>,
) -> FileEntry {
    let extension = extension_of(&name);
    FileEntry {
        size_display: format_size(size_bytes),
        file_type: classify(&extension),
        name,
        relative_path,
        size_bytes,
        modified_at,
        extension,
    }
}

pub fn posix_path(path: &Path) -> String {
    path.components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

pub fn department_scan(dept: &Department, path: &Path, files: Vec<FileEntry>) -> DepartmentScan {
    DepartmentScan {
        key: dept.key.clone(),
        name: dept.name.clone(),
        path: path.to_string_lossy().into_owned(),
        file_count: files.len(),
        last_modified: files.iter().map(|f| f.modified_at).max(),
        files,
    }
}

/// Aggregates department scans (in configuration order) into a snapshot.
pub fn build_snapshot(timestamp: DateTime<Utc>, scans: Vec<DepartmentScan>) -> WorkspaceSnapshot {
    let mut recent_activity: Vec<ActivityEntry> = scans
        .iter()
        .flat_map(|dept| {
            dept.files.iter().map(move |f| ActivityEntry {
                file: f.clone(),
                department: dept.name.clone(),
                department_key: dept.key.clone(),
            })
        })
        .collect();
    recent_activity.sort_by(|a, b| b.file.modified_at.cmp(&a.file.modified_at));
    recent_activity.truncate(RECENT_ACTIVITY_LIMIT);

    let stats = WorkspaceStats {
        total_files: scans.iter().map(|d| d.file_count).sum(),
        total_departments: scans.len(),
        active_departments: scans.iter().filter(|d| d.file_count > 0).count(),
        last_update: Some(timestamp),
    };

    let departments: BTreeMap<String, DepartmentScan> =
        scans.into_iter().map(|d| (d.key.clone(), d)).collect();

    WorkspaceSnapshot {
        timestamp,
        departments,
        recent_activity,
        stats,
    }
}

/// Human-readable size: `"0 B"`, `"1.5 KB"`, `"1.0 GB"`.
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut unit = 0;
    while unit + 1 < SIZE_UNITS.len() && bytes >= 1024u64.pow(unit as u32 + 1) {
        unit += 1;
    }
    let value = bytes as f64 / 1024f64.powi(unit as i32);
    format!("{:.1} {}", value, SIZE_UNITS[unit])
}
