//! Read access to files inside department workspaces.
//!
//! Every request path is resolved against a configured department root and
//! may only contain plain, non-hidden components.

use crate::config::{Department, WorkspaceConfig};
use crate::feeds::{self, FailureRecord};
use crate::models::WorkspaceSnapshot;
use crate::scanner::{self, format_size, is_ignored, posix_path};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::io;
use std::path::{Component, Path, PathBuf};
use std::time::UNIX_EPOCH;
use thiserror::Error;
use tracing::warn;

#[derive(Debug, Error)]
pub enum ContentError {
    #[error("unknown department: {0}")]
    UnknownDepartment(String),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("file not found: {0}")]
    NotFound(String),
    #[error("failed to read {path}: {source}")]
    Read {
        path: String,
        #[source]
        source: io::Error,
    },
}

impl ContentError {
    fn from_io(relative: &str, source: io::Error) -> Self {
        if source.kind() == io::ErrorKind::NotFound {
            ContentError::NotFound(relative.to_string())
        } else {
            ContentError::Read {
                path: relative.to_string(),
                source,
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    Dir,
    File,
}

/// One row of a directory listing.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntryView {
    pub name: String,
    #[serde(rename = "type")]
    pub kind: EntryKind,
    pub size_bytes: u64,
    pub size_display: String,
    pub modified_at: DateTime<Utc>,
    pub path: String,
}

#[derive(Debug, Clone)]
pub struct Workspace {
    root: PathBuf,
    departments: Vec<Department>,
}

impl Workspace {
    pub fn new(root: impl Into<PathBuf>, departments: Vec<Department>) -> Self {
        Self {
            root: root.into(),
            departments,
        }
    }

    pub fn from_config(cfg: &WorkspaceConfig) -> Self {
        Self::new(&cfg.root, cfg.departments.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn departments(&self) -> &[Department] {
        &self.departments
    }

    pub fn scan(&self) -> WorkspaceSnapshot {
        scanner::scan(&self.root, &self.departments)
    }

    pub fn failures(&self) -> Vec<FailureRecord> {
        feeds::load_failures(&feeds::failures_dir(&self.root))
    }

    pub fn funnel(&self) -> Value {
        feeds::load_funnel(&feeds::funnel_path(&self.root))
    }

    pub fn department_root(&self, key: &str) -> Result<PathBuf, ContentError> {
        if !self.departments.iter().any(|d| d.key == key) {
            return Err(ContentError::UnknownDepartment(key.to_string()));
        }
        Ok(scanner::department_root(&self.root, key))
    }

    /// Joins `relative` onto the department root. An empty path is the root itself.
    pub fn resolve(&self, key: &str, relative: &str) -> Result<PathBuf, ContentError> {
        let mut path = self.department_root(key)?;
        for component in Path::new(relative).components() {
            match component {
                Component::Normal(name) if !is_ignored(name) => path.push(name),
                Component::CurDir => {}
                _ => return Err(ContentError::InvalidPath(relative.to_string())),
            }
        }
        Ok(path)
    }

    pub fn read_text(&self, key: &str, relative: &str) -> Result<String, ContentError> {
        let path = self.resolve(key, relative)?;
        let bytes = fs::read(&path).map_err(|e| ContentError::from_io(relative, e))?;
        Ok(String::from_utf8_lossy(&bytes).into_owned())
    }

    /// Opens a regular file for streaming; directories are rejected.
    pub fn open(&self, key: &str, relative: &str) -> Result<(fs::File, u64), ContentError> {
        let path = self.resolve(key, relative)?;
        let meta = fs::metadata(&path).map_err(|e| ContentError::from_io(relative, e))?;
        if meta.is_dir() {
            return Err(ContentError::InvalidPath(relative.to_string()));
        }
        let file = fs::File::open(&path).map_err(|e| ContentError::from_io(relative, e))?;
        Ok((file, meta.len()))
    }

    /// Entries of one directory, most recently modified first.
    pub fn list_directory(&self, key: &str, relative: &str) -> Result<Vec<DirEntryView>, ContentError> {
        let dir = self.resolve(key, relative)?;
        let meta = fs::metadata(&dir).map_err(|e| ContentError::from_io(relative, e))?;
        if !meta.is_dir() {
            return Err(ContentError::InvalidPath(relative.to_string()));
        }
        let read = fs::read_dir(&dir).map_err(|e| ContentError::from_io(relative, e))?;
        let base = Path::new(relative);

        let mut entries = Vec::new();
        for entry in read {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Error listing {:?}: {}", dir, e);
                    continue;
                }
            };
            let name = entry.file_name();
            if is_ignored(&name) {
                continue;
            }
            let meta = match fs::metadata(entry.path()) {
                Ok(m) => m,
                Err(e) => {
                    warn!("Error accessing {:?}: {}", entry.path(), e);
                    continue;
                }
            };
            let kind = if meta.is_dir() {
                EntryKind::Dir
            } else {
                EntryKind::File
            };
            let size_bytes = meta.len();
            entries.push(DirEntryView {
                name: name.to_string_lossy().into_owned(),
                kind,
                size_bytes,
                size_display: format_size(size_bytes),
                modified_at: meta
                    .modified()
                    .map(DateTime::<Utc>::from)
                    .unwrap_or_else(|_| DateTime::<Utc>::from(UNIX_EPOCH)),
                path: posix_path(&base.join(&name)),
            });
        }
        entries.sort_by(|a, b| {
            b.modified_at
                .cmp(&a.modified_at)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(entries)
    }
}
