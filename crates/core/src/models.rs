use crate::classifier::FileType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// One scanned file, relative to its department root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub relative_path: String,
    pub size_bytes: u64,
    pub size_display: String,
    pub modified_at: DateTime<Utc>,
    #[serde(rename = "type")]
    pub file_type: FileType,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentScan {
    pub key: String,
    pub name: String,
    pub path: String,
    pub files: Vec<FileEntry>,
    pub file_count: usize,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
}

/// A file from the activity feed, tagged with the department it came from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEntry {
    #[serde(flatten)]
    pub file: FileEntry,
    pub department: String,
    pub department_key: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceStats {
    pub total_files: usize,
    pub total_departments: usize,
    pub active_departments: usize,
    #[serde(default)]
    pub last_update: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkspaceSnapshot {
    pub timestamp: DateTime<Utc>,
    pub departments: BTreeMap<String, DepartmentScan>,
    pub recent_activity: Vec<ActivityEntry>,
    pub stats: WorkspaceStats,
}

impl WorkspaceSnapshot {
    /// Snapshot of a workspace where nothing could be scanned.
    pub fn empty(timestamp: DateTime<Utc>) -> Self {
        Self {
            timestamp,
            departments: BTreeMap::new(),
            recent_activity: Vec::new(),
            stats: WorkspaceStats {
                last_update: Some(timestamp),
                ..WorkspaceStats::default()
            },
        }
    }
}
