//! File-backed dashboard feeds kept next to the department workspaces:
//! the failures log (`<root>/failures/*.json`) and funnel metrics
//! (`<root>/analytics/funnel.json`).

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

pub const FAILURES_LIMIT: usize = 50;

/// One recorded failure. Fields beyond the required three are passed through.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FailureRecord {
    pub department: String,
    pub error: String,
    pub timestamp: DateTime<Utc>,
    #[serde(flatten)]
    pub details: Map<String, Value>,
}

pub fn failures_dir(root: &Path) -> PathBuf {
    root.join("failures")
}

pub fn funnel_path(root: &Path) -> PathBuf {
    root.join("analytics").join("funnel.json")
}

/// Newest first, at most [`FAILURES_LIMIT`]. A missing directory is an empty log;
/// unreadable files and records without `department`, `error` or `timestamp`
/// are skipped.
pub fn load_failures(dir: &Path) -> Vec<FailureRecord> {
    let read = match fs::read_dir(dir) {
        Ok(r) => r,
        Err(e) => {
            debug!("No failures log at {:?}: {}", dir, e);
            return Vec::new();
        }
    };

    let mut paths: Vec<PathBuf> = read
        .filter_map(|entry| match entry {
            Ok(e) => Some(e.path()),
            Err(e) => {
                warn!("Error listing {:?}: {}", dir, e);
                None
            }
        })
        .filter(|p| p.extension().is_some_and(|ext| ext == "json"))
        .collect();
    paths.sort();

    let mut failures: Vec<FailureRecord> = paths.iter().filter_map(|p| read_failure(p)).collect();
    failures.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    failures.truncate(FAILURES_LIMIT);
    failures
}

fn read_failure(path: &Path) -> Option<FailureRecord> {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            warn!("Error reading {:?}: {}", path, e);
            return None;
        }
    };
    match serde_json::from_str::<FailureRecord>(&text) {
        Ok(record) if !record.department.is_empty() && !record.error.is_empty() => Some(record),
        Ok(_) => {
            debug!("Skipping {:?}: empty department or error", path);
            None
        }
        Err(e) => {
            debug!("Skipping {:?}: {}", path, e);
            None
        }
    }
}

/// Parsed funnel metrics, or `{}` when the file is missing or malformed.
pub fn load_funnel(path: &Path) -> Value {
    let text = match fs::read_to_string(path) {
        Ok(t) => t,
        Err(e) => {
            debug!("No funnel metrics at {:?}: {}", path, e);
            return Value::Object(Map::new());
        }
    };
    serde_json::from_str(&text).unwrap_or_else(|e| {
        warn!("Malformed funnel metrics {:?}: {}", path, e);
        Value::Object(Map::new())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use serde_json::json;

    fn at(secs: i64) -> String {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap().to_rfc3339()
    }

    fn write(dir: &Path, name: &str, value: &Value) {
        fs::write(dir.join(name), value.to_string()).unwrap();
    }

    #[test]
    fn missing_directory_is_an_empty_log() {
        let temp = tempfile::tempdir().unwrap();
        assert!(load_failures(&failures_dir(temp.path())).is_empty());
    }

    #[test]
    fn skips_incomplete_and_foreign_files() {
        let temp = tempfile::tempdir().unwrap();
        let dir = failures_dir(temp.path());
        fs::create_dir_all(&dir).unwrap();

        write(
            &dir,
            "ok.json",
            &json!({"department": "seo-boss", "error": "crawl timed out", "timestamp": at(0), "retries": 3}),
        );
        write(&dir, "no-dept.json", &json!({"error": "x", "timestamp": at(1)}));
        write(&dir, "no-error.json", &json!({"department": "ads-boss", "timestamp": at(2)}));
        write(&dir, "no-time.json", &json!({"department": "ads-boss", "error": "x"}));
        write(&dir, "empty.json", &json!({"department": "", "error": "x", "timestamp": at(3)}));
        write(&dir, "notes.txt", &json!({"department": "a", "error": "x", "timestamp": at(4)}));
        fs::write(dir.join("broken.json"), "{not json").unwrap();

        let failures = load_failures(&dir);
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].department, "seo-boss");
        assert_eq!(failures[0].error, "crawl timed out");
        assert_eq!(failures[0].details["retries"], 3);
    }

    #[test]
    fn newest_first_and_capped() {
        let temp = tempfile::tempdir().unwrap();
        let dir = failures_dir(temp.path());
        fs::create_dir_all(&dir).unwrap();
        for i in 0..(FAILURES_LIMIT as i64 + 5) {
            write(
                &dir,
                &format!("f{i:03}.json"),
                &json!({"department": "ops", "error": format!("e{i}"), "timestamp": at(i * 60)}),
            );
        }

        let failures = load_failures(&dir);
        assert_eq!(failures.len(), FAILURES_LIMIT);
        assert_eq!(failures[0].error, "e54");
        assert!(failures.windows(2).all(|w| w[0].timestamp >= w[1].timestamp));
        assert!(!failures.iter().any(|f| f.error == "e4"));
    }

    #[test]
    fn serializes_required_fields_and_details_flat() {
        let record = FailureRecord {
            department: "seo-boss".into(),
            error: "boom".into(),
            timestamp: Utc.timestamp_opt(1_700_000_000, 0).unwrap(),
            details: Map::from_iter([("task".to_string(), json!("sitemap"))]),
        };
        let value = serde_json::to_value(&record).unwrap();
        assert_eq!(value["department"], "seo-boss");
        assert_eq!(value["task"], "sitemap");
        assert!(value.get("details").is_none());
    }

    #[test]
    fn funnel_defaults_to_empty_object() {
        let temp = tempfile::tempdir().unwrap();
        let path = funnel_path(temp.path());
        assert_eq!(load_funnel(&path), json!({}));

        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, "oops").unwrap();
        assert_eq!(load_funnel(&path), json!({}));

        fs::write(&path, r#"{"visitors": 120, "leads": 9}"#).unwrap();
        assert_eq!(load_funnel(&path)["leads"], 9);
    }
}
