//! File-browser navigation state.
//!
//! The UI keeps a single [`BrowserState`] and replaces it with the result of
//! [`apply`] for every user event, then re-renders from [`visible`].

use crate::models::{FileEntry, WorkspaceSnapshot};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BrowserState {
    pub department: Option<String>,
    /// Directory segments below the department root.
    pub directory: Vec<String>,
    pub open_file: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BrowserEvent {
    SelectDepartment { key: String },
    EnterDirectory { name: String },
    Up,
    OpenFile { path: String },
    CloseFile,
    Reset,
}

impl BrowserState {
    pub fn directory_path(&self) -> String {
        self.directory.join("/")
    }
}

pub fn apply(state: &BrowserState, event: BrowserEvent) -> BrowserState {
    match event {
        BrowserEvent::SelectDepartment { key } => BrowserState {
            department: Some(key),
            ..BrowserState::default()
        },
        BrowserEvent::EnterDirectory { name } => {
            if state.department.is_none() || !is_plain_segment(&name) {
                return state.clone();
            }
            let mut directory = state.directory.clone();
            directory.push(name);
            BrowserState {
                department: state.department.clone(),
                directory,
                open_file: None,
            }
        }
        BrowserEvent::Up => {
            let mut directory = state.directory.clone();
            directory.pop();
            BrowserState {
                department: state.department.clone(),
                directory,
                open_file: None,
            }
        }
        BrowserEvent::OpenFile { path } => {
            if state.department.is_none() {
                return state.clone();
            }
            BrowserState {
                open_file: Some(path),
                ..state.clone()
            }
        }
        BrowserEvent::CloseFile => BrowserState {
            open_file: None,
            ..state.clone()
        },
        BrowserEvent::Reset => BrowserState::default(),
    }
}

fn is_plain_segment(name: &str) -> bool {
    !name.is_empty() && name != "." && name != ".." && !name.contains('/')
}

/// What the browser shows for the current directory.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct Listing<'a> {
    pub directories: Vec<String>,
    pub files: Vec<&'a FileEntry>,
}

pub fn visible<'a>(snapshot: &'a WorkspaceSnapshot, state: &BrowserState) -> Listing<'a> {
    let Some(dept) = state
        .department
        .as_ref()
        .and_then(|key| snapshot.departments.get(key))
    else {
        return Listing::default();
    };

    let prefix = if state.directory.is_empty() {
        String::new()
    } else {
        format!("{}/", state.directory_path())
    };

    let mut directories = BTreeSet::new();
    let mut files = Vec::new();
    for file in &dept.files {
        let Some(rest) = file.relative_path.strip_prefix(&prefix) else {
            continue;
        };
        match rest.split_once('/') {
            Some((dir, _)) => {
                directories.insert(dir.to_string());
            }
            None => files.push(file),
        }
    }

    Listing {
        directories: directories.into_iter().collect(),
        files,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Department;
    use crate::scanner::{build_snapshot, department_scan, new_file_entry};
    use chrono::Utc;
    use std::path::Path;

    fn snapshot() -> WorkspaceSnapshot {
        let now = Utc::now();
        let files = ["readme.md", "assets/logo.png", "assets/banner.svg", "notes/a.txt"]
            .iter()
            .map(|p| {
                let name = p.rsplit('/').next().unwrap().to_string();
                new_file_entry(name, p.to_string(), 1, now)
            })
            .collect();
        let dept = Department::new("design-boss", "Design & Visual");
        let scan = department_scan(&dept, Path::new("/ws/workspace-design-boss"), files);
        build_snapshot(now, vec![scan])
    }

    fn select(key: &str) -> BrowserState {
        apply(
            &BrowserState::default(),
            BrowserEvent::SelectDepartment { key: key.into() },
        )
    }

    #[test]
    fn department_root_lists_files_and_subdirectories() {
        let snap = snapshot();
        let listing = visible(&snap, &select("design-boss"));
        assert_eq!(listing.directories, vec!["assets", "notes"]);
        let names: Vec<&str> = listing.files.iter().map(|f| f.name.as_str()).collect();
        assert_eq!(names, vec!["readme.md"]);
    }

    #[test]
    fn entering_and_leaving_a_directory() {
        let snap = snapshot();
        let state = apply(
            &select("design-boss"),
            BrowserEvent::EnterDirectory {
                name: "assets".into(),
            },
        );
        assert_eq!(state.directory_path(), "assets");
        let listing = visible(&snap, &state);
        assert!(listing.directories.is_empty());
        assert_eq!(listing.files.len(), 2);

        let back = apply(&state, BrowserEvent::Up);
        assert!(back.directory.is_empty());
        assert_eq!(back.department.as_deref(), Some("design-boss"));
    }

    #[test]
    fn selecting_a_department_clears_navigation() {
        let state = apply(
            &select("design-boss"),
            BrowserEvent::EnterDirectory { name: "notes".into() },
        );
        let state = apply(&state, BrowserEvent::OpenFile { path: "notes/a.txt".into() });
        assert_eq!(state.open_file.as_deref(), Some("notes/a.txt"));

        let switched = apply(&state, BrowserEvent::SelectDepartment { key: "seo-boss".into() });
        assert_eq!(switched, select("seo-boss"));
    }

    #[test]
    fn events_without_department_are_ignored() {
        let empty = BrowserState::default();
        assert_eq!(apply(&empty, BrowserEvent::EnterDirectory { name: "x".into() }), empty);
        assert_eq!(apply(&empty, BrowserEvent::OpenFile { path: "x".into() }), empty);
        assert_eq!(visible(&snapshot(), &empty), Listing::default());
    }

    #[test]
    fn rejects_path_like_directory_names() {
        let state = select("design-boss");
        for name in ["", ".", "..", "a/b"] {
            assert_eq!(apply(&state, BrowserEvent::EnterDirectory { name: name.into() }), state);
        }
    }

    #[test]
    fn close_and_reset() {
        let state = apply(&select("design-boss"), BrowserEvent::OpenFile { path: "readme.md".into() });
        assert_eq!(apply(&state, BrowserEvent::CloseFile).open_file, None);
        assert_eq!(apply(&state, BrowserEvent::Reset), BrowserState::default());
    }

    #[test]
    fn events_deserialize_from_tagged_json() {
        let event: BrowserEvent =
            serde_json::from_str(r#"{"type":"enter_directory","name":"assets"}"#).unwrap();
        assert_eq!(event, BrowserEvent::EnterDirectory { name: "assets".into() });
        assert!(serde_json::from_str::<BrowserEvent>(r#"{"type":"teleport"}"#).is_err());
    }
}
