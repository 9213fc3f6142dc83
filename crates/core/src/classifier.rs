//! Extension-based file classification.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileType {
    Document,
    Data,
    Code,
    Image,
    Audio,
    Video,
    Archive,
    File,
}

impl FileType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FileType::Document => "document",
            FileType::Data => "data",
            FileType::Code => "code",
            FileType::Image => "image",
            FileType::Audio => "audio",
            FileType::Video => "video",
            FileType::Archive => "archive",
            FileType::File => "file",
        }
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Maps an extension (with its leading dot) to a [`FileType`].
/// Matching ignores case; anything outside the table is [`FileType::File`].
pub fn classify(ext: &str) -> FileType {
    match ext.to_ascii_lowercase().as_str() {
        ".md" | ".txt" | ".pdf" => FileType::Document,
        ".json" => FileType::Data,
        ".js" | ".py" | ".html" | ".css" => FileType::Code,
        ".png" | ".jpg" | ".jpeg" | ".gif" | ".svg" => FileType::Image,
        ".mp3" | ".wav" => FileType::Audio,
        ".mp4" | ".mov" => FileType::Video,
        ".zip" | ".tar" | ".gz" => FileType::Archive,
        _ => FileType::File,
    }
}

/// Lowercased extension including the dot, or empty when the name has none.
pub fn extension_of(name: &str) -> String {
    Path::new(name)
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| format!(".{}", e.to_lowercase()))
        .unwrap_or_default()
}
