// src/core/snapshot.rs
use serde::{Deserialize, Serialize};

use crate::error::{DocweaverError, Result};

/// One repository file as supplied by the repository provider
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    /// Forward-slash separated path relative to the repository root
    pub path: String,

    /// File content, possibly truncated by the provider
    pub content: String,
}

impl FileRecord {
    pub fn new(path: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Last path segment
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }

    /// Substring after the last `.` of the file name, if any
    pub fn extension(&self) -> Option<&str> {
        self.file_name()
            .rsplit_once('.')
            .map(|(_, ext)| ext)
            .filter(|ext| !ext.is_empty())
    }

    /// Path segments, ignoring empty ones produced by stray slashes
    pub fn segments(&self) -> Vec<&str> {
        self.path.split('/').filter(|s| !s.is_empty()).collect()
    }
}

/// Read-only input to the documentation pipeline
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    pub total_files: usize,
    pub files: Vec<FileRecord>,
}

impl RepositorySnapshot {
    pub fn new(files: Vec<FileRecord>) -> Self {
        Self {
            total_files: files.len(),
            files,
        }
    }

    /// Parse the serialized form sent by callers on the large-repository path
    pub fn from_json(content: &str) -> Result<Self> {
        let mut snapshot: RepositorySnapshot = serde_json::from_str(content).map_err(|e| {
            DocweaverError::InvalidInput(format!("Malformed repository content: {}", e))
        })?;

        // Trust the file list over a caller-supplied count
        snapshot.total_files = snapshot.files.len();
        Ok(snapshot)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Cheap check used to route requests before a full parse
    pub fn looks_like_json(content: &str) -> bool {
        let trimmed = content.trim_start();
        trimmed.starts_with('{') && trimmed.contains("\"files\"")
    }
}

/// Size of a value once serialized to JSON, the unit every threshold is measured in
pub fn serialized_len<T: Serialize + ?Sized>(value: &T) -> usize {
    serde_json::to_string(value).map(|s| s.len()).unwrap_or(0)
}

/// Truncate to at most `max_bytes`, backing off to a char boundary
pub fn truncate_at_char_boundary(text: &str, max_bytes: usize) -> &str {
    if text.len() <= max_bytes {
        return text;
    }
    let mut end = max_bytes;
    while end > 0 && !text.is_char_boundary(end) {
        end -= 1;
    }
    &text[..end]
}

/// First `max_chars` characters of `text`
pub fn char_prefix(text: &str, max_chars: usize) -> String {
    text.chars().take(max_chars).collect()
}
