// src/core/classifier.rs
use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use super::FileRecord;

/// Group key used for files at the repository root
pub const ROOT_GROUP: &str = "root";

/// Semantic bucket used to keep related files together inside oversized directories
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Components,
    Pages,
    Utils,
    Hooks,
    Contexts,
    Tests,
    Other,
}

impl FileCategory {
    /// Emission order for category chunks
    pub const ALL: [FileCategory; 7] = [
        FileCategory::Components,
        FileCategory::Pages,
        FileCategory::Utils,
        FileCategory::Hooks,
        FileCategory::Contexts,
        FileCategory::Tests,
        FileCategory::Other,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            FileCategory::Components => "components",
            FileCategory::Pages => "pages",
            FileCategory::Utils => "utils",
            FileCategory::Hooks => "hooks",
            FileCategory::Contexts => "contexts",
            FileCategory::Tests => "tests",
            FileCategory::Other => "other",
        }
    }
}

impl fmt::Display for FileCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Files sharing one directory key
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectoryGroup {
    pub directory: String,
    pub files: Vec<FileRecord>,
}

/// Directory groups in first-seen order
#[derive(Debug, Clone, Default)]
pub struct DirectoryGroups {
    groups: Vec<DirectoryGroup>,
}

impl DirectoryGroups {
    pub fn iter(&self) -> impl Iterator<Item = &DirectoryGroup> {
        self.groups.iter()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.is_empty()
    }

    pub fn get(&self, directory: &str) -> Option<&DirectoryGroup> {
        self.groups.iter().find(|g| g.directory == directory)
    }

    pub fn total_files(&self) -> usize {
        self.groups.iter().map(|g| g.files.len()).sum()
    }
}

/// Directory key for a path: all segments but the last, or `root` for top-level files
pub fn directory_key(path: &str) -> String {
    match path.rsplit_once('/') {
        Some((dir, _)) if !dir.is_empty() => dir.to_string(),
        _ => ROOT_GROUP.to_string(),
    }
}

/// Groups files by directory and classifies files inside oversized groups
pub struct FileClassifier {
    component_name_regex: Regex,
}

impl FileClassifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            component_name_regex: Regex::new(r"^[A-Z][a-z]+\.(jsx|tsx|js|ts)$")?,
        })
    }

    /// Group every record under exactly one directory key, preserving input order
    pub fn group_by_directory(&self, files: &[FileRecord]) -> DirectoryGroups {
        let mut groups: Vec<DirectoryGroup> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::new();

        for file in files {
            let key = directory_key(&file.path);
            match index.get(&key) {
                Some(&i) => groups[i].files.push(file.clone()),
                None => {
                    index.insert(key.clone(), groups.len());
                    groups.push(DirectoryGroup {
                        directory: key,
                        files: vec![file.clone()],
                    });
                }
            }
        }

        DirectoryGroups { groups }
    }

    /// First matching rule wins
    pub fn classify(&self, record: &FileRecord) -> FileCategory {
        let path = record.path.to_lowercase();
        let name = record.file_name();

        if path.contains("component")
            || path.ends_with(".jsx")
            || path.ends_with(".tsx")
            || self.component_name_regex.is_match(name)
        {
            FileCategory::Components
        } else if path.contains("page") || path.contains("/pages/") {
            FileCategory::Pages
        } else if path.contains("util") || path.contains("helper") {
            FileCategory::Utils
        } else if path.contains("hook") || name.starts_with("use") {
            FileCategory::Hooks
        } else if path.contains("context") || path.contains("provider") {
            FileCategory::Contexts
        } else if path.contains("test") || path.contains("spec") {
            FileCategory::Tests
        } else {
            FileCategory::Other
        }
    }

    /// Split files into non-empty categories in emission order, each sorted for adjacency
    pub fn categorize(&self, files: &[FileRecord]) -> Vec<(FileCategory, Vec<FileRecord>)> {
        let mut buckets: HashMap<FileCategory, Vec<FileRecord>> = HashMap::new();
        for file in files {
            buckets.entry(self.classify(file)).or_default().push(file.clone());
        }

        FileCategory::ALL
            .iter()
            .filter_map(|category| {
                buckets.remove(category).map(|mut files| {
                    sort_within_category(&mut files);
                    (*category, files)
                })
            })
            .collect()
    }
}

/// Index files first, then by extension, then by path
pub fn sort_within_category(files: &mut [FileRecord]) {
    files.sort_by(|a, b| compare_for_adjacency(a, b));
}

fn compare_for_adjacency(a: &FileRecord, b: &FileRecord) -> Ordering {
    let a_index = is_index_file(a);
    let b_index = is_index_file(b);

    b_index
        .cmp(&a_index)
        .then_with(|| a.extension().unwrap_or("").cmp(b.extension().unwrap_or("")))
        .then_with(|| a.path.cmp(&b.path))
}

fn is_index_file(record: &FileRecord) -> bool {
    let name = record.file_name().to_lowercase();
    name == "index" || name.starts_with("index.")
}
