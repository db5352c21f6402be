// src/core/analyzer.rs
use std::collections::BTreeMap;
use serde::{Deserialize, Serialize};

use super::FileRecord;

/// Aggregate shape of a repository, embedded in the overview chunk
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositoryStructure {
    pub extension_counts: BTreeMap<String, usize>,
    pub top_directory_counts: BTreeMap<String, usize>,
}

/// Computes extension and top-level directory statistics
pub struct StructureAnalyzer;

impl StructureAnalyzer {
    pub fn new() -> Self {
        Self
    }

    pub fn analyze(&self, files: &[FileRecord]) -> RepositoryStructure {
        let mut structure = RepositoryStructure::default();

        for file in files {
            if let Some(ext) = file.extension() {
                *structure.extension_counts.entry(ext.to_string()).or_insert(0) += 1;
            }

            if let Some(top) = file.segments().first() {
                *structure.top_directory_counts.entry(top.to_string()).or_insert(0) += 1;
            }
        }

        structure
    }
}

impl Default for StructureAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_extensions_and_top_dirs() {
        let files = vec![
            FileRecord::new("src/App.js", ""),
            FileRecord::new("src/utils/helpers.js", ""),
            FileRecord::new("server/index.ts", ""),
            FileRecord::new("Dockerfile", ""),
        ];

        let structure = StructureAnalyzer::new().analyze(&files);

        assert_eq!(structure.extension_counts.get("js"), Some(&2));
        assert_eq!(structure.extension_counts.get("ts"), Some(&1));
        assert_eq!(structure.extension_counts.len(), 2);
        assert_eq!(structure.top_directory_counts.get("src"), Some(&2));
        assert_eq!(structure.top_directory_counts.get("server"), Some(&1));
        assert_eq!(structure.top_directory_counts.get("Dockerfile"), Some(&1));
    }

    #[test]
    fn test_empty_input() {
        let structure = StructureAnalyzer::new().analyze(&[]);
        assert!(structure.extension_counts.is_empty());
        assert!(structure.top_directory_counts.is_empty());
    }
}
