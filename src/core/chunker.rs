// src/core/chunker.rs
use std::collections::BTreeSet;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ChunkingConfig;
use crate::error::Result;
use super::analyzer::{RepositoryStructure, StructureAnalyzer};
use super::classifier::{DirectoryGroup, FileCategory, FileClassifier};
use super::filter::{in_noisy_directory, FileFilter};
use super::snapshot::serialized_len;
use super::{FileRecord, RepositorySnapshot};

/// Always chunk 0: the repository at a glance
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OverviewChunk {
    pub total_files: usize,
    pub file_list: Vec<String>,
    pub structure: RepositoryStructure,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DirectoryChunk {
    pub directory: String,
    pub files: Vec<FileRecord>,
}

/// Part of an oversized directory, holding one category (or a slice of one)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryChunk {
    pub directory: String,
    pub category: FileCategory,
    /// 1-based slice number when the category was split
    #[serde(skip_serializing_if = "Option::is_none")]
    pub part: Option<usize>,
    pub files: Vec<FileRecord>,
}

/// A bounded unit of repository content submitted as one generation call
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Chunk {
    Overview(OverviewChunk),
    Directory(DirectoryChunk),
    Category(CategoryChunk),
}

impl Chunk {
    pub fn kind(&self) -> &'static str {
        match self {
            Chunk::Overview(_) => "overview",
            Chunk::Directory(_) => "directory",
            Chunk::Category(_) => "category",
        }
    }

    pub fn directory(&self) -> Option<&str> {
        match self {
            Chunk::Overview(_) => None,
            Chunk::Directory(c) => Some(&c.directory),
            Chunk::Category(c) => Some(&c.directory),
        }
    }

    pub fn files(&self) -> &[FileRecord] {
        match self {
            Chunk::Overview(_) => &[],
            Chunk::Directory(c) => &c.files,
            Chunk::Category(c) => &c.files,
        }
    }

    /// Short human-readable label for logs and the plan listing
    pub fn label(&self) -> String {
        match self {
            Chunk::Overview(o) => format!("overview ({} files)", o.total_files),
            Chunk::Directory(c) => c.directory.clone(),
            Chunk::Category(c) => match c.part {
                Some(part) => format!("{} [{} part {}]", c.directory, c.category, part),
                None => format!("{} [{}]", c.directory, c.category),
            },
        }
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    pub fn serialized_len(&self) -> usize {
        serialized_len(self)
    }
}

/// Recover the set of file paths carried by a chunk sequence
pub fn reconstruct_file_paths(chunks: &[Chunk]) -> BTreeSet<String> {
    chunks
        .iter()
        .flat_map(|chunk| chunk.files().iter().map(|f| f.path.clone()))
        .collect()
}

/// Turns a snapshot into the ordered, size-bounded chunk sequence
pub struct ChunkBuilder {
    config: ChunkingConfig,
    filter: FileFilter,
    classifier: FileClassifier,
    analyzer: StructureAnalyzer,
}

impl ChunkBuilder {
    pub fn new(config: &ChunkingConfig) -> Result<Self> {
        Ok(Self {
            config: config.clone(),
            filter: FileFilter::new()?,
            classifier: FileClassifier::new()?,
            analyzer: StructureAnalyzer::new(),
        })
    }

    /// Filter, group and chunk a snapshot. Never fails on well-formed input.
    pub fn build(&self, snapshot: &RepositorySnapshot) -> Vec<Chunk> {
        let files = self.filter.apply(&snapshot.files);
        debug!(
            "Exclusion filter kept {} of {} files",
            files.len(),
            snapshot.files.len()
        );

        let mut chunks = vec![self.overview_chunk(&files)];

        let groups = self.classifier.group_by_directory(&files);
        for group in groups.iter() {
            if in_noisy_directory(&format!("{}/", group.directory)) {
                debug!("Skipping noisy directory group {}", group.directory);
                continue;
            }
            chunks.extend(self.chunk_group(group));
        }

        chunks
    }

    fn overview_chunk(&self, files: &[FileRecord]) -> Chunk {
        Chunk::Overview(OverviewChunk {
            total_files: files.len(),
            file_list: files.iter().map(|f| f.path.clone()).collect(),
            structure: self.analyzer.analyze(files),
        })
    }

    fn chunk_group(&self, group: &DirectoryGroup) -> Vec<Chunk> {
        let files: Vec<FileRecord> = group
            .files
            .iter()
            .filter(|f| f.path != "README.md")
            .cloned()
            .collect();

        if files.is_empty() {
            return vec![];
        }

        let size = serialized_len(&files);
        if size <= self.config.directory_chunk_bytes {
            return vec![Chunk::Directory(DirectoryChunk {
                directory: group.directory.clone(),
                files,
            })];
        }

        debug!(
            "Directory {} is {} bytes, splitting by category",
            group.directory, size
        );

        let mut chunks = Vec::new();
        for (category, category_files) in self.classifier.categorize(&files) {
            if category_files.len() > self.config.max_files_per_category {
                let parts = split_evenly(category_files, self.config.max_category_splits);
                for (i, part_files) in parts.into_iter().enumerate() {
                    chunks.push(Chunk::Category(CategoryChunk {
                        directory: group.directory.clone(),
                        category,
                        part: Some(i + 1),
                        files: part_files,
                    }));
                }
            } else {
                chunks.push(Chunk::Category(CategoryChunk {
                    directory: group.directory.clone(),
                    category,
                    part: None,
                    files: category_files,
                }));
            }
        }

        chunks
    }
}

/// Split into at most `max_parts` consecutive runs of near-equal length
fn split_evenly(files: Vec<FileRecord>, max_parts: usize) -> Vec<Vec<FileRecord>> {
    let parts = max_parts.max(1);
    let per_part = (files.len() + parts - 1) / parts;
    if per_part == 0 {
        return vec![];
    }

    let mut out = Vec::with_capacity(parts);
    let mut iter = files.into_iter().peekable();
    while iter.peek().is_some() {
        out.push(iter.by_ref().take(per_part).collect());
    }
    out
}
