// src/core/repository.rs
use std::path::Path;
use ignore::WalkBuilder;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

use crate::config::RepositoryConfig;
use crate::error::{DocweaverError, Result};
use super::snapshot::{truncate_at_char_boundary, FileRecord, RepositorySnapshot};

/// Builds a snapshot from a local checkout
pub struct RepositoryProvider {
    config: RepositoryConfig,
}

impl RepositoryProvider {
    pub fn new(config: &RepositoryConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Walk `root` and collect every allowlisted text file, sorted by path
    pub fn snapshot<P: AsRef<Path>>(&self, root: P) -> Result<RepositorySnapshot> {
        let root = root.as_ref();
        if !root.is_dir() {
            return Err(DocweaverError::InvalidInput(format!(
                "Source directory not found: {}",
                root.display()
            )));
        }

        let paths = if self.config.respect_gitignore {
            self.walk_with_gitignore(root)?
        } else {
            self.walk_all(root)?
        };

        let mut files = Vec::with_capacity(paths.len());
        for path in paths {
            if let Some(record) = self.read_file(root, &path)? {
                files.push(record);
            }
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));

        info!("Collected {} files from {}", files.len(), root.display());
        Ok(RepositorySnapshot::new(files))
    }

    fn walk_with_gitignore(&self, root: &Path) -> Result<Vec<std::path::PathBuf>> {
        let ignore_dirs = self.config.ignore_dirs.clone();
        let walker = WalkBuilder::new(root)
            .hidden(false)
            .git_ignore(true)
            .require_git(false)
            .filter_entry(move |entry| {
                let is_dir = entry.file_type().map(|t| t.is_dir()).unwrap_or(false);
                !(is_dir && ignore_dirs.iter().any(|d| entry.file_name() == d.as_str()))
            })
            .build();

        let mut paths = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| DocweaverError::Io(std::io::Error::other(e.to_string())))?;
            if entry.file_type().map(|t| t.is_file()).unwrap_or(false) && self.is_allowed(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    fn walk_all(&self, root: &Path) -> Result<Vec<std::path::PathBuf>> {
        let walker = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| !(entry.file_type().is_dir() && self.is_ignored_dir(entry.file_name())));

        let mut paths = Vec::new();
        for entry in walker {
            let entry = entry.map_err(|e| DocweaverError::Io(std::io::Error::other(e.to_string())))?;
            if entry.file_type().is_file() && self.is_allowed(entry.path()) {
                paths.push(entry.into_path());
            }
        }
        Ok(paths)
    }

    fn is_ignored_dir(&self, name: &std::ffi::OsStr) -> bool {
        self.config.ignore_dirs.iter().any(|d| name == d.as_str())
    }

    fn is_allowed(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|e| {
                let e = e.to_lowercase();
                self.config.extensions.iter().any(|allowed| *allowed == e)
            })
            .unwrap_or(false)
    }

    fn read_file(&self, root: &Path, path: &Path) -> Result<Option<FileRecord>> {
        let bytes = std::fs::read(path)?;
        let content = match String::from_utf8(bytes) {
            Ok(content) => content,
            Err(_) => {
                debug!("Skipping non-UTF-8 file {}", path.display());
                return Ok(None);
            }
        };

        let relative = path.strip_prefix(root).unwrap_or(path);
        let relative = relative
            .components()
            .map(|c| c.as_os_str().to_string_lossy())
            .collect::<Vec<_>>()
            .join("/");

        let content = if content.len() > self.config.max_file_size {
            warn!("Truncating {} ({} bytes)", relative, content.len());
            let mut truncated = truncate_at_char_boundary(&content, self.config.max_file_size).to_string();
            truncated.push_str(&self.config.truncation_marker);
            truncated
        } else {
            content
        };

        Ok(Some(FileRecord::new(relative, content)))
    }
}

/// Read a snapshot previously serialized as JSON
pub fn load_snapshot_file<P: AsRef<Path>>(path: P) -> Result<RepositorySnapshot> {
    let content = std::fs::read_to_string(path.as_ref())?;
    RepositorySnapshot::from_json(&content)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Config;
    use assert_fs::prelude::*;
    use predicates::prelude::*;

    fn provider(respect_gitignore: bool) -> RepositoryProvider {
        let mut config = Config::default().repository;
        config.respect_gitignore = respect_gitignore;
        config.max_file_size = 32;
        RepositoryProvider::new(&config)
    }

    fn fixture() -> assert_fs::TempDir {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("src/App.js").write_str("export default App;").unwrap();
        dir.child("src/utils/helpers.js").write_str("export const x = 1;").unwrap();
        dir.child("node_modules/react/index.js").write_str("module.exports = {};").unwrap();
        dir.child("dist/bundle.js").write_str("bundled").unwrap();
        dir.child("assets/logo.png").write_binary(&[0x89, 0x50, 0x4e, 0x47]).unwrap();
        dir.child("README.md").write_str("# Readme").unwrap();
        dir
    }

    #[test]
    fn test_snapshot_prunes_and_sorts() {
        let dir = fixture();
        for respect in [true, false] {
            let snapshot = provider(respect).snapshot(dir.path()).unwrap();
            let paths: Vec<&str> = snapshot.files.iter().map(|f| f.path.as_str()).collect();

            assert_eq!(paths, vec!["README.md", "src/App.js", "src/utils/helpers.js"]);
            assert_eq!(snapshot.total_files, 3);
        }
    }

    #[test]
    fn test_large_files_are_truncated_with_marker() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("big.js").write_str(&"é".repeat(40)).unwrap();

        let snapshot = provider(false).snapshot(dir.path()).unwrap();
        let content = &snapshot.files[0].content;

        assert!(predicate::str::ends_with("[content truncated]").eval(content));
        assert!(content.starts_with(&"é".repeat(16)));
    }

    #[test]
    fn test_non_utf8_files_are_skipped() {
        let dir = assert_fs::TempDir::new().unwrap();
        dir.child("data.json").write_binary(&[0xff, 0xfe, 0x00]).unwrap();
        dir.child("ok.js").write_str("ok").unwrap();

        let snapshot = provider(false).snapshot(dir.path()).unwrap();
        assert_eq!(snapshot.files.len(), 1);
        assert_eq!(snapshot.files[0].path, "ok.js");
    }

    #[test]
    fn test_missing_source_is_input_error() {
        let dir = assert_fs::TempDir::new().unwrap();
        let err = provider(true).snapshot(dir.path().join("absent")).unwrap_err();
        assert!(matches!(err, DocweaverError::InvalidInput(_)));
    }

    #[test]
    fn test_load_snapshot_file() {
        let dir = assert_fs::TempDir::new().unwrap();
        let file = dir.child("snapshot.json");
        file.write_str(r#"{"totalFiles": 9, "files": [{"path": "src/App.js", "content": "x"}]}"#)
            .unwrap();

        let snapshot = load_snapshot_file(file.path()).unwrap();
        assert_eq!(snapshot.total_files, 1);
        assert_eq!(snapshot.files[0].path, "src/App.js");
    }
}
