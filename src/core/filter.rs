// src/core/filter.rs
use regex::Regex;

use crate::error::Result;
use super::FileRecord;

/// Prefix of the one-line stub that replaces stylesheet bodies
pub const STYLESHEET_MARKER: &str = "/* reference only */";

/// Directory names whose contents never reach a chunk
pub const NOISY_DIRECTORIES: &[&str] = &["node_modules", ".git", "dist", "build"];

const BOILERPLATE_FILES: &[&str] = &[
    "manifest.json",
    "robots.txt",
    "index.html",
    "readme.md",
    "sitemap.xml",
    ".gitignore",
];

/// Drops noise files and reduces stylesheets to reference stubs
pub struct FileFilter {
    image_regex: Regex,
    license_regex: Regex,
    vendor_stylesheet_regex: Regex,
    stylesheet_regex: Regex,
}

impl FileFilter {
    pub fn new() -> Result<Self> {
        Ok(Self {
            image_regex: Regex::new(r"(?i)\.(png|jpe?g|gif|svg|ico)$")?,
            license_regex: Regex::new(r"(?i)^licen[cs]e(\.[a-z]+)?$")?,
            vendor_stylesheet_regex: Regex::new(
                r"(?i)^(bootstrap|font-?awesome|normalize|animate)([.-][a-z0-9.-]*)?\.css$",
            )?,
            stylesheet_regex: Regex::new(r"(?i)\.(css|scss|sass|less)$")?,
        })
    }

    /// Whether the record is noise that must never reach the generation step
    pub fn is_excluded(&self, record: &FileRecord) -> bool {
        let name = record.file_name();
        let lower_name = name.to_lowercase();

        if self.image_regex.is_match(&record.path) {
            return true;
        }
        if BOILERPLATE_FILES.contains(&lower_name.as_str()) {
            return true;
        }
        if self.license_regex.is_match(name) || self.vendor_stylesheet_regex.is_match(name) {
            return true;
        }

        in_noisy_directory(&record.path)
    }

    pub fn is_stylesheet(&self, record: &FileRecord) -> bool {
        self.stylesheet_regex.is_match(&record.path)
    }

    /// Apply the exclusion filter and stub out stylesheet bodies, preserving order
    pub fn apply(&self, files: &[FileRecord]) -> Vec<FileRecord> {
        files
            .iter()
            .filter(|record| !self.is_excluded(record))
            .map(|record| {
                if self.is_stylesheet(record) {
                    FileRecord::new(record.path.clone(), stylesheet_stub(&record.path))
                } else {
                    record.clone()
                }
            })
            .collect()
    }
}

pub fn stylesheet_stub(path: &str) -> String {
    format!("{} stylesheet file: {}", STYLESHEET_MARKER, path)
}

/// True when any directory segment of `path` is a noisy directory
pub fn in_noisy_directory(path: &str) -> bool {
    let segments: Vec<&str> = path.split('/').collect();
    let dirs = &segments[..segments.len().saturating_sub(1)];
    dirs.iter().any(|segment| NOISY_DIRECTORIES.contains(segment))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(path: &str) -> FileRecord {
        FileRecord::new(path, "body { color: red; }")
    }

    #[test]
    fn test_excludes_noise() {
        let filter = FileFilter::new().unwrap();
        for path in [
            "assets/logo.png",
            "public/Favicon.ICO",
            "img/photo.JPEG",
            "public/manifest.json",
            "public/robots.txt",
            "public/index.html",
            "README.md",
            "docs/Readme.md",
            "sitemap.xml",
            ".gitignore",
            "LICENSE",
            "License.txt",
            "css/bootstrap.min.css",
            "css/bootstrap-grid.rtl.css",
            "vendor/font-awesome.min.css",
            "node_modules/react/index.js",
            "client/dist/bundle.js",
        ] {
            assert!(filter.is_excluded(&record(path)), "expected {} to be excluded", path);
        }
    }

    #[test]
    fn test_keeps_source_files() {
        let filter = FileFilter::new().unwrap();
        for path in [
            "src/App.js",
            "src/licenseService.js",
            "src/build.rs",
            "server/routes/index.js",
            "src/styles/main.css",
        ] {
            assert!(!filter.is_excluded(&record(path)), "expected {} to be kept", path);
        }
    }

    #[test]
    fn test_stylesheet_body_replaced_by_stub() {
        let filter = FileFilter::new().unwrap();
        let files = vec![record("src/App.css"), FileRecord::new("src/App.js", "export default App;")];

        let filtered = filter.apply(&files);

        assert_eq!(filtered.len(), 2);
        assert_eq!(filtered[0].content, "/* reference only */ stylesheet file: src/App.css");
        assert_eq!(filtered[1].content, "export default App;");
    }

    #[test]
    fn test_preprocessor_stylesheets_are_stubbed_too() {
        let filter = FileFilter::new().unwrap();
        let files = vec![
            record("src/theme.scss"),
            record("src/legacy.SASS"),
            record("src/vars.less"),
        ];

        let filtered = filter.apply(&files);

        assert_eq!(filtered.len(), 3);
        assert_eq!(filtered[0].content, "/* reference only */ stylesheet file: src/theme.scss");
        assert!(filtered.iter().all(|f| f.content.starts_with(STYLESHEET_MARKER)));
    }

    #[test]
    fn test_noisy_directory_only_checks_directories() {
        assert!(in_noisy_directory("a/build/out.js"));
        assert!(!in_noisy_directory("build"));
        assert!(!in_noisy_directory("src/building/x.js"));
    }
}
