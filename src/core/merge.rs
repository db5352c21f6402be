// src/core/merge.rs
use std::collections::HashSet;
use regex::Regex;

use crate::error::Result;

/// Bare lines the generation calls use as section titles without `#` markers
const BARE_TITLES: &[&str] = &["Documentation", "Architecture Explanation"];

/// A heading line recognised by the block parser
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Heading {
    /// 1-3 for `#`..`###`, 0 for a bare title line
    pub level: u8,
    pub text: String,
    pub raw: String,
}

impl Heading {
    /// Identity used for de-duplication: the exact line minus surrounding whitespace
    pub fn key(&self) -> &str {
        self.raw.trim()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Block {
    Heading(Heading),
    Line(String),
}

/// Split markdown into heading and non-heading lines; fenced code is never a heading
pub fn parse_blocks(text: &str) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut in_fence = false;

    for line in text.split('\n') {
        let trimmed = line.trim();

        if trimmed.starts_with("```") || trimmed.starts_with("~~~") {
            in_fence = !in_fence;
            blocks.push(Block::Line(line.to_string()));
            continue;
        }

        if in_fence {
            blocks.push(Block::Line(line.to_string()));
            continue;
        }

        match parse_heading(line) {
            Some(heading) => blocks.push(Block::Heading(heading)),
            None => blocks.push(Block::Line(line.to_string())),
        }
    }

    blocks
}

fn parse_heading(line: &str) -> Option<Heading> {
    let trimmed = line.trim();

    if BARE_TITLES.contains(&trimmed) {
        return Some(Heading {
            level: 0,
            text: trimmed.to_string(),
            raw: line.to_string(),
        });
    }

    let hashes = trimmed.chars().take_while(|&c| c == '#').count();
    if !(1..=3).contains(&hashes) {
        return None;
    }

    let rest = &trimmed[hashes..];
    if !rest.starts_with(char::is_whitespace) || rest.trim().is_empty() {
        return None;
    }

    Some(Heading {
        level: hashes as u8,
        text: rest.trim().to_string(),
        raw: line.to_string(),
    })
}

fn render_blocks(blocks: &[Block]) -> String {
    blocks
        .iter()
        .map(|block| match block {
            Block::Heading(h) => h.raw.as_str(),
            Block::Line(l) => l.as_str(),
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Combines per-chunk outputs into one document, dropping structure the calls reintroduce
pub struct MergeEngine {
    continuation_regex: Regex,
    architecture_title_regex: Regex,
    domain_title_regex: Regex,
    blank_run_regex: Regex,
}

impl MergeEngine {
    pub fn new() -> Result<Self> {
        Ok(Self {
            continuation_regex: Regex::new(
                r"(?i)^\s*(?:continuing from (?:the )?previous section|continuing the documentation|moving on to the next part|documentation continued|part\s+\d+\s*:)[\s:.,!-]*",
            )?,
            architecture_title_regex: Regex::new(r"(?i)^architecture explanation:?$")?,
            domain_title_regex: Regex::new(r"(?i)^(?:front|back)[- ]?end documentation:?$")?,
            blank_run_regex: Regex::new(r"\n{3,}")?,
        })
    }

    /// Merge chunk outputs in order. Heading-driven and syntactic only: prose
    /// repeated outside a duplicate heading survives.
    pub fn merge(&self, responses: &[String]) -> String {
        match responses {
            [] => String::new(),
            [only] => only.clone(),
            [first, rest @ ..] => {
                let mut merged = first.clone();
                let mut seen = heading_keys(&parse_blocks(first));
                let mut appended = 0;

                for response in rest {
                    let cleaned = self.clean_chunk(response, &seen);
                    if cleaned.is_empty() {
                        continue;
                    }
                    seen.extend(heading_keys(&parse_blocks(&cleaned)));
                    if merged.trim().is_empty() {
                        merged.clear();
                    } else {
                        merged.push_str("\n\n");
                    }
                    merged.push_str(&cleaned);
                    appended += 1;
                }

                if appended == 0 {
                    return merged;
                }
                self.blank_run_regex.replace_all(&merged, "\n\n").into_owned()
            }
        }
    }

    /// Drop reintroduced headings first, then strip the continuation phrasing they exposed
    fn clean_chunk(&self, response: &str, seen: &HashSet<String>) -> String {
        let kept: Vec<Block> = parse_blocks(response)
            .into_iter()
            .filter(|block| match block {
                Block::Heading(heading) => !self.is_redundant_heading(heading, seen),
                Block::Line(_) => true,
            })
            .collect();

        let rendered = render_blocks(&kept);
        self.strip_continuation_phrases(rendered.trim_start())
            .trim()
            .to_string()
    }

    fn is_redundant_heading(&self, heading: &Heading, seen: &HashSet<String>) -> bool {
        if self.architecture_title_regex.is_match(&heading.text) {
            return true;
        }
        if heading.level <= 2 && self.domain_title_regex.is_match(&heading.text) {
            return true;
        }
        seen.contains(heading.key())
    }

    fn strip_continuation_phrases(&self, text: &str) -> String {
        let mut current = text.to_string();
        loop {
            let next = self.continuation_regex.replace(&current, "").into_owned();
            if next == current {
                return current;
            }
            current = next;
        }
    }
}

fn heading_keys(blocks: &[Block]) -> HashSet<String> {
    blocks
        .iter()
        .filter_map(|block| match block {
            Block::Heading(h) => Some(h.key().to_string()),
            Block::Line(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn engine() -> MergeEngine {
        MergeEngine::new().unwrap()
    }

    fn merge(parts: &[&str]) -> String {
        let owned: Vec<String> = parts.iter().map(|s| s.to_string()).collect();
        engine().merge(&owned)
    }

    #[test]
    fn test_empty_and_single() {
        assert_eq!(merge(&[]), "");
        let single = "# Title\n\n\n\n\nbody  ";
        assert_eq!(merge(&[single]), single);
    }

    #[test]
    fn test_duplicate_documentation_heading_scenario() {
        let merged = merge(&["# Documentation\n\nHello", "# Documentation\n\nWorld"]);
        assert_eq!(merged, "# Documentation\n\nHello\n\nWorld");
    }

    #[test]
    fn test_empty_trailing_response_keeps_content() {
        let a = "# Project\n\n\n\nSome *content* here.\n\n## Setup\n\nRun it.";
        let merged = merge(&[a, ""]);
        assert!(merged.contains(a));
    }

    #[test]
    fn test_strips_continuation_phrases() {
        let merged = merge(&[
            "# Docs\n\nIntro.",
            "Continuing from previous section...\n\n## API\n\nEndpoints.",
            "Part 3: Moving on to the next part.\n## Models\n\nSchemas.",
        ]);
        assert_eq!(merged, "# Docs\n\nIntro.\n\n## API\n\nEndpoints.\n\n## Models\n\nSchemas.");
    }

    #[test]
    fn test_continuation_phrase_behind_duplicate_heading_is_stripped() {
        let merged = merge(&[
            "# Documentation\n\nHello",
            "# Documentation\n\nContinuing the documentation\n\nWorld",
        ]);
        assert_eq!(merged, "# Documentation\n\nHello\n\nWorld");
        assert!(!merged.contains("Continuing"));
    }

    #[test]
    fn test_empty_first_response_adds_no_leading_separator() {
        let merged = merge(&["", "## API\n\nx"]);
        assert_eq!(merged, "## API\n\nx");

        let merged = merge(&["  \n", "", "## API\n\nx", "## Models\n\ny"]);
        assert_eq!(merged, "## API\n\nx\n\n## Models\n\ny");
    }

    #[test]
    fn test_drops_domain_and_architecture_titles() {
        let merged = merge(&[
            "# App\n\nOverview.",
            "## Architecture Explanation\n\nLayers.\n\n# Frontend Documentation\n\nReact bits.\n\n## Backend Documentation\n\nExpress bits.",
        ]);
        assert!(!merged.contains("Architecture Explanation"));
        assert!(!merged.contains("# Frontend Documentation"));
        assert!(!merged.contains("## Backend Documentation"));
        assert!(merged.contains("React bits."));
        assert!(merged.contains("Express bits."));
        assert!(merged.contains("Layers."));
    }

    #[test]
    fn test_heading_dedup_is_case_sensitive_and_across_chunks() {
        let merged = merge(&[
            "# App\n\n## Setup\n\nOne.",
            "## Setup\n\nTwo.\n\n## setup\n\nThree.\n\n### Routes\n\nA.",
            "### Routes\n\nB.",
        ]);
        assert_eq!(merged.matches("## Setup").count(), 1);
        assert!(merged.contains("## setup"));
        assert_eq!(merged.matches("### Routes").count(), 1);
        assert!(merged.contains("A.") && merged.contains("B."));
    }

    #[test]
    fn test_headings_inside_code_fences_are_kept() {
        let merged = merge(&[
            "# Guide\n\n## Usage\n\nText.",
            "```bash\n## Usage\n```\n\nMore.",
        ]);
        assert!(merged.contains("```bash\n## Usage\n```"));
    }

    #[test]
    fn test_deeper_headings_are_not_deduplicated() {
        let merged = merge(&["# A\n\n#### Notes\n\nx", "#### Notes\n\ny"]);
        assert_eq!(merged.matches("#### Notes").count(), 2);
    }

    #[test]
    fn test_collapses_blank_runs() {
        let merged = merge(&["# A\n\n\n\nx\n", "\n\n\ny"]);
        assert_eq!(merged, "# A\n\nx\n\ny");
    }

    #[test]
    fn test_parse_blocks() {
        let blocks = parse_blocks("# Title\nDocumentation\n#NoSpace\n##   \ntext");
        assert!(matches!(&blocks[0], Block::Heading(h) if h.level == 1 && h.text == "Title"));
        assert!(matches!(&blocks[1], Block::Heading(h) if h.level == 0));
        assert!(matches!(&blocks[2], Block::Line(_)));
        assert!(matches!(&blocks[3], Block::Line(_)));
        assert!(matches!(&blocks[4], Block::Line(_)));
    }
}
