use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::error::{DocweaverError, Result};

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Text-generation provider (openai, gemini)
    pub provider: String,

    /// Model name (e.g., "gpt-4o-mini", "gemini-1.5-flash")
    pub model: String,

    /// API key; falls back to OPENAI_API_KEY / GEMINI_API_KEY when unset
    pub api_key: Option<String>,

    /// Base URL for OpenAI-compatible endpoints
    pub base_url: Option<String>,

    /// Maximum tokens per generation call
    pub max_output_tokens: u32,

    /// Temperature for generation calls (0.0 to 1.0)
    pub temperature: f32,
}

impl LlmConfig {
    /// Resolve the API key from config or the provider's environment variable
    pub fn resolve_api_key(&self) -> Option<String> {
        if let Some(key) = self.api_key.as_ref().filter(|k| !k.trim().is_empty()) {
            return Some(key.clone());
        }

        let env_var = match self.provider.as_str() {
            "gemini" => "GEMINI_API_KEY",
            _ => "OPENAI_API_KEY",
        };
        std::env::var(env_var).ok().filter(|k| !k.trim().is_empty())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Text-generation service settings
    pub llm: LlmConfig,

    /// Chunk sizing and orchestration bounds
    pub chunking: ChunkingConfig,

    /// Documentation generation settings
    pub generation: GenerationConfig,

    /// Prompt template customization
    pub templates: TemplateConfig,

    /// Local repository walking
    pub repository: RepositoryConfig,

    /// Session document storage
    pub session: SessionConfig,
}

/// Byte-size heuristics standing in for the generation service's input limit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChunkingConfig {
    /// Directory groups at or below this serialized size become one chunk
    pub directory_chunk_bytes: usize,

    /// Categories holding more files than this are split further
    pub max_files_per_category: usize,

    /// Upper bound on sub-chunks per oversized category
    pub max_category_splits: usize,

    /// Only the first N chunks are sent for generation
    pub max_chunks: usize,

    /// Each serialized chunk is truncated to this size before submission
    pub max_chunk_prompt_bytes: usize,

    /// Characters of the previous output carried forward as context
    pub summary_chars: usize,

    /// Content below this size is documented in a single call
    pub single_pass_bytes: usize,

    /// Merged documents at or above this size skip refinement
    pub refine_max_bytes: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationConfig {
    /// Fixed system instruction describing documentation style
    pub system_instruction: String,

    /// Whether to run the refinement pass over multi-chunk documents
    pub refine: bool,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TemplateConfig {
    /// Directory containing `<name>.tera` overrides for the built-in prompts
    pub template_dir: Option<PathBuf>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RepositoryConfig {
    /// File extensions (without the dot) included in snapshots
    pub extensions: Vec<String>,

    /// Files larger than this (in bytes) are truncated
    pub max_file_size: usize,

    /// Appended to truncated file content
    pub truncation_marker: String,

    /// Directory names never descended into
    pub ignore_dirs: Vec<String>,

    /// Honour .gitignore files while walking
    pub respect_gitignore: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Storage backend: "memory" or "file"
    pub backend: String,

    /// Directory for the file backend
    pub state_dir: PathBuf,
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            directory_chunk_bytes: 16 * 1024,
            max_files_per_category: 20,
            max_category_splits: 3,
            max_chunks: 80,
            max_chunk_prompt_bytes: 40 * 1024,
            summary_chars: 200,
            single_pass_bytes: 60 * 1024,
            refine_max_bytes: 50 * 1024,
        }
    }
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "openai".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
            base_url: None,
            max_output_tokens: 8192,
            temperature: 0.3,
        }
    }
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            system_instruction: "You are an expert technical writer producing developer documentation \
                for a source-code repository. Write clear Markdown with descriptive headings, \
                explain the purpose and responsibilities of each part, describe how the parts \
                interact, and always refer to files by their full repository path."
                .to_string(),
            refine: true,
        }
    }
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        let extensions = [
            "js", "jsx", "ts", "tsx", "mjs", "cjs", "vue", "svelte", "css", "scss", "html",
            "json", "py", "rb", "go", "rs", "java", "kt", "cs", "php", "c", "h", "cpp", "hpp",
            "swift", "sql", "yml", "yaml", "toml", "md", "sh",
        ];

        Self {
            extensions: extensions.iter().map(|e| e.to_string()).collect(),
            max_file_size: 100 * 1024,
            truncation_marker: "\n... [content truncated]".to_string(),
            ignore_dirs: vec![
                "node_modules".to_string(),
                ".git".to_string(),
                "dist".to_string(),
                "build".to_string(),
            ],
            respect_gitignore: true,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            backend: "file".to_string(),
            state_dir: PathBuf::from(".docweaver/sessions"),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            llm: LlmConfig::default(),
            chunking: ChunkingConfig::default(),
            generation: GenerationConfig::default(),
            templates: TemplateConfig::default(),
            repository: RepositoryConfig::default(),
            session: SessionConfig::default(),
        }
    }
}

impl Config {
    /// Load configuration from file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)
            .map_err(|e| DocweaverError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| DocweaverError::Config(e.to_string()))?;
        std::fs::write(path, content)?;
        Ok(())
    }

    /// Load configuration with fallback to default
    pub fn load_or_default<P: AsRef<Path>>(path: Option<P>) -> Result<Self> {
        match path {
            Some(p) => {
                if p.as_ref().exists() {
                    Self::load(p)
                } else {
                    Ok(Self::default())
                }
            }
            None => {
                // Try common config file locations
                let candidates = [
                    "Docweaver.toml",
                    "docweaver.toml",
                    ".docweaver.toml",
                ];

                for candidate in &candidates {
                    if Path::new(candidate).exists() {
                        return Self::load(candidate);
                    }
                }

                Ok(Self::default())
            }
        }
    }

    /// Reject settings the pipeline cannot work with
    pub fn validate(&self) -> Result<()> {
        let c = &self.chunking;
        if c.max_chunks == 0 {
            return Err(DocweaverError::Config("chunking.max_chunks must be at least 1".to_string()));
        }
        if c.max_category_splits == 0 {
            return Err(DocweaverError::Config(
                "chunking.max_category_splits must be at least 1".to_string(),
            ));
        }
        if c.max_chunk_prompt_bytes == 0 {
            return Err(DocweaverError::Config(
                "chunking.max_chunk_prompt_bytes must be positive".to_string(),
            ));
        }
        match self.session.backend.as_str() {
            "memory" | "file" => Ok(()),
            other => Err(DocweaverError::Config(format!("Unsupported session backend: {}", other))),
        }
    }
}
