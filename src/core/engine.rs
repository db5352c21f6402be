// src/core/engine.rs
use std::io::Read;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use anyhow::Result;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::DocweaverError;
use super::{
    create_generator, create_session_store, load_snapshot_file, reconstruct_file_paths, Chunk, ChunkBuilder,
    DocumentationOutcome, DocumentationService, RepositoryProvider, RepositorySnapshot,
    SessionKey, SessionStore, TextGenerator,
};

/// Where a generate or plan command reads the repository from
#[derive(Debug, Clone)]
pub enum SnapshotSource {
    Directory(PathBuf),
    File(PathBuf),
}

impl SnapshotSource {
    pub fn from_args(source: Option<PathBuf>, snapshot: Option<PathBuf>) -> Result<Self> {
        match (source, snapshot) {
            (Some(dir), None) => Ok(SnapshotSource::Directory(dir)),
            (None, Some(file)) => Ok(SnapshotSource::File(file)),
            _ => Err(DocweaverError::InvalidInput(
                "Exactly one of --source or --snapshot is required".to_string(),
            )
            .into()),
        }
    }

    /// Repository name used for the session key when none is given
    fn default_repo_name(&self) -> String {
        let path = match self {
            SnapshotSource::Directory(dir) => dir.canonicalize().unwrap_or_else(|_| dir.clone()),
            SnapshotSource::File(file) => file.with_extension(""),
        };
        path.file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "repository".to_string())
    }
}

/// Command-line front end over the documentation service
pub struct Engine {
    config: Config,
    user: String,
    generator: Option<Arc<dyn TextGenerator>>,
    store: Arc<dyn SessionStore>,
}

impl Engine {
    pub async fn new(config_path: Option<&Path>, user: String) -> Result<Self> {
        let config = Config::load_or_default(config_path)?;
        debug!("Loaded configuration: {:?}", config);

        let generator: Option<Arc<dyn TextGenerator>> = match create_generator(&config.llm) {
            Ok(generator) => {
                info!(
                    "✅ Text generation enabled: {} ({})",
                    generator.provider_name(),
                    generator.model_name()
                );
                Some(Arc::from(generator))
            }
            Err(e) => {
                warn!("⚠️ Failed to initialize text generation: {}", e);
                warn!("Only commands that do not call the generation service are available");
                None
            }
        };

        let store: Arc<dyn SessionStore> = Arc::from(create_session_store(&config.session)?);

        Ok(Self {
            config,
            user,
            generator,
            store,
        })
    }

    pub async fn init(&self, path: Option<PathBuf>) -> Result<()> {
        let target_dir = match path {
            Some(dir) => dir,
            None => std::env::current_dir()?,
        };
        info!("Initializing Docweaver in: {}", target_dir.display());

        std::fs::create_dir_all(&target_dir)?;
        let config_path = target_dir.join("docweaver.toml");
        if config_path.exists() {
            warn!("⚠️ {} already exists, leaving it untouched", config_path.display());
            return Ok(());
        }

        Config::default().save(&config_path)?;
        info!("✅ Wrote default configuration to {}", config_path.display());
        Ok(())
    }

    pub async fn generate(
        &self,
        source: SnapshotSource,
        repo: Option<String>,
        output: Option<PathBuf>,
        no_refine: bool,
    ) -> Result<()> {
        let repo = repo.unwrap_or_else(|| source.default_repo_name());
        let key = self.session_key(&repo);
        info!("🔍 Generating documentation for {}", key);

        let snapshot = self.load_snapshot(&source)?;
        info!("Repository snapshot holds {} files", snapshot.total_files);

        let mut config = self.config.clone();
        if no_refine {
            config.generation.refine = false;
        }

        let service = self.service(&config)?;
        let outcome = service.generate_snapshot(&snapshot, &key).await?;
        self.report(&outcome);
        self.write_output(&outcome.documentation, output.as_deref())
    }

    pub async fn continue_docs(&self, repo: String, output: Option<PathBuf>) -> Result<()> {
        let key = self.session_key(&repo);
        let service = self.service(&self.config)?;

        let outcome = service.continue_documentation(&key).await?;
        self.report(&outcome);
        self.write_output(&outcome.documentation, output.as_deref())
    }

    pub async fn modify(&self, repo: String, instruction: String, output: Option<PathBuf>) -> Result<()> {
        let key = self.session_key(&repo);
        let service = self.service(&self.config)?;

        let outcome = service.modify(&instruction, &key).await?;
        self.report(&outcome);
        self.write_output(&outcome.documentation, output.as_deref())
    }

    /// Route free-form input (repository content, `continue`, or a change request)
    pub async fn ask(&self, repo: String, input: Option<PathBuf>, output: Option<PathBuf>) -> Result<()> {
        let key = self.session_key(&repo);
        let content = read_input(input.as_deref())?;
        let service = self.service(&self.config)?;

        let outcome = service.handle(&content, &key).await?;
        self.report(&outcome);
        self.write_output(&outcome.documentation, output.as_deref())
    }

    pub async fn reset(&self, repo: String) -> Result<()> {
        let key = self.session_key(&repo);
        if self.store.remove(&key)? {
            info!("🗑️ Cleared stored documentation for {}", key);
        } else {
            warn!("No stored documentation for {}", key);
        }
        Ok(())
    }

    /// Print the chunk sequence without calling the generation service
    pub async fn plan(&self, source: SnapshotSource) -> Result<()> {
        let snapshot = self.load_snapshot(&source)?;
        let builder = ChunkBuilder::new(&self.config.chunking)?;
        let chunks = builder.build(&snapshot);

        let sent = chunks.len().min(self.config.chunking.max_chunks);
        info!("📋 {} chunks planned, {} will be sent", chunks.len(), sent);
        info!("Chunks cover {} of {} files", reconstruct_file_paths(&chunks).len(), snapshot.total_files);

        println!("{:>4}  {:<10} {:<32} {:<12} {:>6} {:>9}", "#", "kind", "directory", "category", "files", "bytes");
        for (index, chunk) in chunks.iter().enumerate() {
            println!("{}", plan_row(index, chunk));
        }
        Ok(())
    }

    fn service(&self, config: &Config) -> Result<DocumentationService> {
        let generator = self.generator.clone().ok_or_else(|| {
            DocweaverError::Config(format!(
                "No text-generation provider available for '{}'; check [llm] settings and API keys",
                config.llm.provider
            ))
        })?;
        Ok(DocumentationService::new(config, generator, self.store.clone())?)
    }

    fn session_key(&self, repo: &str) -> SessionKey {
        SessionKey::new(self.user.clone(), repo)
    }

    fn load_snapshot(&self, source: &SnapshotSource) -> Result<RepositorySnapshot> {
        let snapshot = match source {
            SnapshotSource::Directory(dir) => {
                RepositoryProvider::new(&self.config.repository).snapshot(dir)?
            }
            SnapshotSource::File(file) => load_snapshot_file(file)?,
        };
        Ok(snapshot)
    }

    fn report(&self, outcome: &DocumentationOutcome) {
        info!("📊 Documentation complete ({} mode):", outcome.mode);
        info!("  - {} of {} chunks processed", outcome.chunks_processed, outcome.chunks_total);
        if outcome.chunks_skipped > 0 {
            warn!("  - {} chunks skipped after generation failures", outcome.chunks_skipped);
        }
        if outcome.refined {
            info!("  - refinement pass applied");
        }
    }

    fn write_output(&self, documentation: &str, output: Option<&Path>) -> Result<()> {
        match output {
            Some(path) => {
                if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                    std::fs::create_dir_all(parent)?;
                }
                std::fs::write(path, documentation)?;
                info!("✅ Documentation written to {}", path.display());
            }
            None => println!("{}", documentation),
        }
        Ok(())
    }
}

/// Read request input from a file, or stdin when absent or `-`
fn read_input(input: Option<&Path>) -> Result<String> {
    match input {
        Some(path) if path != Path::new("-") => Ok(std::fs::read_to_string(path)?),
        _ => {
            let mut content = String::new();
            std::io::stdin().read_to_string(&mut content)?;
            Ok(content)
        }
    }
}

fn plan_row(index: usize, chunk: &Chunk) -> String {
    let category = match chunk {
        Chunk::Category(c) => match c.part {
            Some(part) => format!("{}#{}", c.category, part),
            None => c.category.to_string(),
        },
        _ => "-".to_string(),
    };
    let files = match chunk {
        Chunk::Overview(o) => o.total_files,
        other => other.files().len(),
    };

    format!(
        "{:>4}  {:<10} {:<32} {:<12} {:>6} {:>9}",
        index,
        chunk.kind(),
        chunk.directory().unwrap_or("-"),
        category,
        files,
        chunk.serialized_len()
    )
}
