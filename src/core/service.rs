// src/core/service.rs
use std::fmt;
use std::sync::Arc;
use serde::Serialize;
use tracing::{debug, info};

use crate::config::Config;
use crate::error::{DocweaverError, Result};
use super::chunker::ChunkBuilder;
use super::llm::TextGenerator;
use super::merge::MergeEngine;
use super::orchestrator::{GenerationOrchestrator, GenerationSettings};
use super::prompts::PromptTemplates;
use super::refine::RefinementPass;
use super::session::{SessionDocument, SessionKey, SessionStore};
use super::snapshot::RepositorySnapshot;

/// How a request was routed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DocumentationMode {
    SinglePass,
    Chunked,
    Continue,
    Modify,
}

impl fmt::Display for DocumentationMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DocumentationMode::SinglePass => "single-pass",
            DocumentationMode::Chunked => "chunked",
            DocumentationMode::Continue => "continue",
            DocumentationMode::Modify => "modify",
        };
        f.write_str(name)
    }
}

/// A free-form request, classified before any generation call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DocRequest {
    Generate(String),
    Continue,
    Modify(String),
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentationOutcome {
    pub documentation: String,
    pub mode: DocumentationMode,
    pub chunks_total: usize,
    pub chunks_processed: usize,
    pub chunks_skipped: usize,
    pub refined: bool,
}

impl DocumentationOutcome {
    fn single_call(documentation: String, mode: DocumentationMode) -> Self {
        Self {
            documentation,
            mode,
            chunks_total: 1,
            chunks_processed: 1,
            chunks_skipped: 0,
            refined: false,
        }
    }
}

/// Entry point for every documentation request: generation, continuation and modification
pub struct DocumentationService {
    generator: Arc<dyn TextGenerator>,
    store: Arc<dyn SessionStore>,
    templates: PromptTemplates,
    chunk_builder: ChunkBuilder,
    merger: MergeEngine,
    orchestrator: GenerationOrchestrator,
    refinement: RefinementPass,
    settings: GenerationSettings,
    single_pass_bytes: usize,
}

impl DocumentationService {
    pub fn new(
        config: &Config,
        generator: Arc<dyn TextGenerator>,
        store: Arc<dyn SessionStore>,
    ) -> Result<Self> {
        let settings = GenerationSettings {
            system_instruction: config.generation.system_instruction.clone(),
            max_output_tokens: config.llm.max_output_tokens,
            temperature: config.llm.temperature,
        };

        Ok(Self {
            generator,
            store,
            templates: PromptTemplates::new(&config.templates)?,
            chunk_builder: ChunkBuilder::new(&config.chunking)?,
            merger: MergeEngine::new()?,
            orchestrator: GenerationOrchestrator::new(&config.chunking, settings.clone()),
            refinement: RefinementPass::new(
                config.generation.refine,
                config.chunking.refine_max_bytes,
            ),
            settings,
            single_pass_bytes: config.chunking.single_pass_bytes,
        })
    }

    /// Decide what a free-form input asks for
    pub fn classify(&self, input: &str, key: &SessionKey) -> Result<DocRequest> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(DocweaverError::InvalidInput(
                "No repository content or instruction provided".to_string(),
            ));
        }

        if trimmed.eq_ignore_ascii_case("continue") {
            return Ok(DocRequest::Continue);
        }

        if RepositorySnapshot::looks_like_json(trimmed) || self.store.get(key)?.is_none() {
            return Ok(DocRequest::Generate(input.to_string()));
        }

        Ok(DocRequest::Modify(trimmed.to_string()))
    }

    /// Route a free-form input for one session
    pub async fn handle(&self, input: &str, key: &SessionKey) -> Result<DocumentationOutcome> {
        match self.classify(input, key)? {
            DocRequest::Generate(content) => self.generate(&content, key).await,
            DocRequest::Continue => self.continue_documentation(key).await,
            DocRequest::Modify(instruction) => self.modify(&instruction, key).await,
        }
    }

    /// Full generation from serialized repository content
    pub async fn generate(&self, content: &str, key: &SessionKey) -> Result<DocumentationOutcome> {
        if content.trim().is_empty() {
            return Err(DocweaverError::InvalidInput(
                "No repository content provided".to_string(),
            ));
        }

        if content.len() < self.single_pass_bytes {
            return self.generate_single_pass(content, key).await;
        }

        let snapshot = RepositorySnapshot::from_json(content)?;
        self.generate_chunked(&snapshot, key).await
    }

    /// Full generation from an already-parsed snapshot
    pub async fn generate_snapshot(
        &self,
        snapshot: &RepositorySnapshot,
        key: &SessionKey,
    ) -> Result<DocumentationOutcome> {
        let content = snapshot.to_json()?;
        if content.len() < self.single_pass_bytes {
            return self.generate_single_pass(&content, key).await;
        }
        self.generate_chunked(snapshot, key).await
    }

    pub async fn continue_documentation(&self, key: &SessionKey) -> Result<DocumentationOutcome> {
        let previous = self.require_document(key)?;
        info!("Continuing documentation for {}", key);

        let prompt = self.templates.continue_document(&previous.text)?;
        let text = self.call(prompt).await?;

        // Replaces, never appends
        self.store.put(SessionDocument::new(key.clone(), text.clone()))?;
        Ok(DocumentationOutcome::single_call(text, DocumentationMode::Continue))
    }

    pub async fn modify(&self, instruction: &str, key: &SessionKey) -> Result<DocumentationOutcome> {
        if instruction.trim().is_empty() {
            return Err(DocweaverError::InvalidInput(
                "No modification instruction provided".to_string(),
            ));
        }

        let previous = self.require_document(key)?;
        info!("Modifying documentation for {}", key);

        let prompt = self.templates.modify_document(&previous.text, instruction.trim())?;
        let text = self.call(prompt).await?;

        self.store.put(SessionDocument::new(key.clone(), text.clone()))?;
        Ok(DocumentationOutcome::single_call(text, DocumentationMode::Modify))
    }

    async fn generate_single_pass(&self, content: &str, key: &SessionKey) -> Result<DocumentationOutcome> {
        info!("Documenting {} bytes in a single call", content.len());

        let prompt = self.templates.single_pass(content)?;
        let text = self.call(prompt).await?;

        self.store.put(SessionDocument::new(key.clone(), text.clone()))?;
        Ok(DocumentationOutcome::single_call(text, DocumentationMode::SinglePass))
    }

    async fn generate_chunked(
        &self,
        snapshot: &RepositorySnapshot,
        key: &SessionKey,
    ) -> Result<DocumentationOutcome> {
        let chunks = self.chunk_builder.build(snapshot);
        info!(
            "Documenting {} files in {} chunks",
            snapshot.files.len(),
            chunks.len()
        );

        let result = self
            .orchestrator
            .run(&chunks, self.generator.as_ref(), &self.templates)
            .await?;

        let merged = self.merger.merge(&result.responses());
        debug!("Merged document is {} bytes", merged.len());

        let refinement = self
            .refinement
            .run(
                merged,
                result.outputs.len(),
                self.generator.as_ref(),
                &self.templates,
                &self.settings,
            )
            .await;

        self.store.put(SessionDocument::new(key.clone(), refinement.text.clone()))?;

        Ok(DocumentationOutcome {
            documentation: refinement.text,
            mode: DocumentationMode::Chunked,
            chunks_total: result.chunks_available,
            chunks_processed: result.outputs.len(),
            chunks_skipped: result.skipped.len(),
            refined: refinement.refined,
        })
    }

    fn require_document(&self, key: &SessionKey) -> Result<SessionDocument> {
        self.store
            .get(key)?
            .ok_or_else(|| DocweaverError::MissingPriorDocument { session: key.to_string() })
    }

    /// One service call whose failure is surfaced with no partial result
    async fn call(&self, prompt: String) -> Result<String> {
        let response = self
            .generator
            .generate(self.settings.request(prompt))
            .await
            .map_err(|e| match e {
                DocweaverError::Generation(_) => e,
                other => DocweaverError::Generation(other.to_string()),
            })?;

        if response.text.trim().is_empty() {
            return Err(DocweaverError::Generation(
                "Generation service returned an empty document".to_string(),
            ));
        }
        Ok(response.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::InMemorySessionStore;
    use crate::core::test_support::ScriptedGenerator;
    use crate::core::FileRecord;

    fn key() -> SessionKey {
        SessionKey::new("alice", "shop")
    }

    fn service(config: &Config, generator: Arc<ScriptedGenerator>) -> (DocumentationService, Arc<InMemorySessionStore>) {
        let store = Arc::new(InMemorySessionStore::new());
        let service = DocumentationService::new(config, generator, store.clone()).unwrap();
        (service, store)
    }

    fn chunked_config() -> Config {
        let mut config = Config::default();
        config.chunking.single_pass_bytes = 10;
        config
    }

    fn two_directory_snapshot() -> RepositorySnapshot {
        RepositorySnapshot::new(vec![
            FileRecord::new("src/App.js", "export default function App() {}"),
            FileRecord::new("lib/util.js", "export const id = x => x;"),
        ])
    }

    #[tokio::test]
    async fn test_continue_without_prior_document() {
        let generator = Arc::new(ScriptedGenerator::new().respond("should not be used"));
        let (service, _) = service(&Config::default(), generator.clone());

        let err = service.handle("Continue", &key()).await.unwrap_err();

        assert!(matches!(err, DocweaverError::MissingPriorDocument { .. }));
        assert!(err.is_client_error());
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_empty_input_is_rejected() {
        let generator = Arc::new(ScriptedGenerator::new());
        let (service, _) = service(&Config::default(), generator);

        let err = service.handle("   \n", &key()).await.unwrap_err();
        assert!(matches!(err, DocweaverError::InvalidInput(_)));
    }

    #[tokio::test]
    async fn test_small_repository_uses_one_call() {
        let generator = Arc::new(ScriptedGenerator::new().respond("# Shop\n\nAll of it."));
        let (service, store) = service(&Config::default(), generator.clone());
        let content = two_directory_snapshot().to_json().unwrap();

        let outcome = service.handle(&content, &key()).await.unwrap();

        assert_eq!(outcome.mode, DocumentationMode::SinglePass);
        assert_eq!(generator.requests().len(), 1);
        assert!(generator.prompts()[0].contains("src/App.js"));
        assert_eq!(store.get(&key()).unwrap().unwrap().text, "# Shop\n\nAll of it.");
    }

    #[tokio::test]
    async fn test_single_pass_failure_stores_nothing() {
        let generator = Arc::new(ScriptedGenerator::new().fail("service unavailable"));
        let (service, store) = service(&Config::default(), generator);

        let err = service.handle("{\"files\": []}", &key()).await.unwrap_err();

        assert!(matches!(err, DocweaverError::Generation(_)));
        assert!(store.get(&key()).unwrap().is_none());
    }

    #[tokio::test]
    async fn test_large_repository_merges_and_refines() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond("# Documentation\n\nOverview.")
                .respond("# Documentation\n\n## src\n\nApp.")
                .respond("## lib\n\nUtilities.")
                .respond("# Documentation\n\nRefined."),
        );
        let (service, store) = service(&chunked_config(), generator.clone());
        let content = two_directory_snapshot().to_json().unwrap();

        let outcome = service.generate(&content, &key()).await.unwrap();

        assert_eq!(outcome.mode, DocumentationMode::Chunked);
        assert_eq!(outcome.chunks_total, 3);
        assert_eq!(outcome.chunks_processed, 3);
        assert!(outcome.refined);
        assert_eq!(outcome.documentation, "# Documentation\n\nRefined.");
        assert!(generator.prompts()[3].contains("## src"));
        assert_eq!(store.get(&key()).unwrap().unwrap().text, outcome.documentation);
    }

    #[tokio::test]
    async fn test_refinement_failure_keeps_merged_document() {
        let generator = Arc::new(
            ScriptedGenerator::new()
                .respond("# Documentation\n\nHello")
                .respond("# Documentation\n\nWorld")
                .respond("## lib\n\nUtilities.")
                .fail("quota exceeded"),
        );
        let (service, _) = service(&chunked_config(), generator);

        let outcome = service
            .generate_snapshot(&two_directory_snapshot(), &key())
            .await
            .unwrap();

        assert!(!outcome.refined);
        assert_eq!(
            outcome.documentation,
            "# Documentation\n\nHello\n\nWorld\n\n## lib\n\nUtilities."
        );
    }

    #[tokio::test]
    async fn test_malformed_large_content_is_input_error() {
        let generator = Arc::new(ScriptedGenerator::new());
        let (service, _) = service(&chunked_config(), generator.clone());

        let err = service.generate("{\"files\": [oops", &key()).await.unwrap_err();

        assert!(matches!(err, DocweaverError::InvalidInput(_)));
        assert!(generator.requests().is_empty());
    }

    #[tokio::test]
    async fn test_continue_replaces_stored_document() {
        let generator = Arc::new(ScriptedGenerator::new().respond("# Docs\n\nPart two."));
        let (service, store) = service(&Config::default(), generator.clone());
        store.put(SessionDocument::new(key(), "# Docs\n\nPart one.".to_string())).unwrap();

        let outcome = service.handle("continue", &key()).await.unwrap();

        assert_eq!(outcome.mode, DocumentationMode::Continue);
        assert!(generator.prompts()[0].contains("Part one."));
        assert_eq!(store.get(&key()).unwrap().unwrap().text, "# Docs\n\nPart two.");
    }

    #[tokio::test]
    async fn test_instruction_modifies_existing_document() {
        let generator = Arc::new(ScriptedGenerator::new().respond("# Docs\n\nShorter."));
        let (service, store) = service(&Config::default(), generator.clone());
        store.put(SessionDocument::new(key(), "# Docs\n\nLong text.".to_string())).unwrap();

        let outcome = service.handle("Shorten the intro", &key()).await.unwrap();

        assert_eq!(outcome.mode, DocumentationMode::Modify);
        let prompt = &generator.prompts()[0];
        assert!(prompt.contains("Long text."));
        assert!(prompt.contains("Shorten the intro"));
        assert_eq!(store.get(&key()).unwrap().unwrap().text, "# Docs\n\nShorter.");
    }

    #[tokio::test]
    async fn test_cleared_session_documents_instead_of_modifying() {
        let generator = Arc::new(ScriptedGenerator::new().respond("# Fresh"));
        let (service, store) = service(&Config::default(), generator.clone());
        store.put(SessionDocument::new(key(), "# Old".to_string())).unwrap();

        assert!(store.remove(&key()).unwrap());

        // with no document, an instruction is documented rather than applied
        let outcome = service.handle("Shorten the intro", &key()).await.unwrap();
        assert_eq!(outcome.mode, DocumentationMode::SinglePass);
    }

    #[test]
    fn test_classify_without_document_generates() {
        let generator = Arc::new(ScriptedGenerator::new());
        let (service, store) = service(&Config::default(), generator);

        assert_eq!(
            service.classify("some pasted code", &key()).unwrap(),
            DocRequest::Generate("some pasted code".to_string())
        );

        store.put(SessionDocument::new(key(), "doc".to_string())).unwrap();
        assert_eq!(
            service.classify("add a FAQ", &key()).unwrap(),
            DocRequest::Modify("add a FAQ".to_string())
        );
        assert!(matches!(
            service.classify("{\"files\": []}", &key()).unwrap(),
            DocRequest::Generate(_)
        ));
    }
}
