// src/core/refine.rs
use tracing::{debug, info, warn};

use super::llm::TextGenerator;
use super::orchestrator::GenerationSettings;
use super::prompts::PromptTemplates;

#[derive(Debug, Clone)]
pub struct RefinementOutcome {
    pub text: String,
    pub refined: bool,
}

/// Optional best-effort redundancy pass over the merged document
pub struct RefinementPass {
    enabled: bool,
    max_bytes: usize,
}

impl RefinementPass {
    pub fn new(enabled: bool, max_bytes: usize) -> Self {
        Self { enabled, max_bytes }
    }

    /// Whether a document merged from `chunks_processed` outputs qualifies
    pub fn applies(&self, merged: &str, chunks_processed: usize) -> bool {
        self.enabled && chunks_processed > 1 && merged.len() < self.max_bytes
    }

    /// Never fails: any problem falls back to the unrefined text
    pub async fn run(
        &self,
        merged: String,
        chunks_processed: usize,
        generator: &dyn TextGenerator,
        templates: &PromptTemplates,
        settings: &GenerationSettings,
    ) -> RefinementOutcome {
        if !self.applies(&merged, chunks_processed) {
            debug!(
                "Skipping refinement ({} chunks, {} bytes)",
                chunks_processed,
                merged.len()
            );
            return RefinementOutcome { text: merged, refined: false };
        }

        let prompt = match templates.refine(&merged) {
            Ok(prompt) => prompt,
            Err(e) => {
                warn!("Failed to render refinement prompt: {}", e);
                return RefinementOutcome { text: merged, refined: false };
            }
        };

        info!("Refining merged document ({} bytes)", merged.len());
        match generator.generate(settings.request(prompt)).await {
            Ok(response) if !response.text.trim().is_empty() => RefinementOutcome {
                text: response.text,
                refined: true,
            },
            Ok(_) => {
                warn!("Refinement returned an empty document, keeping merged text");
                RefinementOutcome { text: merged, refined: false }
            }
            Err(e) => {
                warn!("Refinement failed, keeping merged text: {}", e);
                RefinementOutcome { text: merged, refined: false }
            }
        }
    }
}
