// src/core/orchestrator.rs
use tracing::{debug, info, warn};

use crate::config::ChunkingConfig;
use crate::error::{DocweaverError, Result};
use super::chunker::Chunk;
use super::llm::{GenerationRequest, TextGenerator};
use super::prompts::PromptTemplates;
use super::snapshot::{char_prefix, truncate_at_char_boundary};

/// Fixed per-call settings shared by every request of a documentation session
#[derive(Debug, Clone)]
pub struct GenerationSettings {
    pub system_instruction: String,
    pub max_output_tokens: u32,
    pub temperature: f32,
}

impl GenerationSettings {
    pub fn request(&self, prompt: String) -> GenerationRequest {
        GenerationRequest::new(self.system_instruction.clone(), prompt)
            .with_limits(self.max_output_tokens, self.temperature)
    }
}

/// Rolling state threaded through one run; never persisted
#[derive(Debug, Clone, Default)]
pub struct GenerationContext {
    pub previous_summary: String,
}

/// Which prompt variant a chunk receives
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PromptRole {
    First,
    Middle,
    Last,
}

impl PromptRole {
    pub fn for_position(index: usize, total: usize) -> Self {
        if index == 0 {
            PromptRole::First
        } else if index + 1 == total {
            PromptRole::Last
        } else {
            PromptRole::Middle
        }
    }
}

#[derive(Debug, Clone)]
pub struct ChunkOutput {
    pub index: usize,
    pub label: String,
    pub text: String,
}

#[derive(Debug, Clone)]
pub struct OrchestrationResult {
    /// Successful outputs in chunk order
    pub outputs: Vec<ChunkOutput>,
    /// Chunks produced by the builder
    pub chunks_available: usize,
    /// Chunks actually sent after the cap
    pub chunks_attempted: usize,
    /// Indices of chunks whose generation call failed
    pub skipped: Vec<usize>,
}

impl OrchestrationResult {
    pub fn responses(&self) -> Vec<String> {
        self.outputs.iter().map(|o| o.text.clone()).collect()
    }
}

/// Walks the chunk sequence strictly in order, one generation call per chunk
pub struct GenerationOrchestrator {
    config: ChunkingConfig,
    settings: GenerationSettings,
}

impl GenerationOrchestrator {
    pub fn new(config: &ChunkingConfig, settings: GenerationSettings) -> Self {
        Self {
            config: config.clone(),
            settings,
        }
    }

    pub async fn run(
        &self,
        chunks: &[Chunk],
        generator: &dyn TextGenerator,
        templates: &PromptTemplates,
    ) -> Result<OrchestrationResult> {
        let attempted = chunks.len().min(self.config.max_chunks);
        if attempted < chunks.len() {
            warn!(
                "Repository produced {} chunks; only the first {} will be documented",
                chunks.len(),
                attempted
            );
        }

        let mut context = GenerationContext::default();
        let mut outputs = Vec::with_capacity(attempted);
        let mut skipped = Vec::new();

        for (index, chunk) in chunks.iter().take(attempted).enumerate() {
            let role = PromptRole::for_position(index, attempted);
            info!("Generating chunk {}/{}: {}", index + 1, attempted, chunk.label());

            let prompt = self.build_prompt(chunk, role, &context, templates)?;
            debug!("Chunk {} prompt is {} bytes ({:?})", index, prompt.len(), role);

            match generator.generate(self.settings.request(prompt)).await {
                Ok(response) => {
                    context.previous_summary = char_prefix(&response.text, self.config.summary_chars);
                    outputs.push(ChunkOutput {
                        index,
                        label: chunk.label(),
                        text: response.text,
                    });
                }
                Err(e) => {
                    warn!("Skipping chunk {} ({}): {}", index, chunk.label(), e);
                    skipped.push(index);
                }
            }
        }

        if !skipped.is_empty() {
            warn!("{} of {} chunks were skipped after generation failures", skipped.len(), attempted);
        }

        if outputs.is_empty() {
            return Err(DocweaverError::NoUsableOutput { attempted });
        }

        Ok(OrchestrationResult {
            outputs,
            chunks_available: chunks.len(),
            chunks_attempted: attempted,
            skipped,
        })
    }

    fn build_prompt(
        &self,
        chunk: &Chunk,
        role: PromptRole,
        context: &GenerationContext,
        templates: &PromptTemplates,
    ) -> Result<String> {
        let json = chunk.to_json()?;
        let body = truncate_at_char_boundary(&json, self.config.max_chunk_prompt_bytes);

        match role {
            PromptRole::First => templates.first_chunk(body),
            PromptRole::Middle => templates.middle_chunk(body, &context.previous_summary),
            PromptRole::Last => templates.last_chunk(body, &context.previous_summary),
        }
    }
}
