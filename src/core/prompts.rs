// src/core/prompts.rs
use tera::{Context, Tera};
use tracing::debug;

use crate::config::TemplateConfig;
use crate::error::Result;

pub const FIRST_CHUNK: &str = "first_chunk";
pub const MIDDLE_CHUNK: &str = "middle_chunk";
pub const LAST_CHUNK: &str = "last_chunk";
pub const SINGLE_PASS: &str = "single_pass";
pub const REFINE: &str = "refine";
pub const CONTINUE: &str = "continue";
pub const MODIFY: &str = "modify";

const FIRST_CHUNK_TEMPLATE: &str = r#"This is the first part of a repository that is being documented in several parts.
Using the content below, write the introduction, a project overview and an architecture explanation.
Do not document individual directories in depth; later parts will cover them, so do not repeat content that belongs there.
Always preserve full file paths exactly as given.

{{ chunk }}"#;

const MIDDLE_CHUNK_TEMPLATE: &str = r#"Continue the documentation of this repository with the next part below.
Context from the previous part:
{{ previous_summary }}

Do not repeat material that was already generated. Do not restate the introduction or overview.
Always preserve full file paths exactly as given.

{{ chunk }}"#;

const LAST_CHUNK_TEMPLATE: &str = r#"This is the final part of the repository. Complete the remaining documentation using the content below.
Context from the previous part:
{{ previous_summary }}

Do not repeat material that was already generated.
Always preserve full file paths exactly as given.

{{ chunk }}"#;

const SINGLE_PASS_TEMPLATE: &str = r#"Generate complete documentation for the following repository: introduction, overview, architecture explanation, and a description of every significant file and directory.
Always preserve full file paths exactly as given.

{{ content }}"#;

const REFINE_TEMPLATE: &str = r#"The documentation below was assembled from several independently generated parts and may contain redundancy.
Rewrite it so that:
- repeated sections are eliminated;
- similar content that appears in several places is consolidated into one place;
- client-side material and server-side material are grouped separately, without headings or labels such as "Frontend" or "Backend";
- every unique piece of information is preserved.
Return the complete refined document.

{{ document }}"#;

const CONTINUE_TEMPLATE: &str = r#"Here is the documentation generated so far. Continue from where it left off and return the documentation.

{{ document }}"#;

const MODIFY_TEMPLATE: &str = r#"Here is the current documentation:

{{ document }}

Apply the following change request with minimal, targeted edits. Leave everything else untouched and return the full document with the modifications applied.

Change request: {{ instruction }}"#;

const BUILTIN_TEMPLATES: &[(&str, &str)] = &[
    (FIRST_CHUNK, FIRST_CHUNK_TEMPLATE),
    (MIDDLE_CHUNK, MIDDLE_CHUNK_TEMPLATE),
    (LAST_CHUNK, LAST_CHUNK_TEMPLATE),
    (SINGLE_PASS, SINGLE_PASS_TEMPLATE),
    (REFINE, REFINE_TEMPLATE),
    (CONTINUE, CONTINUE_TEMPLATE),
    (MODIFY, MODIFY_TEMPLATE),
];

/// Renders every prompt the pipeline sends
pub struct PromptTemplates {
    tera: Tera,
}

impl PromptTemplates {
    /// Built-in templates, each replaced by `<template_dir>/<name>.tera` when present
    pub fn new(config: &TemplateConfig) -> Result<Self> {
        let mut tera = Tera::default();
        tera.add_raw_templates(BUILTIN_TEMPLATES.iter().copied())?;

        if let Some(dir) = &config.template_dir {
            for (name, _) in BUILTIN_TEMPLATES {
                let path = dir.join(format!("{}.tera", name));
                if path.exists() {
                    let content = std::fs::read_to_string(&path)?;
                    tera.add_raw_template(name, &content)?;
                    debug!("Using prompt template override {}", path.display());
                }
            }
        }

        Ok(Self { tera })
    }

    pub fn first_chunk(&self, chunk: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("chunk", chunk);
        self.render(FIRST_CHUNK, &context)
    }

    pub fn middle_chunk(&self, chunk: &str, previous_summary: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("chunk", chunk);
        context.insert("previous_summary", previous_summary);
        self.render(MIDDLE_CHUNK, &context)
    }

    pub fn last_chunk(&self, chunk: &str, previous_summary: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("chunk", chunk);
        context.insert("previous_summary", previous_summary);
        self.render(LAST_CHUNK, &context)
    }

    pub fn single_pass(&self, content: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("content", content);
        self.render(SINGLE_PASS, &context)
    }

    pub fn refine(&self, document: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("document", document);
        self.render(REFINE, &context)
    }

    pub fn continue_document(&self, document: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("document", document);
        self.render(CONTINUE, &context)
    }

    pub fn modify_document(&self, document: &str, instruction: &str) -> Result<String> {
        let mut context = Context::new();
        context.insert("document", document);
        context.insert("instruction", instruction);
        self.render(MODIFY, &context)
    }

    fn render(&self, name: &str, context: &Context) -> Result<String> {
        Ok(self.tera.render(name, context)?)
    }
}
