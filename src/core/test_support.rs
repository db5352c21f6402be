// src/core/test_support.rs
use std::collections::VecDeque;
use std::sync::Mutex;
use async_trait::async_trait;

use crate::error::{DocweaverError, Result};
use super::llm::{GenerationRequest, GenerationResponse, TextGenerator};

/// Replays canned responses in order and records every request it receives
pub struct ScriptedGenerator {
    script: Mutex<VecDeque<Result<String>>>,
    requests: Mutex<Vec<GenerationRequest>>,
}

impl ScriptedGenerator {
    pub fn new() -> Self {
        Self {
            script: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn respond(self, text: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(text.to_string()));
        self
    }

    pub fn fail(self, message: &str) -> Self {
        self.script
            .lock()
            .unwrap()
            .push_back(Err(DocweaverError::Generation(message.to_string())));
        self
    }

    pub fn requests(&self) -> Vec<GenerationRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn prompts(&self) -> Vec<String> {
        self.requests().into_iter().map(|r| r.prompt).collect()
    }
}

#[async_trait]
impl TextGenerator for ScriptedGenerator {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        self.requests.lock().unwrap().push(request);
        let next = self.script.lock().unwrap().pop_front();
        match next {
            Some(Ok(text)) => Ok(GenerationResponse::text(text)),
            Some(Err(e)) => Err(e),
            None => Err(DocweaverError::Generation("script exhausted".to_string())),
        }
    }

    fn provider_name(&self) -> &str {
        "Scripted"
    }

    fn model_name(&self) -> &str {
        "scripted-test"
    }
}
