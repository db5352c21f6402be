use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::error::Result;

/// Speaker of a prior conversation turn
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TurnRole {
    User,
    Model,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Turn {
    pub role: TurnRole,
    pub text: String,
}

/// One call to the text-generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationRequest {
    /// Fixed instruction describing documentation style
    pub system_instruction: String,

    /// Earlier conversation turns, oldest first
    pub prior_turns: Vec<Turn>,

    /// The new user prompt
    pub prompt: String,

    /// Upper bound on generated tokens
    pub max_output_tokens: u32,

    /// Sampling randomness (0.0 to 1.0)
    pub temperature: f32,
}

impl GenerationRequest {
    pub fn new(system_instruction: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            system_instruction: system_instruction.into(),
            prior_turns: vec![],
            prompt: prompt.into(),
            max_output_tokens: 8192,
            temperature: 0.3,
        }
    }

    pub fn with_limits(mut self, max_output_tokens: u32, temperature: f32) -> Self {
        self.max_output_tokens = max_output_tokens;
        self.temperature = temperature;
        self
    }
}

/// Response from the text-generation service
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationResponse {
    /// The generated text
    pub text: String,

    /// Provider-specific details (token usage, finish reason)
    pub metadata: HashMap<String, String>,
}

impl GenerationResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            metadata: HashMap::new(),
        }
    }
}

/// Opaque text-generation capability with a hard per-call size limit
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    /// Issue exactly one generation call
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse>;

    /// Get the provider name (e.g., "OpenAI", "Gemini")
    fn provider_name(&self) -> &str;

    /// Get the model name being used
    fn model_name(&self) -> &str;
}
