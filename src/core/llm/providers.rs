use async_trait::async_trait;
use serde_json::json;
use tracing::debug;

use crate::config::LlmConfig;
use crate::error::{DocweaverError, Result};
use super::generator::{
    GenerationRequest, GenerationResponse, TextGenerator, TurnRole
};

const OPENAI_DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Factory function to create the text generator named in config
pub fn create_generator(config: &LlmConfig) -> Result<Box<dyn TextGenerator>> {
    match config.provider.as_str() {
        "openai" => Ok(Box::new(OpenAiProvider::new(config)?)),
        "gemini" => Ok(Box::new(GeminiProvider::new(config)?)),
        _ => Err(DocweaverError::Config(
            format!("Unsupported LLM provider: {}", config.provider)
        )),
    }
}

/// OpenAI-compatible chat completions provider
pub struct OpenAiProvider {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            DocweaverError::Config("API key required for the openai provider (set llm.api_key or OPENAI_API_KEY)".to_string())
        })?;

        Ok(Self {
            config: config.clone(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(OPENAI_DEFAULT_BASE_URL);
        format!("{}/chat/completions", base.trim_end_matches('/'))
    }

    fn build_payload(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut messages = vec![json!({
            "role": "system",
            "content": request.system_instruction,
        })];

        for turn in &request.prior_turns {
            let role = match turn.role {
                TurnRole::User => "user",
                TurnRole::Model => "assistant",
            };
            messages.push(json!({ "role": role, "content": turn.text }));
        }

        messages.push(json!({ "role": "user", "content": request.prompt }));

        json!({
            "model": self.config.model,
            "messages": messages,
            "max_tokens": request.max_output_tokens,
            "temperature": request.temperature
        })
    }
}

#[async_trait]
impl TextGenerator for OpenAiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let payload = self.build_payload(&request);
        debug!("OpenAI request: {} prompt bytes", request.prompt.len());

        let response = self.client
            .post(self.endpoint())
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| DocweaverError::Generation(format!("OpenAI API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocweaverError::Generation(
                format!("OpenAI API error {}: {}", status, error_text)
            ));
        }

        let response_data: serde_json::Value = response.json().await
            .map_err(|e| DocweaverError::Generation(format!("Failed to parse OpenAI response: {}", e)))?;

        let text = response_data["choices"][0]["message"]["content"]
            .as_str()
            .ok_or_else(|| DocweaverError::Generation("OpenAI response contained no content".to_string()))?
            .to_string();

        let mut response = GenerationResponse::text(text);
        response.metadata.insert("provider".to_string(), "OpenAI".to_string());
        response.metadata.insert("model".to_string(), self.config.model.clone());
        if let Some(usage) = response_data.get("usage") {
            response.metadata.insert("tokens_used".to_string(), usage["total_tokens"].to_string());
        }
        if let Some(reason) = response_data["choices"][0]["finish_reason"].as_str() {
            response.metadata.insert("finish_reason".to_string(), reason.to_string());
        }

        Ok(response)
    }

    fn provider_name(&self) -> &str {
        "OpenAI"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

/// Google Gemini `generateContent` provider
pub struct GeminiProvider {
    config: LlmConfig,
    api_key: String,
    client: reqwest::Client,
}

impl GeminiProvider {
    pub fn new(config: &LlmConfig) -> Result<Self> {
        let api_key = config.resolve_api_key().ok_or_else(|| {
            DocweaverError::Config("API key required for the gemini provider (set llm.api_key or GEMINI_API_KEY)".to_string())
        })?;

        Ok(Self {
            config: config.clone(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    fn endpoint(&self) -> String {
        let base = self.config.base_url.as_deref().unwrap_or(GEMINI_BASE_URL);
        format!("{}/models/{}:generateContent", base.trim_end_matches('/'), self.config.model)
    }

    fn build_payload(&self, request: &GenerationRequest) -> serde_json::Value {
        let mut contents: Vec<serde_json::Value> = request.prior_turns.iter()
            .map(|turn| {
                let role = match turn.role {
                    TurnRole::User => "user",
                    TurnRole::Model => "model",
                };
                json!({ "role": role, "parts": [{ "text": turn.text }] })
            })
            .collect();

        contents.push(json!({ "role": "user", "parts": [{ "text": request.prompt }] }));

        json!({
            "systemInstruction": { "parts": [{ "text": request.system_instruction }] },
            "contents": contents,
            "generationConfig": {
                "maxOutputTokens": request.max_output_tokens,
                "temperature": request.temperature
            }
        })
    }
}

#[async_trait]
impl TextGenerator for GeminiProvider {
    async fn generate(&self, request: GenerationRequest) -> Result<GenerationResponse> {
        let payload = self.build_payload(&request);
        debug!("Gemini request: {} prompt bytes", request.prompt.len());

        let response = self.client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&payload)
            .send()
            .await
            .map_err(|e| DocweaverError::Generation(format!("Gemini API request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response.text().await.unwrap_or_default();
            return Err(DocweaverError::Generation(
                format!("Gemini API error {}: {}", status, error_text)
            ));
        }

        let response_data: serde_json::Value = response.json().await
            .map_err(|e| DocweaverError::Generation(format!("Failed to parse Gemini response: {}", e)))?;

        let parts = response_data["candidates"][0]["content"]["parts"]
            .as_array()
            .ok_or_else(|| DocweaverError::Generation("Gemini response contained no candidates".to_string()))?;

        let text: String = parts.iter()
            .filter_map(|part| part["text"].as_str())
            .collect();

        let mut response = GenerationResponse::text(text);
        response.metadata.insert("provider".to_string(), "Gemini".to_string());
        response.metadata.insert("model".to_string(), self.config.model.clone());
        if let Some(count) = response_data["usageMetadata"]["totalTokenCount"].as_u64() {
            response.metadata.insert("tokens_used".to_string(), count.to_string());
        }

        Ok(response)
    }

    fn provider_name(&self) -> &str {
        "Gemini"
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}
