use std::time::Duration;

use crate::llm::client::{http_client, LLMClient, LlmRequest};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde_json::{json, Value};

/// Client for a local Ollama server (`/api/chat`, non-streaming).
pub struct OllamaClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
}

impl OllamaClient {
    pub fn new(base_url: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            base_url: base_url.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn request_body(&self, request: &LlmRequest<'_>) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }

        let mut user = json!({ "role": "user", "content": request.prompt });
        if let Some(image) = request.image {
            // Ollama takes raw base64, not a data URL
            user["images"] = json!([image.data_base64]);
        }
        messages.push(user);

        let mut body = json!({
            "model": self.model,
            "messages": messages,
            "stream": false,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["options"] = json!({ "num_predict": max_tokens });
        }
        body
    }
}

#[async_trait]
impl LLMClient for OllamaClient {
    async fn complete(&self, request: &LlmRequest<'_>) -> Result<String> {
        let url = format!("{}/api/chat", self.base_url);
        let body = self.request_body(request);

        let response = self
            .http
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::capability("llm", format!("Ollama request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::capability(
                "llm",
                format!("Ollama request failed ({}): {}", status, text),
            ));
        }

        let response_json: Value = response.json().await.map_err(|e| {
            AppError::capability("llm", format!("Failed to parse Ollama response: {}", e))
        })?;

        response_json["message"]["content"]
            .as_str()
            .map(str::to_string)
            .ok_or_else(|| AppError::capability("llm", "Ollama response has no message content"))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
