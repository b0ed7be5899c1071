use std::time::Duration;

use crate::llm::client::{http_client, LLMClient, LlmRequest};
use crate::types::{AppError, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};

/// Client for OpenAI-compatible `/chat/completions` endpoints.
pub struct OpenAIClient {
    http: reqwest::Client,
    api_key: String,
    api_base: String,
    model: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

impl OpenAIClient {
    pub fn new(api_key: String, api_base: String, model: String, timeout: Duration) -> Result<Self> {
        Ok(Self {
            http: http_client(timeout)?,
            api_key,
            api_base: api_base.trim_end_matches('/').to_string(),
            model,
        })
    }

    fn request_body(&self, request: &LlmRequest<'_>) -> Value {
        let mut messages = Vec::new();
        if let Some(system) = request.system {
            messages.push(json!({ "role": "system", "content": system }));
        }

        let user_content = match request.image {
            Some(image) => json!([
                { "type": "text", "text": request.prompt },
                { "type": "image_url", "image_url": { "url": image.data_url() } }
            ]),
            None => json!(request.prompt),
        };
        messages.push(json!({ "role": "user", "content": user_content }));

        let mut body = json!({
            "model": self.model,
            "messages": messages,
        });
        if let Some(max_tokens) = request.max_tokens {
            body["max_tokens"] = json!(max_tokens);
        }
        body
    }
}

#[async_trait]
impl LLMClient for OpenAIClient {
    async fn complete(&self, request: &LlmRequest<'_>) -> Result<String> {
        let url = format!("{}/chat/completions", self.api_base);
        let body = self.request_body(request);

        let response = self
            .http
            .post(&url)
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| AppError::capability("llm", format!("OpenAI request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            return Err(AppError::capability(
                "llm",
                format!("OpenAI request failed ({}): {}", status, text),
            ));
        }

        let completion: ChatCompletion = response.json().await.map_err(|e| {
            AppError::capability("llm", format!("Failed to parse OpenAI response: {}", e))
        })?;

        completion
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content.unwrap_or_default())
            .ok_or_else(|| AppError::capability("llm", "OpenAI response contained no choices"))
    }

    fn model_name(&self) -> &str {
        &self.model
    }
}
