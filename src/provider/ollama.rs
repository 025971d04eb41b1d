// src/provider/ollama.rs — Ollama backend (OpenAI-compatible chat endpoint)

use async_trait::async_trait;
use std::time::Duration;

use super::{CallFailure, ModelBackend, ModelConfig};

pub const DEFAULT_BASE_URL: &str = "http://localhost:11434/v1";

pub struct OllamaBackend {
    client: reqwest::Client,
}

impl OllamaBackend {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Request body for `/chat/completions`. Temperature is pinned to 0 so
    /// reruns differ only by model nondeterminism.
    pub fn request_body(prompt: &str, config: &ModelConfig) -> serde_json::Value {
        serde_json::json!({
            "model": config.model_name,
            "messages": [{ "role": "user", "content": prompt }],
            "temperature": 0,
            "stream": false,
            "options": { "num_ctx": config.num_ctx },
        })
    }

    /// Pull the assistant message out of a chat completion.
    pub fn extract_content(resp: &serde_json::Value) -> Result<String, CallFailure> {
        resp["choices"][0]["message"]["content"]
            .as_str()
            .map(|s| s.to_string())
            .ok_or_else(|| {
                CallFailure::new("Unexpected response format from Ollama")
                    .with("missing_key", "choices[0].message.content")
            })
    }

    /// `http://host:11434/v1` -> `http://host:11434`
    fn host(base_url: &str) -> &str {
        base_url
            .trim_end_matches('/')
            .strip_suffix("/v1")
            .unwrap_or(base_url)
    }
}

impl Default for OllamaBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ModelBackend for OllamaBackend {
    fn id(&self) -> &str {
        "ollama"
    }

    async fn call(&self, prompt: &str, config: &ModelConfig) -> Result<String, CallFailure> {
        let url = format!("{}/chat/completions", config.base_url.trim_end_matches('/'));
        let body = Self::request_body(prompt, config);

        let response = self
            .client
            .post(&url)
            .json(&body)
            .timeout(config.timeout)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    CallFailure::timeout("Ollama", config.timeout).with("url", &url)
                } else {
                    CallFailure::new("Ollama connection failed")
                        .with("url", &url)
                        .with("reason", e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let error_body = response.text().await.unwrap_or_default();
            return Err(
                CallFailure::new(format!("Ollama HTTP error: {}", status.as_u16()))
                    .with("url", &url)
                    .with("code", status.as_u16())
                    .with("body", error_body),
            );
        }

        let resp: serde_json::Value = response.json().await.map_err(|e| {
            CallFailure::new("Invalid JSON response from Ollama").with("error", e)
        })?;

        Self::extract_content(&resp)
    }

    async fn is_available(&self, config: &ModelConfig) -> bool {
        let url = format!("{}/api/tags", Self::host(&config.base_url));
        match self
            .client
            .get(&url)
            .timeout(Duration::from_secs(5))
            .send()
            .await
        {
            Ok(resp) => resp.status().is_success(),
            Err(e) => {
                tracing::debug!(url = %url, "Ollama not reachable: {}", e);
                false
            }
        }
    }
}
