// src/provider/mod.rs — Model invocation layer

pub mod cli;
pub mod ollama;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::infra::errors::SkillBenchError;

/// Core trait that every model backend implements.
///
/// Calls are request/response: one prompt in, one complete answer out.
/// Backends must report failures through `CallFailure` (timeouts included)
/// and never hand back an empty string in place of an error.
#[async_trait]
pub trait ModelBackend: Send + Sync {
    fn id(&self) -> &str;

    async fn call(&self, prompt: &str, config: &ModelConfig) -> Result<String, CallFailure>;

    async fn is_available(&self, config: &ModelConfig) -> bool;
}

/// A failed model invocation, with backend-specific context.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct CallFailure {
    pub message: String,
    pub context: BTreeMap<String, String>,
}

impl CallFailure {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            context: BTreeMap::new(),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl ToString) -> Self {
        self.context.insert(key.into(), value.to_string());
        self
    }

    pub fn timeout(backend: &str, after: Duration) -> Self {
        Self::new(format!(
            "{} timeout after {} seconds",
            backend,
            after.as_secs()
        ))
        .with("timeout", after.as_secs())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Ollama,
    Copilot,
    Codex,
    Gemini,
}

impl ProviderKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ProviderKind::Ollama => "ollama",
            ProviderKind::Copilot => "copilot",
            ProviderKind::Codex => "codex",
            ProviderKind::Gemini => "gemini",
        }
    }

    /// Per-call timeout when the config does not set one.
    pub fn default_timeout(&self) -> Duration {
        match self {
            ProviderKind::Ollama | ProviderKind::Copilot => Duration::from_secs(300),
            ProviderKind::Codex | ProviderKind::Gemini => Duration::from_secs(600),
        }
    }
}

impl std::fmt::Display for ProviderKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for ProviderKind {
    type Err = SkillBenchError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" => Ok(ProviderKind::Ollama),
            "copilot" => Ok(ProviderKind::Copilot),
            "codex" => Ok(ProviderKind::Codex),
            "gemini" => Ok(ProviderKind::Gemini),
            other => Err(SkillBenchError::UnknownProvider(other.to_string())),
        }
    }
}

/// Model configuration shared by the baseline call, the skill call and the
/// judge call of one evaluation, so guidance is the only variable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelConfig {
    pub provider: ProviderKind,
    pub model_name: String,
    pub base_url: String,
    pub num_ctx: u32,
    pub timeout: Duration,
}

impl ModelConfig {
    pub fn new(provider: ProviderKind, model_name: impl Into<String>) -> Self {
        Self {
            provider,
            model_name: model_name.into(),
            base_url: ollama::DEFAULT_BASE_URL.into(),
            num_ctx: 64_000,
            timeout: provider.default_timeout(),
        }
    }
}

/// Build the backend for a provider.
pub fn backend_for(provider: ProviderKind) -> Arc<dyn ModelBackend> {
    match provider {
        ProviderKind::Ollama => Arc::new(ollama::OllamaBackend::new()),
        ProviderKind::Copilot => Arc::new(cli::CliBackend::new(cli::CliKind::Copilot)),
        ProviderKind::Codex => Arc::new(cli::CliBackend::new(cli::CliKind::Codex)),
        ProviderKind::Gemini => Arc::new(cli::CliBackend::new(cli::CliKind::Gemini)),
    }
}
