// src/infra/config.rs — Configuration loading (TOML)

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::provider::{ModelConfig, ProviderKind};

/// Default config file, looked up in the working directory.
pub const CONFIG_FILE_NAME: &str = "skillbench.toml";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_skills_dir")]
    pub skills_dir: PathBuf,

    #[serde(default = "default_results_dir")]
    pub results_dir: PathBuf,

    #[serde(default)]
    pub evaluation: EvaluationConfig,

    #[serde(default = "default_targets")]
    pub targets: Vec<TargetConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            skills_dir: default_skills_dir(),
            results_dir: default_results_dir(),
            evaluation: EvaluationConfig::default(),
            targets: default_targets(),
        }
    }
}

fn default_skills_dir() -> PathBuf {
    PathBuf::from("skills")
}

fn default_results_dir() -> PathBuf {
    PathBuf::from("tests/results")
}

fn default_targets() -> Vec<TargetConfig> {
    vec![TargetConfig::new(ProviderKind::Ollama, "llama3.2:latest")]
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    /// Minimum with-skill pass rate (0-100) when no judgment is available.
    pub threshold: u8,
    /// Run the blind judge after the dual run.
    pub judge: bool,
    /// Worker pool size across (provider, model) targets.
    pub max_concurrent: usize,
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            threshold: 50,
            judge: true,
            max_concurrent: 4,
        }
    }
}

/// One (provider, model) combination to evaluate every selected skill against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TargetConfig {
    pub provider: ProviderKind,
    pub model: String,
    #[serde(default)]
    pub base_url: Option<String>,
    #[serde(default)]
    pub num_ctx: Option<u32>,
    #[serde(default)]
    pub timeout_seconds: Option<u64>,
}

impl TargetConfig {
    pub fn new(provider: ProviderKind, model: impl Into<String>) -> Self {
        Self {
            provider,
            model: model.into(),
            base_url: None,
            num_ctx: None,
            timeout_seconds: None,
        }
    }

    /// Resolve into the model configuration shared by every call of a run.
    pub fn model_config(&self) -> ModelConfig {
        let mut config = ModelConfig::new(self.provider, self.model.clone());
        if let Some(url) = &self.base_url {
            config.base_url = url.clone();
        }
        if let Some(ctx) = self.num_ctx {
            config.num_ctx = ctx;
        }
        if let Some(secs) = self.timeout_seconds {
            config.timeout = std::time::Duration::from_secs(secs);
        }
        config
    }
}

impl Config {
    /// Load `skillbench.toml` from the working directory, falling back to defaults.
    pub fn load() -> anyhow::Result<Self> {
        let path = Path::new(CONFIG_FILE_NAME);
        if path.exists() {
            Self::load_from(path)
        } else {
            Ok(Self::default())
        }
    }

    pub fn load_from(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }
}
