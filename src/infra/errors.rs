// src/infra/errors.rs — Error types for skillbench

use thiserror::Error;

#[derive(Error, Debug)]
pub enum SkillBenchError {
    // Run setup (fatal for the affected target)
    #[error("Model backend '{provider}' is not available for model '{model}'")]
    BackendUnavailable { provider: String, model: String },

    #[error("No skills found in {dir}")]
    NoSkills { dir: String },

    #[error("No skill matches {filter:?}")]
    SkillNotFound { filter: Vec<String> },

    #[error("No usable test cases for skill '{skill}'")]
    NoTests { skill: String },

    #[error("Unknown provider '{0}' (expected ollama, copilot, codex or gemini)")]
    UnknownProvider(String),

    // Boundary
    #[error("Summary error: {0}")]
    Summary(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl SkillBenchError {
    /// Errors that stop a whole target rather than a single test or judgment.
    pub fn is_fatal_for_target(&self) -> bool {
        matches!(
            self,
            SkillBenchError::BackendUnavailable { .. }
                | SkillBenchError::NoSkills { .. }
                | SkillBenchError::SkillNotFound { .. }
        )
    }
}
