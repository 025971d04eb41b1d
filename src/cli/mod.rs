// src/cli/mod.rs — CLI definition (clap derive)

pub mod evaluate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::infra::config::{Config, TargetConfig};
use crate::infra::errors::SkillBenchError;
use crate::provider::ProviderKind;

/// Model used when `--provider ollama` is given without `--model`.
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2:latest";

#[derive(Parser, Debug)]
#[command(
    name = "skillbench",
    about = "Measure whether skill documents improve model-written code",
    version
)]
pub struct Cli {
    /// Skill to evaluate (substring match, repeatable)
    #[arg(short, long = "skill", value_name = "NAME")]
    pub skills: Vec<String>,

    /// Evaluate every discovered skill (overrides --skill)
    #[arg(long)]
    pub all: bool,

    /// Model backend: ollama, copilot, codex or gemini (replaces configured targets)
    #[arg(short, long)]
    pub provider: Option<ProviderKind>,

    /// Model name for the backend
    #[arg(short, long)]
    pub model: Option<String>,

    /// Minimum with-skill pass rate (0-100) for skills without a judgment
    #[arg(short, long, value_parser = clap::value_parser!(u8).range(0..=100))]
    pub threshold: Option<u8>,

    /// Run the blind judge
    #[arg(long, conflicts_with = "no_judge")]
    pub judge: bool,

    /// Skip the blind judge
    #[arg(long)]
    pub no_judge: bool,

    /// Where summaries are written
    #[arg(long)]
    pub results_dir: Option<PathBuf>,

    /// Where skills are discovered
    #[arg(long)]
    pub skills_dir: Option<PathBuf>,

    /// Print the console report (alone: report on the last run without evaluating)
    #[arg(long)]
    pub report: bool,

    /// Per-test progress and model errors on stderr
    #[arg(short, long)]
    pub verbose: bool,

    /// Config file path (default: ./skillbench.toml)
    #[arg(long)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the console report from an existing summary
    Report {
        /// Summary file (default: <results_dir>/summary.json)
        path: Option<PathBuf>,
    },
}

impl Cli {
    /// `--report` with nothing selected only prints the last report.
    pub fn report_only(&self) -> bool {
        self.report && !self.all && self.skills.is_empty()
    }

    /// Name filters for skill selection. Empty selects every skill.
    pub fn skill_filters(&self) -> &[String] {
        if self.all {
            &[]
        } else {
            &self.skills
        }
    }

    /// Layer command-line flags over the loaded config.
    pub fn apply_overrides(&self, config: &mut Config) -> Result<(), SkillBenchError> {
        if let Some(dir) = &self.skills_dir {
            config.skills_dir = dir.clone();
        }
        if let Some(dir) = &self.results_dir {
            config.results_dir = dir.clone();
        }
        if let Some(threshold) = self.threshold {
            config.evaluation.threshold = threshold;
        }
        if self.judge {
            config.evaluation.judge = true;
        }
        if self.no_judge {
            config.evaluation.judge = false;
        }

        if self.provider.is_some() || self.model.is_some() {
            config.targets = vec![self.target(config)?];
        }
        Ok(())
    }

    fn target(&self, config: &Config) -> Result<TargetConfig, SkillBenchError> {
        let provider = self
            .provider
            .or_else(|| config.targets.first().map(|t| t.provider))
            .unwrap_or(ProviderKind::Ollama);

        // Keep endpoint/context/timeout settings of a configured target for
        // the same provider.
        let mut target = config
            .targets
            .iter()
            .find(|t| t.provider == provider)
            .cloned()
            .unwrap_or_else(|| TargetConfig::new(provider, String::new()));

        if let Some(model) = &self.model {
            target.model = model.clone();
        } else if target.model.is_empty() {
            if provider != ProviderKind::Ollama {
                return Err(SkillBenchError::Config(format!(
                    "--model is required for provider '{}'",
                    provider
                )));
            }
            target.model = DEFAULT_OLLAMA_MODEL.to_string();
        }
        Ok(target)
    }
}
