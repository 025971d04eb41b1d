// src/evaluator/mod.rs — Skill evaluation pipeline
//
// suite -> dual run -> (optional) blind judge -> classification.

pub mod classify;
pub mod judge;
pub mod matcher;
pub mod report;
pub mod retry;
pub mod runner;
pub mod suite;
pub mod types;

use std::sync::Arc;

use crate::infra::errors::SkillBenchError;
use crate::infra::fs::FileSystem;
use crate::provider::{ModelBackend, ModelConfig};
use crate::skills::Skill;
use judge::BlindJudge;
use runner::DualRunExecutor;
use suite::TestSuiteBuilder;
use types::EvaluationResult;

/// Evaluates skills against one (backend, model) target.
pub struct SkillEvaluator {
    backend: Arc<dyn ModelBackend>,
    config: ModelConfig,
    fs: Arc<dyn FileSystem>,
    judge: Option<BlindJudge>,
}

impl SkillEvaluator {
    pub fn new(backend: Arc<dyn ModelBackend>, config: ModelConfig, fs: Arc<dyn FileSystem>) -> Self {
        Self {
            backend,
            config,
            fs,
            judge: Some(BlindJudge::default()),
        }
    }

    pub fn with_judge(mut self, judge: Option<BlindJudge>) -> Self {
        self.judge = judge;
        self
    }

    pub fn config(&self) -> &ModelConfig {
        &self.config
    }

    /// Checked once before a run; an unreachable backend is fatal for the target.
    pub async fn ensure_available(&self) -> Result<(), SkillBenchError> {
        if self.backend.is_available(&self.config).await {
            Ok(())
        } else {
            Err(SkillBenchError::BackendUnavailable {
                provider: self.config.provider.to_string(),
                model: self.config.model_name.clone(),
            })
        }
    }

    /// A skill without any usable test case is reported as `NoTests`.
    pub async fn evaluate(&self, skill: &Skill) -> Result<EvaluationResult, SkillBenchError> {
        let suite = TestSuiteBuilder::new(self.fs.as_ref()).build(skill);
        tracing::info!(
            skill = %skill.name,
            model = %self.config.model_name,
            tests = suite.test_count(),
            "Evaluating skill"
        );
        if suite.is_empty() {
            tracing::warn!(skill = %skill.name, "No test cases found");
            return Err(SkillBenchError::NoTests {
                skill: skill.name.clone(),
            });
        }

        let runs = DualRunExecutor::new(self.backend.as_ref(), &self.config)
            .run(skill, &suite)
            .await;

        let judgment = match &self.judge {
            Some(judge) => {
                judge
                    .judge(
                        skill,
                        &runs.baseline_results,
                        &runs.skill_results,
                        self.backend.as_ref(),
                        &self.config,
                    )
                    .await
            }
            None => None,
        };
        let result = EvaluationResult { judgment, ..runs };

        tracing::info!(
            skill = %skill.name,
            baseline = result.baseline_pass_rate(),
            with_skill = result.skill_pass_rate(),
            improvement = result.improvement(),
            "Evaluation complete"
        );
        Ok(result)
    }
}
