// src/evaluator/runner.rs — Baseline and with-skill runs
//
// Strictly sequential: for each test case the baseline call completes before
// the skill call starts, and test cases never overlap.

use super::matcher;
use super::types::{EvaluationResult, TestCase, TestResult, TestSuite};
use crate::provider::{ModelBackend, ModelConfig};
use crate::skills::Skill;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunKind {
    Baseline,
    WithSkill,
}

impl RunKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RunKind::Baseline => "baseline",
            RunKind::WithSkill => "skill",
        }
    }
}

/// Runs every test case twice through one backend and one model config, so
/// the skill guidance is the only difference between the two runs.
pub struct DualRunExecutor<'a> {
    backend: &'a dyn ModelBackend,
    config: &'a ModelConfig,
}

impl<'a> DualRunExecutor<'a> {
    pub fn new(backend: &'a dyn ModelBackend, config: &'a ModelConfig) -> Self {
        Self { backend, config }
    }

    /// Model failures become failed results; the suite always runs to the end.
    /// The returned result carries no judgment.
    pub async fn run(&self, skill: &Skill, suite: &TestSuite) -> EvaluationResult {
        let instruction = skill.instruction();
        let mut baseline_results = Vec::with_capacity(suite.test_count());
        let mut skill_results = Vec::with_capacity(suite.test_count());

        for (i, test) in suite.tests.iter().enumerate() {
            tracing::info!(
                skill = %skill.name,
                test = %test.name,
                "Test {}/{}",
                i + 1,
                suite.test_count()
            );

            baseline_results.push(
                self.run_one(test, &test.input_prompt, RunKind::Baseline)
                    .await,
            );

            let prompt = format!("{}{}", instruction, test.input_prompt);
            skill_results.push(self.run_one(test, &prompt, RunKind::WithSkill).await);
        }

        EvaluationResult {
            skill_name: skill.name.clone(),
            severity: skill.severity,
            model: self.config.model_name.clone(),
            baseline_results,
            skill_results,
            judgment: None,
        }
    }

    async fn run_one(&self, test: &TestCase, prompt: &str, run: RunKind) -> TestResult {
        match self.backend.call(prompt, self.config).await {
            Ok(response) => {
                let outcome = matcher::evaluate(&response, &test.expected);
                if !outcome.passed {
                    tracing::info!(
                        test = %test.name,
                        run = run.as_str(),
                        "Failed: {}",
                        outcome.reason
                    );
                }
                TestResult::from_match(&test.name, response, outcome)
            }
            Err(failure) => {
                tracing::warn!(
                    test = %test.name,
                    run = run.as_str(),
                    backend = self.backend.id(),
                    context = ?failure.context,
                    "Model error: {}",
                    failure.message
                );
                TestResult::model_failure(&test.name, &failure)
            }
        }
    }
}
