// src/evaluator/types.rs — Evaluation records

use serde::{Deserialize, Serialize};

use super::classify::{self, Improvement, Rating};
use super::matcher::{ExpectationRules, MatchOutcome};
use crate::provider::CallFailure;
use crate::skills::Severity;

/// One prompt and its expectations, evaluated once per run type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestCase {
    pub name: String,
    pub input_prompt: String,
    pub expected: ExpectationRules,
}

/// Ordered test cases for one skill. Order is stable for the whole run:
/// baseline and skill results are paired by position.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestSuite {
    pub skill_name: String,
    pub severity: Severity,
    pub tests: Vec<TestCase>,
}

impl TestSuite {
    pub fn test_count(&self) -> usize {
        self.tests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }
}

/// Outcome of one model call for one test case.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestResult {
    pub test_name: String,
    pub passed: bool,
    pub response: String,
    /// Empty iff `passed`.
    pub failure_reason: String,
}

impl TestResult {
    pub fn from_match(test_name: &str, response: String, outcome: MatchOutcome) -> Self {
        let failure_reason = match (outcome.passed, outcome.reason.is_empty()) {
            (true, _) => String::new(),
            (false, false) => outcome.reason,
            (false, true) => "expectation not met".to_string(),
        };
        Self {
            test_name: test_name.to_string(),
            passed: outcome.passed,
            response,
            failure_reason,
        }
    }

    pub fn model_failure(test_name: &str, failure: &CallFailure) -> Self {
        let failure_reason = if failure.message.trim().is_empty() {
            "model call failed".to_string()
        } else {
            failure.message.clone()
        };
        Self {
            test_name: test_name.to_string(),
            passed: false,
            response: String::new(),
            failure_reason,
        }
    }

    /// First 100 characters, for console output.
    pub fn response_preview(&self) -> String {
        const MAX: usize = 100;
        if self.response.chars().count() > MAX {
            let head: String = self.response.chars().take(MAX).collect();
            format!("{}...", head)
        } else {
            self.response.clone()
        }
    }
}

/// A judge's pick between the two anonymous solutions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Choice {
    /// Solution A: the without-skill run.
    A,
    /// Solution B: the with-skill run.
    B,
    Equal,
}

impl Choice {
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim() {
            "A" => Some(Choice::A),
            "B" => Some(Choice::B),
            "Equal" => Some(Choice::Equal),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Choice::A => "A",
            Choice::B => "B",
            Choice::Equal => "Equal",
        }
    }
}

impl std::fmt::Display for Choice {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Blind-comparison verdict. A is always the without-skill aggregate and B
/// the with-skill aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JudgmentResult {
    pub principle_better: Choice,
    pub quality_better: Choice,
    pub overall_better: Choice,
    /// With-skill mechanical pass rate (0-100), never the model's opinion.
    pub score: u8,
    pub reasoning: String,
}

impl JudgmentResult {
    pub fn skill_won(&self) -> bool {
        self.overall_better == Choice::B
    }
}

/// Baseline vs. with-skill evaluation of one skill on one model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EvaluationResult {
    pub skill_name: String,
    pub severity: Severity,
    pub model: String,
    pub baseline_results: Vec<TestResult>,
    /// Positionally paired with `baseline_results`.
    pub skill_results: Vec<TestResult>,
    pub judgment: Option<JudgmentResult>,
}

impl EvaluationResult {
    pub fn baseline_pass_rate(&self) -> u8 {
        pass_rate(&self.baseline_results)
    }

    pub fn skill_pass_rate(&self) -> u8 {
        pass_rate(&self.skill_results)
    }

    /// Percentage points gained by adding the skill.
    pub fn improvement(&self) -> i16 {
        i16::from(self.skill_pass_rate()) - i16::from(self.baseline_pass_rate())
    }

    pub fn baseline_rating(&self) -> Rating {
        classify::adjusted_ratings(self).0
    }

    pub fn skill_rating(&self) -> Rating {
        classify::adjusted_ratings(self).1
    }

    pub fn improvement_label(&self) -> Improvement {
        classify::improvement(self)
    }

    pub fn baseline_pass_count(&self) -> String {
        pass_count(&self.baseline_results)
    }

    pub fn skill_pass_count(&self) -> String {
        pass_count(&self.skill_results)
    }

    /// Baseline/skill pairs in suite order.
    pub fn pairs(&self) -> impl Iterator<Item = (&TestResult, &TestResult)> {
        self.baseline_results.iter().zip(self.skill_results.iter())
    }
}

pub fn passed_count(results: &[TestResult]) -> usize {
    results.iter().filter(|r| r.passed).count()
}

/// `round(100 * passed / total)`; 0 for an empty run.
pub fn pass_rate(results: &[TestResult]) -> u8 {
    percentage(passed_count(results), results.len())
}

pub fn percentage(part: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    ((part as f64 / total as f64) * 100.0).round().clamp(0.0, 100.0) as u8
}

fn pass_count(results: &[TestResult]) -> String {
    format!("{}/{}", passed_count(results), results.len())
}
