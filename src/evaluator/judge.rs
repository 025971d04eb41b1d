// src/evaluator/judge.rs — Blind A/B comparison judge
//
// Labeling is fixed: Solution A is the aggregate of the without-skill
// responses, Solution B the with-skill aggregate. The model is not told
// which is which. The judge never produces the score; it is overwritten
// with the mechanical with-skill pass rate.

use serde_json::Value;
use thiserror::Error;

use super::retry::{call_with_feedback, AttemptOutcome, RetryPolicy};
use super::types::{pass_rate, passed_count, Choice, JudgmentResult, TestResult};
use crate::provider::{ModelBackend, ModelConfig};
use crate::skills::Skill;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum JudgeParseError {
    #[error("No JSON object found in response")]
    NoJson,

    #[error("Invalid JSON in response: {0}")]
    InvalidJson(String),

    #[error("Invalid {field}: expected \"A\", \"B\" or \"Equal\", got {found}")]
    InvalidChoice { field: &'static str, found: String },

    #[error("Missing reasoning")]
    MissingReasoning,
}

/// The judge's answer before the score override.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Verdict {
    pub principle_better: Choice,
    pub quality_better: Choice,
    pub overall_better: Choice,
    pub reasoning: String,
}

impl Verdict {
    pub fn with_score(self, score: u8) -> JudgmentResult {
        JudgmentResult {
            principle_better: self.principle_better,
            quality_better: self.quality_better,
            overall_better: self.overall_better,
            score,
            reasoning: self.reasoning,
        }
    }
}

/// All non-empty responses of one run, blank-line separated.
pub fn aggregate(results: &[TestResult]) -> String {
    results
        .iter()
        .map(|r| r.response.as_str())
        .filter(|r| !r.trim().is_empty())
        .collect::<Vec<_>>()
        .join("\n\n")
}

pub fn build_comparison_prompt(
    principle: &str,
    guidance: &str,
    solution_a: &str,
    solution_b: &str,
) -> String {
    format!(
        "You are comparing two solutions to the same programming tasks.\n\n\
         PRINCIPLE: {}\n\n\
         KEY INSTRUCTIONS:\n{}\n\n\
         SOLUTION A:\n```\n{}\n```\n\n\
         SOLUTION B:\n```\n{}\n```\n\n\
         Answer each question independently with \"A\", \"B\" or \"Equal\":\n\
         1. principle_better: which solution better follows the principle?\n\
         2. quality_better: which solution has better code quality (correctness, clarity, maintainability)?\n\
         3. overall_better: which solution is better overall?\n\
         Then give 2-3 sentences of reasoning.\n\n\
         Do NOT give a numeric score.\n\n\
         Respond ONLY with valid JSON in this exact format:\n\
         {{\n  \"principle_better\": \"A|B|Equal\",\n  \"quality_better\": \"A|B|Equal\",\n  \
         \"overall_better\": \"A|B|Equal\",\n  \"reasoning\": \"Your explanation here\"\n}}",
        principle, guidance, solution_a, solution_b
    )
}

/// The JSON object in a response: the first fenced block holding one, else
/// the span from the first `{` to the last `}`.
pub fn extract_json(response: &str) -> Option<&str> {
    fenced_object(response).or_else(|| {
        let start = response.find('{')?;
        let end = response.rfind('}')?;
        (end > start).then(|| &response[start..=end])
    })
}

fn fenced_object(response: &str) -> Option<&str> {
    let mut rest = response;
    while let Some(open) = rest.find("```") {
        let after_fence = &rest[open + 3..];
        let body_start = after_fence.find('\n').map(|i| i + 1).unwrap_or(0);
        let body = &after_fence[body_start..];
        let close = body.find("```")?;
        let inner = body[..close].trim();
        if inner.starts_with('{') && inner.ends_with('}') {
            return Some(inner);
        }
        rest = &body[close + 3..];
    }
    None
}

pub fn parse_verdict(response: &str) -> Result<Verdict, JudgeParseError> {
    let json = extract_json(response).ok_or(JudgeParseError::NoJson)?;
    let data: Value =
        serde_json::from_str(json).map_err(|e| JudgeParseError::InvalidJson(e.to_string()))?;

    let reasoning = data
        .get("reasoning")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default();
    let verdict = Verdict {
        principle_better: choice_field(&data, "principle_better")?,
        quality_better: choice_field(&data, "quality_better")?,
        overall_better: choice_field(&data, "overall_better")?,
        reasoning: reasoning.to_string(),
    };
    if verdict.reasoning.is_empty() {
        return Err(JudgeParseError::MissingReasoning);
    }
    Ok(verdict)
}

fn choice_field(data: &Value, field: &'static str) -> Result<Choice, JudgeParseError> {
    let raw = data.get(field).unwrap_or(&Value::Null);
    raw.as_str()
        .and_then(Choice::parse)
        .ok_or_else(|| JudgeParseError::InvalidChoice {
            field,
            found: raw.to_string(),
        })
}

/// `round(100 * passed / total)` over the with-skill results.
pub fn deterministic_score(skill_results: &[TestResult]) -> u8 {
    pass_rate(skill_results)
}

/// Runs the blind comparison for one evaluation.
#[derive(Debug, Clone, Copy, Default)]
pub struct BlindJudge {
    policy: RetryPolicy,
}

impl BlindJudge {
    pub fn new(policy: RetryPolicy) -> Self {
        Self { policy }
    }

    /// `None` when either side has nothing to compare, the model call fails,
    /// or the verdict still does not parse after the retry budget.
    pub async fn judge(
        &self,
        skill: &Skill,
        baseline_results: &[TestResult],
        skill_results: &[TestResult],
        backend: &dyn ModelBackend,
        config: &ModelConfig,
    ) -> Option<JudgmentResult> {
        let solution_a = aggregate(baseline_results);
        let solution_b = aggregate(skill_results);
        if solution_a.is_empty() || solution_b.is_empty() {
            tracing::info!(skill = %skill.name, "Judge skipped: missing responses to compare");
            return None;
        }

        let prompt = build_comparison_prompt(
            &skill.principle(),
            &skill.guidance(),
            &solution_a,
            &solution_b,
        );

        match call_with_feedback(backend, config, &prompt, self.policy, parse_verdict).await {
            AttemptOutcome::Parsed { value, attempts } => {
                let judgment = value.with_score(deterministic_score(skill_results));
                tracing::info!(
                    skill = %skill.name,
                    attempts,
                    overall = %judgment.overall_better,
                    "Judge: {} (score {}/100 = {}/{} tests)",
                    if judgment.skill_won() { "skill improved" } else { "no improvement" },
                    judgment.score,
                    passed_count(skill_results),
                    skill_results.len()
                );
                Some(judgment)
            }
            AttemptOutcome::CallFailed { failure, attempts } => {
                tracing::warn!(skill = %skill.name, attempts, "Judge call failed: {}", failure);
                None
            }
            AttemptOutcome::Exhausted { last_error, attempts } => {
                tracing::warn!(skill = %skill.name, attempts, "Judge response unusable: {}", last_error);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn result(response: &str, passed: bool) -> TestResult {
        TestResult {
            test_name: "t".into(),
            passed,
            response: response.into(),
            failure_reason: if passed { String::new() } else { "x".into() },
        }
    }

    const VALID: &str = r#"{"principle_better": "B", "quality_better": "Equal", "overall_better": "B", "reasoning": "B isolates state."}"#;

    // ─── aggregation and prompt ─────────────────────────────────

    #[test]
    fn test_aggregate_skips_empty() {
        let results = vec![result("one", true), result("", false), result("two", true)];
        assert_eq!(aggregate(&results), "one\n\ntwo");
        assert_eq!(aggregate(&[result("  ", false)]), "");
    }

    #[test]
    fn test_prompt_layout() {
        let p = build_comparison_prompt("Keep it local", "Guidance text", "AAA", "BBB");
        assert!(p.contains("PRINCIPLE: Keep it local"));
        assert!(p.contains("SOLUTION A:\n```\nAAA\n```"));
        assert!(p.contains("SOLUTION B:\n```\nBBB\n```"));
        assert!(p.contains("Do NOT give a numeric score"));
        assert!(!p.contains("\"score\""));
        assert!(!p.to_lowercase().contains("baseline"));
    }

    // ─── extraction ─────────────────────────────────────────────

    #[test]
    fn test_extract_fenced() {
        let r = "Here you go:\n```json\n{\"a\": 1}\n```\nThanks";
        assert_eq!(extract_json(r), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_skips_non_json_fence() {
        let r = "```python\nx = {}\ny = 1\n```\n```\n{\"a\": 1}\n```";
        assert_eq!(extract_json(r), Some("{\"a\": 1}"));
    }

    #[test]
    fn test_extract_raw_braces() {
        assert_eq!(extract_json("verdict: {\"a\": {\"b\": 1}} done"), Some("{\"a\": {\"b\": 1}}"));
        assert_eq!(extract_json("no json here"), None);
        assert_eq!(extract_json("} backwards {"), None);
    }

    // ─── parsing ────────────────────────────────────────────────

    #[test]
    fn test_parse_valid() {
        let v = parse_verdict(VALID).unwrap();
        assert_eq!(v.principle_better, Choice::B);
        assert_eq!(v.quality_better, Choice::Equal);
        assert_eq!(v.overall_better, Choice::B);
        assert_eq!(v.reasoning, "B isolates state.");
    }

    #[test]
    fn test_parse_rejects_bad_choice() {
        let r = r#"{"principle_better": "Both", "quality_better": "A", "overall_better": "A", "reasoning": "r"}"#;
        let err = parse_verdict(r).unwrap_err();
        assert_eq!(
            err,
            JudgeParseError::InvalidChoice {
                field: "principle_better",
                found: "\"Both\"".into()
            }
        );
    }

    #[test]
    fn test_parse_rejects_missing_field() {
        let r = r#"{"principle_better": "A", "quality_better": "A", "reasoning": "r"}"#;
        assert!(matches!(
            parse_verdict(r),
            Err(JudgeParseError::InvalidChoice { field: "overall_better", .. })
        ));
    }

    #[test]
    fn test_parse_rejects_blank_reasoning() {
        let r = r#"{"principle_better": "A", "quality_better": "A", "overall_better": "A", "reasoning": "  "}"#;
        assert_eq!(parse_verdict(r), Err(JudgeParseError::MissingReasoning));
    }

    #[test]
    fn test_parse_invalid_json() {
        assert!(matches!(parse_verdict("{not: json}"), Err(JudgeParseError::InvalidJson(_))));
        assert_eq!(parse_verdict("I prefer B."), Err(JudgeParseError::NoJson));
    }

    #[test]
    fn test_parse_ignores_judge_score() {
        let r = r#"{"principle_better": "A", "quality_better": "A", "overall_better": "A", "score": 99, "reasoning": "r"}"#;
        let judgment = parse_verdict(r).unwrap().with_score(40);
        assert_eq!(judgment.score, 40);
    }

    // ─── score ──────────────────────────────────────────────────

    #[test]
    fn test_deterministic_score() {
        let results = vec![
            result("a", true),
            result("b", true),
            result("c", true),
            result("d", false),
        ];
        assert_eq!(deterministic_score(&results), 75);
        assert_eq!(deterministic_score(&[]), 0);
    }
}
