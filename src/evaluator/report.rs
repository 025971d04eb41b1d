// src/evaluator/report.rs — Serialized results and the console report

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::classify::{self, Improvement, Rating};
use super::types::{EvaluationResult, JudgmentResult, TestResult};
use crate::infra::errors::SkillBenchError;
use crate::infra::fs::FileSystem;
use crate::skills::Severity;

pub const SUMMARY_FILE: &str = "summary.json";

/// One side of a test pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunRecord {
    pub pass: bool,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub failure_reason: String,
    pub response_preview: String,
    pub response_full: String,
}

impl From<&TestResult> for RunRecord {
    fn from(r: &TestResult) -> Self {
        Self {
            pass: r.passed,
            failure_reason: r.failure_reason.clone(),
            response_preview: r.response_preview(),
            response_full: r.response.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestPairRecord {
    pub name: String,
    pub baseline: RunRecord,
    pub skill: RunRecord,
}

/// The serialized form of an `EvaluationResult`, derived values included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub skill: String,
    pub severity: Severity,
    pub model: String,
    pub baseline_rate: u8,
    pub skill_rate: u8,
    pub baseline_rating: Rating,
    pub skill_rating: Rating,
    pub baseline_passed: String,
    pub skill_passed: String,
    pub improvement: i16,
    pub verdict: Improvement,
    pub accepted: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub judgment: Option<JudgmentResult>,
    pub results: Vec<TestPairRecord>,
}

impl EvaluationRecord {
    pub fn from_result(result: &EvaluationResult, threshold: u8) -> Self {
        let (baseline_rating, skill_rating) = classify::adjusted_ratings(result);
        Self {
            skill: result.skill_name.clone(),
            severity: result.severity,
            model: result.model.clone(),
            baseline_rate: result.baseline_pass_rate(),
            skill_rate: result.skill_pass_rate(),
            baseline_rating,
            skill_rating,
            baseline_passed: result.baseline_pass_count(),
            skill_passed: result.skill_pass_count(),
            improvement: result.improvement(),
            verdict: classify::improvement(result),
            accepted: classify::accepts(result, threshold),
            judgment: result.judgment.clone(),
            results: result
                .pairs()
                .map(|(baseline, skill)| TestPairRecord {
                    name: baseline.test_name.clone(),
                    baseline: baseline.into(),
                    skill: skill.into(),
                })
                .collect(),
        }
    }
}

/// A skill that could not be evaluated on a model. Always counts as rejected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SkippedRecord {
    pub skill: String,
    pub model: String,
    pub reason: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub timestamp: String,
    pub results: Vec<EvaluationRecord>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub skipped: Vec<SkippedRecord>,
}

impl RunSummary {
    pub fn new(results: Vec<EvaluationRecord>) -> Self {
        Self {
            timestamp: chrono::Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
            results,
            skipped: Vec::new(),
        }
    }

    pub fn with_skipped(mut self, skipped: Vec<SkippedRecord>) -> Self {
        self.skipped = skipped;
        self
    }

    /// Concatenate per-target summaries, in the order given.
    pub fn merge(summaries: impl IntoIterator<Item = RunSummary>) -> Self {
        let (mut results, mut skipped) = (Vec::new(), Vec::new());
        for summary in summaries {
            results.extend(summary.results);
            skipped.extend(summary.skipped);
        }
        Self::new(results).with_skipped(skipped)
    }

    pub fn all_accepted(&self) -> bool {
        self.skipped.is_empty() && self.results.iter().all(|r| r.accepted)
    }

    pub fn save(&self, path: &Path, fs: &dyn FileSystem) -> Result<(), SkillBenchError> {
        let content = serde_json::to_string_pretty(self)?;
        fs.write_text(path, &content)?;
        Ok(())
    }

    pub fn load(path: &Path, fs: &dyn FileSystem) -> Result<Self, SkillBenchError> {
        if !fs.exists(path) {
            return Err(SkillBenchError::Summary(format!(
                "No summary file found at {}. Run a benchmark first.",
                path.display()
            )));
        }
        let content = fs.read_text(path)?;
        serde_json::from_str(&content)
            .map_err(|e| SkillBenchError::Summary(format!("Invalid summary JSON: {}", e)))
    }

    /// Markdown table, with a judge column when any result was judged.
    pub fn render_console_report(&self) -> String {
        let judged = self.results.iter().any(|r| r.judgment.is_some());
        let mut lines = vec!["# Benchmark Results".to_string(), String::new()];

        if judged {
            lines.push("| Skill | Severity | Model | Baseline | With Skill | Improvement | Ratings | Judge | Status |".into());
            lines.push("|-------|----------|-------|----------|------------|-------------|---------|-------|--------|".into());
        } else {
            lines.push("| Skill | Severity | Model | Baseline | With Skill | Improvement | Ratings | Status |".into());
            lines.push("|-------|----------|-------|----------|------------|-------------|---------|--------|".into());
        }

        for r in &self.results {
            let status = if r.accepted { "PASS" } else { "FAIL" };
            let head = format!(
                "| {} | {} | {} | {}% ({}) | {}% ({}) | {:+}% | {} -> {} |",
                r.skill,
                r.severity,
                r.model,
                r.baseline_rate,
                r.baseline_passed,
                r.skill_rate,
                r.skill_passed,
                r.improvement,
                r.baseline_rating,
                r.skill_rating
            );
            if judged {
                let judge = r
                    .judgment
                    .as_ref()
                    .map(|j| format!("{} ({}/100)", r.verdict, j.score))
                    .unwrap_or_else(|| "N/A".to_string());
                lines.push(format!("{} {} | {} |", head, judge, status));
            } else {
                lines.push(format!("{} {} |", head, status));
            }
        }

        let reasoning: Vec<String> = self
            .results
            .iter()
            .filter_map(|r| {
                r.judgment
                    .as_ref()
                    .map(|j| format!("- **{}** ({}): {}", r.skill, r.model, j.reasoning))
            })
            .collect();
        if !reasoning.is_empty() {
            lines.push(String::new());
            lines.push("## Judge reasoning".into());
            lines.push(String::new());
            lines.extend(reasoning);
        }

        if !self.skipped.is_empty() {
            lines.push(String::new());
            lines.push("## Not evaluated".into());
            lines.push(String::new());
            lines.extend(
                self.skipped
                    .iter()
                    .map(|s| format!("- **{}** ({}): {} | FAIL", s.skill, s.model, s.reason)),
            );
        }

        lines.join("\n")
    }
}

/// `<results_dir>/<provider>/<model>/summary.json`, with the model name made
/// path-safe.
pub fn target_summary_path(results_dir: &Path, provider: &str, model: &str) -> PathBuf {
    results_dir
        .join(provider)
        .join(sanitize_model(model))
        .join(SUMMARY_FILE)
}

pub fn sanitize_model(model: &str) -> String {
    model
        .chars()
        .map(|c| match c {
            'a'..='z' | 'A'..='Z' | '0'..='9' | '.' | '-' | '_' => c,
            _ => '_',
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::evaluator::types::Choice;
    use crate::infra::fs::MemoryFileSystem;
    use pretty_assertions::assert_eq;

    fn test_result(name: &str, passed: bool, response: &str) -> TestResult {
        TestResult {
            test_name: name.into(),
            passed,
            response: response.into(),
            failure_reason: if passed { String::new() } else { "missing 'def'".into() },
        }
    }

    fn evaluation(judged: bool) -> EvaluationResult {
        EvaluationResult {
            skill_name: "ps-local-reasoning".into(),
            severity: Severity::Warn,
            model: "llama3.2:latest".into(),
            baseline_results: vec![test_result("t1", false, "x = 1"), test_result("t2", true, "def g(): pass")],
            skill_results: vec![test_result("t1", true, "def f(): pass"), test_result("t2", true, "def g(): pass")],
            judgment: judged.then(|| JudgmentResult {
                principle_better: Choice::B,
                quality_better: Choice::Equal,
                overall_better: Choice::B,
                score: 100,
                reasoning: "B keeps state local.".into(),
            }),
        }
    }

    // ─── record ─────────────────────────────────────────────────

    #[test]
    fn test_record_fields() {
        let record = EvaluationRecord::from_result(&evaluation(false), 50);
        assert_eq!(record.baseline_rate, 50);
        assert_eq!(record.skill_rate, 100);
        assert_eq!(record.improvement, 50);
        assert_eq!(record.baseline_passed, "1/2");
        assert_eq!(record.baseline_rating, Rating::Good);
        assert_eq!(record.skill_rating, Rating::Outstanding);
        assert_eq!(record.verdict, Improvement::Yes);
        assert!(record.accepted);
        assert_eq!(record.results.len(), 2);
        assert_eq!(record.results[0].name, "t1");
        assert!(!record.results[0].baseline.pass);
        assert_eq!(record.results[0].skill.response_full, "def f(): pass");
    }

    #[test]
    fn test_record_json_shape() {
        let record = EvaluationRecord::from_result(&evaluation(true), 50);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["severity"], "WARN");
        assert_eq!(json["baseline_rating"], "good");
        assert_eq!(json["verdict"], "yes");
        assert_eq!(json["judgment"]["overall_better"], "B");
        assert_eq!(json["judgment"]["score"], 100);
        assert_eq!(json["results"][0]["baseline"]["failure_reason"], "missing 'def'");
        assert!(json["results"][0]["skill"].get("failure_reason").is_none());
    }

    #[test]
    fn test_unjudged_record_omits_judgment() {
        let record = EvaluationRecord::from_result(&evaluation(false), 50);
        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("judgment").is_none());
    }

    // ─── summary ────────────────────────────────────────────────

    #[test]
    fn test_save_and_load() {
        let fs = MemoryFileSystem::new();
        let path = Path::new("results/summary.json");
        let summary = RunSummary::new(vec![EvaluationRecord::from_result(&evaluation(true), 50)]);
        summary.save(path, &fs).unwrap();
        let loaded = RunSummary::load(path, &fs).unwrap();
        assert_eq!(loaded, summary);
    }

    #[test]
    fn test_load_missing() {
        let fs = MemoryFileSystem::new();
        let err = RunSummary::load(Path::new("nope.json"), &fs).unwrap_err();
        assert!(err.to_string().contains("No summary file found"));
    }

    #[test]
    fn test_load_invalid() {
        let fs = MemoryFileSystem::new().with_file("bad.json", "{");
        let err = RunSummary::load(Path::new("bad.json"), &fs).unwrap_err();
        assert!(matches!(err, SkillBenchError::Summary(_)));
    }

    #[test]
    fn test_merge_keeps_order() {
        let a = RunSummary::new(vec![EvaluationRecord::from_result(&evaluation(false), 50)]);
        let mut b = a.clone();
        b.results[0].model = "other".into();
        let merged = RunSummary::merge(vec![a, b]);
        let models: Vec<&str> = merged.results.iter().map(|r| r.model.as_str()).collect();
        assert_eq!(models, vec!["llama3.2:latest", "other"]);
    }

    fn skipped(skill: &str) -> SkippedRecord {
        SkippedRecord {
            skill: skill.into(),
            model: "llama3.2:latest".into(),
            reason: format!("No usable test cases for skill '{}'", skill),
        }
    }

    #[test]
    fn test_skipped_skill_blocks_acceptance() {
        let summary = RunSummary::new(vec![EvaluationRecord::from_result(&evaluation(false), 50)]);
        assert!(summary.all_accepted());
        let summary = summary.with_skipped(vec![skipped("ps-empty")]);
        assert!(!summary.all_accepted());
    }

    #[test]
    fn test_merge_carries_skipped() {
        let a = RunSummary::new(vec![]).with_skipped(vec![skipped("ps-a")]);
        let b = RunSummary::new(vec![EvaluationRecord::from_result(&evaluation(false), 50)])
            .with_skipped(vec![skipped("ps-b")]);
        let merged = RunSummary::merge(vec![a, b]);
        assert_eq!(merged.results.len(), 1);
        let names: Vec<&str> = merged.skipped.iter().map(|s| s.skill.as_str()).collect();
        assert_eq!(names, vec!["ps-a", "ps-b"]);
    }

    #[test]
    fn test_skipped_omitted_from_json_when_empty() {
        let summary = RunSummary::new(vec![]);
        let json = serde_json::to_value(&summary).unwrap();
        assert!(json.get("skipped").is_none());
        let back: RunSummary = serde_json::from_value(json).unwrap();
        assert!(back.skipped.is_empty());
    }

    // ─── console report ─────────────────────────────────────────

    #[test]
    fn test_report_lists_skipped() {
        let summary = RunSummary::new(vec![]).with_skipped(vec![skipped("ps-empty")]);
        let report = summary.render_console_report();
        assert!(report.contains("## Not evaluated"));
        assert!(report.contains(
            "- **ps-empty** (llama3.2:latest): No usable test cases for skill 'ps-empty' | FAIL"
        ));
    }

    #[test]
    fn test_report_without_judgment() {
        let summary = RunSummary::new(vec![EvaluationRecord::from_result(&evaluation(false), 50)]);
        let report = summary.render_console_report();
        assert!(report.starts_with("# Benchmark Results"));
        assert!(!report.contains("| Judge |"));
        assert!(report.contains(
            "| ps-local-reasoning | WARN | llama3.2:latest | 50% (1/2) | 100% (2/2) | +50% | good -> outstanding | PASS |"
        ));
    }

    #[test]
    fn test_report_with_judgment() {
        let summary = RunSummary::new(vec![EvaluationRecord::from_result(&evaluation(true), 50)]);
        let report = summary.render_console_report();
        assert!(report.contains("| Judge |"));
        assert!(report.contains("| yes (100/100) | PASS |"));
        assert!(report.contains("B keeps state local."));
    }

    // ─── paths ──────────────────────────────────────────────────

    #[test]
    fn test_target_summary_path() {
        assert_eq!(
            target_summary_path(Path::new("tests/results"), "ollama", "llama3.2:latest"),
            PathBuf::from("tests/results/ollama/llama3.2_latest/summary.json")
        );
        assert_eq!(sanitize_model("org/model v2"), "org_model_v2");
    }
}
