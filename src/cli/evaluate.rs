// src/cli/evaluate.rs — Multi-target evaluation run
//
// One task per (provider, model) target, bounded by a semaphore. Tasks share
// nothing mutable; their summaries are merged only after every task joins.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tokio::sync::Semaphore;

use crate::evaluator::judge::BlindJudge;
use crate::evaluator::report::{self, EvaluationRecord, RunSummary, SkippedRecord, SUMMARY_FILE};
use crate::evaluator::SkillEvaluator;
use crate::infra::config::{Config, EvaluationConfig};
use crate::infra::errors::SkillBenchError;
use crate::infra::fs::{FileSystem, LocalFileSystem};
use crate::provider::{backend_for, ModelBackend, ModelConfig};
use crate::skills::loader::{discover_skills, filter_skills};
use crate::skills::Skill;

/// A resolved (backend, model) pair to evaluate against.
#[derive(Clone)]
pub struct Target {
    pub backend: Arc<dyn ModelBackend>,
    pub config: ModelConfig,
}

impl Target {
    pub fn label(&self) -> String {
        format!("{}/{}", self.config.provider, self.config.model_name)
    }
}

/// Outcome of one target's run.
pub struct TargetRun {
    pub label: String,
    pub outcome: Result<RunSummary, SkillBenchError>,
}

/// Evaluate the configured targets. Returns `true` when every target ran and
/// every skill passed the acceptance gate.
pub async fn run_evaluate(config: &Config, filters: &[String], print_report: bool) -> anyhow::Result<bool> {
    let fs: Arc<dyn FileSystem> = Arc::new(LocalFileSystem);

    let skills = match select_skills(&config.skills_dir, filters, fs.as_ref()) {
        Ok(skills) => skills,
        Err(e) => {
            eprintln!("{}", e);
            return Ok(false);
        }
    };

    let targets: Vec<Target> = config
        .targets
        .iter()
        .map(|t| Target {
            backend: backend_for(t.provider),
            config: t.model_config(),
        })
        .collect();

    eprintln!(
        "Evaluating {} skill(s) on {} target(s)",
        skills.len(),
        targets.len()
    );

    let runs = evaluate_targets(
        targets,
        Arc::new(skills),
        Arc::clone(&fs),
        &config.evaluation,
        &config.results_dir,
    )
    .await;

    let mut all_ran = true;
    let mut summaries = Vec::new();
    for run in runs {
        match run.outcome {
            Ok(summary) => summaries.push(summary),
            Err(e) => {
                all_ran = false;
                eprintln!("[{}] {}", run.label, e);
            }
        }
    }

    let merged = RunSummary::merge(summaries);
    let summary_path = config.results_dir.join(SUMMARY_FILE);
    match merged.save(&summary_path, fs.as_ref()) {
        Ok(()) => eprintln!("Summary saved to: {}", summary_path.display()),
        Err(e) => eprintln!("Warning: failed to save summary: {}", e),
    }

    if print_report {
        println!("{}", merged.render_console_report());
    }

    let failures = failure_details(&merged);
    if !failures.is_empty() {
        println!("{}", failures);
    }

    Ok(all_ran && merged.all_accepted())
}

/// Discover skills and apply name filters. No skills, or no match, is fatal.
pub fn select_skills(
    skills_dir: &Path,
    filters: &[String],
    fs: &dyn FileSystem,
) -> Result<Vec<Skill>, SkillBenchError> {
    let all = discover_skills(skills_dir, fs);
    if all.is_empty() {
        return Err(SkillBenchError::NoSkills {
            dir: skills_dir.display().to_string(),
        });
    }
    let selected = filter_skills(all, filters);
    if selected.is_empty() {
        return Err(SkillBenchError::SkillNotFound {
            filter: filters.to_vec(),
        });
    }
    Ok(selected)
}

/// Run every target concurrently, at most `settings.max_concurrent` at once.
/// Results come back in target order.
pub async fn evaluate_targets(
    targets: Vec<Target>,
    skills: Arc<Vec<Skill>>,
    fs: Arc<dyn FileSystem>,
    settings: &EvaluationConfig,
    results_dir: &Path,
) -> Vec<TargetRun> {
    let sem = Arc::new(Semaphore::new(settings.max_concurrent.max(1)));
    let mut tasks = Vec::with_capacity(targets.len());

    for target in targets {
        let label = target.label();
        let sem = Arc::clone(&sem);
        let skills = Arc::clone(&skills);
        let fs = Arc::clone(&fs);
        let settings = settings.clone();
        let results_dir = results_dir.to_path_buf();

        let task = tokio::spawn(async move {
            let _permit = sem.acquire_owned().await.ok();
            evaluate_target(target, &skills, fs, &settings, &results_dir).await
        });
        tasks.push((label, task));
    }

    let (labels, handles): (Vec<String>, Vec<_>) = tasks.into_iter().unzip();
    let joined = futures::future::join_all(handles).await;

    labels
        .into_iter()
        .zip(joined)
        .map(|(label, joined)| TargetRun {
            outcome: joined.unwrap_or_else(|e| {
                Err(SkillBenchError::Other(anyhow::anyhow!(
                    "evaluation task for {} panicked: {}",
                    label,
                    e
                )))
            }),
            label,
        })
        .collect()
}

/// Evaluate every skill on one target and write its summary.
async fn evaluate_target(
    target: Target,
    skills: &[Skill],
    fs: Arc<dyn FileSystem>,
    settings: &EvaluationConfig,
    results_dir: &Path,
) -> Result<RunSummary, SkillBenchError> {
    let label = target.label();
    let summary_path = target_summary_path(results_dir, &target.config);
    let evaluator = SkillEvaluator::new(target.backend, target.config, Arc::clone(&fs))
        .with_judge(settings.judge.then(BlindJudge::default));

    evaluator.ensure_available().await?;

    let mut records = Vec::with_capacity(skills.len());
    let mut skipped = Vec::new();
    for skill in skills {
        let result = match evaluator.evaluate(skill).await {
            Ok(result) => result,
            Err(e) if e.is_fatal_for_target() => return Err(e),
            Err(e) => {
                eprintln!("[{}] {}: {}", label, skill.name, e);
                skipped.push(SkippedRecord {
                    skill: skill.name.clone(),
                    model: evaluator.config().model_name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }
        };
        let record = EvaluationRecord::from_result(&result, settings.threshold);
        eprintln!(
            "[{}] {}: baseline {}% | with skill {}% | {:+}%{}",
            label,
            record.skill,
            record.baseline_rate,
            record.skill_rate,
            record.improvement,
            record
                .judgment
                .as_ref()
                .map(|j| format!(" | judge {} ({}/100)", record.verdict, j.score))
                .unwrap_or_default()
        );
        records.push(record);
    }

    let summary = RunSummary::new(records).with_skipped(skipped);
    if let Err(e) = summary.save(&summary_path, fs.as_ref()) {
        tracing::warn!("Failed to save {}: {}", summary_path.display(), e);
    }
    Ok(summary)
}

fn target_summary_path(results_dir: &Path, config: &ModelConfig) -> PathBuf {
    report::target_summary_path(results_dir, config.provider.as_str(), &config.model_name)
}

/// Per-test failure details for every rejected skill. Empty when all passed.
pub fn failure_details(summary: &RunSummary) -> String {
    let rejected: Vec<&EvaluationRecord> = summary.results.iter().filter(|r| !r.accepted).collect();
    if rejected.is_empty() && summary.skipped.is_empty() {
        return String::new();
    }

    let names: Vec<&str> = rejected
        .iter()
        .map(|r| r.skill.as_str())
        .chain(summary.skipped.iter().map(|s| s.skill.as_str()))
        .collect();
    let mut lines = vec![format!(
        "[FAIL] {} skill(s) failed: {}",
        names.len(),
        names.join(", ")
    )];

    for s in &summary.skipped {
        lines.push(String::new());
        lines.push(format!("  {} ({}): not evaluated", s.skill, s.model));
        lines.push(format!("    {}", s.reason));
    }

    for r in rejected {
        lines.push(String::new());
        lines.push(format!("  {} ({}):", r.skill, r.model));
        lines.push(format!("    Baseline: {}% ({} passed)", r.baseline_rate, r.baseline_passed));
        lines.push(format!("    With Skill: {}% ({} passed)", r.skill_rate, r.skill_passed));
        if let Some(j) = &r.judgment {
            lines.push(format!("    Judge: {} (score: {}/100)", j.overall_better, j.score));
            lines.push(format!("    Reasoning: {}", j.reasoning));
        }
        for test in r.results.iter().filter(|t| !t.baseline.pass || !t.skill.pass) {
            lines.push(format!("    Test: {}", test.name));
            if !test.baseline.pass {
                lines.push(format!("      Baseline FAIL: {}", truncate(&test.baseline.failure_reason, 100)));
            }
            if !test.skill.pass {
                lines.push(format!("      Skill FAIL: {}", truncate(&test.skill.failure_reason, 100)));
            }
        }
    }
    lines.join("\n")
}

fn truncate(s: &str, max: usize) -> String {
    s.chars().take(max).collect()
}

/// Print the console report of an existing summary.
pub fn run_report(path: &Path) -> anyhow::Result<()> {
    let summary = RunSummary::load(path, &LocalFileSystem)?;
    println!("{}", summary.render_console_report());
    Ok(())
}
