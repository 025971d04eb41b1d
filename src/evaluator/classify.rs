// src/evaluator/classify.rs — Ratings and the improvement verdict

use serde::{Deserialize, Serialize};

use super::types::{Choice, EvaluationResult};

/// Coarse quality bucket. Ordered from worst to best.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Rating {
    Vague,
    Regular,
    Good,
    Outstanding,
}

impl Rating {
    /// 0-24 vague, 25-49 regular, 50-74 good, 75-100 outstanding.
    pub fn for_rate(pass_rate: u8) -> Self {
        match pass_rate {
            0..=24 => Rating::Vague,
            25..=49 => Rating::Regular,
            50..=74 => Rating::Good,
            _ => Rating::Outstanding,
        }
    }

    /// One bucket lower, floored at `Vague`.
    pub fn down(self) -> Self {
        match self {
            Rating::Vague | Rating::Regular => Rating::Vague,
            Rating::Good => Rating::Regular,
            Rating::Outstanding => Rating::Good,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Rating::Vague => "vague",
            Rating::Regular => "regular",
            Rating::Good => "good",
            Rating::Outstanding => "outstanding",
        }
    }
}

impl std::fmt::Display for Rating {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Improvement {
    Yes,
    No,
    Neutral,
}

impl Improvement {
    pub fn as_str(&self) -> &'static str {
        match self {
            Improvement::Yes => "yes",
            Improvement::No => "no",
            Improvement::Neutral => "neutral",
        }
    }
}

impl std::fmt::Display for Improvement {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// (baseline, skill) ratings after reconciling with the judge.
///
/// When the judge names a strict overall winner, the loser must rate strictly
/// below the winner: if the mechanical ratings tie or invert, the loser drops
/// to one bucket under the winner (never below `Vague`).
pub fn adjusted_ratings(result: &EvaluationResult) -> (Rating, Rating) {
    let baseline = Rating::for_rate(result.baseline_pass_rate());
    let skill = Rating::for_rate(result.skill_pass_rate());

    match result.judgment.as_ref().map(|j| j.overall_better) {
        Some(Choice::B) if baseline >= skill => (skill.down(), skill),
        Some(Choice::A) if skill >= baseline => (baseline, baseline.down()),
        _ => (baseline, skill),
    }
}

/// Judge verdict when there is one, else the sign of the pass-rate delta.
pub fn improvement(result: &EvaluationResult) -> Improvement {
    match result.judgment.as_ref().map(|j| j.overall_better) {
        Some(Choice::B) => Improvement::Yes,
        Some(Choice::A) => Improvement::No,
        Some(Choice::Equal) => Improvement::Neutral,
        None => match result.improvement() {
            d if d > 0 => Improvement::Yes,
            d if d < 0 => Improvement::No,
            _ => Improvement::Neutral,
        },
    }
}

/// Run-level gate: judged skills must win outright; unjudged skills must
/// reach `threshold` percent with the skill applied. A result with no tests
/// is never accepted.
pub fn accepts(result: &EvaluationResult, threshold: u8) -> bool {
    if result.skill_results.is_empty() {
        return false;
    }
    match result.judgment {
        Some(_) => improvement(result) == Improvement::Yes,
        None => result.skill_pass_rate() >= threshold,
    }
}
