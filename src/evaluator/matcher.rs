// src/evaluator/matcher.rs — Mechanical expectation matching
//
// A response is checked against an ordered list of independent rules; the
// first violated rule decides the failure reason. No model is involved.

use regex::RegexBuilder;
use serde::{Deserialize, Deserializer, Serialize};

/// Below this many (trimmed) characters a response counts as empty.
pub const MIN_RESPONSE_CHARS: usize = 10;

/// Expectation rule-set attached to a test case.
///
/// Every key is optional; unknown keys (e.g. `focus` hints meant for the
/// judge) are ignored. List-valued keys also accept a single string.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpectationRules {
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub excludes: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub does_not_contain: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub includes: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub contains_any: Vec<String>,
    #[serde(default, deserialize_with = "one_or_many", skip_serializing_if = "Vec::is_empty")]
    pub regex: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<usize>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<usize>,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SingleOrList {
    Single(String),
    List(Vec<String>),
}

fn one_or_many<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Option::<SingleOrList>::deserialize(deserializer)? {
        None => Vec::new(),
        Some(SingleOrList::Single(s)) => vec![s],
        Some(SingleOrList::List(v)) => v,
    })
}

impl ExpectationRules {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    /// `excludes` and its legacy spelling `does_not_contain`.
    fn forbidden(&self) -> impl Iterator<Item = &String> {
        self.excludes.iter().chain(self.does_not_contain.iter())
    }
}

/// Result of matching one response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatchOutcome {
    pub passed: bool,
    /// Empty when passed.
    pub reason: String,
}

impl MatchOutcome {
    pub fn pass() -> Self {
        Self {
            passed: true,
            reason: String::new(),
        }
    }

    pub fn fail(reason: impl Into<String>) -> Self {
        Self {
            passed: false,
            reason: reason.into(),
        }
    }
}

type Check = fn(&str, &ExpectationRules) -> Option<String>;

/// Evaluation order. Short-circuits on the first violation. Brevity applies
/// to every response, rules or not.
const CHECKS: [Check; 6] = [
    check_excludes,
    check_includes,
    check_contains_any,
    check_regex,
    check_length,
    check_brevity,
];

/// Match a response against a rule-set. Pure and deterministic.
pub fn evaluate(response: &str, rules: &ExpectationRules) -> MatchOutcome {
    CHECKS
        .iter()
        .find_map(|check| check(response, rules))
        .map(MatchOutcome::fail)
        .unwrap_or_else(MatchOutcome::pass)
}

fn check_excludes(response: &str, rules: &ExpectationRules) -> Option<String> {
    let lower = response.to_lowercase();
    rules
        .forbidden()
        .find(|term| lower.contains(&term.to_lowercase()))
        .map(|term| format!("Response contains forbidden term '{}'", term))
}

fn check_includes(response: &str, rules: &ExpectationRules) -> Option<String> {
    let lower = response.to_lowercase();
    rules
        .includes
        .iter()
        .find(|term| !lower.contains(&term.to_lowercase()))
        .map(|term| format!("Response missing required term '{}'", term))
}

fn check_contains_any(response: &str, rules: &ExpectationRules) -> Option<String> {
    if rules.contains_any.is_empty() {
        return None;
    }
    let lower = response.to_lowercase();
    if rules
        .contains_any
        .iter()
        .any(|term| lower.contains(&term.to_lowercase()))
    {
        None
    } else {
        Some(format!(
            "Response contains none of: {}",
            rules.contains_any.join(", ")
        ))
    }
}

fn check_regex(response: &str, rules: &ExpectationRules) -> Option<String> {
    for pattern in &rules.regex {
        let re = match RegexBuilder::new(pattern)
            .case_insensitive(true)
            .multi_line(true)
            .dot_matches_new_line(true)
            .build()
        {
            Ok(re) => re,
            Err(e) => return Some(format!("Invalid regex pattern '{}': {}", pattern, e)),
        };
        if !re.is_match(response) {
            return Some(format!("Response does not match pattern '{}'", pattern));
        }
    }
    None
}

fn check_length(response: &str, rules: &ExpectationRules) -> Option<String> {
    let len = response.chars().count();

    if let Some(min) = rules.min_length {
        if len < min {
            let trimmed = response.trim().chars().count();
            return Some(if trimmed < MIN_RESPONSE_CHARS {
                format!(
                    "Response too brief or empty ({} chars, minimum {})",
                    len, min
                )
            } else {
                format!("Response too short ({} chars, minimum {})", len, min)
            });
        }
    }

    if let Some(max) = rules.max_length {
        if len > max {
            return Some(format!("Response too long ({} chars, maximum {})", len, max));
        }
    }

    None
}

fn check_brevity(response: &str, _rules: &ExpectationRules) -> Option<String> {
    let trimmed = response.trim().chars().count();
    (trimmed < MIN_RESPONSE_CHARS).then(|| {
        format!(
            "Response too brief or empty ({} chars, minimum {})",
            trimmed, MIN_RESPONSE_CHARS
        )
    })
}
