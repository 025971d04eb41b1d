// src/evaluator/retry.rs — Bounded call-and-parse retry
//
// A model call whose answer must parse. On a parse failure the original
// prompt is re-sent with the error appended; a transport failure stops
// immediately. The attempt budget is plain data on `RetryPolicy`.

use std::fmt::Display;

use crate::provider::{CallFailure, ModelBackend, ModelConfig};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, first call included. Zero behaves as one.
    pub max_attempts: u32,
}

impl Default for RetryPolicy {
    /// One call plus one corrective retry.
    fn default() -> Self {
        Self { max_attempts: 2 }
    }
}

impl RetryPolicy {
    pub fn new(max_attempts: u32) -> Self {
        Self { max_attempts }
    }

    fn budget(&self) -> u32 {
        self.max_attempts.max(1)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AttemptOutcome<T, E> {
    Parsed { value: T, attempts: u32 },
    CallFailed { failure: CallFailure, attempts: u32 },
    Exhausted { last_error: E, attempts: u32 },
}

impl<T, E> AttemptOutcome<T, E> {
    pub fn attempts(&self) -> u32 {
        match self {
            AttemptOutcome::Parsed { attempts, .. }
            | AttemptOutcome::CallFailed { attempts, .. }
            | AttemptOutcome::Exhausted { attempts, .. } => *attempts,
        }
    }

    pub fn into_value(self) -> Option<T> {
        match self {
            AttemptOutcome::Parsed { value, .. } => Some(value),
            _ => None,
        }
    }
}

/// The original prompt followed by the parse error and a correction request.
pub fn feedback_prompt(original: &str, error: &impl Display) -> String {
    format!(
        "{}\n\n\
         Your previous response could not be parsed: {}\n\
         Return ONLY the corrected JSON object, with no other text.",
        original, error
    )
}

/// Call `backend` and parse the answer, retrying parse failures up to the
/// policy's budget.
pub async fn call_with_feedback<T, E, F>(
    backend: &dyn ModelBackend,
    config: &ModelConfig,
    prompt: &str,
    policy: RetryPolicy,
    parse: F,
) -> AttemptOutcome<T, E>
where
    F: Fn(&str) -> Result<T, E>,
    E: Display,
{
    let budget = policy.budget();
    let mut next_prompt = prompt.to_string();
    let mut attempts = 0;

    loop {
        attempts += 1;
        let response = match backend.call(&next_prompt, config).await {
            Ok(r) => r,
            Err(failure) => return AttemptOutcome::CallFailed { failure, attempts },
        };

        match parse(&response) {
            Ok(value) => return AttemptOutcome::Parsed { value, attempts },
            Err(e) if attempts >= budget => {
                return AttemptOutcome::Exhausted {
                    last_error: e,
                    attempts,
                }
            }
            Err(e) => {
                tracing::debug!(attempt = attempts, "Parse failed, retrying: {}", e);
                next_prompt = feedback_prompt(prompt, &e);
            }
        }
    }
}
