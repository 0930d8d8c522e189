//! Step planning: how many sequential model calls a prompt needs.

use crate::parser;
use crate::prompts;
use crate::transport::{ChatMode, ChatRequest, Transport};
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;

pub const DEFAULT_TOKEN_LIMIT: u32 = 4000;
pub const DEFAULT_STEPS: usize = 1;

/// Phase count used by the structured workflow when the analysis names none.
pub const DEFAULT_WORKFLOW_STEPS: usize = 3;

/// Step counts above this are still honored, but logged as suspicious.
pub const LARGE_STEP_COUNT: usize = 20;

static STEP_COUNT: Lazy<Option<Regex>> = Lazy::new(|| Regex::new(r"(?i)(\d+)\s+steps?").ok());

/// The provider's estimate of the budget and number of steps for a prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepEstimate {
    pub token_limit: u32,
    pub steps: usize,
}

impl Default for StepEstimate {
    fn default() -> Self {
        Self {
            token_limit: DEFAULT_TOKEN_LIMIT,
            steps: DEFAULT_STEPS,
        }
    }
}

/// Ask the provider how to split `prompt`. Never fails: any transport or parse
/// problem yields [`StepEstimate::default`].
pub async fn estimate_steps(transport: &dyn Transport, prompt: &str, session_id: &str) -> StepEstimate {
    let request = ChatRequest::new(prompts::planner_prompt(prompt), ChatMode::Query)
        .with_session(session_id);

    match transport.chat(&request).await {
        Ok(raw) => {
            let body = parser::parse(&raw).response;
            parse_estimate(&body).unwrap_or_else(|| {
                tracing::debug!("planner reply had no usable estimate, using defaults");
                StepEstimate::default()
            })
        }
        Err(e) => {
            tracing::warn!(error = %e, "planner request failed, using default estimate");
            StepEstimate::default()
        }
    }
}

/// Read `{"tokenLimit": N, "steps": M}` from the first balanced object in `text`.
///
/// Both fields must be positive integers.
pub fn parse_estimate(text: &str) -> Option<StepEstimate> {
    let object = first_balanced_object(text)?;
    let value: Value = serde_json::from_str(object).ok()?;

    let token_limit = value
        .get("tokenLimit")
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .and_then(|n| u32::try_from(n).ok())?;
    let steps = value
        .get("steps")
        .and_then(Value::as_u64)
        .filter(|n| *n > 0)
        .and_then(|n| usize::try_from(n).ok())?;
    warn_if_large(steps);

    Some(StepEstimate { token_limit, steps })
}

/// First `<N> step`/`<N> steps` mention in `text`, case-insensitive.
///
/// Zero and counts that do not fit a `usize` fall back to
/// [`DEFAULT_WORKFLOW_STEPS`].
pub fn parse_step_count(text: &str) -> usize {
    let steps = STEP_COUNT
        .as_ref()
        .and_then(|re| re.captures(text))
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse::<usize>().ok())
        .filter(|n| *n > 0)
        .unwrap_or(DEFAULT_WORKFLOW_STEPS);
    warn_if_large(steps);
    steps
}

/// Whether `steps` is above [`LARGE_STEP_COUNT`].
pub fn is_large_step_count(steps: usize) -> bool {
    steps > LARGE_STEP_COUNT
}

fn warn_if_large(steps: usize) {
    if is_large_step_count(steps) {
        tracing::warn!(
            steps,
            limit = LARGE_STEP_COUNT,
            "model asked for an unusually large number of steps"
        );
    }
}

/// The first `{...}` span whose braces balance, ignoring braces inside string literals.
fn first_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, c) in text[start..].char_indices() {
        if in_string {
            if escaped {
                escaped = false;
            } else if c == '\\' {
                escaped = true;
            } else if c == '"' {
                in_string = false;
            }
            continue;
        }
        match c {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=start + offset]);
                }
            }
            _ => {}
        }
    }
    None
}
