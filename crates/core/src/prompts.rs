//! Prompt templates used by the orchestrator.
//!
//! Every message sent to a provider is assembled here so the wording lives in
//! one place.

use crate::vector::SearchHit;

/// Built-in system prompts, always available and never deletable.
pub const DEFAULT_PROMPTS: &[(&str, &str)] = &[
    (
        "default",
        "You are an AI assistant specialized in helping with coding tasks. Provide clear, concise, and helpful responses. Follow SOLID principles and design patterns. Consider performance, security, and maintainability in your solutions.",
    ),
    (
        "javascript",
        "You are a JavaScript expert. Provide modern, efficient JavaScript code with ES6+ features. Include explanations for complex parts.",
    ),
    (
        "python",
        "You are a Python expert. Provide Pythonic code following PEP 8 guidelines. Focus on readability and best practices.",
    ),
    (
        "react",
        "You are a React expert. Provide functional components with hooks. Follow React best practices and patterns.",
    ),
    (
        "debugging",
        "You are a debugging expert. Analyze code carefully, identify issues, and suggest fixes with explanations.",
    ),
];

/// Name of the system prompt used when none has been selected.
pub const DEFAULT_PROMPT_NAME: &str = "default";

pub fn default_prompt(name: &str) -> Option<&'static str> {
    DEFAULT_PROMPTS
        .iter()
        .find(|(prompt_name, _)| *prompt_name == name)
        .map(|(_, text)| *text)
}

const THINK_PREAMBLE: &str = "Think step by step about this problem. Break down the request into logical phases based on token limits. Each phase should use approximately 75% of the available tokens. Explain your reasoning process for each phase and how they connect:";

/// Meta prompt asking the provider for a token limit and step count.
pub fn planner_prompt(prompt: &str) -> String {
    format!(
        "I need to complete the following task: \"{prompt}\". What is the token limit for this request and how many steps would you recommend to complete it? Please respond in JSON format with \"tokenLimit\" and \"steps\" fields."
    )
}

/// Prefix `body` with the selected system prompt, if any.
pub fn with_system_prompt(system_prompt: Option<&str>, body: &str) -> String {
    match system_prompt.map(str::trim) {
        Some(system) if !system.is_empty() => format!("{system}\n\n{body}"),
        _ => body.to_string(),
    }
}

/// Prefix `body` with the thinking-mode instructions.
pub fn think_preamble(body: &str) -> String {
    format!("{THINK_PREAMBLE}\n\n{body}")
}

/// Append vector search hits as numbered examples. Empty hits leave `body` unchanged.
pub fn with_examples(body: &str, hits: &[SearchHit]) -> String {
    if hits.is_empty() {
        return body.to_string();
    }
    let examples = hits
        .iter()
        .enumerate()
        .map(|(i, hit)| {
            format!(
                "Example {} (similarity: {}):\n{}",
                i + 1,
                hit.similarity,
                hit.content
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n");
    format!("{body}\n\nHere are some relevant code examples that might help:\n\n{examples}")
}

/// Prompt for a continuation step of a simple multi-step run.
///
/// `step_index` is zero-based; the text shows it one-based.
pub fn continuation_prompt(prompt: &str, step_index: usize, total_steps: usize, code: &str) -> String {
    format!(
        "Continue implementing the solution for: \"{prompt}\". This is step {} of {total_steps}. Here's what we have so far:\n\n{code}\n\nPlease add the next part without repeating the existing code.",
        step_index + 1
    )
}

/// Prompt for the auto-debug pass over the finished code.
pub fn final_debug_prompt(code: &str) -> String {
    format!("Debug this final code and explain any potential issues or improvements:\n\n{code}")
}

/// Prompt for a user-requested debug of a snippet.
pub fn snippet_debug_prompt(code: &str) -> String {
    format!(
        "Please debug the following code:\n\n{code}\n\nAnalyze for issues, potential bugs, and suggest improvements while maintaining the existing system structure."
    )
}

/// Structured workflow: decomposition request.
pub fn workflow_think_prompt(prompt: &str) -> String {
    format!("{prompt}\n\nThink about this request and break it down into logical steps based on token limits.")
}

/// Structured workflow: code phase `phase` (one-based).
pub fn workflow_code_prompt(prompt: &str, analysis: &str, phase: usize, code_so_far: &str) -> String {
    if phase <= 1 {
        format!("{prompt}\n\nBased on the analysis: {analysis}\n\nImplement only the first phase of this request.")
    } else {
        format!(
            "{prompt}\n\nBased on the analysis: {analysis}\n\nHere's what we have so far:\n\n{code_so_far}\n\nNow implement phase {phase} of the request."
        )
    }
}

/// Structured workflow: final debug over the accumulated code.
pub fn workflow_debug_prompt(code: &str) -> String {
    format!("Debug this final code while maintaining the existing system structure:\n\n{code}")
}
