//! Terminal rendering of core events.

use cf_protocol::ipc::{Event, MessageRole};
use colored::Colorize;

/// Render one event as terminal lines, or `None` for events not worth a line.
pub fn format_event(event: &Event) -> Option<String> {
    let line = match event {
        Event::RunStarted { run_id, mode, .. } => {
            format!("{} run {run_id} ({mode:?})", "▶".bold())
        }
        Event::RunStatusUpdate {
            status,
            step_index,
            total_steps,
            ..
        } => format!("  [{status:?}] step {}/{total_steps}", step_index + 1)
            .dimmed()
            .to_string(),
        Event::PlanEstimated {
            token_limit, steps, ..
        } => format!("  plan: {steps} step(s), {token_limit} tokens").cyan().to_string(),
        Event::StepCompleted { step, .. } => format!(
            "  step {} done ({} code chunk(s))",
            step.step_index + 1,
            step.code_chunks.len()
        )
        .dimmed()
        .to_string(),
        Event::ConversationMessage { role, content, .. } => match role {
            MessageRole::User => format!("{} {content}", "you:".green().bold()),
            MessageRole::Assistant => format!("{} {content}", "assistant:".blue().bold()),
        },
        Event::ChatResponse { .. } => return None,
        Event::ThinkResponse {
            response, steps, ..
        } => format!("{} ({steps} phases)\n{response}", "analysis:".magenta().bold()),
        Event::CodeResponse {
            response,
            step,
            total_steps,
            ..
        } => format!("{} {step}/{total_steps}\n{response}", "phase".blue().bold()),
        Event::DebugResponse { response, .. } => {
            format!("{}\n{response}", "debug:".magenta().bold())
        }
        Event::SecurityWarning { warnings, .. } => warnings
            .iter()
            .map(|w| format!("{} {w}", "warning:".yellow().bold()))
            .collect::<Vec<_>>()
            .join("\n"),
        Event::RunCompleted { final_code, .. } => match final_code {
            Some(code) => format!("{}\n{code}", "✔ final code".green().bold()),
            None => format!("{}", "✔ done (no code produced)".green().bold()),
        },
        Event::RunError { error, .. } => format!("{} {error}", "✘ error:".red().bold()),
        Event::RunCancelled { .. } => "■ cancelled".yellow().to_string(),
        Event::AutomationDispatched { prompt, iteration } => {
            format!("{} #{iteration}: {prompt}", "automation".cyan().bold())
        }
        Event::AutomationStopped { dispatched } => format!(
            "{} after {dispatched} prompt(s)",
            "automation stopped".cyan().bold()
        ),
    };
    Some(line)
}
