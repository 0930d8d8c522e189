//! Run state machine implementation.
//!
//! This module provides functions for managing the lifecycle of a Run,
//! including status transitions and event emission. Every mutation that the
//! host should see goes through one of these functions.

use cf_protocol::ipc::{Event, MessageRole};
use cf_protocol::run_models::{Run, RunMode, RunStatus, StepResult};
use chrono::Utc;
use tokio::sync::mpsc::Sender;
use uuid::Uuid;

/// Create a new Run with Idle status and a single planned step.
///
/// # Arguments
///
/// * `prompt` - The prompt exactly as the user submitted it
/// * `mode` - How the run sequences its model calls
pub fn create_run(prompt: String, mode: RunMode) -> Run {
    Run {
        id: Uuid::new_v4(),
        initial_prompt: prompt,
        mode,
        total_steps: 1,
        current_step: 0,
        accumulated_code: String::new(),
        status: RunStatus::Idle,
        validation_score: None,
        debugged: false,
        multi_step_complete: false,
        token_limit: None,
        steps: Vec::new(),
        final_code: None,
        error: None,
        started_at: Utc::now(),
        completed_at: None,
    }
}

/// Announce the run and log the user's prompt to the conversation.
///
/// # Arguments
///
/// * `run` - The freshly created run
/// * `events_tx` - Channel to send events
pub async fn announce_run(run: &Run, events_tx: &Sender<Event>) {
    let _ = events_tx
        .send(Event::RunStarted {
            run_id: run.id,
            prompt: run.initial_prompt.clone(),
            mode: run.mode,
        })
        .await;
    post_message(run, events_tx, MessageRole::User, run.initial_prompt.clone()).await;
}

/// Move the run to `status` and emit a status update.
///
/// Transitions that would move backwards or leave a terminal status are
/// ignored and logged.
///
/// # Returns
///
/// `true` if the status was applied.
pub async fn transition(run: &mut Run, status: RunStatus, events_tx: &Sender<Event>) -> bool {
    if !run.status.can_transition_to(status) {
        tracing::warn!(
            run_id = %run.id,
            from = ?run.status,
            to = ?status,
            "ignoring invalid run status transition"
        );
        return false;
    }
    run.status = status;
    let _ = events_tx
        .send(Event::RunStatusUpdate {
            run_id: run.id,
            status: run.status,
            step_index: run.current_step,
            total_steps: run.total_steps,
        })
        .await;
    true
}

/// Set the number of planned steps, keeping `current_step` within range.
pub fn set_total_steps(run: &mut Run, total_steps: usize) {
    run.total_steps = total_steps.max(1);
    run.current_step = run.current_step.min(run.total_steps);
}

/// Point the run at the step with zero-based `step_index`.
pub fn set_current_step(run: &mut Run, step_index: usize) {
    run.current_step = step_index.min(run.total_steps);
}

/// Append a step result to the run and emit it with the current code.
///
/// # Arguments
///
/// * `run` - The run that produced the step
/// * `step` - The immutable step output
/// * `events_tx` - Channel to send the step event
pub async fn record_step(run: &mut Run, step: StepResult, events_tx: &Sender<Event>) {
    run.steps.push(step.clone());
    let _ = events_tx
        .send(Event::StepCompleted {
            run_id: run.id,
            step,
            accumulated_code: run.accumulated_code.clone(),
        })
        .await;
}

/// Post a line to the conversation log.
pub async fn post_message(run: &Run, events_tx: &Sender<Event>, role: MessageRole, content: String) {
    let _ = events_tx
        .send(Event::ConversationMessage {
            run_id: run.id,
            role,
            content,
        })
        .await;
}

/// Mark the run as complete and emit the completion event.
///
/// # Arguments
///
/// * `run` - The run to complete
/// * `final_code` - The code handed to the host, or `None`
/// * `events_tx` - Channel to send completion events
pub async fn complete_run(run: &mut Run, final_code: Option<String>, events_tx: &Sender<Event>) {
    if !transition(run, RunStatus::Complete, events_tx).await {
        return;
    }
    run.final_code = final_code.clone();
    run.completed_at = Some(Utc::now());
    tracing::info!(run_id = %run.id, steps = run.steps.len(), "run complete");
    let _ = events_tx
        .send(Event::RunCompleted {
            run_id: run.id,
            final_code,
        })
        .await;
}

/// Mark the run as failed and emit error events.
///
/// Partial results (steps and accumulated code) stay on the run.
///
/// # Arguments
///
/// * `run` - The run to fail
/// * `events_tx` - Channel to send error events
/// * `error` - Message describing the failure
pub async fn fail_run(run: &mut Run, events_tx: &Sender<Event>, error: String) {
    if !transition(run, RunStatus::Error, events_tx).await {
        return;
    }
    tracing::error!(run_id = %run.id, step = run.current_step, error = %error, "run failed");
    run.error = Some(error.clone());
    run.completed_at = Some(Utc::now());
    let _ = events_tx
        .send(Event::RunError {
            run_id: run.id,
            error: error.clone(),
        })
        .await;
    post_message(run, events_tx, MessageRole::Assistant, format!("Error: {error}")).await;
}

/// Mark the run as cancelled and emit the cancellation event.
pub async fn cancel_run(run: &mut Run, events_tx: &Sender<Event>) {
    if !transition(run, RunStatus::Cancelled, events_tx).await {
        return;
    }
    tracing::info!(run_id = %run.id, step = run.current_step, "run cancelled");
    run.completed_at = Some(Utc::now());
    let _ = events_tx.send(Event::RunCancelled { run_id: run.id }).await;
}
