//! Simple multi-step mode: plan, generate in N steps, optionally debug.

use super::{Orchestrator, OrchestratorSettings};
use crate::merge::merge_code;
use crate::planner;
use crate::prompts;
use crate::state::run::{
    cancel_run, complete_run, fail_run, post_message, set_current_step, set_total_steps,
    transition,
};
use crate::transport::ChatMode;
use crate::vector;
use cf_protocol::config_models::ModuleId;
use cf_protocol::ipc::{Event, MessageRole};
use cf_protocol::run_models::{Run, RunStatus, StepRole};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

impl Orchestrator {
    pub(super) async fn run_simple(
        &self,
        run: &mut Run,
        settings: &OrchestratorSettings,
        cancel: &CancellationToken,
        events_tx: &Sender<Event>,
    ) {
        transition(run, RunStatus::AwaitingPlan, events_tx).await;
        if cancel.is_cancelled() {
            cancel_run(run, events_tx).await;
            return;
        }

        let estimate = planner::estimate_steps(
            self.transport.as_ref(),
            &run.initial_prompt,
            &settings.session_id,
        )
        .await;
        run.token_limit = Some(estimate.token_limit);
        set_total_steps(run, estimate.steps);
        tracing::info!(
            run_id = %run.id,
            token_limit = estimate.token_limit,
            steps = run.total_steps,
            "plan estimated"
        );
        let _ = events_tx
            .send(Event::PlanEstimated {
                run_id: run.id,
                token_limit: estimate.token_limit,
                steps: run.total_steps,
            })
            .await;

        let mode = if settings.thinking_mode {
            ChatMode::Think
        } else {
            ChatMode::Chat
        };

        for step_index in 0..run.total_steps {
            if cancel.is_cancelled() {
                cancel_run(run, events_tx).await;
                return;
            }
            set_current_step(run, step_index);
            transition(run, RunStatus::Generating, events_tx).await;

            let message = self.step_message(run, step_index, settings, events_tx).await;
            tracing::debug!(run_id = %run.id, step = step_index, "dispatching generation step");

            let parsed = match self.call(message, mode, settings).await {
                Ok(parsed) => parsed,
                Err(e) => {
                    fail_run(run, events_tx, e.to_string()).await;
                    return;
                }
            };

            if let Some(code) = &parsed.code {
                run.accumulated_code = if step_index == 0 || settings.auto_debug {
                    code.clone()
                } else {
                    merge_code(&run.accumulated_code, code)
                };
                self.scan(run, code, events_tx).await;
            }
            self.push_step(run, StepRole::Code, &parsed, events_tx).await;
            post_message(run, events_tx, MessageRole::Assistant, parsed.response).await;
        }
        run.multi_step_complete = true;

        let mut final_code = (!run.accumulated_code.is_empty()).then(|| run.accumulated_code.clone());

        if settings.auto_debug && settings.debug_allowed() && final_code.is_some() {
            if cancel.is_cancelled() {
                cancel_run(run, events_tx).await;
                return;
            }
            transition(run, RunStatus::Debugging, events_tx).await;
            post_message(
                run,
                events_tx,
                MessageRole::Assistant,
                "Debugging the final completed code...".to_string(),
            )
            .await;

            let message = prompts::with_system_prompt(
                settings.system_prompt.as_deref(),
                &prompts::final_debug_prompt(&run.accumulated_code),
            );
            match self.call(message, ChatMode::Debug, settings).await {
                Ok(parsed) => {
                    run.debugged = true;
                    self.report_debug(run, &parsed, events_tx).await;
                    if parsed.code.is_some() {
                        final_code = parsed.code;
                    }
                }
                Err(e) => {
                    fail_run(run, events_tx, e.to_string()).await;
                    return;
                }
            }
        }

        complete_run(run, final_code, events_tx).await;
    }

    /// Build the message for generation step `step_index`.
    ///
    /// Step 0 carries the raw prompt and, when enabled, vector search examples.
    /// Later steps carry the continuation prompt with the code so far.
    async fn step_message(
        &self,
        run: &Run,
        step_index: usize,
        settings: &OrchestratorSettings,
        events_tx: &Sender<Event>,
    ) -> String {
        let body = if step_index == 0 {
            run.initial_prompt.clone()
        } else {
            prompts::continuation_prompt(
                &run.initial_prompt,
                step_index,
                run.total_steps,
                &run.accumulated_code,
            )
        };

        let mut message = prompts::with_system_prompt(settings.system_prompt.as_deref(), &body);
        if settings.thinking_mode {
            message = prompts::think_preamble(&message);
        }

        if step_index == 0 && settings.module_enabled(ModuleId::Vector) {
            if let Some(searcher) = &self.searcher {
                let hits = vector::search_or_empty(searcher.as_ref(), &message).await;
                if !hits.is_empty() {
                    post_message(
                        run,
                        events_tx,
                        MessageRole::Assistant,
                        "Searching vector database for relevant code examples...".to_string(),
                    )
                    .await;
                    message = prompts::with_examples(&message, &hits);
                }
            }
        }

        message
    }
}
