//! Structured workflow mode: chat, think, code x N, debug.

use super::{Orchestrator, OrchestratorSettings};
use crate::parser::ParsedResponse;
use crate::planner::parse_step_count;
use crate::prompts;
use crate::state::run::{
    cancel_run, complete_run, fail_run, post_message, set_current_step, set_total_steps,
    transition,
};
use crate::transport::ChatMode;
use cf_protocol::ipc::{Event, MessageRole};
use cf_protocol::run_models::{Run, RunStatus, StepRole};
use tokio::sync::mpsc::Sender;
use tokio_util::sync::CancellationToken;

impl Orchestrator {
    pub(super) async fn run_structured(
        &self,
        run: &mut Run,
        settings: &OrchestratorSettings,
        cancel: &CancellationToken,
        events_tx: &Sender<Event>,
    ) {
        let prompt = run.initial_prompt.clone();

        // Chat
        let Some(chat) = self
            .stage(
                run,
                RunStatus::Chatting,
                prompts::with_system_prompt(settings.system_prompt.as_deref(), &prompt),
                ChatMode::Chat,
                settings,
                cancel,
                events_tx,
            )
            .await
        else {
            return;
        };
        self.push_step(run, StepRole::Chat, &chat, events_tx).await;
        let _ = events_tx
            .send(Event::ChatResponse {
                run_id: run.id,
                response: chat.response.clone(),
            })
            .await;
        post_message(run, events_tx, MessageRole::Assistant, chat.response).await;

        // Think
        let Some(think) = self
            .stage(
                run,
                RunStatus::Thinking,
                prompts::workflow_think_prompt(&prompt),
                ChatMode::Think,
                settings,
                cancel,
                events_tx,
            )
            .await
        else {
            return;
        };
        let total_steps = parse_step_count(&think.response);
        set_total_steps(run, total_steps);
        tracing::info!(run_id = %run.id, steps = total_steps, "workflow decomposed");
        self.push_step(run, StepRole::Think, &think, events_tx).await;
        let _ = events_tx
            .send(Event::ThinkResponse {
                run_id: run.id,
                response: think.response.clone(),
                steps: total_steps,
            })
            .await;
        let analysis = think.response;

        // Code phases
        for phase in 1..=total_steps {
            set_current_step(run, phase - 1);
            let message =
                prompts::workflow_code_prompt(&prompt, &analysis, phase, &run.accumulated_code);
            let Some(code_reply) = self
                .stage(
                    run,
                    RunStatus::Generating,
                    message,
                    ChatMode::Code,
                    settings,
                    cancel,
                    events_tx,
                )
                .await
            else {
                return;
            };

            if let Some(code) = &code_reply.code {
                if !run.accumulated_code.is_empty() {
                    run.accumulated_code.push_str("\n\n");
                }
                run.accumulated_code.push_str(code);
                self.scan(run, code, events_tx).await;
            }
            self.push_step(run, StepRole::Code, &code_reply, events_tx).await;
            let _ = events_tx
                .send(Event::CodeResponse {
                    run_id: run.id,
                    response: code_reply.response,
                    code: code_reply.code,
                    step: phase,
                    total_steps,
                })
                .await;
        }
        run.multi_step_complete = true;

        if run.accumulated_code.is_empty() {
            complete_run(run, None, events_tx).await;
            return;
        }

        // Debug
        let Some(debug) = self
            .stage(
                run,
                RunStatus::Debugging,
                prompts::workflow_debug_prompt(&run.accumulated_code),
                ChatMode::Debug,
                settings,
                cancel,
                events_tx,
            )
            .await
        else {
            return;
        };
        run.debugged = true;
        let final_code = debug
            .code
            .clone()
            .unwrap_or_else(|| run.accumulated_code.clone());
        self.push_step(run, StepRole::Debug, &debug, events_tx).await;
        if let Some(code) = &debug.code {
            self.scan(run, code, events_tx).await;
        }
        let _ = events_tx
            .send(Event::DebugResponse {
                run_id: run.id,
                response: debug.response,
                code: Some(final_code.clone()),
            })
            .await;

        complete_run(run, Some(final_code), events_tx).await;
    }

    /// Check for cancellation, enter `status` and make one call.
    ///
    /// Returns `None` when the run was cancelled or failed; the run is then
    /// already in its terminal status.
    #[allow(clippy::too_many_arguments)]
    async fn stage(
        &self,
        run: &mut Run,
        status: RunStatus,
        message: String,
        mode: ChatMode,
        settings: &OrchestratorSettings,
        cancel: &CancellationToken,
        events_tx: &Sender<Event>,
    ) -> Option<ParsedResponse> {
        if cancel.is_cancelled() {
            cancel_run(run, events_tx).await;
            return None;
        }
        transition(run, status, events_tx).await;
        tracing::debug!(run_id = %run.id, status = ?status, "dispatching workflow stage");

        match self.call(message, mode, settings).await {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                fail_run(run, events_tx, e.to_string()).await;
                None
            }
        }
    }
}
