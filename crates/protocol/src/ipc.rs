//! Inter-process communication protocol.
//!
//! This module defines the message types exchanged between a host (the CLI
//! or a browser UI) and the orchestration core.
//!
//! The protocol follows an Operation/Event pattern:
//! - `Op`: Commands sent from the host to the core
//! - `Event`: Progress and status updates sent from the core to the host
//!
//! Communication is asynchronous and channel-based. The host is merely one
//! consumer of the event stream; nothing in the core depends on how events
//! are rendered.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

use crate::run_models::{RunMode, RunStatus, StepResult};

/// Operations sent from the host to the core.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "submitPrompt",
///   "payload": { "prompt": "write a fibonacci function" }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Op {
    /// Start a new run for a prompt, superseding any active run.
    SubmitPrompt { prompt: String },

    /// Replay a list of prompts, optionally forever.
    StartAutomation {
        prompts: Vec<String>,
        infinite_loop: bool,
    },

    /// Stop the automation loop before its next dispatch.
    StopAutomation,

    /// Stop the active run before its next step.
    CancelRun,

    /// Rate the most recently completed run (0-10).
    SubmitValidationScore { score: u8 },

    SetAutoDebug { enabled: bool },

    SetThinkingMode { enabled: bool },

    /// Run a debug pass over the given code, or the last run's code.
    RequestDebug { code: Option<String> },

    /// Cancel everything and stop handling operations.
    Shutdown,
}

/// Events sent from the core to the host.
///
/// Uses tagged enum serialization for TypeScript compatibility:
/// ```json
/// {
///   "type": "runStatusUpdate",
///   "payload": {
///     "run_id": "uuid-here",
///     "status": "GENERATING",
///     "step_index": 1,
///     "total_steps": 3
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, TS)]
#[serde(tag = "type", content = "payload", rename_all = "camelCase")]
pub enum Event {
    /// A new run has been created.
    RunStarted {
        #[ts(type = "string")]
        run_id: Uuid,
        prompt: String,
        mode: RunMode,
    },

    /// A run's status or step counter changed.
    RunStatusUpdate {
        #[ts(type = "string")]
        run_id: Uuid,
        status: RunStatus,
        step_index: usize,
        total_steps: usize,
    },

    /// The step planner settled on a budget.
    PlanEstimated {
        #[ts(type = "string")]
        run_id: Uuid,
        token_limit: u32,
        steps: usize,
    },

    /// A simple-mode step finished.
    StepCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        step: StepResult,
        accumulated_code: String,
    },

    /// Structured workflow: chat stage finished.
    ChatResponse {
        #[ts(type = "string")]
        run_id: Uuid,
        response: String,
    },

    /// Structured workflow: think stage finished with a step count.
    ThinkResponse {
        #[ts(type = "string")]
        run_id: Uuid,
        response: String,
        steps: usize,
    },

    /// Structured workflow: one code phase finished (`step` is 1-based).
    CodeResponse {
        #[ts(type = "string")]
        run_id: Uuid,
        response: String,
        code: Option<String>,
        step: usize,
        total_steps: usize,
    },

    /// A debug pass finished.
    DebugResponse {
        #[ts(type = "string")]
        run_id: Uuid,
        response: String,
        code: Option<String>,
    },

    /// A line for the conversation log.
    ConversationMessage {
        #[ts(type = "string")]
        run_id: Uuid,
        role: MessageRole,
        content: String,
    },

    /// Generated code matched one or more unsafe patterns.
    SecurityWarning {
        #[ts(type = "string")]
        run_id: Uuid,
        warnings: Vec<String>,
    },

    /// A run finished; `final_code` is null when no code was produced.
    RunCompleted {
        #[ts(type = "string")]
        run_id: Uuid,
        final_code: Option<String>,
    },

    /// A run halted on an error. Partial results stay on the run.
    RunError {
        #[ts(type = "string")]
        run_id: Uuid,
        error: String,
    },

    /// A run stopped because of cancellation or supersession.
    RunCancelled {
        #[ts(type = "string")]
        run_id: Uuid,
    },

    /// The automation runner dispatched a prompt (`iteration` is 1-based).
    AutomationDispatched { prompt: String, iteration: usize },

    /// The automation runner exited.
    AutomationStopped { dispatched: usize },
}

/// Author of a conversation log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}
