//! Runtime run state models.
//!
//! This module defines the structures for tracking the state of a single
//! orchestration run and the step results it accumulates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Lifecycle status of a run.
///
/// Non-terminal statuses progress in declaration order:
/// Idle -> AwaitingPlan -> Chatting -> Thinking -> Generating -> Debugging -> Complete
///
/// A run may skip ahead (a simple run never chats or thinks) but never moves
/// backwards. `Error` and `Cancelled` are absorbing and reachable from any
/// non-terminal status.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RunStatus {
    /// Run has been created but nothing was dispatched yet.
    Idle,

    /// Waiting for the step planner's estimate.
    AwaitingPlan,

    /// Structured workflow: free-form analysis stage.
    Chatting,

    /// Structured workflow: task decomposition stage.
    Thinking,

    /// Code generation steps are being dispatched.
    Generating,

    /// Final debug pass over the accumulated code.
    Debugging,

    /// Run finished successfully.
    Complete,

    /// Run halted on an unrecovered error.
    Error,

    /// Run was stopped by a cancellation request or superseded.
    Cancelled,
}

impl RunStatus {
    /// Position along the forward order, `None` for the absorbing failure states.
    fn rank(self) -> Option<u8> {
        match self {
            RunStatus::Idle => Some(0),
            RunStatus::AwaitingPlan => Some(1),
            RunStatus::Chatting => Some(2),
            RunStatus::Thinking => Some(3),
            RunStatus::Generating => Some(4),
            RunStatus::Debugging => Some(5),
            RunStatus::Complete => Some(6),
            RunStatus::Error | RunStatus::Cancelled => None,
        }
    }

    /// Whether the run can no longer change status.
    pub fn is_terminal(self) -> bool {
        matches!(
            self,
            RunStatus::Complete | RunStatus::Error | RunStatus::Cancelled
        )
    }

    /// Whether moving from `self` to `next` respects the monotonic order.
    ///
    /// Staying in the same non-terminal status is allowed (a run emits
    /// `Generating` once per step).
    pub fn can_transition_to(self, next: RunStatus) -> bool {
        if self.is_terminal() {
            return false;
        }
        match (self.rank(), next.rank()) {
            (_, None) => true,
            (Some(current), Some(target)) => target >= current,
            (None, Some(_)) => false,
        }
    }
}

/// How a run sequences its model calls.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "camelCase")]
pub enum RunMode {
    /// Token-budget driven: plan, then N generation steps, optional debug.
    Simple,

    /// Fixed four-stage workflow: chat, think, code x N, debug.
    Structured,
}

/// Semantic purpose of a single model call within a run.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
pub enum StepRole {
    Chat,
    Think,
    Code,
    Debug,
}

/// Output of one model call within a run. Immutable once produced.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct StepResult {
    /// Zero-based position of this call in the run.
    pub step_index: usize,

    pub role: StepRole,

    /// The message body as returned by the provider.
    pub raw_text: String,

    /// First fenced code span of the reply, if any.
    pub extracted_code: Option<String>,

    /// `extracted_code` split into bounded-size chunks, in order.
    pub code_chunks: Vec<String>,
}

/// Runtime state of one user-initiated orchestration.
///
/// A run is created when a prompt is submitted and mutated only by the
/// orchestrator as each step resolves.
#[derive(Serialize, Deserialize, Debug, Clone, TS)]
pub struct Run {
    #[ts(type = "string")]
    pub id: Uuid,

    /// The prompt exactly as the user submitted it.
    pub initial_prompt: String,

    pub mode: RunMode,

    /// Number of generation steps, always at least 1.
    pub total_steps: usize,

    /// Index of the generation step currently dispatched or last completed.
    ///
    /// Never exceeds `total_steps`.
    pub current_step: usize,

    /// Code produced so far across the run's generation steps.
    pub accumulated_code: String,

    pub status: RunStatus,

    /// Optional user rating (0-10) of the run's output.
    pub validation_score: Option<u8>,

    /// Whether a debug pass ran over this run's code.
    pub debugged: bool,

    /// Set once the last planned generation step succeeded.
    pub multi_step_complete: bool,

    /// Token budget reported by the step planner (simple mode only).
    pub token_limit: Option<u32>,

    /// Every step result appended in dispatch order.
    pub steps: Vec<StepResult>,

    /// The code handed to the completion event, if any.
    pub final_code: Option<String>,

    /// Error message when `status` is `Error`.
    pub error: Option<String>,

    #[ts(type = "string")]
    pub started_at: DateTime<Utc>,

    #[ts(type = "string | null")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Run {
    /// Code to show for this run: the final code if set, else whatever accumulated.
    pub fn visible_code(&self) -> Option<&str> {
        match &self.final_code {
            Some(code) => Some(code.as_str()),
            None if !self.accumulated_code.is_empty() => Some(self.accumulated_code.as_str()),
            None => None,
        }
    }
}

/// One logged prompt/completion pair, kept for exporting rated training data.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct InteractionRecord {
    #[ts(type = "string")]
    pub run_id: Uuid,

    pub prompt: String,

    pub code: Option<String>,

    /// Set once a validation score was submitted.
    pub validated: bool,

    pub validation_score: u8,

    pub debugged: bool,

    #[ts(type = "string")]
    pub timestamp: DateTime<Utc>,
}
