//! Error types for session operations.

use crate::engine::OrchestratorError;
use crate::store::StoreError;
use thiserror::Error;

/// Result type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Errors returned by [`SessionManager`](super::SessionManager) operations.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("Prompt is empty")]
    EmptyPrompt,

    #[error("Automation has no prompts")]
    NoPrompts,

    #[error("Validation score must be between 0 and 10, got {0}")]
    InvalidScore(u8),

    #[error("No completed run to rate")]
    NothingToRate,

    #[error(transparent)]
    Orchestrator(#[from] OrchestratorError),

    #[error(transparent)]
    Store(#[from] StoreError),
}
