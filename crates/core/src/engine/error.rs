use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OrchestratorError {
    #[error("A run is already in progress")]
    Busy,

    #[error("Nothing to debug: no code was provided and the last run produced none")]
    NothingToDebug,
}
