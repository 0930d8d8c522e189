//! Run and session state.
//!
//! This module provides:
//! - Run state machine functions that emit status events
//! - SessionManager for coordinating runs, automation and toggles

pub mod error;
pub mod manager;
pub mod run;

pub use error::{SessionError, SessionResult};
pub use manager::SessionManager;
