//! # cf-protocol
//!
//! Core protocol definitions and data models for codeflow.
//!
//! This crate defines all shared data structures used for:
//! - Configuration file parsing (TOML config, Markdown prompts, YAML automations)
//! - Runtime run state
//! - Communication between a host and the orchestration core
//!
//! ## Modules
//!
//! - [`automation_models`]: Saved automations and the runtime prompt queue
//! - [`config_models`]: Provider, model and module settings
//! - [`run_models`]: Run state, step results and interaction records
//! - [`ipc`]: Operations and Events for host-core communication
//!
//! ## Design Principles
//!
//! - Minimal dependencies: serde, ts-rs, uuid and chrono
//! - TypeScript generation: All types derive `TS` for browser hosts
//! - Independent compilation: No dependencies on other codeflow crates

pub mod automation_models;
pub mod config_models;
pub mod ipc;
pub mod run_models;

// Re-export all public types for convenience
pub use automation_models::*;
pub use config_models::*;
pub use ipc::*;
pub use run_models::*;
