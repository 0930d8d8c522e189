//! # cf-core
//!
//! Core orchestration engine for codeflow.
//!
//! This crate provides:
//! - Configuration loading from `.codeflow/` directory
//! - A transport abstraction with retry and an HTTP implementation
//! - Model reply parsing, step planning and code merging
//! - The workflow orchestrator and automation runner
//! - Session state and persistence
//!
//! ## Modules
//!
//! - [`config`]: Configuration loading and validation
//! - [`transport`]: Model provider calls
//! - [`engine`]: Workflow orchestration
//! - [`state`]: Run state machine and session management
//! - [`store`]: Key/value persistence

pub mod catalog;
pub mod config;
pub mod engine;
pub mod init;
pub mod merge;
pub mod parser;
pub mod planner;
pub mod prompts;
pub mod security;
pub mod state;
pub mod store;
pub mod transport;
pub mod vector;
