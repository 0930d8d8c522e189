//! Initialization module for creating `.codeflow` directory structures.
//!
//! This module provides functionality to initialize a new codeflow project
//! by generating a `.codeflow/` directory with pre-configured templates for:
//! - Global configuration (`config.toml`)
//! - System prompts (`prompts/*.md`)
//! - Automations (`automations/*.yaml`)
//!
//! # Example
//!
//! ```no_run
//! use cf_core::init::{InitOptions, generate_codeflow_structure};
//! use std::path::PathBuf;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let options = InitOptions {
//!     target_dir: PathBuf::from("."),
//!     force: false,
//!     minimal: false,
//! };
//!
//! generate_codeflow_structure(options).await?;
//! # Ok(())
//! # }
//! ```

pub mod error;
pub mod generator;
pub mod templates;

pub use error::{InitError, InitResult};
pub use generator::{generate_codeflow_structure, InitOptions};
pub use templates::{get_template, list_templates};
