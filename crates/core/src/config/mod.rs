//! Configuration loading and management.
//!
//! This module provides functionality to load and parse all configuration files
//! from the `.codeflow/` directory structure, and to validate provider settings.

pub mod error;
pub mod loader;
pub mod models;
pub mod validate;
