//! Configuration models that aggregate all settings.
//!
//! This module provides the unified `AppConfig` structure that combines
//! global settings, system prompts and saved automations into a single
//! configuration object.

use cf_protocol::automation_models::Automation;
use cf_protocol::config_models::{GlobalConfig, SystemPrompt};

/// Unified application configuration loaded from `.codeflow/` directory.
///
/// This structure aggregates all configuration sources:
/// - `config.toml`: Global settings
/// - `prompts/*.md`: System prompts
/// - `automations/*.yaml`: Saved automations
///
/// # Example
///
/// ```rust,no_run
/// use cf_core::config::loader::load_config;
/// use std::path::Path;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new(".")).await?;
/// println!("Loaded {} prompts and {} automations",
///          config.prompts.len(),
///          config.automations.len());
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct AppConfig {
    /// Global settings from `config.toml`.
    pub global: GlobalConfig,

    /// All system prompts loaded from `prompts/*.md`.
    pub prompts: Vec<SystemPrompt>,

    /// All automations loaded from `automations/*.yaml`.
    pub automations: Vec<Automation>,
}

impl AppConfig {
    /// Look up a system prompt by name.
    pub fn prompt(&self, name: &str) -> Option<&SystemPrompt> {
        self.prompts.iter().find(|prompt| prompt.name == name)
    }

    /// The prompt marked `default: true`, if any.
    pub fn default_prompt(&self) -> Option<&SystemPrompt> {
        self.prompts.iter().find(|prompt| prompt.default)
    }

    pub fn automation(&self, id: &str) -> Option<&Automation> {
        self.automations.iter().find(|automation| automation.id == id)
    }
}
