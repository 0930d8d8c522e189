//! Per-run orchestrator settings.

use cf_protocol::config_models::{GlobalConfig, ModelDescriptor, ModuleId};
use cf_protocol::run_models::RunMode;
use std::time::Duration;

/// Everything a run needs to know about the user's choices.
///
/// A snapshot is taken when a run is dispatched; toggles changed while a run
/// is in flight apply to the next run.
#[derive(Debug, Clone, PartialEq)]
pub struct OrchestratorSettings {
    pub model: Option<ModelDescriptor>,
    pub modules: Vec<ModuleId>,
    pub system_prompt: Option<String>,
    pub auto_debug: bool,
    pub thinking_mode: bool,
    pub session_id: String,
    /// Score of the last rated run, sent along with each request.
    pub validation_score: Option<u8>,
    pub automation_delay: Duration,
}

impl Default for OrchestratorSettings {
    fn default() -> Self {
        Self::from_config(&GlobalConfig::default(), None)
    }
}

impl OrchestratorSettings {
    pub fn from_config(config: &GlobalConfig, system_prompt: Option<String>) -> Self {
        Self {
            model: config.model.clone(),
            modules: config.modules.clone(),
            system_prompt,
            auto_debug: config.auto_debug,
            thinking_mode: config.thinking_mode,
            session_id: config.session_id.clone(),
            validation_score: None,
            automation_delay: Duration::from_millis(config.automation_delay_ms),
        }
    }

    pub fn module_enabled(&self, module: ModuleId) -> bool {
        self.modules.contains(&module)
    }

    /// The structured workflow runs when chat, think, code and debug are all on.
    pub fn run_mode(&self) -> RunMode {
        let structured = [ModuleId::Chat, ModuleId::Think, ModuleId::Code, ModuleId::Debug]
            .into_iter()
            .all(|module| self.module_enabled(module));
        if structured {
            RunMode::Structured
        } else {
            RunMode::Simple
        }
    }

    /// Auto-debug needs the debug module, unless no module set was configured at all.
    pub fn debug_allowed(&self) -> bool {
        self.modules.is_empty() || self.module_enabled(ModuleId::Debug)
    }

    pub fn model_id(&self) -> Option<String> {
        self.model.as_ref().map(|model| model.id.clone())
    }
}
