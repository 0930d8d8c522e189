//! Configuration models for `.codeflow/config.toml`.
//!
//! This module defines the provider, model and module selection settings
//! that are threaded explicitly through the orchestrator.

use serde::Deserialize;
use serde::Serialize;
use ts_rs::TS;

/// A model provider family. Each maps to a fixed default endpoint.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(rename_all = "lowercase")]
pub enum ModelProvider {
    Ollama,
    Lmstudio,
    Openai,
    Claude,
}

impl ModelProvider {
    /// Default chat endpoint for this provider.
    pub fn endpoint(self) -> &'static str {
        match self {
            ModelProvider::Lmstudio => "http://localhost:1234/v1/chat/completions",
            ModelProvider::Ollama => "http://localhost:11434/api/chat",
            ModelProvider::Openai => "https://api.openai.com/v1/chat/completions",
            ModelProvider::Claude => "https://api.anthropic.com/v1/messages",
        }
    }

    /// Whether the provider runs on the local machine.
    pub fn is_local(self) -> bool {
        matches!(self, ModelProvider::Ollama | ModelProvider::Lmstudio)
    }
}

/// The model selected for requests.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ModelDescriptor {
    /// Identifier sent to the provider (e.g., "codellama").
    pub id: String,

    /// Display name; also used in prompt preambles.
    pub name: String,

    #[serde(default)]
    pub description: String,

    pub provider: ModelProvider,
}

/// An orchestration capability that can be switched on or off.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Hash, TS)]
#[serde(rename_all = "lowercase")]
pub enum ModuleId {
    Chat,
    Think,
    Code,
    Debug,
    Vector,
}

/// Where requests go and how they authenticate.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct ProviderConfig {
    /// Fallback endpoint used when no model is selected.
    pub api_url: String,

    /// Bearer token sent with every request.
    pub api_key: String,
}

/// Retry budget for the transport wrapper.
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, TS)]
#[serde(default)]
pub struct RetrySettings {
    /// Total attempts including the first one.
    pub max_attempts: u32,

    /// Delay before the second attempt; doubles for each further attempt.
    pub base_delay_ms: u64,
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            base_delay_ms: 1000,
        }
    }
}

/// Settings from `.codeflow/config.toml`.
///
/// # Example
///
/// ```toml
/// session_id = "code-editor-session"
/// auto_debug = true
/// thinking_mode = false
/// modules = ["chat", "code", "debug"]
///
/// [provider]
/// api_url = "http://localhost:11434/api/chat"
/// api_key = "local-key-123"
///
/// [model]
/// id = "codellama"
/// name = "CodeLlama"
/// provider = "ollama"
/// ```
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
#[serde(default)]
pub struct GlobalConfig {
    /// Provider endpoint and credentials. `None` means unconfigured.
    pub provider: Option<ProviderConfig>,

    /// Active model; its provider endpoint overrides `provider.api_url`.
    pub model: Option<ModelDescriptor>,

    /// Enabled modules.
    pub modules: Vec<ModuleId>,

    /// Run a debug pass after generation and replace code on continuation steps.
    pub auto_debug: bool,

    /// Send every simple-mode call with the think preamble.
    pub thinking_mode: bool,

    /// Session identifier sent with every request.
    pub session_id: String,

    pub retry: RetrySettings,

    /// Pause between infinite-loop automation dispatches.
    pub automation_delay_ms: u64,
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            provider: None,
            model: None,
            modules: Vec::new(),
            auto_debug: false,
            thinking_mode: false,
            session_id: "code-editor-session".to_string(),
            retry: RetrySettings::default(),
            automation_delay_ms: 2000,
        }
    }
}

/// A named system prompt from `.codeflow/prompts/*.md`.
///
/// Front matter holds the metadata; the Markdown body is the prompt text.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, TS)]
pub struct SystemPrompt {
    pub name: String,

    #[serde(default)]
    pub description: String,

    /// Marks the prompt that is applied when no other is selected.
    #[serde(default)]
    pub default: bool,

    #[serde(skip)]
    pub content: String,
}
