//! Base Transport trait and supporting types.

use async_trait::async_trait;
use serde::Serialize;
use thiserror::Error;

/// Mode tag sent with every request; tells the provider what kind of answer is wanted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ChatMode {
    Query,
    Chat,
    Think,
    Code,
    Debug,
}

impl ChatMode {
    pub fn as_str(self) -> &'static str {
        match self {
            ChatMode::Query => "query",
            ChatMode::Chat => "chat",
            ChatMode::Think => "think",
            ChatMode::Code => "code",
            ChatMode::Debug => "debug",
        }
    }
}

/// One request to a model provider.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatRequest {
    /// The fully decorated prompt text.
    pub message: String,

    pub mode: ChatMode,

    pub session_id: String,

    /// Score the user gave the previous interaction, if any.
    pub validation_score: Option<u8>,

    /// Provider-side model identifier.
    pub model: Option<String>,
}

impl ChatRequest {
    /// Create a request with the default session and no score or model.
    pub fn new(message: impl Into<String>, mode: ChatMode) -> Self {
        Self {
            message: message.into(),
            mode,
            session_id: "code-editor-session".to_string(),
            validation_score: None,
            model: None,
        }
    }

    pub fn with_session(mut self, session_id: impl Into<String>) -> Self {
        self.session_id = session_id.into();
        self
    }

    pub fn with_validation_score(mut self, score: Option<u8>) -> Self {
        self.validation_score = score;
        self
    }

    pub fn with_model(mut self, model: Option<String>) -> Self {
        self.model = model;
        self
    }
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("API configuration not found. Please configure the API first.")]
    NotConfigured,
    #[error("Unable to connect to the API. Please check your connection and try again. ({0})")]
    Unreachable(String),
    #[error("API request timed out: {0}")]
    Timeout(String),
    #[error("API request failed with status {status}: {body}")]
    Provider { status: u16, body: String },
    #[error("Invalid API response: {0}")]
    InvalidResponse(String),
}

impl TransportError {
    /// Whether another attempt might succeed.
    ///
    /// Connection failures, timeouts, rate limits and server errors are
    /// transient; configuration problems and other provider rejections are not.
    pub fn is_transient(&self) -> bool {
        match self {
            TransportError::Unreachable(_) | TransportError::Timeout(_) => true,
            TransportError::Provider { status, .. } => *status == 429 || *status >= 500,
            TransportError::NotConfigured | TransportError::InvalidResponse(_) => false,
        }
    }
}

/// A model provider connection: one network round-trip per call.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Whether a provider is configured at all. Checked before any run starts.
    async fn is_configured(&self) -> bool;

    /// Send one request and return the raw response body.
    async fn chat(&self, request: &ChatRequest) -> Result<String, TransportError>;
}
