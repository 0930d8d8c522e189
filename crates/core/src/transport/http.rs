//! HTTP transport posting chat requests to the configured provider.

use crate::transport::base::{ChatRequest, Transport, TransportError};
use async_trait::async_trait;
use cf_protocol::config_models::{ModelDescriptor, ProviderConfig};
use reqwest::Client;
use std::time::Duration;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Transport speaking the assistant's JSON wire format over HTTP.
///
/// The request body is the serialized [`ChatRequest`]
/// (`{message, mode, sessionId, validationScore, model}`), sent with bearer
/// auth. The response body is returned untouched; envelope handling belongs to
/// the response parser.
pub struct HttpTransport {
    provider: Option<ProviderConfig>,
    model: Option<ModelDescriptor>,
    client: Client,
}

impl HttpTransport {
    /// Create a transport. `provider` may be `None`; every call then fails
    /// with [`TransportError::NotConfigured`].
    pub fn new(provider: Option<ProviderConfig>, model: Option<ModelDescriptor>) -> Self {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            provider,
            model,
            client,
        }
    }

    /// The endpoint requests go to: the active model's provider endpoint,
    /// else the configured API URL.
    pub fn endpoint(&self) -> Option<String> {
        match (&self.model, &self.provider) {
            (Some(model), Some(_)) => Some(model.provider.endpoint().to_string()),
            (None, Some(provider)) => Some(provider.api_url.clone()),
            (_, None) => None,
        }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn is_configured(&self) -> bool {
        self.provider.is_some()
    }

    async fn chat(&self, request: &ChatRequest) -> Result<String, TransportError> {
        let provider = self.provider.as_ref().ok_or(TransportError::NotConfigured)?;
        let url = self.endpoint().ok_or(TransportError::NotConfigured)?;

        let mut request = request.clone();
        if request.model.is_none() {
            request.model = self.model.as_ref().map(|m| m.id.clone());
        }

        tracing::debug!(url = %url, mode = request.mode.as_str(), "sending chat request");

        let response = self
            .client
            .post(&url)
            .header("accept", "application/json")
            .bearer_auth(&provider.api_key)
            .json(&request)
            .send()
            .await
            .map_err(classify_send_error)?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| TransportError::InvalidResponse(e.to_string()))?;

        if !status.is_success() {
            return Err(TransportError::Provider {
                status: status.as_u16(),
                body: truncate_for_error(&body, 500),
            });
        }

        Ok(body)
    }
}

fn classify_send_error(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout(error.to_string())
    } else {
        // Connection refused, DNS failure, TLS failure: the provider was never reached.
        TransportError::Unreachable(error.to_string())
    }
}

fn truncate_for_error(input: &str, max_len: usize) -> String {
    if input.chars().count() <= max_len {
        return input.to_string();
    }
    let truncated: String = input.chars().take(max_len).collect();
    format!("{truncated}...")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::base::ChatMode;
    use cf_protocol::config_models::ModelProvider;

    fn provider() -> ProviderConfig {
        ProviderConfig {
            api_url: "http://127.0.0.1:9/api/chat".to_string(),
            api_key: "test-key-123".to_string(),
        }
    }

    #[tokio::test]
    async fn test_unconfigured_transport() {
        let transport = HttpTransport::new(None, None);
        assert!(!transport.is_configured().await);
        assert_eq!(transport.endpoint(), None);

        let result = transport
            .chat(&ChatRequest::new("hi", ChatMode::Chat))
            .await;
        assert_eq!(result, Err(TransportError::NotConfigured));
    }

    #[test]
    fn test_endpoint_prefers_model_provider() {
        let model = ModelDescriptor {
            id: "codellama".to_string(),
            name: "CodeLlama".to_string(),
            description: String::new(),
            provider: ModelProvider::Ollama,
        };
        let transport = HttpTransport::new(Some(provider()), Some(model));
        assert_eq!(
            transport.endpoint().as_deref(),
            Some("http://localhost:11434/api/chat")
        );

        let transport = HttpTransport::new(Some(provider()), None);
        assert_eq!(
            transport.endpoint().as_deref(),
            Some("http://127.0.0.1:9/api/chat")
        );
    }

    #[tokio::test]
    async fn test_connection_refused_is_unreachable() {
        // Port 9 (discard) is not expected to accept connections.
        let transport = HttpTransport::new(Some(provider()), None);
        let result = transport
            .chat(&ChatRequest::new("hi", ChatMode::Chat))
            .await;
        assert!(matches!(
            result,
            Err(TransportError::Unreachable(_)) | Err(TransportError::Timeout(_))
        ));
    }

    #[test]
    fn test_truncate_for_error() {
        assert_eq!(truncate_for_error("short", 10), "short");
        assert_eq!(truncate_for_error("abcdefgh", 3), "abc...");
    }
}
