//! Model discovery per provider.
//!
//! Each provider is asked for its model list; when it cannot be reached or
//! answers with something unexpected, a built-in list is used instead.

use cf_protocol::config_models::{ModelDescriptor, ModelProvider};
use reqwest::Client;
use serde_json::Value;
use std::time::Duration;

const DISCOVERY_TIMEOUT: Duration = Duration::from_secs(5);

fn descriptor(id: &str, name: &str, description: &str, provider: ModelProvider) -> ModelDescriptor {
    ModelDescriptor {
        id: id.to_string(),
        name: name.to_string(),
        description: description.to_string(),
        provider,
    }
}

/// Models offered when `provider` cannot be queried.
pub fn fallback_models(provider: ModelProvider) -> Vec<ModelDescriptor> {
    use ModelProvider::*;
    match provider {
        Ollama => vec![
            descriptor("codellama", "CodeLlama", "Specialized for code generation", Ollama),
            descriptor("llama2", "Llama 2", "General purpose model", Ollama),
            descriptor("mistral", "Mistral", "Mistral 7B model", Ollama),
            descriptor("neural-chat", "Neural Chat", "Optimized for dialogue", Ollama),
            descriptor("starling-lm", "Starling", "Starling LM model", Ollama),
        ],
        Lmstudio => vec![
            descriptor("wizardcoder", "WizardCoder", "Specialized for code generation", Lmstudio),
            descriptor("openchat", "OpenChat", "Conversational model", Lmstudio),
            descriptor("deepseek", "DeepSeek", "DeepSeek Coder model", Lmstudio),
            descriptor("solar", "Solar", "Upstage Solar model", Lmstudio),
        ],
        Openai => vec![
            descriptor("gpt-4-turbo-preview", "GPT-4 Turbo", "Most capable GPT-4 model", Openai),
            descriptor("gpt-4", "GPT-4", "Most capable GPT-4 model", Openai),
            descriptor("gpt-3.5-turbo", "GPT-3.5 Turbo", "Most capable GPT-3.5 model", Openai),
        ],
        Claude => vec![
            descriptor("claude-3-opus", "Claude 3 Opus", "Most capable Claude model", Claude),
            descriptor("claude-3-sonnet", "Claude 3 Sonnet", "Balanced performance and speed", Claude),
            descriptor("claude-3-haiku", "Claude 3 Haiku", "Fast and efficient", Claude),
        ],
    }
}

fn listing_url(provider: ModelProvider) -> &'static str {
    match provider {
        ModelProvider::Ollama => "http://localhost:11434/api/list",
        ModelProvider::Lmstudio => "http://localhost:1234/v1/models",
        ModelProvider::Openai => "https://api.openai.com/v1/models",
        ModelProvider::Claude => "https://api.anthropic.com/v1/models",
    }
}

/// List the models `provider` offers, falling back to [`fallback_models`].
///
/// Hosted providers are only queried when `api_key` is given.
pub async fn available_models(provider: ModelProvider, api_key: Option<&str>) -> Vec<ModelDescriptor> {
    match discover(provider, api_key).await {
        Ok(models) if !models.is_empty() => models,
        Ok(_) => {
            tracing::warn!(?provider, "provider listed no models, using defaults");
            fallback_models(provider)
        }
        Err(e) => {
            tracing::warn!(?provider, error = %e, "falling back to default models");
            fallback_models(provider)
        }
    }
}

async fn discover(provider: ModelProvider, api_key: Option<&str>) -> anyhow::Result<Vec<ModelDescriptor>> {
    let client = Client::builder().timeout(DISCOVERY_TIMEOUT).build()?;
    let mut request = client
        .get(listing_url(provider))
        .header("content-type", "application/json");

    match (provider, api_key) {
        (ModelProvider::Openai, Some(key)) => request = request.bearer_auth(key),
        (ModelProvider::Claude, Some(key)) => request = request.header("x-api-key", key),
        (ModelProvider::Openai | ModelProvider::Claude, None) => {
            anyhow::bail!("no API key for {provider:?}")
        }
        _ => {}
    }

    let body: Value = request.send().await?.error_for_status()?.json().await?;
    parse_model_list(provider, &body)
        .ok_or_else(|| anyhow::anyhow!("unexpected model list format from {provider:?}"))
}

/// Read a provider's model listing. `None` when the shape is not recognised.
pub fn parse_model_list(provider: ModelProvider, body: &Value) -> Option<Vec<ModelDescriptor>> {
    let text = |entry: &Value, key: &str| entry.get(key).and_then(Value::as_str).map(str::to_string);

    match provider {
        ModelProvider::Ollama => {
            let models = body.get("models")?.as_array()?;
            Some(
                models
                    .iter()
                    .filter_map(|entry| {
                        let name = text(entry, "name")?;
                        let description = if entry.get("digest").is_some() {
                            "Custom model"
                        } else {
                            "Base model"
                        };
                        Some(descriptor(&name, &name, description, provider))
                    })
                    .collect(),
            )
        }
        ModelProvider::Lmstudio | ModelProvider::Claude => {
            let key = if provider == ModelProvider::Claude { "models" } else { "data" };
            let default_description = if provider == ModelProvider::Claude {
                "Anthropic Claude model"
            } else {
                "LM Studio model"
            };
            let models = body.get(key)?.as_array()?;
            Some(
                models
                    .iter()
                    .filter_map(|entry| {
                        let id = text(entry, "id")?;
                        let name = text(entry, "name").unwrap_or_else(|| id.clone());
                        let description = text(entry, "description")
                            .unwrap_or_else(|| default_description.to_string());
                        Some(descriptor(&id, &name, &description, provider))
                    })
                    .collect(),
            )
        }
        ModelProvider::Openai => {
            let models = body.get("data")?.as_array()?;
            Some(
                models
                    .iter()
                    .filter_map(|entry| text(entry, "id"))
                    .filter(|id| id.contains("gpt"))
                    .map(|id| descriptor(&id, &id, "OpenAI GPT model", provider))
                    .collect(),
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_fallback_lists() {
        let ollama = fallback_models(ModelProvider::Ollama);
        assert_eq!(ollama.len(), 5);
        assert_eq!(ollama[0].id, "codellama");
        assert!(fallback_models(ModelProvider::Claude)
            .iter()
            .all(|m| m.provider == ModelProvider::Claude));
    }

    #[test]
    fn test_parse_ollama_listing() {
        let body = json!({"models": [{"name": "qwen2.5-coder", "digest": "abc"}, {"name": "phi"}]});
        let models = parse_model_list(ModelProvider::Ollama, &body).unwrap();
        assert_eq!(models.len(), 2);
        assert_eq!(models[0].description, "Custom model");
        assert_eq!(models[1].description, "Base model");
    }

    #[test]
    fn test_parse_openai_keeps_gpt_only() {
        let body = json!({"data": [{"id": "gpt-4o"}, {"id": "whisper-1"}]});
        let models = parse_model_list(ModelProvider::Openai, &body).unwrap();
        assert_eq!(models.len(), 1);
        assert_eq!(models[0].id, "gpt-4o");
    }

    #[test]
    fn test_parse_lmstudio_name_defaults_to_id() {
        let body = json!({"data": [{"id": "deepseek-coder"}]});
        let models = parse_model_list(ModelProvider::Lmstudio, &body).unwrap();
        assert_eq!(models[0].name, "deepseek-coder");
        assert_eq!(models[0].description, "LM Studio model");
    }

    #[test]
    fn test_unrecognised_shape() {
        assert!(parse_model_list(ModelProvider::Ollama, &json!({"data": []})).is_none());
    }

    #[tokio::test]
    async fn test_hosted_provider_without_key_falls_back() {
        let models = available_models(ModelProvider::Openai, None).await;
        assert_eq!(models, fallback_models(ModelProvider::Openai));
    }
}
