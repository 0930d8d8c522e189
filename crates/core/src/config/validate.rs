//! Provider configuration checks.

use crate::config::error::{ConfigError, ConfigResult};
use cf_protocol::config_models::ProviderConfig;
use reqwest::Url;

/// Shortest API key accepted.
pub const MIN_API_KEY_LEN: usize = 8;

/// Reject provider settings that cannot possibly work.
pub fn validate_provider(provider: &ProviderConfig) -> ConfigResult<()> {
    if provider.api_url.trim().is_empty() {
        return Err(ConfigError::InvalidProvider("API URL is required".to_string()));
    }
    if Url::parse(&provider.api_url).is_err() {
        return Err(ConfigError::InvalidProvider(
            "Invalid API URL format".to_string(),
        ));
    }
    if provider.api_key.is_empty() {
        return Err(ConfigError::InvalidProvider("API Key is required".to_string()));
    }
    if provider.api_key.chars().count() < MIN_API_KEY_LEN {
        return Err(ConfigError::InvalidProvider("API Key is too short".to_string()));
    }
    Ok(())
}
