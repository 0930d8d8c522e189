//! Configuration file loader for `.codeflow/` directory structure.
//!
//! This module provides functionality to load and parse all configuration files
//! from the `.codeflow/` directory, including:
//! - `config.toml`: Global settings
//! - `prompts/*.md`: System prompts with YAML front matter
//! - `automations/*.yaml`: Saved automations

use crate::config::error::ConfigError;
use crate::config::error::ConfigResult;
use crate::config::models::AppConfig;
use crate::config::validate::validate_provider;
use cf_protocol::automation_models::Automation;
use cf_protocol::config_models::{GlobalConfig, SystemPrompt};
use gray_matter::engine::YAML;
use gray_matter::Matter;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Name of the configuration directory under the project root.
pub const CONFIG_DIR: &str = ".codeflow";

/// Loads all configuration from the `.codeflow/` directory.
///
/// # Arguments
///
/// * `root` - Root directory containing the `.codeflow/` folder
///
/// # Returns
///
/// An `AppConfig` containing all loaded configuration. Missing directories or
/// files yield defaults rather than errors.
///
/// # Errors
///
/// Returns `ConfigError` if:
/// - Files exist but cannot be read
/// - Files have invalid syntax (TOML, YAML, or Markdown front matter)
/// - A configured provider has an unusable URL or key
pub async fn load_config(root: &Path) -> ConfigResult<AppConfig> {
    let cf_dir = root.join(CONFIG_DIR);

    if !cf_dir.exists() {
        return Ok(AppConfig::default());
    }

    let global = load_global_config(&cf_dir)?;
    let prompts = load_prompts(&cf_dir)?;
    let automations = load_automations(&cf_dir)?;

    tracing::debug!(
        dir = %cf_dir.display(),
        prompts = prompts.len(),
        automations = automations.len(),
        "configuration loaded"
    );

    Ok(AppConfig {
        global,
        prompts,
        automations,
    })
}

/// Loads global configuration from `config.toml`.
fn load_global_config(cf_dir: &Path) -> ConfigResult<GlobalConfig> {
    let config_path = cf_dir.join("config.toml");

    if !config_path.exists() {
        return Ok(GlobalConfig::default());
    }

    let content = read_file(&config_path)?;

    let config: GlobalConfig =
        toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
            path: config_path.clone(),
            source,
        })?;

    if let Some(provider) = &config.provider {
        validate_provider(provider).map_err(|e| ConfigError::InvalidConfig {
            path: config_path,
            reason: e.to_string(),
        })?;
    }

    Ok(config)
}

/// Loads all system prompts from `prompts/*.md`.
fn load_prompts(cf_dir: &Path) -> ConfigResult<Vec<SystemPrompt>> {
    let mut prompts = Vec::new();

    for path in files_with_extension(&cf_dir.join("prompts"), &["md"])? {
        let content = read_file(&path)?;

        let matter = Matter::<YAML>::new();
        let result = matter.parse(&content);

        let mut prompt: SystemPrompt = result
            .data
            .ok_or_else(|| ConfigError::MarkdownParse {
                path: path.clone(),
                reason: "Missing YAML front matter".to_string(),
            })?
            .deserialize()
            .map_err(|e| ConfigError::MarkdownParse {
                path: path.clone(),
                reason: format!("Failed to deserialize front matter: {e}"),
            })?;

        prompt.content = result.content.trim().to_string();
        prompts.push(prompt);
    }

    Ok(prompts)
}

/// Loads all automations from `automations/*.yaml` and `*.yml`.
fn load_automations(cf_dir: &Path) -> ConfigResult<Vec<Automation>> {
    let mut automations = Vec::new();

    for path in files_with_extension(&cf_dir.join("automations"), &["yaml", "yml"])? {
        let content = read_file(&path)?;

        let automation: Automation =
            serde_yaml::from_str(&content).map_err(|source| ConfigError::YamlParse {
                path: path.clone(),
                source,
            })?;

        if automation.prompts.is_empty() {
            return Err(ConfigError::InvalidConfig {
                path,
                reason: "automation has no prompts".to_string(),
            });
        }

        automations.push(automation);
    }

    Ok(automations)
}

/// Direct children of `dir` with one of `extensions`, sorted by file name.
/// A missing directory yields no files.
fn files_with_extension(dir: &Path, extensions: &[&str]) -> ConfigResult<Vec<PathBuf>> {
    if !dir.exists() {
        return Ok(Vec::new());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|source| ConfigError::DirectoryWalk {
            path: dir.to_path_buf(),
            source,
        })?;

        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|s| s.to_str())
            .is_some_and(|ext| extensions.contains(&ext));
        if matches {
            files.push(path.to_path_buf());
        }
    }
    Ok(files)
}

fn read_file(path: &Path) -> ConfigResult<String> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use cf_protocol::config_models::{ModelProvider, ModuleId};
    use std::fs;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_load_config_full() {
        let dir = tempdir().expect("Failed to create temp dir");
        let root = dir.path();
        let cf_dir = root.join(CONFIG_DIR);

        fs::create_dir_all(cf_dir.join("prompts")).expect("Failed to create prompts dir");
        fs::create_dir_all(cf_dir.join("automations")).expect("Failed to create automations dir");

        let config_toml = r#"
auto_debug = true
modules = ["chat", "think", "code", "debug"]
automation_delay_ms = 500

[provider]
api_url = "http://localhost:11434/api/chat"
api_key = "local-key-123"

[model]
id = "codellama"
name = "CodeLlama"
provider = "ollama"

[retry]
max_attempts = 5
"#;
        fs::write(cf_dir.join("config.toml"), config_toml).expect("Failed to write config.toml");

        let prompt_md = r#"---
name: rust
description: Rust specialist
default: true
---

You are a Rust expert. Prefer iterators over index loops."#;
        fs::write(cf_dir.join("prompts/rust.md"), prompt_md).expect("Failed to write prompt");

        let automation_yaml = r#"id: fib
name: Fibonacci drill
infinite-loop: true
prompts:
  - "Write a fibonacci function"
  - "Add tests"
"#;
        fs::write(cf_dir.join("automations/fib.yaml"), automation_yaml)
            .expect("Failed to write automation");

        let config = load_config(root).await.expect("Failed to load config");

        assert!(config.global.auto_debug);
        assert_eq!(config.global.modules.len(), 4);
        assert!(config.global.modules.contains(&ModuleId::Think));
        assert_eq!(config.global.automation_delay_ms, 500);
        assert_eq!(config.global.retry.max_attempts, 5);
        assert_eq!(config.global.retry.base_delay_ms, 1000);
        assert_eq!(
            config.global.model.as_ref().map(|m| m.provider),
            Some(ModelProvider::Ollama)
        );

        let prompt = config.default_prompt().expect("default prompt");
        assert_eq!(prompt.name, "rust");
        assert!(prompt.content.starts_with("You are a Rust expert."));

        let automation = config.automation("fib").expect("automation");
        assert!(automation.infinite_loop);
        assert_eq!(automation.prompts.len(), 2);
    }

    #[tokio::test]
    async fn test_load_config_empty_directory() {
        let dir = tempdir().expect("Failed to create temp dir");

        let config = load_config(dir.path())
            .await
            .expect("Should handle missing .codeflow");

        assert!(config.global.provider.is_none());
        assert_eq!(config.global.session_id, "code-editor-session");
        assert!(config.prompts.is_empty());
        assert!(config.automations.is_empty());
    }

    #[tokio::test]
    async fn test_load_config_invalid_toml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&cf_dir).expect("Failed to create .codeflow");
        fs::write(cf_dir.join("config.toml"), "auto_debug = [invalid toml")
            .expect("Failed to write config.toml");

        let result = load_config(dir.path()).await;

        if let Err(ConfigError::TomlParse { path, .. }) = result {
            assert!(path.ends_with("config.toml"));
        } else {
            panic!("Expected TomlParse error");
        }
    }

    #[tokio::test]
    async fn test_load_config_rejects_bad_provider() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(&cf_dir).expect("Failed to create .codeflow");
        fs::write(
            cf_dir.join("config.toml"),
            "[provider]\napi_url = \"http://localhost:1234\"\napi_key = \"abc\"\n",
        )
        .expect("Failed to write config.toml");

        let result = load_config(dir.path()).await;

        match result {
            Err(ConfigError::InvalidConfig { reason, .. }) => {
                assert!(reason.contains("too short"))
            }
            other => panic!("Expected InvalidConfig error, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_prompt_without_front_matter() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(cf_dir.join("prompts")).expect("Failed to create prompts dir");
        fs::write(cf_dir.join("prompts/plain.md"), "Just plain markdown content")
            .expect("Failed to write prompt");

        let result = load_config(dir.path()).await;

        if let Err(ConfigError::MarkdownParse { path, reason }) = result {
            assert!(path.ends_with("plain.md"));
            assert!(reason.contains("Missing YAML front matter"));
        } else {
            panic!("Expected MarkdownParse error");
        }
    }

    #[tokio::test]
    async fn test_invalid_automation_yaml() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(cf_dir.join("automations")).expect("Failed to create dir");
        fs::write(cf_dir.join("automations/bad.yml"), "id: x\n  name: [broken")
            .expect("Failed to write automation");

        let result = load_config(dir.path()).await;

        if let Err(ConfigError::YamlParse { path, .. }) = result {
            assert!(path.ends_with("bad.yml"));
        } else {
            panic!("Expected YamlParse error");
        }
    }

    #[tokio::test]
    async fn test_empty_automation_rejected() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(cf_dir.join("automations")).expect("Failed to create dir");
        fs::write(
            cf_dir.join("automations/empty.yaml"),
            "id: empty\nname: Empty\nprompts: []\n",
        )
        .expect("Failed to write automation");

        assert!(matches!(
            load_config(dir.path()).await,
            Err(ConfigError::InvalidConfig { .. })
        ));
    }

    #[tokio::test]
    async fn test_non_matching_files_are_ignored() {
        let dir = tempdir().expect("Failed to create temp dir");
        let cf_dir = dir.path().join(CONFIG_DIR);
        fs::create_dir_all(cf_dir.join("prompts")).expect("Failed to create prompts dir");
        fs::create_dir_all(cf_dir.join("automations")).expect("Failed to create dir");
        fs::write(cf_dir.join("prompts/readme.txt"), "notes").expect("write");
        fs::write(cf_dir.join("automations/notes.txt"), "notes").expect("write");

        let config = load_config(dir.path()).await.expect("Should ignore other files");

        assert!(config.prompts.is_empty());
        assert!(config.automations.is_empty());
    }
}
