//! Directory structure and file generation for `.codeflow` initialization.

use super::error::{InitError, InitResult};
use super::templates::{get_template, list_templates};
use crate::config::loader::CONFIG_DIR;
use std::fs;
use std::path::{Path, PathBuf};

/// Options for initializing a `.codeflow` directory.
#[derive(Debug, Clone)]
pub struct InitOptions {
    /// Target directory where `.codeflow` will be created.
    pub target_dir: PathBuf,

    /// Overwrite existing `.codeflow` directory if it exists.
    pub force: bool,

    /// Create minimal template (only the default prompt and one automation).
    pub minimal: bool,
}

impl Default for InitOptions {
    fn default() -> Self {
        Self {
            target_dir: std::env::current_dir().unwrap_or_else(|_| PathBuf::from(".")),
            force: false,
            minimal: false,
        }
    }
}

const MINIMAL_PROMPT: &str = "prompts/default.md";
const MINIMAL_AUTOMATION: &str = "automations/fibonacci.yaml";

/// Generate a complete `.codeflow` directory structure with templates.
///
/// ```text
/// .codeflow/
/// ├── config.toml
/// ├── prompts/
/// │   ├── default.md
/// │   └── ... (unless minimal)
/// └── automations/
///     ├── fibonacci.yaml
///     └── refactor-loop.yaml (unless minimal)
/// ```
///
/// # Returns
/// The paths written, or an `InitError` if:
/// - The `.codeflow` directory already exists (without force flag)
/// - A template file cannot be found
/// - File system operations fail
pub async fn generate_codeflow_structure(options: InitOptions) -> InitResult<Vec<PathBuf>> {
    let cf_dir = options.target_dir.join(CONFIG_DIR);

    if cf_dir.exists() && !options.force {
        return Err(InitError::DirectoryExists(cf_dir));
    }

    for sub_dir in ["prompts", "automations"] {
        let path = cf_dir.join(sub_dir);
        fs::create_dir_all(&path).map_err(|source| InitError::DirectoryCreate { path, source })?;
    }

    let mut templates = vec!["config.toml".to_string()];
    if options.minimal {
        templates.push(MINIMAL_PROMPT.to_string());
        templates.push(MINIMAL_AUTOMATION.to_string());
    } else {
        templates.extend(list_templates("prompts/"));
        templates.extend(list_templates("automations/"));
    }

    let mut written = Vec::with_capacity(templates.len());
    for template_path in &templates {
        written.push(write_template_file(&cf_dir, template_path)?);
    }

    tracing::info!(dir = %cf_dir.display(), files = written.len(), "initialized .codeflow");
    Ok(written)
}

/// Write one embedded template below `cf_dir`, returning the target path.
fn write_template_file(cf_dir: &Path, template_path: &str) -> InitResult<PathBuf> {
    let content = get_template(template_path)
        .ok_or_else(|| InitError::TemplateNotFound(template_path.to_string()))?;

    let target_path = cf_dir.join(template_path);

    if let Some(parent) = target_path.parent() {
        fs::create_dir_all(parent).map_err(|source| InitError::DirectoryCreate {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    fs::write(&target_path, content).map_err(|source| InitError::FileWrite {
        path: target_path.clone(),
        source,
    })?;

    Ok(target_path)
}
