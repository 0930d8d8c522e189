//! Embedded template files for `.codeflow` initialization.

use rust_embed::RustEmbed;

/// Embedded template files from the workspace `templates/` directory.
///
/// `CARGO_MANIFEST_DIR` is `crates/core`, so `../../templates` is the
/// workspace root `templates/`. With the `debug-embed` feature, debug builds
/// embed the files as release builds do.
#[derive(RustEmbed)]
#[folder = "$CARGO_MANIFEST_DIR/../../templates"]
pub struct TemplateAssets;

/// Get template file content by path.
///
/// # Arguments
/// * `path` - Relative path from templates root (e.g., "config.toml", "prompts/default.md")
///
/// # Returns
/// The file content as a String, or None if the file doesn't exist.
pub fn get_template(path: &str) -> Option<String> {
    TemplateAssets::get(path).map(|file| String::from_utf8_lossy(file.data.as_ref()).to_string())
}

/// List all template files in a directory, sorted.
///
/// # Arguments
/// * `prefix` - Directory prefix (e.g., "prompts/", "automations/")
pub fn list_templates(prefix: &str) -> Vec<String> {
    let mut paths: Vec<String> = TemplateAssets::iter()
        .filter(|path| path.starts_with(prefix))
        .map(|path| path.to_string())
        .collect();
    paths.sort();
    paths
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_config_template() {
        let content = get_template("config.toml").expect("config.toml should be embedded");
        assert!(content.contains("auto_debug ="));
        assert!(content.contains("[retry]"));
    }

    #[test]
    fn test_get_default_prompt_template() {
        let content = get_template("prompts/default.md").expect("default prompt should be embedded");
        assert!(content.contains("name: default"));
        assert!(content.contains("default: true"));
    }

    #[test]
    fn test_get_automation_template() {
        let content = get_template("automations/fibonacci.yaml")
            .expect("fibonacci automation should be embedded");
        assert!(content.contains("id: fibonacci"));
    }

    #[test]
    fn test_get_nonexistent_template() {
        assert!(get_template("nonexistent.txt").is_none());
    }

    #[test]
    fn test_list_templates() {
        let prompts = list_templates("prompts/");
        assert!(prompts.contains(&"prompts/default.md".to_string()));
        assert!(prompts.contains(&"prompts/rust.md".to_string()));

        let automations = list_templates("automations/");
        assert_eq!(
            automations,
            vec![
                "automations/fibonacci.yaml".to_string(),
                "automations/refactor-loop.yaml".to_string()
            ]
        );

        assert!(list_templates("").len() >= 6);
    }
}
