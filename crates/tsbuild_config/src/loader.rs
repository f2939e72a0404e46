//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "tsbuild.toml";

/// Loads and validates `<project_dir>/tsbuild.toml`.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    let config_path = project_dir.join(CONFIG_FILE);
    let content = std::fs::read_to_string(&config_path)?;
    load_config_from_str(&content)
}

/// Like [`load_config`], but an absent file yields the default configuration.
pub fn load_config_or_default(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    match load_config(project_dir) {
        Err(ConfigError::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            Ok(ProjectConfig::default())
        }
        other => other,
    }
}

/// Parses and validates a configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Validates that values are usable.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    if config.compiler.command.is_empty() {
        return Err(ConfigError::MissingField("compiler.command".to_string()));
    }
    if config.layout.targets_dir.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("layout.targets_dir".to_string()));
    }
    if config.layout.tsconfig_dir.as_os_str().is_empty() {
        return Err(ConfigError::MissingField("layout.tsconfig_dir".to_string()));
    }
    if config.bin.dir.as_os_str().is_empty() || config.bin.dir.is_absolute() {
        return Err(ConfigError::ValidationError(
            "bin.dir must be a non-empty relative path".to_string(),
        ));
    }
    config.bin.key()?;
    Ok(())
}
