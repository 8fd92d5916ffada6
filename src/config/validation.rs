use std::path::Path;

use super::{AppConfig, ConfigError};

const TRAIN_LEVELS: [&str; 3] = ["lv1", "lv2", "lv3"];
const TEST_LEVELS: [&str; 3] = ["1", "2", "3"];

/// Validate the full application config, returning an error if any rule is violated.
///
/// # Errors
///
/// Returns [`ConfigError::Validation`] when any configuration invariant is violated.
pub fn validate_config(config: &AppConfig) -> Result<(), ConfigError> {
    validate_paths(config)?;
    validate_api_bank(config)?;
    validate_tool_alpaca(config)?;
    validate_log_level(config)?;
    validate_log_format(config)?;
    Ok(())
}

fn validation_err(msg: impl Into<String>) -> ConfigError {
    ConfigError::Validation(msg.into())
}

fn validate_paths(config: &AppConfig) -> Result<(), ConfigError> {
    let paths = &config.paths;
    for (field, path) in [
        ("source_root", &paths.source_root),
        ("output_root", &paths.output_root),
        ("catalog_root", &paths.catalog_root),
    ] {
        if is_blank(path) {
            return Err(validation_err(format!("paths.{field} must not be empty")));
        }
    }
    Ok(())
}

fn is_blank(path: &Path) -> bool {
    path.as_os_str().to_string_lossy().trim().is_empty()
}

fn validate_api_bank(config: &AppConfig) -> Result<(), ConfigError> {
    let api_bank = &config.api_bank;
    if let Some(level) = api_bank
        .train_levels
        .iter()
        .find(|level| !TRAIN_LEVELS.contains(&level.as_str()))
    {
        return Err(validation_err(format!(
            "api_bank.train_levels: unknown level '{level}', expected one of {TRAIN_LEVELS:?}"
        )));
    }
    if let Some(level) = api_bank
        .test_levels
        .iter()
        .find(|level| !TEST_LEVELS.contains(&level.as_str()))
    {
        return Err(validation_err(format!(
            "api_bank.test_levels: unknown level '{level}', expected one of {TEST_LEVELS:?}"
        )));
    }
    Ok(())
}

fn validate_tool_alpaca(config: &AppConfig) -> Result<(), ConfigError> {
    if config.tool_alpaca.input_file.trim().is_empty() {
        return Err(validation_err("tool_alpaca.input_file must not be empty"));
    }
    Ok(())
}

fn validate_log_level(config: &AppConfig) -> Result<(), ConfigError> {
    let valid_levels = ["DEBUG", "INFO", "WARNING", "ERROR", "CRITICAL", "DISABLED"];
    if !valid_levels.contains(&config.features.log_level.to_uppercase().as_str()) {
        return Err(validation_err(format!(
            "log_level must be one of {valid_levels:?}"
        )));
    }
    Ok(())
}

fn validate_log_format(config: &AppConfig) -> Result<(), ConfigError> {
    let valid_formats = ["text", "json"];
    if !valid_formats.contains(&config.features.log_format.to_lowercase().as_str()) {
        return Err(validation_err(format!(
            "log_format must be one of {valid_formats:?}"
        )));
    }
    Ok(())
}
