pub mod validation;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use self::validation::validate_config;

/// Error type for configuration loading and validation.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("Failed to parse YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Filesystem roots. Each corpus reads and writes under a subdirectory
/// named after it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,
    #[serde(default = "default_output_root")]
    pub output_root: PathBuf,
    #[serde(default = "default_catalog_root")]
    pub catalog_root: PathBuf,
}

fn default_source_root() -> PathBuf {
    PathBuf::from("data/downloaded")
}
fn default_output_root() -> PathBuf {
    PathBuf::from("data/processed")
}
fn default_catalog_root() -> PathBuf {
    PathBuf::from("data/tools")
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            output_root: default_output_root(),
            catalog_root: default_catalog_root(),
        }
    }
}

/// API-Bank levels to convert.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiBankConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_train_levels")]
    pub train_levels: Vec<String>,
    #[serde(default = "default_test_levels")]
    pub test_levels: Vec<String>,
}

fn default_train_levels() -> Vec<String> {
    ["lv1", "lv2", "lv3"].map(String::from).to_vec()
}
fn default_test_levels() -> Vec<String> {
    ["1", "2", "3"].map(String::from).to_vec()
}

impl Default for ApiBankConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            train_levels: default_train_levels(),
            test_levels: default_test_levels(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolAlpacaConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default = "default_input_file")]
    pub input_file: String,
}

fn default_input_file() -> String {
    "train_data.json".to_string()
}

impl Default for ToolAlpacaConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            input_file: default_input_file(),
        }
    }
}

/// Feature flags and settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeaturesConfig {
    #[serde(default = "default_log_level")]
    pub log_level: String,
    /// `text` or `json`.
    #[serde(default = "default_log_format")]
    pub log_format: String,
}

fn default_true() -> bool {
    true
}
fn default_log_level() -> String {
    "INFO".to_string()
}
fn default_log_format() -> String {
    "text".to_string()
}

impl Default for FeaturesConfig {
    fn default() -> Self {
        Self {
            log_level: default_log_level(),
            log_format: default_log_format(),
        }
    }
}

/// Top-level application configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub api_bank: ApiBankConfig,
    #[serde(default)]
    pub tool_alpaca: ToolAlpacaConfig,
    #[serde(default)]
    pub features: FeaturesConfig,
}

/// Load configuration from a YAML file and validate it.
///
/// # Errors
///
/// Returns [`ConfigError::Io`] when reading the file fails, [`ConfigError::Yaml`]
/// when parsing fails, or [`ConfigError::Validation`] when semantic validation fails.
pub fn load_config(path: &str) -> Result<AppConfig, ConfigError> {
    let contents = std::fs::read_to_string(path)?;
    let config: AppConfig = serde_yaml::from_str(&contents)?;
    validate_config(&config)?;
    Ok(config)
}
