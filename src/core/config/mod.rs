pub mod defaults;
pub mod paths;
pub mod service;
pub mod validation;

use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::core::errors::AppError;

pub use paths::AppPaths;
pub use service::ConfigService;

/// Fully resolved settings for one chat session.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub model: String,
    pub host: String,
    pub system_prompt: String,
    pub rag: RagSettings,
    pub search: SearchSettings,
    pub log_dir: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RagSettings {
    pub enabled: bool,
    pub data_dir: PathBuf,
    pub top_k: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SearchSettings {
    pub max_results: usize,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            model: defaults::DEFAULT_MODEL.to_string(),
            host: defaults::DEFAULT_HOST.to_string(),
            system_prompt: defaults::DEFAULT_SYSTEM_PROMPT.to_string(),
            rag: RagSettings::default(),
            search: SearchSettings::default(),
            log_dir: PathBuf::from(defaults::DEFAULT_LOG_DIR),
        }
    }
}

impl Default for RagSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            data_dir: PathBuf::from(defaults::DEFAULT_DATA_DIR),
            top_k: defaults::DEFAULT_TOP_K,
        }
    }
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            max_results: defaults::DEFAULT_MAX_RESULTS,
        }
    }
}

impl AppConfig {
    /// Validate a merged config tree and convert it into typed settings.
    pub fn from_value(value: &Value) -> Result<Self, AppError> {
        validation::validate_config(value)?;
        serde_json::from_value(value.clone()).map_err(|e| AppError::Config(e.to_string()))
    }
}
