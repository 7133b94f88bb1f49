use std::env;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use serde_json::{Map, Value};

use super::defaults::default_config;
use super::paths::AppPaths;
use super::AppConfig;
use crate::core::errors::AppError;

#[derive(Clone)]
pub struct ConfigService {
    paths: Arc<AppPaths>,
}

impl ConfigService {
    pub fn new(paths: Arc<AppPaths>) -> Self {
        Self { paths }
    }

    /// Merge defaults, the YAML file, the environment and `overrides` (in
    /// that order) into a validated config with root-anchored directories.
    pub fn load_config(&self, overrides: &Value) -> Result<AppConfig, AppError> {
        let file_config = load_yaml_file(&self.paths.config_path)?;
        let env_config = env_overrides(|key| env::var(key).ok())?;

        let merged = [file_config, env_config, overrides.clone()]
            .iter()
            .fold(default_config(), |acc, layer| deep_merge(&acc, layer));

        let mut config = AppConfig::from_value(&merged)?;
        config.rag.data_dir = self.paths.resolve(&config.rag.data_dir);
        config.log_dir = self.paths.resolve(&config.log_dir);
        Ok(config)
    }
}

fn load_yaml_file(path: &Path) -> Result<Value, AppError> {
    if !path.exists() {
        return Ok(Value::Object(Map::new()));
    }

    let contents = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("failed to read {}: {}", path.display(), e)))?;
    match serde_yaml::from_str::<Value>(&contents) {
        Ok(value @ Value::Object(_)) => Ok(value),
        Ok(Value::Null) => Ok(Value::Object(Map::new())),
        Ok(_) => Err(AppError::Config(format!(
            "{} must contain a mapping at the top level",
            path.display()
        ))),
        Err(e) => Err(AppError::Config(format!(
            "failed to parse {}: {}",
            path.display(),
            e
        ))),
    }
}

fn env_overrides<F>(lookup: F) -> Result<Value, AppError>
where
    F: Fn(&str) -> Option<String>,
{
    let mut root = Map::new();
    let mut rag = Map::new();

    if let Some(model) = lookup("OLLAMA_MODEL").filter(|v| !v.trim().is_empty()) {
        root.insert("model".to_string(), Value::String(model));
    }
    if let Some(host) = lookup("OLLAMA_HOST").filter(|v| !v.trim().is_empty()) {
        root.insert("host".to_string(), Value::String(host));
    }
    if let Some(dir) = lookup("FELIX_LOG_DIR").filter(|v| !v.trim().is_empty()) {
        root.insert("log_dir".to_string(), Value::String(dir));
    }
    if let Some(raw) = lookup("FELIX_RAG_ENABLED") {
        let enabled = parse_flag(&raw).ok_or_else(|| {
            AppError::Config(format!("FELIX_RAG_ENABLED must be a boolean, got '{}'", raw))
        })?;
        rag.insert("enabled".to_string(), Value::Bool(enabled));
    }
    if let Some(dir) = lookup("FELIX_DATA_DIR").filter(|v| !v.trim().is_empty()) {
        rag.insert("data_dir".to_string(), Value::String(dir));
    }
    if let Some(raw) = lookup("FELIX_RAG_TOP_K") {
        let top_k = raw.trim().parse::<u64>().map_err(|_| {
            AppError::Config(format!("FELIX_RAG_TOP_K must be an integer, got '{}'", raw))
        })?;
        rag.insert("top_k".to_string(), Value::from(top_k));
    }

    if !rag.is_empty() {
        root.insert("rag".to_string(), Value::Object(rag));
    }
    Ok(Value::Object(root))
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "yes" => Some(true),
        "0" | "false" | "off" | "no" => Some(false),
        _ => None,
    }
}

pub(crate) fn deep_merge(base: &Value, override_value: &Value) -> Value {
    match (base, override_value) {
        (Value::Object(base_map), Value::Object(override_map)) => {
            let mut merged: Map<String, Value> = base_map.clone();
            for (key, value) in override_map {
                let merged_value = match merged.get(key) {
                    Some(existing) => deep_merge(existing, value),
                    None => value.clone(),
                };
                merged.insert(key.clone(), merged_value);
            }
            Value::Object(merged)
        }
        _ => override_value.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::HashMap;
    use std::path::PathBuf;

    fn service_in(dir: &Path) -> ConfigService {
        ConfigService::new(Arc::new(AppPaths {
            project_root: dir.to_path_buf(),
            config_path: dir.join("felix.yml"),
        }))
    }

    #[test]
    fn deep_merge_merges_objects_and_overrides_scalars() {
        let base = json!({
            "model": "a",
            "rag": { "enabled": true, "top_k": 3 }
        });
        let override_value = json!({
            "rag": { "top_k": 5 },
            "host": "http://example:11434"
        });

        let merged = deep_merge(&base, &override_value);

        assert_eq!(
            merged,
            json!({
                "model": "a",
                "host": "http://example:11434",
                "rag": { "enabled": true, "top_k": 5 }
            })
        );
    }

    #[test]
    fn env_overrides_map_known_variables() {
        let vars: HashMap<&str, &str> = [
            ("OLLAMA_MODEL", "llama3.2:3b"),
            ("OLLAMA_HOST", "http://gpu-box:11434"),
            ("FELIX_RAG_ENABLED", "off"),
            ("FELIX_RAG_TOP_K", "5"),
        ]
        .into_iter()
        .collect();

        let value = env_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .expect("env overrides should parse");

        assert_eq!(value["model"], "llama3.2:3b");
        assert_eq!(value["host"], "http://gpu-box:11434");
        assert_eq!(value["rag"]["enabled"], false);
        assert_eq!(value["rag"]["top_k"], 5);
    }

    #[test]
    fn env_overrides_reject_garbage_numbers() {
        let result = env_overrides(|key| (key == "FELIX_RAG_TOP_K").then(|| "many".to_string()));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn load_config_reads_yaml_file_and_anchors_paths() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(
            dir.path().join("felix.yml"),
            "model: mistral:7b\nrag:\n  data_dir: notes\n  top_k: 2\n",
        )
        .expect("write config");

        let config = service_in(dir.path())
            .load_config(&json!({ "rag": { "enabled": false } }))
            .expect("config should load");

        assert!(!config.rag.enabled);
        assert_eq!(config.rag.top_k, 2);
        assert_eq!(config.rag.data_dir, dir.path().join("notes"));
        assert_eq!(config.search.max_results, 3);
        assert!(config.log_dir.starts_with(dir.path()));
        // Environment may override the model on developer machines.
        if env::var("OLLAMA_MODEL").is_err() {
            assert_eq!(config.model, "mistral:7b");
        }
    }

    #[test]
    fn load_config_rejects_non_mapping_files() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("felix.yml"), "- just\n- a list\n").expect("write config");

        let result = service_in(dir.path()).load_config(&json!({}));
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let value = load_yaml_file(&PathBuf::from("/definitely/not/here/felix.yml"))
            .expect("missing file is not an error");
        assert_eq!(value, json!({}));
    }
}
