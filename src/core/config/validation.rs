use serde_json::{Map, Value};

use crate::core::errors::AppError;

pub fn validate_config(config: &Value) -> Result<(), AppError> {
    let root = config
        .as_object()
        .ok_or_else(|| config_type_error("root", "object"))?;

    validate_required_string_field(root, "model", "model")?;
    validate_required_string_field(root, "host", "host")?;
    validate_host(root)?;
    validate_optional_string_field(root, "system_prompt", "system_prompt")?;
    validate_optional_string_field(root, "log_dir", "log_dir")?;

    if let Some(rag) = expect_optional_object(root, "rag")? {
        validate_bool_field(rag, "rag.enabled", "enabled")?;
        validate_optional_string_field(rag, "rag.data_dir", "data_dir")?;
        validate_u64_field(rag, "rag.top_k", "top_k", 1, 100)?;
    }

    if let Some(search) = expect_optional_object(root, "search")? {
        validate_u64_field(search, "search.max_results", "max_results", 1, 25)?;
    }

    Ok(())
}

fn validate_host(root: &Map<String, Value>) -> Result<(), AppError> {
    let Some(host) = root.get("host").and_then(|v| v.as_str()) else {
        return Ok(());
    };
    let parsed = reqwest::Url::parse(host.trim())
        .map_err(|e| AppError::Config(format!("Invalid config at 'host': {}", e)))?;
    if parsed.scheme() != "http" && parsed.scheme() != "https" {
        return Err(AppError::Config(
            "Invalid config at 'host': only http/https hosts are supported".to_string(),
        ));
    }
    Ok(())
}

fn expect_optional_object<'a>(
    root: &'a Map<String, Value>,
    key: &str,
) -> Result<Option<&'a Map<String, Value>>, AppError> {
    match root.get(key) {
        Some(Value::Object(map)) => Ok(Some(map)),
        Some(_) => Err(config_type_error(key, "object")),
        None => Ok(None),
    }
}

fn validate_bool_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), AppError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_bool().is_some() {
        return Ok(());
    }
    Err(config_type_error(path, "boolean"))
}

fn validate_u64_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
    min: u64,
    max: u64,
) -> Result<(), AppError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    let Some(number) = value.as_u64() else {
        return Err(config_type_error(path, "integer"));
    };
    if number < min || number > max {
        return Err(AppError::Config(format!(
            "Invalid config at '{}': must be between {} and {}",
            path, min, max
        )));
    }
    Ok(())
}

fn validate_required_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), AppError> {
    let value = section.get(key).ok_or_else(|| {
        AppError::Config(format!("Invalid config at '{}': value is required", path))
    })?;
    let Some(text) = value.as_str() else {
        return Err(config_type_error(path, "string"));
    };
    if text.trim().is_empty() {
        return Err(AppError::Config(format!(
            "Invalid config at '{}': value cannot be empty",
            path
        )));
    }
    Ok(())
}

fn validate_optional_string_field(
    section: &Map<String, Value>,
    path: &str,
    key: &str,
) -> Result<(), AppError> {
    let Some(value) = section.get(key) else {
        return Ok(());
    };
    if value.as_str().is_none() {
        return Err(config_type_error(path, "string"));
    }
    Ok(())
}

fn config_type_error(path: &str, expected: &str) -> AppError {
    AppError::Config(format!(
        "Invalid config at '{}': expected {}",
        path, expected
    ))
}
