use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Cannot reach Ollama at {host}. Is it running and reachable from here? ({message})")]
    Connectivity { host: String, message: String },
    #[error("model error: {0}")]
    Model(String),
    #[error("bad request: {0}")]
    BadRequest(String),
    #[error("invalid config: {0}")]
    Config(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    pub fn internal<E: std::fmt::Display>(err: E) -> Self {
        AppError::Internal(err.to_string())
    }

    pub fn model<E: std::fmt::Display>(err: E) -> Self {
        AppError::Model(err.to_string())
    }
}

/// Collapse a failed best-effort operation into its empty value, logging why.
pub fn degrade<T: Default>(operation: &str, result: Result<T, AppError>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => {
            tracing::warn!("{} failed, continuing without it: {}", operation, err);
            T::default()
        }
    }
}
