use std::sync::Arc;

use async_trait::async_trait;

use super::types::ChatRequest;
use crate::core::errors::AppError;

/// A chat-completion backend bound to one host and one model.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn host(&self) -> &str;

    fn model(&self) -> &str;

    /// cheap reachability probe against the host's status endpoint
    async fn health_check(&self) -> Result<(), AppError>;

    /// chat completion (non-streaming)
    async fn chat(&self, request: ChatRequest) -> Result<String, AppError>;
}

/// Builds a provider handle for `(host, model)`; used again whenever the
/// active model changes.
pub type ProviderFactory = Arc<dyn Fn(&str, &str) -> Arc<dyn LlmProvider> + Send + Sync>;
