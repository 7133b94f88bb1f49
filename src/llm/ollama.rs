use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};

use super::provider::{LlmProvider, ProviderFactory};
use super::types::ChatRequest;
use crate::core::errors::AppError;

const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(5);
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct OllamaProvider {
    base_url: String,
    model: String,
    client: Client,
}

impl OllamaProvider {
    pub fn new(base_url: &str, model: &str) -> Self {
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .unwrap_or_else(|_| Client::new());
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            client,
        }
    }

    pub fn factory() -> ProviderFactory {
        Arc::new(|host: &str, model: &str| -> Arc<dyn LlmProvider> {
            Arc::new(OllamaProvider::new(host, model))
        })
    }
}

#[async_trait]
impl LlmProvider for OllamaProvider {
    fn host(&self) -> &str {
        &self.base_url
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn health_check(&self) -> Result<(), AppError> {
        let url = format!("{}/api/tags", self.base_url);
        let res = self
            .client
            .get(&url)
            .header("Content-Type", "application/json")
            .timeout(HEALTH_CHECK_TIMEOUT)
            .send()
            .await
            .map_err(AppError::internal)?;

        if !res.status().is_success() {
            return Err(AppError::Internal(format!(
                "Ollama unreachable (status {})",
                res.status().as_u16()
            )));
        }
        Ok(())
    }

    async fn chat(&self, request: ChatRequest) -> Result<String, AppError> {
        let url = format!("{}/api/chat", self.base_url);

        let body = json!({
            "model": self.model,
            "messages": request.messages,
            "stream": false,
        });

        let res = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(AppError::model)?;

        if !res.status().is_success() {
            let status = res.status();
            let text = res.text().await.unwrap_or_default();
            return Err(AppError::Model(format!(
                "Ollama chat error ({}): {}",
                status, text
            )));
        }

        let payload: Value = res.json().await.map_err(AppError::model)?;
        let content = match &payload["message"]["content"] {
            Value::String(text) => text.clone(),
            Value::Null => {
                return Err(AppError::Model(
                    "Ollama response did not contain a message".to_string(),
                ))
            }
            other => other.to_string(),
        };

        Ok(content)
    }
}
