use std::sync::Arc;

use super::intent::{IntentClassifier, KeywordIntentClassifier, SiteQuery};
use super::prompt::{build_augmented_prompt, page_excerpt_block, web_results_block};
use super::session::ConversationState;
use crate::core::config::AppConfig;
use crate::core::errors::AppError;
use crate::core::logging::truncate_for_log;
use crate::llm::{ChatMessage, ChatRequest, LlmProvider, OllamaProvider, ProviderFactory};
use crate::rag::{RagConfig, RagService};
use crate::tools::search::{SearchResult, WebSearch, WebSearchTool};

const LOG_PREVIEW_CHARS: usize = 400;

/// Outcome of the search branch of one turn.
enum SearchContext {
    Fresh {
        results_block: String,
        page_block: Option<String>,
    },
    Reused(String),
    Skipped,
}

/// Drives one conversation: history, connectivity, context assembly and the
/// model call. Turns are processed one at a time (`&mut self`).
pub struct ChatService {
    state: ConversationState,
    system_prompt: String,
    max_results: usize,
    provider: Arc<dyn LlmProvider>,
    provider_factory: ProviderFactory,
    web: Arc<dyn WebSearch>,
    rag: Option<RagService>,
    intent: Arc<dyn IntentClassifier>,
}

pub struct ChatServiceBuilder {
    config: AppConfig,
    provider_factory: Option<ProviderFactory>,
    web: Option<Arc<dyn WebSearch>>,
    intent: Option<Arc<dyn IntentClassifier>>,
}

impl ChatServiceBuilder {
    pub fn provider_factory(mut self, factory: ProviderFactory) -> Self {
        self.provider_factory = Some(factory);
        self
    }

    pub fn web_search(mut self, web: Arc<dyn WebSearch>) -> Self {
        self.web = Some(web);
        self
    }

    pub fn intent_classifier(mut self, intent: Arc<dyn IntentClassifier>) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn build(self) -> Result<ChatService, AppError> {
        let config = self.config;
        let rag = if config.rag.enabled {
            let rag_config = RagConfig::new(config.rag.data_dir.clone(), config.rag.top_k)?;
            Some(RagService::new(rag_config))
        } else {
            None
        };

        let provider_factory = self.provider_factory.unwrap_or_else(OllamaProvider::factory);
        let provider = provider_factory(&config.host, &config.model);
        let state = ConversationState::new(
            &config.system_prompt,
            &config.model,
            &config.host,
            rag.is_some(),
        );

        tracing::info!(
            "session:start host={} model={} rag={}",
            state.host,
            state.model,
            if state.rag_enabled { "on" } else { "off" }
        );

        Ok(ChatService {
            state,
            system_prompt: config.system_prompt,
            max_results: config.search.max_results,
            provider,
            provider_factory,
            web: self
                .web
                .unwrap_or_else(|| Arc::new(WebSearchTool::new()) as Arc<dyn WebSearch>),
            rag,
            intent: self
                .intent
                .unwrap_or_else(|| Arc::new(KeywordIntentClassifier) as Arc<dyn IntentClassifier>),
        })
    }
}

impl ChatService {
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        Self::builder(config).build()
    }

    pub fn builder(config: &AppConfig) -> ChatServiceBuilder {
        ChatServiceBuilder {
            config: config.clone(),
            provider_factory: None,
            web: None,
            intent: None,
        }
    }

    /// Process one user turn and return the assistant's reply.
    ///
    /// Only the first-call connectivity probe is reported as `Err`. Model
    /// failures come back as `Ok` text starting with `Error:` so the caller
    /// can show them like any other reply.
    pub async fn try_send_message(&mut self, user_text: &str) -> Result<String, AppError> {
        self.ensure_connection().await?;

        let user_index = self.state.push(ChatMessage::user(user_text));
        tracing::info!("user: {}", truncate_for_log(user_text, LOG_PREVIEW_CHARS));

        let (rag_block, search_context) =
            tokio::join!(self.rag_context(user_text), self.search_context(user_text));

        let mut context_blocks = Vec::new();
        if let Some(block) = rag_block {
            context_blocks.push(block);
        }
        match search_context {
            SearchContext::Fresh {
                results_block,
                page_block,
            } => {
                self.state.cache_search_results(results_block.clone());
                context_blocks.push(results_block);
                context_blocks.extend(page_block);
            }
            SearchContext::Reused(cached) => context_blocks.push(cached),
            SearchContext::Skipped => {}
        }

        let prompt = build_augmented_prompt(user_text, &context_blocks);
        let request = ChatRequest::new(self.state.outgoing_messages(user_index, &prompt));

        match self.provider.chat(request).await {
            Ok(reply) => {
                tracing::info!("assistant: {}", truncate_for_log(&reply, LOG_PREVIEW_CHARS));
                self.state.push(ChatMessage::assistant(reply.clone()));
                Ok(reply)
            }
            Err(err) => {
                tracing::error!(
                    "error: {} host={} model={}",
                    err,
                    self.state.host,
                    self.state.model
                );
                Ok(format!(
                    "Error: {} (host={}, model={})",
                    err, self.state.host, self.state.model
                ))
            }
        }
    }

    /// Like `try_send_message`, but connectivity failures are rendered as
    /// `Error: ...` text too.
    pub async fn send_message(&mut self, user_text: &str) -> String {
        match self.try_send_message(user_text).await {
            Ok(reply) => reply,
            Err(err) => format!("Error: {}", err),
        }
    }

    /// Drops the whole history, system prompt included.
    pub fn clear_history(&mut self) {
        self.state.clear();
    }

    pub fn restore_system_prompt(&mut self) {
        self.state.restore_system_prompt(&self.system_prompt);
    }

    pub fn set_model(&mut self, model_id: &str) {
        self.provider = (self.provider_factory)(self.provider.host(), model_id);
        self.state.model = model_id.to_string();
        tracing::info!("model: switched to {} host={}", model_id, self.state.host);
    }

    pub fn get_history(&self) -> Vec<ChatMessage> {
        self.state.messages().to_vec()
    }

    pub fn model(&self) -> &str {
        &self.state.model
    }

    pub fn host(&self) -> &str {
        &self.state.host
    }

    pub fn rag_enabled(&self) -> bool {
        self.state.rag_enabled
    }

    pub fn rag(&self) -> Option<&RagService> {
        self.rag.as_ref()
    }

    pub fn last_search_results(&self) -> &str {
        self.state.last_search_results()
    }

    async fn ensure_connection(&mut self) -> Result<(), AppError> {
        if self.state.is_connected() {
            return Ok(());
        }

        if let Err(err) = self.provider.health_check().await {
            let message = match err {
                AppError::Internal(message) => message,
                other => other.to_string(),
            };
            tracing::warn!("connect: fail host={} msg={}", self.state.host, message);
            return Err(AppError::Connectivity {
                host: self.state.host.clone(),
                message,
            });
        }

        tracing::info!("connect: ok host={}", self.state.host);
        self.state.mark_connected();
        Ok(())
    }

    async fn rag_context(&self, user_text: &str) -> Option<String> {
        let rag = self.rag.as_ref()?;
        let context = rag.retrieve_context(user_text).await;
        (!context.is_empty()).then_some(context)
    }

    async fn search_context(&self, user_text: &str) -> SearchContext {
        if self.intent.is_search_request(user_text) {
            let query = self.intent.search_query(user_text);
            tracing::info!("search: {}", query);

            let results = self.run_search(&query).await;
            let Some(top) = results.first() else {
                tracing::info!("search: no results for {}", query);
                return SearchContext::Skipped;
            };

            let page = self.web.fetch_page_content(&top.url).await;
            let page_block = if page.is_empty() {
                tracing::info!("fetch: no content from {}", top.url);
                None
            } else {
                Some(page_excerpt_block(&top.title, &page))
            };

            return SearchContext::Fresh {
                results_block: web_results_block(&results),
                page_block,
            };
        }

        let cached = self.state.last_search_results();
        if !cached.is_empty() && self.intent.is_context_reference(user_text) {
            tracing::info!("search: reusing cached results");
            return SearchContext::Reused(cached.to_string());
        }

        SearchContext::Skipped
    }

    async fn run_search(&self, query: &str) -> Vec<SearchResult> {
        if let Some(site) = SiteQuery::parse(query) {
            let direct = self
                .web
                .search_domain_direct(&site.domain, &site.term, self.max_results)
                .await;
            if !direct.is_empty() {
                return direct;
            }
            tracing::info!("search: direct search on {} empty, using engine", site.domain);
        }
        self.web.search(query, self.max_results).await
    }
}
