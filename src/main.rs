use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use serde_json::{json, Map, Value};

use local_felix::chat::ChatService;
use local_felix::core::config::{AppPaths, ConfigService};
use local_felix::core::logging;
use local_felix::repl;

/// Terminal chat with a local Ollama model, grounded in local documents and
/// web search.
#[derive(Parser, Debug)]
#[command(name = "local-felix", version, about, long_about = None)]
struct Cli {
    /// Model identifier served by the host (e.g. qwen3:4b)
    #[arg(long)]
    model: Option<String>,

    /// Base URL of the Ollama host
    #[arg(long)]
    host: Option<String>,

    /// Directory of .txt/.md/.mdx documents used for retrieval
    #[arg(long)]
    data_dir: Option<PathBuf>,

    /// Number of documents retrieved per turn
    #[arg(long)]
    top_k: Option<usize>,

    /// Disable retrieval over local documents
    #[arg(long)]
    no_rag: bool,

    /// Directory for app.log
    #[arg(long)]
    log_dir: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> Value {
        let mut root = Map::new();
        if let Some(model) = &self.model {
            root.insert("model".to_string(), json!(model));
        }
        if let Some(host) = &self.host {
            root.insert("host".to_string(), json!(host));
        }
        if let Some(log_dir) = &self.log_dir {
            root.insert("log_dir".to_string(), json!(log_dir));
        }

        let mut rag = Map::new();
        if self.no_rag {
            rag.insert("enabled".to_string(), json!(false));
        }
        if let Some(data_dir) = &self.data_dir {
            rag.insert("data_dir".to_string(), json!(data_dir));
        }
        if let Some(top_k) = self.top_k {
            rag.insert("top_k".to_string(), json!(top_k));
        }
        if !rag.is_empty() {
            root.insert("rag".to_string(), Value::Object(rag));
        }
        Value::Object(root)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();
    let cli = Cli::parse();

    let paths = Arc::new(AppPaths::new());
    let config = ConfigService::new(paths)
        .load_config(&cli.overrides())
        .context("Failed to load configuration")?;

    logging::init(&config.log_dir);

    let chat = ChatService::new(&config).context("Failed to start chat session")?;
    if let Some(rag) = chat.rag() {
        rag.ensure_ready().await;
        match rag.document_count().await {
            Some(count) => tracing::info!("rag: {} documents ready", count),
            None => tracing::warn!("rag: unavailable for this session"),
        }
    }

    repl::run(chat).await
}
