use serde_json::{json, Value};

pub const DEFAULT_MODEL: &str = "qwen3:4b";
pub const DEFAULT_HOST: &str = "http://127.0.0.1:11434";
pub const DEFAULT_DATA_DIR: &str = "./data";
pub const DEFAULT_LOG_DIR: &str = "./logs";
pub const DEFAULT_TOP_K: usize = 3;
pub const DEFAULT_MAX_RESULTS: usize = 3;

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are Felix, a helpful assistant running on a local model. \
Answer clearly and concisely. When the user message includes retrieved notes or web search \
results, ground your answer in them and say where the information came from.";

/// Base layer that every other config source is merged over.
pub fn default_config() -> Value {
    json!({
        "model": DEFAULT_MODEL,
        "host": DEFAULT_HOST,
        "system_prompt": DEFAULT_SYSTEM_PROMPT,
        "rag": {
            "enabled": true,
            "data_dir": DEFAULT_DATA_DIR,
            "top_k": DEFAULT_TOP_K,
        },
        "search": {
            "max_results": DEFAULT_MAX_RESULTS,
        },
        "log_dir": DEFAULT_LOG_DIR,
    })
}
