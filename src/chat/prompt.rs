use crate::tools::search::{format_search_results, SearchResult};

pub const WEB_RESULTS_HEADER: &str = "Web Search Results:\n";
pub const PAGE_EXCERPT_CHARS: usize = 2000;

const CONTEXT_INSTRUCTIONS: &str = "Use the context above when it is relevant to the question. \
If you rely on the web search results, say so by adding \"(from web search)\". \
If the context does not help, answer from your own knowledge and state \"(no web search used)\".";

const NO_CONTEXT_INSTRUCTIONS: &str =
    "Answer from your own knowledge and state \"(no web search used)\".";

/// Build the text sent to the model in place of the user's latest message.
pub fn build_augmented_prompt(user_text: &str, context_blocks: &[String]) -> String {
    if context_blocks.is_empty() {
        return format!("{}\n\n{}", user_text, NO_CONTEXT_INSTRUCTIONS);
    }
    format!(
        "{}\n\n{}\n\n{}",
        user_text,
        context_blocks.join("\n\n"),
        CONTEXT_INSTRUCTIONS
    )
}

pub fn web_results_block(results: &[SearchResult]) -> String {
    format!("{}{}", WEB_RESULTS_HEADER, format_search_results(results))
}

pub fn page_excerpt_block(title: &str, content: &str) -> String {
    let excerpt: String = content.chars().take(PAGE_EXCERPT_CHARS).collect();
    format!("Content from {}:\n{}...", title, excerpt)
}
