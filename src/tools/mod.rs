pub mod search;

pub use search::{SearchResult, WebSearch, WebSearchTool};
