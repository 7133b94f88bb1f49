use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use tokio::sync::OnceCell;

use super::embedding::embed_text;
use super::store::{IndexedDocument, MemoryIndex};
use crate::core::config::defaults::{DEFAULT_DATA_DIR, DEFAULT_TOP_K};
use crate::core::errors::AppError;

const TEXT_EXTENSIONS: [&str; 3] = ["txt", "md", "mdx"];
const CONTEXT_HEADER: &str = "Retrieved Context:";

#[derive(Debug, Clone)]
pub struct RagConfig {
    data_dir: PathBuf,
    top_k: usize,
}

impl RagConfig {
    pub fn new(data_dir: impl Into<PathBuf>, top_k: usize) -> Result<Self, AppError> {
        if top_k == 0 {
            return Err(AppError::Config("rag top_k must be at least 1".to_string()));
        }
        Ok(Self {
            data_dir: data_dir.into(),
            top_k,
        })
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn top_k(&self) -> usize {
        self.top_k
    }
}

impl Default for RagConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            top_k: DEFAULT_TOP_K,
        }
    }
}

#[derive(Debug)]
enum IndexState {
    Ready(MemoryIndex),
    /// No directory or no usable documents.
    Empty,
    /// The build failed; retrieval stays off for this instance.
    Disabled,
}

/// Answers similarity queries over the text files of one directory.
///
/// The index is built on first use. `OnceCell` gives single-flight semantics:
/// concurrent callers await the same in-flight build, and the outcome
/// (including failure) is kept until the service is dropped.
#[derive(Debug)]
pub struct RagService {
    config: RagConfig,
    index: OnceCell<IndexState>,
}

impl RagService {
    pub fn new(config: RagConfig) -> Self {
        Self {
            config,
            index: OnceCell::new(),
        }
    }

    pub async fn ensure_ready(&self) {
        self.state().await;
    }

    /// Number of indexed documents, or `None` when retrieval is unavailable.
    pub async fn document_count(&self) -> Option<usize> {
        match self.state().await {
            IndexState::Ready(index) => Some(index.len()),
            IndexState::Empty => Some(0),
            IndexState::Disabled => None,
        }
    }

    /// Top-K documents for `query` under a `Retrieved Context:` header, or an
    /// empty string when nothing can be retrieved.
    pub async fn retrieve_context(&self, query: &str) -> String {
        let IndexState::Ready(index) = self.state().await else {
            return String::new();
        };

        let matches = match index.search(&embed_text(query), self.config.top_k) {
            Ok(matches) => matches,
            Err(err) => {
                tracing::warn!("rag: query failed: {}", err);
                return String::new();
            }
        };

        for m in &matches {
            tracing::debug!("rag: matched {} score={:.3}", m.document.source, m.score);
        }

        let parts: Vec<String> = matches
            .iter()
            .map(|m| m.document.content.trim())
            .filter(|text| !text.is_empty())
            .enumerate()
            .map(|(idx, text)| format!("({}) {}", idx + 1, text))
            .collect();

        if parts.is_empty() {
            return String::new();
        }
        format!("{}\n{}", CONTEXT_HEADER, parts.join("\n\n"))
    }

    async fn state(&self) -> &IndexState {
        self.index
            .get_or_init(|| build_index(self.config.data_dir.clone()))
            .await
    }
}

async fn build_index(data_dir: PathBuf) -> IndexState {
    match load_documents(&data_dir).await {
        Ok(documents) if documents.is_empty() => {
            tracing::info!("rag: no documents in {}", data_dir.display());
            IndexState::Empty
        }
        Ok(documents) => {
            tracing::info!(
                "rag: indexed {} documents from {}",
                documents.len(),
                data_dir.display()
            );
            IndexState::Ready(MemoryIndex::new(documents))
        }
        Err(err) => {
            tracing::error!("rag: index build failed, disabling retrieval: {}", err);
            IndexState::Disabled
        }
    }
}

async fn load_documents(data_dir: &Path) -> Result<Vec<IndexedDocument>, AppError> {
    let mut entries = match tokio::fs::read_dir(data_dir).await {
        Ok(entries) => entries,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(AppError::internal(err)),
    };

    let mut files = Vec::new();
    while let Some(entry) = entries.next_entry().await.map_err(AppError::internal)? {
        let file_type = entry.file_type().await.map_err(AppError::internal)?;
        let path = entry.path();
        if file_type.is_file() && is_text_file(&path) {
            files.push(path);
        }
    }
    files.sort();

    let mut documents = Vec::with_capacity(files.len());
    for path in files {
        let bytes = tokio::fs::read(&path).await.map_err(AppError::internal)?;
        let content = String::from_utf8_lossy(&bytes).into_owned();
        if content.trim().is_empty() {
            continue;
        }
        let source = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        documents.push(IndexedDocument {
            embedding: embed_text(&content),
            source,
            content,
        });
    }

    Ok(documents)
}

fn is_text_file(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            let ext = ext.to_ascii_lowercase();
            TEXT_EXTENSIONS.contains(&ext.as_str())
        })
        .unwrap_or(false)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use std::sync::Arc;

    fn write_notes(dir: &Path) {
        fs::write(
            dir.join("note1.txt"),
            "TypeScript is great for large JavaScript applications.",
        )
        .expect("write note1");
        fs::write(
            dir.join("note2.md"),
            "Ollama serves local LLMs via HTTP on port 11434.",
        )
        .expect("write note2");
    }

    #[test]
    fn config_rejects_zero_top_k() {
        assert!(RagConfig::new("./data", 0).is_err());
        assert_eq!(RagConfig::new("./data", 2).expect("valid").top_k(), 2);
    }

    #[test]
    fn text_file_filter_matches_known_extensions() {
        assert!(is_text_file(Path::new("a.txt")));
        assert!(is_text_file(Path::new("b.MD")));
        assert!(is_text_file(Path::new("c.mdx")));
        assert!(!is_text_file(Path::new("d.pdf")));
        assert!(!is_text_file(Path::new("README")));
    }

    #[tokio::test]
    async fn builds_an_index_and_retrieves_relevant_context() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_notes(dir.path());

        let rag = RagService::new(RagConfig::new(dir.path(), 2).expect("config"));
        let ctx = rag.retrieve_context("How do I run local LLMs?").await;

        assert!(ctx.starts_with("Retrieved Context:\n(1) "));
        assert!(ctx.contains("11434"));
        assert!(ctx.contains("(2) "));
        assert_eq!(rag.document_count().await, Some(2));
    }

    #[tokio::test]
    async fn top_k_limits_the_number_of_documents() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_notes(dir.path());
        fs::write(dir.path().join("note3.mdx"), "A third note.").expect("write");

        let rag = RagService::new(RagConfig::new(dir.path(), 1).expect("config"));
        let ctx = rag.retrieve_context("note").await;

        assert!(ctx.contains("(1) "));
        assert!(!ctx.contains("(2) "));
    }

    #[tokio::test]
    async fn ignores_other_extensions_blank_files_and_subdirectories() {
        let dir = tempfile::tempdir().expect("tempdir");
        fs::write(dir.path().join("data.json"), "{\"port\": 11434}").expect("write");
        fs::write(dir.path().join("blank.txt"), "   \n\t").expect("write");
        fs::create_dir(dir.path().join("nested")).expect("mkdir");
        fs::write(dir.path().join("nested").join("deep.txt"), "deep note").expect("write");

        let rag = RagService::new(RagConfig::new(dir.path(), 3).expect("config"));
        assert_eq!(rag.retrieve_context("port").await, "");
        assert_eq!(rag.document_count().await, Some(0));
        assert!(rag.document_count().await.is_some());
    }

    #[tokio::test]
    async fn missing_directory_is_an_empty_index() {
        let dir = tempfile::tempdir().expect("tempdir");
        let rag = RagService::new(RagConfig::new(dir.path().join("absent"), 3).expect("config"));

        assert_eq!(rag.retrieve_context("anything").await, "");
        assert!(rag.document_count().await.is_some());
    }

    #[tokio::test]
    async fn build_failure_disables_retrieval_without_retry() {
        let dir = tempfile::tempdir().expect("tempdir");
        let data_path = dir.path().join("data");
        fs::write(&data_path, "not a directory").expect("write");

        let rag = RagService::new(RagConfig::new(&data_path, 3).expect("config"));
        assert_eq!(rag.retrieve_context("anything").await, "");
        assert_eq!(rag.document_count().await, None);

        fs::remove_file(&data_path).expect("remove");
        fs::create_dir(&data_path).expect("mkdir");
        write_notes(&data_path);

        assert_eq!(rag.retrieve_context("local LLMs").await, "");
        assert_eq!(rag.document_count().await, None);
    }

    #[tokio::test]
    async fn concurrent_callers_share_one_build() {
        let dir = tempfile::tempdir().expect("tempdir");
        write_notes(dir.path());

        let rag = Arc::new(RagService::new(RagConfig::new(dir.path(), 2).expect("config")));
        let (a, b) = tokio::join!(
            rag.retrieve_context("local LLMs"),
            rag.retrieve_context("local LLMs")
        );
        assert_eq!(a, b);
        assert!(!a.is_empty());

        // The index is memoised: later file changes are not picked up.
        fs::write(dir.path().join("note4.txt"), "late arrival").expect("write");
        rag.ensure_ready().await;
        assert_eq!(rag.document_count().await, Some(2));
    }
}
