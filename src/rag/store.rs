//! In-memory document index for the local RAG pipeline.

use crate::core::errors::AppError;
use crate::vector_math::rank_descending_by_cosine;

/// One loaded document with its embedding.
#[derive(Debug, Clone)]
pub struct IndexedDocument {
    /// File name the document was read from.
    pub source: String,
    /// The full text content.
    pub content: String,
    pub embedding: Vec<f32>,
}

/// Result of a similarity search.
#[derive(Debug, Clone)]
pub struct DocumentMatch<'a> {
    pub document: &'a IndexedDocument,
    /// Similarity score (higher = better).
    pub score: f32,
}

#[derive(Debug, Clone, Default)]
pub struct MemoryIndex {
    documents: Vec<IndexedDocument>,
    embeddings: Vec<Vec<f32>>,
}

impl MemoryIndex {
    pub fn new(documents: Vec<IndexedDocument>) -> Self {
        let embeddings = documents.iter().map(|d| d.embedding.clone()).collect();
        Self {
            documents,
            embeddings,
        }
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    pub fn search(
        &self,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<DocumentMatch<'_>>, AppError> {
        let ranked = rank_descending_by_cosine(query_embedding, &self.embeddings)?;
        Ok(ranked
            .into_iter()
            .take(limit)
            .map(|(idx, score)| DocumentMatch {
                document: &self.documents[idx],
                score,
            })
            .collect())
    }
}
