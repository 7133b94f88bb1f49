//! Local RAG (Retrieval-Augmented Generation) module.
//!
//! This module provides:
//! - `embedding`: a deterministic hashing embedding (no model download)
//! - `MemoryIndex`: an in-memory document store ranked by cosine similarity
//! - `RagService`: lazy, single-flight index build over a data directory

pub mod embedding;
mod service;
mod store;

pub use service::{RagConfig, RagService};
pub use store::{DocumentMatch, IndexedDocument, MemoryIndex};
