pub mod chat;
pub mod core;
pub mod llm;
pub mod rag;
pub mod repl;
pub mod tools;
pub mod vector_math;
