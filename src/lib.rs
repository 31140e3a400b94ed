//! BakeBuddy - retrieval-augmented baking recipe assistant
//!
//! # Architecture
//!
//! - **index**: dense embeddings, BM25 sparse vectors, Qdrant storage, ingestion
//! - **rag**: hybrid retrieval with reciprocal rank fusion, prompt assembly,
//!   and the per-question pipeline
//! - **llm**: chat completions, answer generation, relevance judging
//! - **cost**: per-model token pricing
//! - **store**: SQLite log of conversations and feedback
//! - **repl** / **cli**: the interactive chat loop and command-line surface

pub mod errors;
pub mod types;

pub use errors::{BakeError, Result};

pub mod config;
pub mod cost;
pub mod index;
pub mod llm;
pub mod rag;
pub mod store;

// Terminal surface
pub mod cli;
pub mod repl;
