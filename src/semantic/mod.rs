//! Semantic similarity search over historical crime records.
//!
//! This module provides local semantic search using fastembed-rs for
//! generating embeddings and an exact in-memory vector index.
//!
//! # Architecture
//!
//! - `preprocess`: Text normalization for embedding input
//! - `embeddings`: `Embedder` trait, fastembed wrapper, vector normalization
//! - `index`: Flat index with exhaustive inner-product search
//! - `matches`: Threshold, dedup and explanation of raw hits
//! - `service`: Build-once similarity search service

pub mod embeddings;
mod index;
pub mod matches;
mod preprocess;
mod service;

pub use embeddings::{normalize_vector, Embedder, EmbeddingError, EmbeddingModel};
pub use index::{FlatIndex, IndexError, SearchHit};
pub use matches::{QueryResult, SearchResponse};
pub use preprocess::{normalize_upload, record_text};
pub use service::{SearchSettings, SemanticSearchError, SimilarityService};

/// Default embedding model name
pub const DEFAULT_MODEL: &str = "all-MiniLM-L6-v2";
