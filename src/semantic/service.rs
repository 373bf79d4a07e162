//! Similarity search service over the crime-record corpus.
//!
//! Owns the corpus, the embedder and the index:
//! - `build` embeds the whole corpus once and fills the index
//! - after `build` returns nothing is mutated, so the service can be shared
//!   across request handlers behind an `Arc` without locking
//! - `search_text`/`search_upload` run one query end to end

use std::time::Instant;

use crate::corpus::CorpusStore;
use crate::errors::AppError;
use crate::semantic::embeddings::{is_finite, normalize_vector, Embedder, EmbeddingError};
use crate::semantic::index::{FlatIndex, IndexError, SearchHit};
use crate::semantic::matches::{self, SearchResponse, DEFAULT_THRESHOLD, DEFAULT_TOP_K};
use crate::semantic::preprocess::normalize_upload;

/// Errors that can occur while building the service.
#[derive(Debug, thiserror::Error)]
pub enum SemanticSearchError {
    #[error("Embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("Index error: {0}")]
    Index(#[from] IndexError),
}

/// Query-time knobs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchSettings {
    /// Minimum rounded similarity, inclusive
    pub threshold: f64,
    /// Raw hits taken from the index per query
    pub top_k: usize,
}

impl Default for SearchSettings {
    fn default() -> Self {
        Self {
            threshold: DEFAULT_THRESHOLD,
            top_k: DEFAULT_TOP_K,
        }
    }
}

pub struct SimilarityService {
    corpus: CorpusStore,
    index: FlatIndex,
    embedder: Box<dyn Embedder>,
    settings: SearchSettings,
}

impl SimilarityService {
    /// Embed every record and build the index.
    ///
    /// Returns only once the index is complete; callers must not start
    /// serving before this succeeds.
    pub fn build(
        corpus: CorpusStore,
        embedder: Box<dyn Embedder>,
        settings: SearchSettings,
    ) -> Result<Self, SemanticSearchError> {
        let now = Instant::now();
        log::info!(
            "embedding {} records with model '{}'",
            corpus.len(),
            embedder.name()
        );

        let texts: Vec<String> = corpus.iter().map(|r| r.processed_text.clone()).collect();
        let mut embeddings = embedder.embed_batch(&texts)?;

        if embeddings.len() != corpus.len() {
            return Err(EmbeddingError::EmbeddingFailed(format!(
                "expected {} embeddings, model returned {}",
                corpus.len(),
                embeddings.len()
            ))
            .into());
        }

        for embedding in embeddings.iter_mut() {
            if !is_finite(embedding) {
                return Err(EmbeddingError::NonFinite.into());
            }
            normalize_vector(embedding);
        }

        let mut index = FlatIndex::new(embedder.dimensions());
        index.build(embeddings)?;

        assert_eq!(
            index.len(),
            corpus.len(),
            "index and corpus must stay aligned"
        );

        log::info!(
            "index built: {} vectors of {} dimensions in {}ms",
            index.len(),
            index.dimensions(),
            now.elapsed().as_millis()
        );

        Ok(Self {
            corpus,
            index,
            embedder,
            settings,
        })
    }

    pub fn corpus_len(&self) -> usize {
        self.corpus.len()
    }

    pub fn dimensions(&self) -> usize {
        self.index.dimensions()
    }

    pub fn model_name(&self) -> &str {
        self.embedder.name()
    }

    pub fn settings(&self) -> SearchSettings {
        self.settings
    }

    /// Decode an uploaded document and search with it.
    pub fn search_upload(&self, bytes: &[u8]) -> Result<SearchResponse, AppError> {
        self.search_text(&normalize_upload(bytes))
    }

    /// Search with already-normalized query text.
    ///
    /// Empty text is rejected before it reaches the model.
    pub fn search_text(&self, query_text: &str) -> Result<SearchResponse, AppError> {
        if query_text.is_empty() {
            return Err(AppError::empty_file());
        }

        let hits = self.raw_search(query_text)?;
        log::debug!("{} raw hits for query of {} bytes", hits.len(), query_text.len());

        let results = matches::process(
            &hits,
            query_text,
            &self.corpus,
            self.settings.threshold,
            self.settings.top_k,
        );

        Ok(results.into())
    }

    fn raw_search(&self, query_text: &str) -> Result<Vec<SearchHit>, AppError> {
        let mut query = self.embedder.embed(query_text)?;
        if !is_finite(&query) {
            return Err(EmbeddingError::NonFinite.into());
        }
        normalize_vector(&mut query);

        Ok(self.index.search(&query, self.settings.top_k)?)
    }
}
