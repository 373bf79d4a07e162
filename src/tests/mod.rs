//! Cross-module tests driven by a deterministic stub embedder.

mod web;

use crate::corpus::{CorpusStore, Record};
use crate::semantic::{Embedder, EmbeddingError, SearchSettings, SimilarityService};

/// Words the stub embedder knows; one dimension each.
const VOCAB: [&str; 12] = [
    "theft", "delhi", "2020", "robbery", "mumbai", "2019", "murder", "pune", "fraud", "bank",
    "chennai", "2021",
];

/// Bag-of-words counts over `VOCAB`. Unknown words are ignored, so text with
/// no known word embeds to the zero vector.
pub struct VocabEmbedder;

impl Embedder for VocabEmbedder {
    fn name(&self) -> &str {
        "vocab-stub"
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        Ok(texts.iter().map(|text| vocab_vector(text)).collect())
    }
}

fn vocab_vector(text: &str) -> Vec<f32> {
    let mut v = vec![0.0; VOCAB.len()];
    for token in text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| !t.is_empty())
    {
        let token = token.to_lowercase();
        if let Some(idx) = VOCAB.iter().position(|w| *w == token) {
            v[idx] += 1.0;
        }
    }
    v
}

/// Embeds the corpus fine, fails on every query.
pub struct BrokenQueryEmbedder;

impl Embedder for BrokenQueryEmbedder {
    fn name(&self) -> &str {
        "broken-stub"
    }

    fn dimensions(&self) -> usize {
        VOCAB.len()
    }

    fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
        Err(EmbeddingError::EmbeddingFailed("numeric failure".to_string()))
    }

    fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        VocabEmbedder.embed_batch(texts)
    }
}

pub fn corpus(rows: &[(&str, &str, &str, &str)]) -> CorpusStore {
    CorpusStore::from_records(
        rows.iter()
            .map(|(crime, place, year, accused)| Record::new(*crime, *place, *year, *accused))
            .collect(),
    )
}

pub fn sample_corpus() -> CorpusStore {
    corpus(&[
        ("Theft", "Delhi", "2020", "2"),
        ("Robbery", "Mumbai", "2019", "3"),
        ("Theft", "DELHI", "2020", "7"),
        ("Murder", "Pune", "2021", ""),
        ("Fraud", "", "", "1"),
    ])
}

pub fn service(corpus: CorpusStore) -> SimilarityService {
    SimilarityService::build(corpus, Box::new(VocabEmbedder), SearchSettings::default()).unwrap()
}
