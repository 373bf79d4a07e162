//! Turns raw index hits into the cases shown to the user.
//!
//! Hits are walked in index order (best first): scores are rounded to two
//! decimals, filtered by threshold, deduplicated by case key and explained
//! against the query text. Nothing here reorders hits.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::corpus::{CorpusStore, Record};
use crate::semantic::SearchHit;

/// Default minimum rounded score for a case to be reported
pub const DEFAULT_THRESHOLD: f64 = 0.3;

/// Default number of raw hits considered per query
pub const DEFAULT_TOP_K: usize = 10;

/// Explanation used when no field of the case appears in the query
pub const GENERAL_SIMILARITY: &str = "General similarity in report text.";

const UNKNOWN: &str = "Unknown";
const NOT_AVAILABLE: &str = "N/A";

/// One similar case as returned to the client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryResult {
    #[serde(rename = "Crime")]
    pub crime: String,
    #[serde(rename = "Year")]
    pub year: String,
    #[serde(rename = "Place")]
    pub place: String,
    #[serde(rename = "Accused Count")]
    pub accused_count: String,
    /// Cosine similarity rounded to two decimals
    #[serde(rename = "Similarity Score")]
    pub similarity_score: f64,
    #[serde(rename = "Similarities Found")]
    pub explanation: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResponse {
    pub similar_cases: Vec<QueryResult>,
    pub total_found: usize,
}

impl From<Vec<QueryResult>> for SearchResponse {
    fn from(similar_cases: Vec<QueryResult>) -> Self {
        Self {
            total_found: similar_cases.len(),
            similar_cases,
        }
    }
}

/// Round to two decimal places, halves to even.
pub fn round_score(score: f32) -> f64 {
    (score as f64 * 100.0).round_ties_even() / 100.0
}

/// Post-process raw hits for `query_text` (already normalized).
///
/// # Panics
/// If a hit points past the end of `corpus`. That means the index and the
/// corpus are out of sync, which is a bug and not a user error.
pub fn process(
    raw_matches: &[SearchHit],
    query_text: &str,
    corpus: &CorpusStore,
    threshold: f64,
    k: usize,
) -> Vec<QueryResult> {
    let mut seen: HashSet<(String, String, String)> = HashSet::new();
    let mut results = Vec::new();

    for hit in raw_matches.iter().take(k) {
        let record = corpus.get(hit.position).unwrap_or_else(|| {
            panic!(
                "index returned position {} but corpus has {} records",
                hit.position,
                corpus.len()
            )
        });

        let similarity = round_score(hit.score);
        if similarity < threshold {
            continue;
        }

        if !seen.insert(case_key(record)) {
            continue;
        }

        results.push(QueryResult {
            crime: record.crime_type.clone(),
            year: or_placeholder(&record.year, UNKNOWN),
            place: or_placeholder(&record.place, UNKNOWN),
            accused_count: or_placeholder(&record.accused_count, NOT_AVAILABLE),
            similarity_score: similarity,
            explanation: explain(record, query_text),
        });
    }

    results
}

/// `(crime, place, year)`; year is compared as-is.
fn case_key(record: &Record) -> (String, String, String) {
    (
        record.crime_type.to_lowercase(),
        record.place.to_lowercase(),
        record.year.clone(),
    )
}

fn or_placeholder(value: &str, placeholder: &str) -> String {
    if value.is_empty() {
        placeholder.to_string()
    } else {
        value.to_string()
    }
}

/// Which fields of `record` literally occur in the query, crime → place → year.
pub fn explain(record: &Record, query_text: &str) -> String {
    let contains = |field: &str| query_text.contains(&field.to_lowercase());

    // an empty crime or place always matches; only year is skipped when empty
    let mut clauses = vec![];
    if contains(&record.crime_type) {
        clauses.push(format!("Crime type matches ({})", record.crime_type));
    }
    if contains(&record.place) {
        clauses.push(format!("Location pattern matches ({})", record.place));
    }
    if !record.year.is_empty() && contains(&record.year) {
        clauses.push(format!("Same year of occurrence ({})", record.year));
    }

    if clauses.is_empty() {
        GENERAL_SIMILARITY.to_string()
    } else {
        clauses.join(", ")
    }
}
