//! Text preprocessing for embedding input.
//!
//! Both the corpus build and the upload path go through here so the
//! embedding model always sees the same canonical form:
//! 1. Records: `"{crime_type} {place}"`, lowercased
//! 2. Uploads: lossy UTF-8 decode, trim, lowercase

/// Build the search string for a corpus record.
///
/// Missing fields arrive as empty strings, so the separator is always present.
pub fn record_text(crime_type: &str, place: &str) -> String {
    format!("{} {}", crime_type, place).to_lowercase()
}

/// Decode an uploaded document into query text.
///
/// Invalid UTF-8 sequences are dropped rather than replaced, so a few bad
/// bytes never leak `U+FFFD` into the query.
pub fn normalize_upload(bytes: &[u8]) -> String {
    let decoded: String = bytes
        .utf8_chunks()
        .map(|chunk| chunk.valid())
        .collect();

    decoded.trim().to_lowercase()
}
