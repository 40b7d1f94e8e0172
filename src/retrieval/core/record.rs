//! Corpus record type.

/// One retrievable hadith passage.
///
/// Records are loaded once at startup and never mutated; the store hands them
/// out behind `Arc` so query results can share them cheaply.
#[derive(Clone, Debug, PartialEq)]
pub struct Record {
    /// Chapter identifier (numeric or textual in the source files).
    pub chapter_number: String,
    /// Hadith number within the chapter; `None` when the source left it blank.
    pub sequence_number: Option<i64>,
    /// Passage in the query language (English). Never blank.
    pub primary_text: String,
    /// Passage in its original language (Arabic). Never blank.
    pub source_text: String,
    /// Chain of narrators (isnad).
    pub attribution: String,
    /// Substantive excerpt (matn).
    pub body: String,
    /// Reliability grade label.
    pub reliability_grade: String,
    /// Precomputed embedding of the normalized `primary_text`.
    pub embedding: Vec<f32>,
}
