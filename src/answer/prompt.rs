//! Prompt assembly from retrieved records.

use crate::retrieval::engine::QueryResult;

/// Render retrieved records as the LLM context block.
///
/// One paragraph per record: text, isnad and grade on separate lines.
#[must_use]
pub fn build_context(results: &[QueryResult]) -> String {
    results
        .iter()
        .map(|result| {
            let record = &result.record;
            format!(
                "{}\n{}\n{}",
                record.primary_text, record.attribution, record.reliability_grade
            )
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

/// Build the user turn sent alongside the system prompt.
#[must_use]
pub fn build_user_message(context: &str, query: &str) -> String {
    format!("Context:\n{context}\n\nQuery: {query}")
}
