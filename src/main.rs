//! Binary entrypoint for the hadith RAG server.
//! Run with: cargo run --bin hadith-rag

use std::process::ExitCode;

use hadith_rag::start_hadith_rag;

/// Load the corpus, model and index, then serve the query API.
fn main() -> ExitCode {
    start_hadith_rag::run()
}
