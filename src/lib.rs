//! Retrieval-augmented question answering over a fixed hadith corpus.

// Hard bans on unsafe or non-idiomatic code
#![deny(unsafe_code)] // No unsafe code anywhere in the crate
#![deny(missing_docs)] // Every public item must be documented
#![deny(non_camel_case_types)]
#![deny(unused_must_use)] // Results and Options must be handled
#![deny(nonstandard_style)]
#![forbid(unsafe_op_in_unsafe_fn)]

// Clippy discipline
#![deny(clippy::all)]
#![deny(clippy::pedantic)]
#![deny(clippy::nursery)]
#![deny(clippy::unwrap_used)] // No unwrap()
#![deny(clippy::expect_used)] // No expect()
#![deny(clippy::panic)] // No panic!()
#![deny(clippy::print_stdout)] // Log through tracing instead
#![deny(clippy::todo)]
#![deny(clippy::unimplemented)]
#![deny(clippy::unwrap_in_result)]
#![deny(clippy::redundant_clone)]
#![deny(clippy::shadow_unrelated)]
#![deny(clippy::too_many_arguments)]
#![deny(clippy::cognitive_complexity)]
#![cfg_attr(test, allow(clippy::unwrap_used, clippy::expect_used, clippy::panic))]

// Robustness
#![deny(overflowing_literals)]

/// Answer generation: answer modes, prompt assembly, LLM calls and HTML formatting.
#[allow(clippy::missing_errors_doc)]
pub mod answer;
/// Retrieval core: normalization, embeddings, vector index, corpus records.
pub mod retrieval;
/// HTTP server and API routes.
#[allow(
    clippy::missing_errors_doc,
    clippy::missing_const_for_fn,
    clippy::unused_async
)]
pub mod server;
/// Entry helpers to start the hadith RAG service.
pub mod start_hadith_rag;
