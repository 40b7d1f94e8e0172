//! Answer generation on top of retrieval.
//!
//! - `mode`: Concise and detailed answer modes with their prompts
//! - `prompt`: Context and user message assembly
//! - `completion`: Hosted chat model behind the `AnswerModel` trait
//! - `errors`: LLM and end-to-end query failures
//! - `format`: Markdown-ish reply to HTML
//! - `pipeline`: The end-to-end query flow

pub mod completion;
pub mod errors;
pub mod format;
pub mod mode;
pub mod pipeline;
pub mod prompt;

pub use completion::{AnswerFuture, AnswerModel, GroqAnswerModel};
pub use errors::{AnswerError, AnswerResult, QueryError};
pub use format::ResponseFormatter;
pub use mode::AnswerMode;
pub use pipeline::{Answer, AnswerPipeline};
pub use prompt::{build_context, build_user_message};
