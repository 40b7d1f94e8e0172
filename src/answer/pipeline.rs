//! Query pipeline: retrieve, prompt, complete, format.

use std::sync::Arc;

use tracing::{debug, info};

use crate::answer::completion::AnswerModel;
use crate::answer::errors::QueryError;
use crate::answer::format::ResponseFormatter;
use crate::answer::mode::AnswerMode;
use crate::answer::prompt::{build_context, build_user_message};
use crate::retrieval::core::config::{LlmConfig, RetrievalConfig};
use crate::retrieval::core::errors::StartupResult;
use crate::retrieval::engine::{QueryResult, Retriever};

/// Grounded answer to one query.
#[derive(Clone, Debug)]
pub struct Answer {
    /// LLM reply rendered as HTML.
    pub html: String,
    /// Records the reply was grounded on, nearest first.
    pub hadiths: Vec<QueryResult>,
    /// Mode the answer was produced in.
    pub mode: AnswerMode,
}

/// Everything needed to answer a query, shared by all request handlers.
pub struct AnswerPipeline {
    retriever: Arc<Retriever>,
    model: Arc<dyn AnswerModel>,
    formatter: ResponseFormatter,
    llm: LlmConfig,
    retrieval: RetrievalConfig,
}

impl AnswerPipeline {
    /// Assemble the pipeline.
    ///
    /// # Errors
    /// Returns an error if the formatter patterns fail to compile.
    pub fn new(
        retriever: Arc<Retriever>,
        model: Arc<dyn AnswerModel>,
        llm: LlmConfig,
        retrieval: RetrievalConfig,
    ) -> StartupResult<Self> {
        Ok(Self {
            retriever,
            model,
            formatter: ResponseFormatter::new()?,
            llm,
            retrieval,
        })
    }

    /// Answer `query` in `mode`.
    ///
    /// Retrieves `retrieve_k` records, keeps the mode's `top_k` of them as
    /// context, asks the LLM and formats its reply.
    ///
    /// # Errors
    /// Returns an error if retrieval or the LLM call fails.
    pub async fn answer(&self, query: &str, mode: AnswerMode) -> Result<Answer, QueryError> {
        let mut hadiths = Arc::clone(&self.retriever)
            .retrieve_blocking(
                query.to_string(),
                self.retrieval.retrieve_k,
                self.retrieval.timeout(),
            )
            .await?;
        hadiths.truncate(mode.top_k(&self.llm));
        debug!(%mode, kept = hadiths.len(), "context records selected");

        let context = build_context(&hadiths);
        let user_message = build_user_message(&context, query);
        let reply = self
            .model
            .complete(mode.model_name(&self.llm), mode.system_prompt(), &user_message)
            .await?;
        info!(%mode, hadiths = hadiths.len(), reply_chars = reply.len(), "query answered");

        Ok(Answer {
            html: self.formatter.format(&reply),
            hadiths,
            mode,
        })
    }

    /// Number of records available for retrieval.
    #[must_use]
    pub fn corpus_size(&self) -> usize {
        self.retriever.corpus_size()
    }
}
