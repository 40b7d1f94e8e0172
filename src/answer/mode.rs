//! Answer modes and their system prompts.

use std::fmt;

use serde::Serialize;
use serde_json::Value;

use crate::retrieval::core::config::LlmConfig;

const CONCISE_PROMPT: &str = "You are a respectful assistant who answers only using authentic Hadith from Sahih Bukhari, Sahih Muslim, and other authentic collections (such as Abu Daud, Ibn Majah, Al-Nasa'i, and Jami' at-Tirmidhi). Your responses must be strictly based on the provided context. Do not add external knowledge, assumptions, or information outside this context. The context contains Hadiths, each with the Hadith text, Isnad, and Grade separated by newlines. Keep answers concise, presenting the Hadiths in a numbered list. Format each Hadith as follows:

**[Hadith Number]**

[Hadith text]

**Narrated by:** [Isnad]

**Grade:** [Grade]

Summarize key points without elaboration.";

const DETAILED_PROMPT: &str = "You are a respectful assistant who answers only using authentic Hadith from Sahih Bukhari, Sahih Muslim, and other authentic collections (such as Abu Daud, Ibn Majah, Al-Nasa'i, and Jami' at-Tirmidhi). Your responses must be strictly based on the provided context. Do not add external knowledge, assumptions, or information outside this context. Provide detailed answers, quoting all relevant parts of the context and explaining their relevance step-by-step. Format the response with:

**[Hadith Number]**

[Hadith text]

**Narrated by:** [Isnad]

**Grade:** [Grade]

**Explanation:** [Detailed explanation of relevance]";

/// How much the answer should elaborate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AnswerMode {
    /// Short numbered list of the most relevant hadiths.
    #[default]
    Concise,
    /// Every relevant hadith with an explanation.
    Detailed,
}

impl AnswerMode {
    /// Resolve the mode value sent by a client.
    ///
    /// An absent field counts as `"concise"`. Only the string `"concise"`
    /// selects [`AnswerMode::Concise`]; any other value, `null` included,
    /// selects [`AnswerMode::Detailed`].
    #[must_use]
    pub fn from_request(mode: Option<&Value>) -> Self {
        match mode {
            None => Self::Concise,
            Some(value) if value.as_str() == Some(Self::Concise.as_str()) => Self::Concise,
            Some(_) => Self::Detailed,
        }
    }

    /// Wire name of the mode.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Concise => "concise",
            Self::Detailed => "detailed",
        }
    }

    /// System prompt steering the LLM for this mode.
    #[must_use]
    pub const fn system_prompt(self) -> &'static str {
        match self {
            Self::Concise => CONCISE_PROMPT,
            Self::Detailed => DETAILED_PROMPT,
        }
    }

    /// LLM model name configured for this mode.
    #[must_use]
    pub fn model_name(self, llm: &LlmConfig) -> &str {
        match self {
            Self::Concise => &llm.concise_model,
            Self::Detailed => &llm.detailed_model,
        }
    }

    /// Number of retrieved records handed to the LLM in this mode.
    #[must_use]
    pub const fn top_k(self, llm: &LlmConfig) -> usize {
        match self {
            Self::Concise => llm.top_k_concise,
            Self::Detailed => llm.top_k_detailed,
        }
    }
}

impl fmt::Display for AnswerMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
