//! Remote question oracle: an LLM asked for the next interview question.

pub mod gemini;
pub mod markers;
pub mod openai;
pub mod prompts;

use crate::error::OracleError;
use crate::question_source::{NextQuestion, QuestionContext, QuestionOrigin, QuestionSource};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

pub use gemini::GeminiBackend;
pub use markers::{OracleReply, parse_reply};
pub use openai::ChatCompletionsBackend;
pub use prompts::PromptBook;

/// Default hard cap on questions asked through an oracle.
pub const DEFAULT_MAX_QUESTIONS: usize = 12;

/// One HTTP round trip to an LLM, returning its raw text.
///
/// Exactly one attempt per call: no retry, no backoff.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait OracleBackend: Send + Sync {
    async fn complete(&self, ctx: &QuestionContext) -> Result<String, OracleError>;
}

/// Adapts an [`OracleBackend`] to [`QuestionSource`].
///
/// Every backend failure, and every reply that parses to an empty question,
/// becomes a fallback question with `should_continue = true`.
pub struct OracleSource<B> {
    backend: B,
    max_questions: usize,
}

impl<B: OracleBackend> OracleSource<B> {
    pub fn new(backend: B, max_questions: usize) -> Self {
        Self {
            backend,
            max_questions,
        }
    }
}

#[async_trait]
impl<B: OracleBackend> QuestionSource for OracleSource<B> {
    async fn produce_next(&self, ctx: &QuestionContext) -> Result<NextQuestion, OracleError> {
        let raw = match self.backend.complete(ctx).await {
            Ok(raw) => raw,
            Err(e) => {
                tracing::warn!("Oracle request failed, using fallback question: {e}");
                return Ok(NextQuestion::fallback(ctx.question_count));
            }
        };

        let reply = parse_reply(&raw);
        tracing::debug!(?reply, "Parsed oracle reply");

        if !reply.should_continue {
            return Ok(NextQuestion::finish(reply.text, QuestionOrigin::Oracle));
        }
        if reply.text.is_empty() {
            tracing::warn!("Oracle reply had no question text, using fallback question");
            return Ok(NextQuestion::fallback(ctx.question_count));
        }

        let topic = reply.new_topic.clone().or_else(|| Some(ctx.topic.clone()));
        Ok(NextQuestion::ask(reply.text, topic, QuestionOrigin::Oracle).with_new_topic(reply.new_topic))
    }

    fn question_cap(&self) -> Option<usize> {
        Some(self.max_questions)
    }
}
