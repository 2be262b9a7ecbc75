use crate::error::OracleError;
use crate::settings::DEFAULT_CLOSING_REMARK;
use crate::topic::{RolePlan, Step, TopicCursor};
use crate::transcript::Transcript;
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

/// Canned questions used whenever the oracle cannot be reached or answers
/// with something unusable. Rotated by question count.
pub const FALLBACK_QUESTIONS: &[&str] = &[
    "Tell me about yourself and your background.",
    "Why are you interested in this position?",
    "What are your greatest strengths?",
    "Describe a challenging situation you faced and how you handled it.",
    "Where do you see yourself in 5 years?",
];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Question {
    pub text: String,
    pub topic_label: Option<String>,
    /// A closing remark rather than something to be answered.
    pub is_terminal: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuestionOrigin {
    Table,
    Oracle,
    Fallback,
}

/// What a question source hands back for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NextQuestion {
    pub question: Question,
    pub should_continue: bool,
    pub new_topic: Option<String>,
    pub origin: QuestionOrigin,
}

impl NextQuestion {
    pub fn ask(text: impl Into<String>, topic_label: Option<String>, origin: QuestionOrigin) -> Self {
        Self {
            question: Question {
                text: text.into(),
                topic_label,
                is_terminal: false,
            },
            should_continue: true,
            new_topic: None,
            origin,
        }
    }

    pub fn finish(closing_remark: impl Into<String>, origin: QuestionOrigin) -> Self {
        Self {
            question: Question {
                text: closing_remark.into(),
                topic_label: None,
                is_terminal: true,
            },
            should_continue: false,
            new_topic: None,
            origin,
        }
    }

    /// Never empty, always continues.
    pub fn fallback(question_count: usize) -> Self {
        let text = FALLBACK_QUESTIONS[question_count % FALLBACK_QUESTIONS.len()];
        Self::ask(text, None, QuestionOrigin::Fallback)
    }

    pub fn with_new_topic(mut self, topic: Option<String>) -> Self {
        self.new_topic = topic;
        self
    }
}

/// Everything a source may look at when choosing the next question.
#[derive(Debug, Clone)]
pub struct QuestionContext {
    pub role: String,
    pub topic: String,
    /// Questions already served within `topic`.
    pub asked_in_topic: usize,
    /// Questions already served in the whole interview.
    pub question_count: usize,
    pub transcript: Transcript,
}

// The one capability the controller asks for questions. Implemented by the
// static table and by `OracleSource`; `#[automock]` generates
// `MockQuestionSource` for tests.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait QuestionSource: Send + Sync {
    async fn produce_next(&self, ctx: &QuestionContext) -> Result<NextQuestion, OracleError>;

    /// Hard bound on the number of questions, overriding the source's own
    /// opinion about continuing.
    fn question_cap(&self) -> Option<usize> {
        None
    }
}

/// Serves the per-role topic table. Deterministic, no I/O, never fails.
#[derive(Debug, Default, Clone, Copy)]
pub struct StaticQuestionSource;

#[async_trait]
impl QuestionSource for StaticQuestionSource {
    async fn produce_next(&self, ctx: &QuestionContext) -> Result<NextQuestion, OracleError> {
        let plan = RolePlan::for_role(&ctx.role);
        let cursor = TopicCursor {
            topic_index: plan.topic_position(&ctx.topic).unwrap_or(0),
            asked_in_topic: ctx.asked_in_topic,
        };

        let next = match plan.next_step(cursor) {
            Step::Ask { topic_index, text } => {
                let topic = plan.topics[topic_index].name.to_string();
                let moved = topic_index != cursor.topic_index;
                NextQuestion::ask(text, Some(topic.clone()), QuestionOrigin::Table)
                    .with_new_topic(moved.then_some(topic))
            }
            Step::Exhausted => NextQuestion::finish(DEFAULT_CLOSING_REMARK, QuestionOrigin::Table),
        };
        Ok(next)
    }
}
