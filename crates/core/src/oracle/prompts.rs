use crate::question_source::QuestionContext;
use crate::transcript::Transcript;
use std::collections::HashMap;

const GENERIC_ROLE_CONTEXT: &str = "Focus on relevant skills and experience for this role.";

/// Built-in role instructions, keyed by role slug.
const ROLE_CONTEXTS: &[(&str, &str)] = &[
    (
        "software-engineer",
        "You are conducting a technical interview for a Software Engineer position. Focus on coding skills, algorithms, system design, and technical problem-solving.",
    ),
    (
        "product-manager",
        "You are conducting an interview for a Product Manager position. Focus on product strategy, stakeholder management, prioritization, and business acumen.",
    ),
    (
        "business-analyst",
        "You are conducting an interview for a Business Analyst position. Focus on analytical thinking, requirements gathering, process improvement, and data analysis.",
    ),
    (
        "data-analyst",
        "You are conducting an interview for a Data Analyst position. Focus on SQL, data interpretation, statistical analysis, and communicating insights.",
    ),
    (
        "marketing-manager",
        "You are conducting an interview for a Marketing Manager position. Focus on campaign strategy, market analysis, budgeting, and brand management.",
    ),
];

pub const OPENING_INSTRUCTION: &str = "Please start the interview with an opening question.";
pub const NEXT_INSTRUCTION: &str = "Please provide the next interview question.";
pub const CONTINUE_INSTRUCTION: &str = "Please continue with the next interview question.";

/// `"Software Engineer"` -> `"software-engineer"`.
pub fn role_slug(role: &str) -> String {
    role.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join("-")
}

/// Role instructions for both oracle variants. Entries loaded from disk
/// replace the built-in ones with the same slug.
#[derive(Debug, Clone, Default)]
pub struct PromptBook {
    overrides: HashMap<String, String>,
}

impl PromptBook {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_overrides(overrides: HashMap<String, String>) -> Self {
        Self { overrides }
    }

    pub fn role_context(&self, role: &str) -> String {
        let slug = role_slug(role);
        if let Some(text) = self.overrides.get(&slug) {
            return text.trim().to_string();
        }
        ROLE_CONTEXTS
            .iter()
            .find(|(key, _)| *key == slug)
            .map(|(_, text)| text.to_string())
            .unwrap_or_else(|| GENERIC_ROLE_CONTEXT.to_string())
    }

    /// System message for the chat-completions oracle. Asks for the marker
    /// format understood by [`super::markers::parse_reply`].
    pub fn system_prompt(&self, role: &str) -> String {
        format!(
            r#"You are an experienced HR interviewer conducting a comprehensive interview for a {role} position. {context}

Your responsibilities:
- Ask relevant, insightful questions based on the candidate's responses
- Probe deeper when answers are vague or incomplete
- Cover different aspects: technical skills, experience, problem-solving, cultural fit
- Ask follow-up questions that build on previous answers
- Maintain a professional but friendly tone
- Decide when to move to new topics or end the interview (after 8-12 questions)

Response format:
- Start with "QUESTION:" followed by your question
- If you want to end the interview, start with "END_INTERVIEW:" followed by closing remarks
- If moving to a new topic, include "NEW_TOPIC:" followed by the topic name
- Keep questions conversational and specific to their role

Guidelines:
- Ask one question at a time
- Build on their previous responses
- Be encouraging and professional
- Focus on {role}-specific skills and scenarios"#,
            context = self.role_context(role),
        )
    }

    /// Opening instruction block for the generate-content oracle.
    pub fn preamble(&self, role: &str) -> String {
        format!(
            r#"You are an experienced interviewer conducting a mock interview for a {role} position. {context}

Guidelines:
- Ask one question at a time
- Make questions progressively more challenging
- Ask follow-up questions based on the candidate's responses
- Keep questions professional and relevant to the role
- Limit your response to just the question, no additional commentary
- Make the interview feel natural and conversational"#,
            context = self.role_context(role),
        )
    }
}

/// User message for the chat-completions oracle: role, topic, count and the
/// last `window` turns.
pub fn conversation_context(ctx: &QuestionContext, window: usize) -> String {
    format!(
        "Interview Context:\nRole: {}\nCurrent Topic: {}\nQuestion Count: {}\nRecent Conversation:\n{}\n\nPlease generate the next appropriate question or end the interview if sufficient questions have been asked.",
        ctx.role,
        ctx.topic,
        ctx.question_count,
        Transcript::render(ctx.transcript.recent(window)),
    )
}
