use super::OracleBackend;
use super::prompts::{PromptBook, conversation_context};
use crate::error::OracleError;
use crate::question_source::QuestionContext;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub const DEFAULT_CHAT_URL: &str = "https://api.openai.com/v1/chat/completions";
pub const DEFAULT_CHAT_MODEL: &str = "gpt-4.1-2025-04-14";

const TEMPERATURE: f32 = 0.7;
const MAX_TOKENS: u32 = 300;

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
pub struct LlmResponse {
    pub choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
pub struct Choice {
    pub message: Message,
}

#[derive(Debug, Deserialize)]
pub struct Message {
    pub content: Option<String>,
}

/// Chat-completions oracle: bearer auth, one system message carrying the
/// role instructions and one user message carrying a windowed transcript.
pub struct ChatCompletionsBackend {
    client: Client,
    endpoint: String,
    api_key: SecretString,
    model: String,
    prompts: PromptBook,
    history_window: usize,
}

impl ChatCompletionsBackend {
    pub fn new(api_key: SecretString, model: String, prompts: PromptBook, history_window: usize) -> Self {
        Self {
            client: Client::new(),
            endpoint: DEFAULT_CHAT_URL.to_string(),
            api_key,
            model,
            prompts,
            history_window,
        }
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }
}

#[async_trait]
impl OracleBackend for ChatCompletionsBackend {
    async fn complete(&self, ctx: &QuestionContext) -> Result<String, OracleError> {
        let system = self.prompts.system_prompt(&ctx.role);
        let user = conversation_context(ctx, self.history_window);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &system,
                },
                ChatMessage {
                    role: "user",
                    content: &user,
                },
            ],
            temperature: TEMPERATURE,
            max_tokens: MAX_TOKENS,
        };

        tracing::debug!(model = %self.model, questions = ctx.question_count, "Requesting next question");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: LlmResponse = serde_json::from_str(&text)?;
        let content = parsed
            .choices
            .into_iter()
            .next()
            .ok_or(OracleError::MissingField("choices"))?
            .message
            .content
            .ok_or(OracleError::MissingField("message.content"))?;

        if content.trim().is_empty() {
            return Err(OracleError::EmptyReply);
        }
        Ok(content)
    }
}
