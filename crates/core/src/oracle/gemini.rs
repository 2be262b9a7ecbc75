use super::OracleBackend;
use super::prompts::{CONTINUE_INSTRUCTION, NEXT_INSTRUCTION, OPENING_INSTRUCTION, PromptBook};
use crate::error::OracleError;
use crate::question_source::QuestionContext;
use crate::transcript::Speaker;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta/models";
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-pro";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Content {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Part {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: u32,
    top_p: f32,
    max_output_tokens: u32,
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            top_k: 40,
            top_p: 0.95,
            max_output_tokens: 1024,
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

fn turn(role: &str, text: String) -> Content {
    Content {
        role: Some(role.to_string()),
        parts: vec![Part { text: Some(text) }],
    }
}

/// Generate-content oracle: API key in the query string, the whole
/// conversation replayed as alternating `user`/`model` turns.
pub struct GeminiBackend {
    client: Client,
    base_url: String,
    api_key: SecretString,
    model: String,
    prompts: PromptBook,
}

impl GeminiBackend {
    pub fn new(api_key: SecretString, model: String, prompts: PromptBook) -> Self {
        Self {
            client: Client::new(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            api_key,
            model,
            prompts,
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Replays the transcript. The first `user` turn carries the role
    /// preamble, every answer is framed as "My answer: ..." and the list
    /// always ends on a `user` turn.
    fn build_contents(&self, ctx: &QuestionContext) -> Vec<Content> {
        let mut contents = vec![turn(
            "user",
            format!("{}\n\n{}", self.prompts.preamble(&ctx.role), OPENING_INSTRUCTION),
        )];

        for t in ctx.transcript.turns() {
            match t.speaker {
                Speaker::Ai => contents.push(turn("model", t.text.clone())),
                Speaker::User => contents.push(turn(
                    "user",
                    format!("My answer: {}\n\n{}", t.text, NEXT_INSTRUCTION),
                )),
            }
        }

        if ctx.transcript.last_speaker() == Some(Speaker::Ai) {
            contents.push(turn("user", CONTINUE_INSTRUCTION.to_string()));
        }
        contents
    }
}

#[async_trait]
impl OracleBackend for GeminiBackend {
    async fn complete(&self, ctx: &QuestionContext) -> Result<String, OracleError> {
        let url = format!("{}/{}:generateContent", self.base_url, self.model);
        let body = GenerateRequest {
            contents: self.build_contents(ctx),
            generation_config: GenerationConfig::default(),
        };

        tracing::debug!(model = %self.model, turns = body.contents.len(), "Requesting next question");

        // reqwest errors carry the request URL, which holds the key.
        let response = self
            .client
            .post(&url)
            .query(&[("key", self.api_key.expose_secret())])
            .json(&body)
            .send()
            .await
            .map_err(|e| OracleError::Http(e.without_url()))?;

        let status = response.status();
        let text = response
            .text()
            .await
            .map_err(|e| OracleError::Http(e.without_url()))?;
        if !status.is_success() {
            return Err(OracleError::Status {
                status: status.as_u16(),
                body: text,
            });
        }

        let parsed: GenerateResponse = serde_json::from_str(&text)?;
        let content = parsed
            .candidates
            .into_iter()
            .next()
            .ok_or(OracleError::MissingField("candidates"))?
            .content
            .ok_or(OracleError::MissingField("candidates[0].content"))?;
        let answer = content
            .parts
            .into_iter()
            .next()
            .and_then(|p| p.text)
            .ok_or(OracleError::MissingField("candidates[0].content.parts[0].text"))?;

        if answer.trim().is_empty() {
            return Err(OracleError::EmptyReply);
        }
        Ok(answer.trim().to_string())
    }
}
