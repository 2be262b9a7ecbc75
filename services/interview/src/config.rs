//! Service configuration, loaded from environment variables (and `.env`).

use clap::ValueEnum;
use interview_core::oracle::DEFAULT_MAX_QUESTIONS;
use interview_core::oracle::gemini::DEFAULT_GEMINI_MODEL;
use interview_core::oracle::openai::DEFAULT_CHAT_MODEL;
use secrecy::SecretString;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;
use tracing::Level;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Where interview questions come from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum QuestionBackend {
    /// Built-in per-role topic table.
    Static,
    /// Chat-completions API.
    #[value(name = "openai")]
    OpenAI,
    /// Generate-content API.
    Gemini,
}

impl FromStr for QuestionBackend {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "static" => Ok(Self::Static),
            "openai" => Ok(Self::OpenAI),
            "gemini" => Ok(Self::Gemini),
            other => Err(format!("'{other}' is not one of static, openai, gemini")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub question_source: QuestionBackend,
    pub openai_api_key: Option<SecretString>,
    pub gemini_api_key: Option<SecretString>,
    pub chat_model: String,
    pub gemini_model: String,
    pub max_questions: usize,
    pub max_oracle_failures: usize,
    pub closing_delay: Duration,
    pub prompts_dir: PathBuf,
    pub log_level: Level,
}

impl Config {
    /// Loads configuration from environment variables.
    ///
    /// *   `QUESTION_SOURCE`: `static`, `openai` or `gemini`. Defaults to `static`.
    /// *   `OPENAI_API_KEY`: Required for `openai`.
    /// *   `GEMINI_API_KEY`: Required for `gemini`.
    /// *   `CHAT_MODEL`: Defaults to `gpt-4.1-2025-04-14`.
    /// *   `GEMINI_MODEL`: Defaults to `gemini-pro`.
    /// *   `MAX_QUESTIONS`: Hard cap for oracle interviews. Defaults to 12.
    /// *   `MAX_ORACLE_FAILURES`: Consecutive fallbacks before ending. Defaults to 3.
    /// *   `CLOSING_DELAY_MS`: Defaults to 3000.
    /// *   `PROMPTS_DIR`: Role preamble overrides. Defaults to `prompts`.
    /// *   `RUST_LOG`: Defaults to `INFO`.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let question_source = parse_or(&lookup, "QUESTION_SOURCE", QuestionBackend::Static)?;
        let max_questions = parse_or(&lookup, "MAX_QUESTIONS", DEFAULT_MAX_QUESTIONS)?;
        if max_questions == 0 {
            return Err(ConfigError::InvalidValue(
                "MAX_QUESTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        let max_oracle_failures = parse_or(&lookup, "MAX_ORACLE_FAILURES", 3usize)?;
        let closing_delay_ms = parse_or(&lookup, "CLOSING_DELAY_MS", 3000u64)?;

        let log_level_str = lookup("RUST_LOG").unwrap_or_else(|| "INFO".to_string());
        let log_level = log_level_str.parse::<Level>().map_err(|_| {
            ConfigError::InvalidValue(
                "RUST_LOG".to_string(),
                format!("'{}' is not a valid log level", log_level_str),
            )
        })?;

        let config = Self {
            question_source,
            openai_api_key: lookup("OPENAI_API_KEY").map(SecretString::from),
            gemini_api_key: lookup("GEMINI_API_KEY").map(SecretString::from),
            chat_model: lookup("CHAT_MODEL").unwrap_or_else(|| DEFAULT_CHAT_MODEL.to_string()),
            gemini_model: lookup("GEMINI_MODEL").unwrap_or_else(|| DEFAULT_GEMINI_MODEL.to_string()),
            max_questions,
            max_oracle_failures: max_oracle_failures.max(1),
            closing_delay: Duration::from_millis(closing_delay_ms),
            prompts_dir: lookup("PROMPTS_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("prompts")),
            log_level,
        };
        config.validate()?;
        Ok(config)
    }

    /// Switches the question source, re-checking that its key is present.
    pub fn with_question_source(mut self, source: QuestionBackend) -> Result<Self, ConfigError> {
        self.question_source = source;
        self.validate()?;
        Ok(self)
    }

    fn validate(&self) -> Result<(), ConfigError> {
        match self.question_source {
            QuestionBackend::Static => {}
            QuestionBackend::OpenAI => {
                if self.openai_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "OPENAI_API_KEY must be set for 'openai' question source".to_string(),
                    ));
                }
            }
            QuestionBackend::Gemini => {
                if self.gemini_api_key.is_none() {
                    return Err(ConfigError::MissingVar(
                        "GEMINI_API_KEY must be set for 'gemini' question source".to_string(),
                    ));
                }
            }
        }
        Ok(())
    }
}

fn parse_or<T>(
    lookup: &impl Fn(&str) -> Option<String>,
    key: &str,
    default: T,
) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidValue(key.to_string(), e.to_string())),
    }
}
