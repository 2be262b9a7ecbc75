use thiserror::Error;

/// Failures of a single question-oracle round trip.
///
/// Every variant is recoverable: the oracle question source turns any of
/// them into a canned fallback question.
#[derive(Debug, Error)]
pub enum OracleError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("oracle returned status {status}: {body}")]
    Status { status: u16, body: String },

    #[error("failed to parse oracle response: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("oracle response is missing `{0}`")]
    MissingField(&'static str),

    #[error("oracle returned an empty reply")]
    EmptyReply,
}
