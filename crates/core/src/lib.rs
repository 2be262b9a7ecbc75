pub mod app;
pub mod error;
pub mod oracle;
pub mod question_source;
pub mod session_state;
pub mod settings;
pub mod speech;
pub mod summary;
pub mod topic;
pub mod transcript;

use summary::SessionSummary;

/// Notifications the controller sends to whatever presents the interview.
///
/// The controller decides; the presentation layer only renders these.
#[derive(Debug, Clone, PartialEq)]
pub enum InterviewEvent {
    /// A question was recorded and handed to speech output.
    QuestionAsked {
        number: usize,
        topic: String,
        text: String,
        /// Percentage of the role's topic plan served, if the topic is in it.
        progress: Option<f32>,
    },
    Speaking,
    Listening,
    /// Non-fatal, user-visible problem such as a recognition error.
    Notice(String),
    /// The closing remark being spoken.
    Closing(String),
    Completed(SessionSummary),
    Abandoned,
}
