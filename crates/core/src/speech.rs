use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::mpsc;

/// Identifies one `speak` call so that its completion can be told apart
/// from completions of utterances that were cancelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct UtteranceId(pub u64);

impl UtteranceId {
    pub fn next(self) -> Self {
        UtteranceId(self.0 + 1)
    }
}

/// Events a speech engine emits back to the controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpeechEvent {
    /// Output of the given utterance finished naturally.
    SpeakingDone(UtteranceId),
    /// Interim recognition result. Only useful for live display.
    PartialTranscript(String),
    /// Recognition result for a complete utterance.
    FinalTranscript(String),
    /// Recognition stopped on an error. Listening is over until restarted.
    RecognitionError(String),
    Closed,
}

/// Text-to-speech and speech-to-text, abstracted over the engine providing
/// them.
///
/// Stop requests are best effort: events already in flight may still be
/// delivered afterwards.
#[async_trait]
pub trait SpeechIo: Send {
    /// Starts speaking `text`. Completion arrives as `SpeakingDone(id)`.
    async fn speak(&mut self, id: UtteranceId, text: &str) -> Result<()>;

    async fn stop_speaking(&mut self) -> Result<()>;

    /// Starts continuous recognition.
    async fn listen(&mut self) -> Result<()>;

    async fn stop_listening(&mut self) -> Result<()>;

    /// Returns the receiver for engine events. Can only be taken once.
    async fn events(&mut self) -> Result<mpsc::Receiver<SpeechEvent>>;
}
