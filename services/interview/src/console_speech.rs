//! Terminal stand-in for a speech engine: questions are printed, answers
//! are typed.

use anyhow::{Context, Result};
use async_trait::async_trait;
use interview_core::session_state::Control;
use interview_core::speech::{SpeechEvent, SpeechIo, UtteranceId};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

/// Line commands recognised regardless of listening state.
const END_COMMAND: &str = "/end";
const LISTEN_COMMAND: &str = "/listen";
const QUIT_COMMAND: &str = "/quit";

/// "Speaks" by printing and holding the floor for a time proportional to
/// the word count. "Listens" by forwarding typed lines as final transcripts.
///
/// An empty line while listening is reported as a `no-speech` recognition
/// error, mirroring a browser recogniser that heard nothing.
pub struct ConsoleSpeech {
    event_tx: mpsc::Sender<SpeechEvent>,
    event_rx: Option<mpsc::Receiver<SpeechEvent>>,
    listening: Arc<AtomicBool>,
    word_pace: Duration,
    speaking: Option<JoinHandle<()>>,
    reader: JoinHandle<()>,
}

impl ConsoleSpeech {
    pub fn spawn<R>(input: R, word_pace: Duration, control_tx: mpsc::Sender<Control>) -> Self
    where
        R: AsyncBufRead + Unpin + Send + 'static,
    {
        let (event_tx, event_rx) = mpsc::channel(32);
        let listening = Arc::new(AtomicBool::new(false));
        let reader = tokio::spawn(read_lines(
            input,
            event_tx.clone(),
            control_tx,
            listening.clone(),
        ));
        Self {
            event_tx,
            event_rx: Some(event_rx),
            listening,
            word_pace,
            speaking: None,
            reader,
        }
    }
}

async fn read_lines<R>(
    input: R,
    event_tx: mpsc::Sender<SpeechEvent>,
    control_tx: mpsc::Sender<Control>,
    listening: Arc<AtomicBool>,
) where
    R: AsyncBufRead + Unpin,
{
    let mut lines = input.lines();
    loop {
        let line = match lines.next_line().await {
            Ok(Some(line)) => line,
            Ok(None) => break,
            Err(e) => {
                tracing::error!("Failed to read from terminal: {e}");
                break;
            }
        };
        let line = line.trim();

        let control = match line {
            END_COMMAND => Some(Control::EndInterview),
            LISTEN_COMMAND => Some(Control::ResumeListening),
            QUIT_COMMAND => Some(Control::Abandon),
            _ => None,
        };
        if let Some(control) = control {
            if control_tx.send(control).await.is_err() {
                break;
            }
            continue;
        }

        if !listening.load(Ordering::SeqCst) {
            tracing::debug!("Not listening, dropping input");
            continue;
        }
        let event = if line.is_empty() {
            listening.store(false, Ordering::SeqCst);
            SpeechEvent::RecognitionError("no-speech".to_string())
        } else {
            SpeechEvent::FinalTranscript(line.to_string())
        };
        if event_tx.send(event).await.is_err() {
            break;
        }
    }
    if let Err(e) = event_tx.send(SpeechEvent::Closed).await {
        tracing::debug!("Speech events receiver gone: {e}");
    }
}

#[async_trait]
impl SpeechIo for ConsoleSpeech {
    async fn speak(&mut self, id: UtteranceId, text: &str) -> Result<()> {
        if let Some(previous) = self.speaking.take() {
            previous.abort();
        }
        println!("\nInterviewer: {text}");

        let hold = self.word_pace * text.split_whitespace().count() as u32;
        let event_tx = self.event_tx.clone();
        self.speaking = Some(tokio::spawn(async move {
            tokio::time::sleep(hold).await;
            if let Err(e) = event_tx.send(SpeechEvent::SpeakingDone(id)).await {
                tracing::debug!("Speech events receiver gone: {e}");
            }
        }));
        Ok(())
    }

    async fn stop_speaking(&mut self) -> Result<()> {
        if let Some(speaking) = self.speaking.take() {
            speaking.abort();
        }
        Ok(())
    }

    async fn listen(&mut self) -> Result<()> {
        println!("(type your answer, {LISTEN_COMMAND} to retry listening, {END_COMMAND} to finish)");
        self.listening.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop_listening(&mut self) -> Result<()> {
        self.listening.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn events(&mut self) -> Result<mpsc::Receiver<SpeechEvent>> {
        self.event_rx
            .take()
            .context("Speech events receiver was already taken")
    }
}

impl Drop for ConsoleSpeech {
    fn drop(&mut self) {
        self.reader.abort();
        if let Some(speaking) = self.speaking.take() {
            speaking.abort();
        }
    }
}
