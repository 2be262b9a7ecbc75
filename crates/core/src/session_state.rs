use crate::{
    InterviewEvent,
    question_source::{NextQuestion, QuestionContext, QuestionOrigin, QuestionSource},
    settings::{InterviewSettings, ORACLE_UNAVAILABLE_REMARK},
    speech::{SpeechEvent, SpeechIo, UtteranceId},
    summary::SessionSummary,
    topic::{RolePlan, TopicCursor},
    transcript::{Speaker, Transcript},
};
use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use tokio::sync::mpsc;

/// Interview data for one run. Only the controller mutates it.
#[derive(Debug, Clone)]
pub struct Session {
    pub role: String,
    pub topic: String,
    /// Questions served within `topic`.
    pub asked_in_topic: usize,
    /// Questions served in total. Never exceeds the AI turns in `transcript`.
    pub question_index: usize,
    pub topics_visited: Vec<String>,
    /// Always as long as the USER turns in `transcript`.
    pub answers: Vec<String>,
    pub transcript: Transcript,
    pub started_at: DateTime<Utc>,
}

impl Session {
    pub fn new(role: impl Into<String>) -> Self {
        let role = role.into();
        let topic = RolePlan::for_role(&role)
            .topics
            .first()
            .map(|t| t.name.to_string())
            .unwrap_or_default();
        Self {
            role,
            topic,
            asked_in_topic: 0,
            question_index: 0,
            topics_visited: Vec::new(),
            answers: Vec::new(),
            transcript: Transcript::new(),
            started_at: Utc::now(),
        }
    }

    /// Applies a topic change and appends the question. Returns `false` if a
    /// question is already outstanding.
    pub fn record_question(&mut self, next: &NextQuestion) -> bool {
        if !self.transcript.push_question(next.question.text.clone()) {
            return false;
        }
        if let Some(topic) = next.new_topic.as_ref().filter(|t| **t != self.topic) {
            self.topic = topic.clone();
            self.asked_in_topic = 0;
        }
        if !self.topics_visited.contains(&self.topic) {
            self.topics_visited.push(self.topic.clone());
        }
        self.asked_in_topic += 1;
        self.question_index += 1;
        true
    }

    /// Appends an answer to the outstanding question, if there is one.
    pub fn record_answer(&mut self, text: &str) -> bool {
        if !self.transcript.push_answer(text) {
            return false;
        }
        self.answers.push(text.to_string());
        true
    }

    pub fn context(&self) -> QuestionContext {
        QuestionContext {
            role: self.role.clone(),
            topic: self.topic.clone(),
            asked_in_topic: self.asked_in_topic,
            question_count: self.question_index,
            transcript: self.transcript.clone(),
        }
    }

    /// Share of the role's static plan already served, when the current
    /// topic belongs to that plan.
    pub fn progress(&self) -> Option<f32> {
        let plan = RolePlan::for_role(&self.role);
        plan.topic_position(&self.topic).map(|topic_index| {
            plan.progress(TopicCursor {
                topic_index,
                asked_in_topic: self.asked_in_topic,
            })
        })
    }

    pub fn summarize(&self, completed_at: DateTime<Utc>) -> SessionSummary {
        let (questions_asked, questions_answered) = SessionSummary::count_turns(&self.transcript);
        SessionSummary {
            role: self.role.clone(),
            questions_asked,
            questions_answered,
            topics_covered: self.topics_visited.clone(),
            transcript: self.transcript.clone(),
            started_at: self.started_at,
            completed_at,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InterviewState {
    Idle,
    Running,
    Terminating,
    Done,
}

/// Which of the mutually exclusive operations is in flight.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Activity {
    Quiet,
    Speaking(UtteranceId),
    Listening,
    AwaitingQuestion,
}

/// Requests from the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Control {
    EndInterview,
    ResumeListening,
    /// Leave without a summary.
    Abandon,
}

/// Drives one interview: asks, speaks, listens, records, and decides when
/// to stop.
///
/// Methods take `&mut self`, so a new question is never requested while
/// another is pending and listening never starts while speaking.
pub struct InterviewController<Q, S> {
    source: Q,
    speech: S,
    settings: InterviewSettings,
    event_tx: mpsc::Sender<InterviewEvent>,
    state: InterviewState,
    activity: Activity,
    session: Option<Session>,
    utterance: UtteranceId,
    consecutive_failures: usize,
    summary: Option<SessionSummary>,
}

impl<Q: QuestionSource, S: SpeechIo> InterviewController<Q, S> {
    pub fn new(
        source: Q,
        speech: S,
        settings: InterviewSettings,
        event_tx: mpsc::Sender<InterviewEvent>,
    ) -> Self {
        Self {
            source,
            speech,
            settings,
            event_tx,
            state: InterviewState::Idle,
            activity: Activity::Quiet,
            session: None,
            utterance: UtteranceId(0),
            consecutive_failures: 0,
            summary: None,
        }
    }

    pub fn state(&self) -> InterviewState {
        self.state
    }

    pub fn activity(&self) -> Activity {
        self.activity
    }

    pub fn session(&self) -> Option<&Session> {
        self.session.as_ref()
    }

    /// The completion summary, once the interview is `Done`.
    pub fn summary(&self) -> Option<&SessionSummary> {
        self.summary.as_ref()
    }

    async fn emit(&self, event: InterviewEvent) -> Result<()> {
        self.event_tx
            .send(event)
            .await
            .context("Failed to send interview event")
    }

    pub async fn start(&mut self, role: &str) -> Result<()> {
        if self.state != InterviewState::Idle {
            tracing::warn!(state = ?self.state, "Interview already started, ignoring start");
            return Ok(());
        }
        tracing::info!(role, "Starting interview");
        self.session = Some(Session::new(role));
        self.state = InterviewState::Running;
        self.ask_next().await
    }

    /// Requests the next question and speaks it, or terminates when the
    /// source says so, the question cap is reached, or the source keeps
    /// failing.
    async fn ask_next(&mut self) -> Result<()> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };

        if let Some(cap) = self.source.question_cap() {
            if session.question_index >= cap {
                tracing::info!(cap, "Question cap reached");
                return self.terminate(None).await;
            }
        }

        self.activity = Activity::AwaitingQuestion;
        let ctx = session.context();
        let next = match self.source.produce_next(&ctx).await {
            Ok(next) => next,
            Err(e) => {
                tracing::warn!("Question source failed, using fallback question: {e}");
                NextQuestion::fallback(ctx.question_count)
            }
        };

        if next.origin == QuestionOrigin::Fallback {
            self.consecutive_failures += 1;
            if self.consecutive_failures >= self.settings.max_consecutive_failures {
                tracing::warn!(
                    failures = self.consecutive_failures,
                    "Question source keeps failing, ending interview"
                );
                return self.terminate(Some(ORACLE_UNAVAILABLE_REMARK.to_string())).await;
            }
        } else {
            self.consecutive_failures = 0;
        }

        if !next.should_continue || next.question.is_terminal {
            tracing::info!("Question source ended the interview");
            return self.terminate(Some(next.question.text)).await;
        }

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if !session.record_question(&next) {
            tracing::debug!("Question already outstanding, dropping new question");
            self.activity = Activity::Quiet;
            return Ok(());
        }

        let event = InterviewEvent::QuestionAsked {
            number: session.question_index,
            topic: session.topic.clone(),
            text: next.question.text.clone(),
            progress: session.progress(),
        };
        tracing::info!(number = session.question_index, topic = %session.topic, "Asking question");
        self.emit(event).await?;
        self.speak_question(&next.question.text).await
    }

    async fn speak_question(&mut self, text: &str) -> Result<()> {
        self.utterance = self.utterance.next();
        let id = self.utterance;
        match self.speech.speak(id, text).await {
            Ok(()) => {
                self.activity = Activity::Speaking(id);
                self.emit(InterviewEvent::Speaking).await
            }
            Err(e) => {
                // The question is already on screen; let the candidate answer.
                tracing::error!("Failed to speak question: {e:#}");
                self.begin_listening().await
            }
        }
    }

    async fn begin_listening(&mut self) -> Result<()> {
        match self.speech.listen().await {
            Ok(()) => {
                self.activity = Activity::Listening;
                self.emit(InterviewEvent::Listening).await
            }
            Err(e) => {
                tracing::error!("Failed to start listening: {e:#}");
                self.activity = Activity::Quiet;
                self.emit(InterviewEvent::Notice(format!("Speech recognition unavailable: {e}")))
                    .await
            }
        }
    }

    /// Records a final transcript as the answer to the outstanding question
    /// and moves the interview on. Blank text changes nothing.
    pub async fn on_answer_received(&mut self, text: &str) -> Result<()> {
        let text = text.trim();
        if text.is_empty() {
            tracing::debug!("Ignoring empty transcript");
            return Ok(());
        }
        if self.state != InterviewState::Running {
            tracing::debug!(state = ?self.state, "Ignoring answer outside a running interview");
            return Ok(());
        }

        match self.activity {
            Activity::Speaking(_) => {
                if let Err(e) = self.speech.stop_speaking().await {
                    tracing::warn!("Failed to stop speaking: {e:#}");
                }
            }
            Activity::Listening => {
                if let Err(e) = self.speech.stop_listening().await {
                    tracing::warn!("Failed to stop listening: {e:#}");
                }
            }
            Activity::Quiet | Activity::AwaitingQuestion => {}
        }

        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };
        if !session.record_answer(text) {
            tracing::debug!("No outstanding question, ignoring answer");
            return Ok(());
        }
        self.activity = Activity::Quiet;

        if self.settings.is_end_request(text) {
            tracing::info!("Candidate asked to end the interview");
            return self.terminate(None).await;
        }
        self.ask_next().await
    }

    pub async fn handle_speech_event(&mut self, event: SpeechEvent) -> Result<()> {
        match event {
            SpeechEvent::SpeakingDone(id) => {
                if self.state == InterviewState::Running && self.activity == Activity::Speaking(id) {
                    self.begin_listening().await
                } else {
                    tracing::debug!(?id, activity = ?self.activity, "Ignoring stale speaking-done");
                    Ok(())
                }
            }
            SpeechEvent::PartialTranscript(_) => Ok(()),
            SpeechEvent::FinalTranscript(text) => {
                if self.activity == Activity::Listening {
                    self.on_answer_received(&text).await
                } else {
                    tracing::debug!(activity = ?self.activity, "Ignoring transcript while not listening");
                    Ok(())
                }
            }
            SpeechEvent::RecognitionError(message) => {
                if self.state != InterviewState::Running || self.activity != Activity::Listening {
                    tracing::debug!(%message, "Ignoring stale recognition error");
                    return Ok(());
                }
                tracing::warn!(%message, "Speech recognition error");
                if let Err(e) = self.speech.stop_listening().await {
                    tracing::warn!("Failed to stop listening: {e:#}");
                }
                self.activity = Activity::Quiet;
                self.emit(InterviewEvent::Notice(format!("Speech recognition error: {message}")))
                    .await
            }
            SpeechEvent::Closed => {
                tracing::warn!("Speech engine closed");
                if self.state == InterviewState::Running {
                    self.terminate(None).await
                } else {
                    Ok(())
                }
            }
        }
    }

    /// Restarts listening after a recognition error.
    pub async fn resume_listening(&mut self) -> Result<()> {
        let outstanding = self
            .session
            .as_ref()
            .is_some_and(|s| s.transcript.last_speaker() == Some(Speaker::Ai));
        if self.state == InterviewState::Running && self.activity == Activity::Quiet && outstanding {
            self.begin_listening().await
        } else {
            tracing::debug!(activity = ?self.activity, "Nothing to resume");
            Ok(())
        }
    }

    pub async fn handle_control(&mut self, control: Control) -> Result<()> {
        match control {
            Control::EndInterview => {
                if self.state == InterviewState::Running {
                    self.terminate(None).await
                } else {
                    Ok(())
                }
            }
            Control::ResumeListening => self.resume_listening().await,
            Control::Abandon => self.abandon().await,
        }
    }

    async fn halt_speech(&mut self) {
        if let Err(e) = self.speech.stop_speaking().await {
            tracing::warn!("Failed to stop speaking: {e:#}");
        }
        if let Err(e) = self.speech.stop_listening().await {
            tracing::warn!("Failed to stop listening: {e:#}");
        }
        self.activity = Activity::Quiet;
    }

    /// Cancels speech in both directions, speaks the closing remark, waits
    /// the closing delay and emits the completion summary.
    pub async fn terminate(&mut self, closing: Option<String>) -> Result<()> {
        if matches!(self.state, InterviewState::Terminating | InterviewState::Done) {
            return Ok(());
        }
        if self.session.is_none() {
            tracing::debug!(state = ?self.state, "No session to terminate");
            return Ok(());
        }
        self.state = InterviewState::Terminating;
        tracing::info!("Terminating interview");
        self.halt_speech().await;

        let remark = closing
            .filter(|c| !c.trim().is_empty())
            .unwrap_or_else(|| self.settings.closing_remark.clone());
        self.emit(InterviewEvent::Closing(remark.clone())).await?;

        self.utterance = self.utterance.next();
        match self.speech.speak(self.utterance, &remark).await {
            Ok(()) => self.activity = Activity::Speaking(self.utterance),
            Err(e) => tracing::error!("Failed to speak closing remark: {e:#}"),
        }

        tokio::time::sleep(self.settings.closing_delay).await;

        let summary = self
            .session
            .as_ref()
            .map(|s| s.summarize(Utc::now()))
            .context("Terminating without a session")?;
        self.state = InterviewState::Done;
        self.activity = Activity::Quiet;
        tracing::info!(
            asked = summary.questions_asked,
            answered = summary.questions_answered,
            "Interview complete"
        );
        self.summary = Some(summary.clone());
        self.emit(InterviewEvent::Completed(summary)).await
    }

    /// Stops everything and discards the session without a summary.
    pub async fn abandon(&mut self) -> Result<()> {
        if self.state == InterviewState::Done {
            return Ok(());
        }
        tracing::info!("Interview abandoned");
        self.halt_speech().await;
        self.session = None;
        self.state = InterviewState::Done;
        self.emit(InterviewEvent::Abandoned).await
    }

    /// Feeds speech events and controls into the controller until the
    /// interview is done. Returns the summary, or `None` if abandoned.
    pub async fn run(
        &mut self,
        mut speech_rx: mpsc::Receiver<SpeechEvent>,
        mut control_rx: mpsc::Receiver<Control>,
    ) -> Result<Option<SessionSummary>> {
        let mut controls_open = true;
        while self.state != InterviewState::Done {
            tokio::select! {
                event = speech_rx.recv() => match event {
                    Some(event) => self.handle_speech_event(event).await?,
                    None => {
                        self.handle_speech_event(SpeechEvent::Closed).await?;
                        if self.state != InterviewState::Done {
                            self.abandon().await?;
                        }
                    }
                },
                control = control_rx.recv(), if controls_open => match control {
                    Some(control) => self.handle_control(control).await?,
                    None => controls_open = false,
                },
            }
        }
        Ok(self.summary.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::question_source::{MockQuestionSource, StaticQuestionSource};
    use crate::settings::DEFAULT_CLOSING_REMARK;
    use crate::topic::ROLE_PLANS;
    use async_trait::async_trait;
    use std::sync::{Arc, Mutex};
    use std::time::Duration;

    #[derive(Debug, Clone, PartialEq, Eq)]
    enum Call {
        Speak(UtteranceId, String),
        StopSpeaking,
        Listen,
        StopListening,
    }

    /// Records every call; never fails.
    #[derive(Clone, Default)]
    struct RecordingSpeech {
        calls: Arc<Mutex<Vec<Call>>>,
    }

    impl RecordingSpeech {
        fn calls(&self) -> Vec<Call> {
            self.calls.lock().unwrap().clone()
        }

        fn spoken(&self) -> Vec<String> {
            self.calls()
                .into_iter()
                .filter_map(|c| match c {
                    Call::Speak(_, text) => Some(text),
                    _ => None,
                })
                .collect()
        }
    }

    #[async_trait]
    impl SpeechIo for RecordingSpeech {
        async fn speak(&mut self, id: UtteranceId, text: &str) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Speak(id, text.to_string()));
            Ok(())
        }

        async fn stop_speaking(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push(Call::StopSpeaking);
            Ok(())
        }

        async fn listen(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Listen);
            Ok(())
        }

        async fn stop_listening(&mut self) -> Result<()> {
            self.calls.lock().unwrap().push(Call::StopListening);
            Ok(())
        }

        async fn events(&mut self) -> Result<mpsc::Receiver<SpeechEvent>> {
            anyhow::bail!("not used in tests")
        }
    }

    fn settings() -> InterviewSettings {
        InterviewSettings {
            closing_delay: Duration::ZERO,
            ..InterviewSettings::default()
        }
    }

    fn controller<Q: QuestionSource>(
        source: Q,
    ) -> (
        InterviewController<Q, RecordingSpeech>,
        RecordingSpeech,
        mpsc::Receiver<InterviewEvent>,
    ) {
        let speech = RecordingSpeech::default();
        let (event_tx, event_rx) = mpsc::channel(256);
        let controller = InterviewController::new(source, speech.clone(), settings(), event_tx);
        (controller, speech, event_rx)
    }

    /// Plays the speech engine: finishes the current utterance, then
    /// delivers `answer` as a final transcript.
    async fn answer<Q: QuestionSource>(
        controller: &mut InterviewController<Q, RecordingSpeech>,
        answer: &str,
    ) {
        if let Activity::Speaking(id) = controller.activity() {
            controller
                .handle_speech_event(SpeechEvent::SpeakingDone(id))
                .await
                .unwrap();
        }
        controller
            .handle_speech_event(SpeechEvent::FinalTranscript(answer.to_string()))
            .await
            .unwrap();
    }

    fn drain(rx: &mut mpsc::Receiver<InterviewEvent>) -> Vec<InterviewEvent> {
        let mut events = Vec::new();
        while let Ok(event) = rx.try_recv() {
            events.push(event);
        }
        events
    }

    fn asked(events: &[InterviewEvent]) -> Vec<String> {
        events
            .iter()
            .filter_map(|e| match e {
                InterviewEvent::QuestionAsked { text, .. } => Some(text.clone()),
                _ => None,
            })
            .collect()
    }

    fn assert_alternates(transcript: &Transcript) {
        for (i, turn) in transcript.turns().iter().enumerate() {
            let expected = if i % 2 == 0 { Speaker::Ai } else { Speaker::User };
            assert_eq!(turn.speaker, expected, "turn {i} out of order");
        }
    }

    #[tokio::test]
    async fn start_asks_first_question_and_listens_after_speaking() {
        let (mut controller, speech, mut events) = controller(StaticQuestionSource);
        controller.start("Software Engineer").await.unwrap();

        let first = ROLE_PLANS[0].topics[0].questions[0];
        assert_eq!(controller.state(), InterviewState::Running);
        assert_eq!(speech.calls(), vec![Call::Speak(UtteranceId(1), first.to_string())]);
        assert_eq!(controller.activity(), Activity::Speaking(UtteranceId(1)));

        controller
            .handle_speech_event(SpeechEvent::SpeakingDone(UtteranceId(1)))
            .await
            .unwrap();
        assert_eq!(controller.activity(), Activity::Listening);
        assert_eq!(speech.calls().last(), Some(&Call::Listen));

        let events = drain(&mut events);
        assert!(matches!(
            &events[0],
            InterviewEvent::QuestionAsked { number: 1, progress: Some(_), .. }
        ));
        assert_eq!(events.last(), Some(&InterviewEvent::Listening));
    }

    #[tokio::test]
    async fn fifth_question_is_first_follow_up() {
        let (mut controller, _speech, mut events) = controller(StaticQuestionSource);
        controller.start("Software Engineer").await.unwrap();
        for i in 0..4 {
            answer(&mut controller, &format!("answer {i}")).await;
        }

        let topic = &ROLE_PLANS[0].topics[0];
        assert_eq!(topic.questions.len(), 4);
        let asked = asked(&drain(&mut events));
        assert_eq!(asked.len(), 5);
        assert_eq!(asked[..4], topic.questions[..]);
        assert_eq!(asked[4], topic.follow_ups[0]);
        assert_eq!(controller.session().unwrap().topic, topic.name);
    }

    #[tokio::test]
    async fn static_interview_runs_to_completion() {
        let (mut controller, speech, mut events) = controller(StaticQuestionSource);
        controller.start("Data Analyst").await.unwrap();

        let plan = RolePlan::for_role("Data Analyst");
        for i in 0..plan.total_questions() {
            answer(&mut controller, &format!("a thoughtful answer {i}")).await;
        }

        assert_eq!(controller.state(), InterviewState::Done);
        let summary = controller.summary().unwrap().clone();
        assert_eq!(summary.questions_asked, plan.total_questions());
        assert_eq!(summary.questions_answered, plan.total_questions());
        assert_eq!(summary.topics_covered.len(), plan.topics.len());
        assert_alternates(&summary.transcript);
        assert_eq!(speech.spoken().last().map(String::as_str), Some(DEFAULT_CLOSING_REMARK));

        let events = drain(&mut events);
        assert!(matches!(events.last(), Some(InterviewEvent::Completed(_))));
        let topic_changes = events
            .iter()
            .filter_map(|e| match e {
                InterviewEvent::QuestionAsked { topic, .. } => Some(topic.clone()),
                _ => None,
            })
            .collect::<Vec<_>>();
        assert_eq!(topic_changes.first().map(String::as_str), Some(plan.topics[0].name));
        assert_eq!(topic_changes.last().map(String::as_str), Some(plan.topics[2].name));
    }

    #[tokio::test]
    async fn blank_transcript_changes_nothing() {
        let (mut controller, _speech, _events) = controller(StaticQuestionSource);
        controller.start("Software Engineer").await.unwrap();
        answer(&mut controller, "   \n\t").await;

        let session = controller.session().unwrap();
        assert_eq!(session.transcript.len(), 1);
        assert_eq!(session.question_index, 1);
        assert!(session.answers.is_empty());
        assert_eq!(controller.activity(), Activity::Listening);
    }

    #[tokio::test]
    async fn continue_false_terminates_with_oracle_remark() {
        let mut source = MockQuestionSource::new();
        source.expect_question_cap().return_const(Some(12usize));
        let mut calls = 0;
        source.expect_produce_next().returning(move |_| {
            calls += 1;
            if calls == 1 {
                Ok(NextQuestion::ask("Why this role?", None, QuestionOrigin::Oracle))
            } else {
                Ok(NextQuestion::finish("That's all, thanks!", QuestionOrigin::Oracle))
            }
        });

        let (mut controller, speech, _events) = controller(source);
        controller.start("Product Manager").await.unwrap();
        answer(&mut controller, "I love shipping.").await;

        assert_eq!(controller.state(), InterviewState::Done);
        assert_eq!(speech.spoken().last().map(String::as_str), Some("That's all, thanks!"));
        let summary = controller.summary().unwrap();
        assert_eq!(summary.questions_asked, 1);
        assert_eq!(summary.questions_answered, 1);
    }

    #[tokio::test]
    async fn question_cap_terminates_even_when_source_would_continue() {
        let mut source = MockQuestionSource::new();
        source.expect_question_cap().return_const(Some(3usize));
        source
            .expect_produce_next()
            .times(3)
            .returning(|ctx| {
                Ok(NextQuestion::ask(
                    format!("Question {}", ctx.question_count + 1),
                    None,
                    QuestionOrigin::Oracle,
                ))
            });

        let (mut controller, _speech, mut events) = controller(source);
        controller.start("Software Engineer").await.unwrap();
        for i in 0..3 {
            answer(&mut controller, &format!("answer {i}")).await;
        }

        assert_eq!(controller.state(), InterviewState::Done);
        assert_eq!(asked(&drain(&mut events)).len(), 3);
        assert_eq!(controller.summary().unwrap().questions_answered, 3);
    }

    #[tokio::test]
    async fn questions_answered_tracks_questions_actually_asked() {
        let mut source = MockQuestionSource::new();
        source.expect_question_cap().return_const(None::<usize>);
        source.expect_produce_next().returning(|ctx| {
            if ctx.question_count < 2 {
                Ok(NextQuestion::ask("Go on?", None, QuestionOrigin::Oracle))
            } else {
                Ok(NextQuestion::finish("Done.", QuestionOrigin::Oracle))
            }
        });

        let (mut controller, _speech, _events) = controller(source);
        controller.start("Software Engineer").await.unwrap();
        // Five answers offered, but only two questions are ever asked.
        for i in 0..5 {
            answer(&mut controller, &format!("answer {i}")).await;
        }

        let summary = controller.summary().unwrap();
        assert_eq!(summary.questions_asked, 2);
        assert_eq!(summary.questions_answered, 2);
        assert_alternates(&summary.transcript);
    }

    #[tokio::test]
    async fn end_phrase_terminates_after_recording_answer() {
        let (mut controller, speech, _events) = controller(StaticQuestionSource);
        controller.start("Marketing Manager").await.unwrap();
        answer(&mut controller, "Actually, let's END INTERVIEW here.").await;

        assert_eq!(controller.state(), InterviewState::Done);
        let summary = controller.summary().unwrap();
        assert_eq!(summary.questions_answered, 1);
        assert_eq!(summary.transcript.len(), 2);
        let calls = speech.calls();
        let closing_call = Call::Speak(UtteranceId(2), DEFAULT_CLOSING_REMARK.to_string());
        let closing = calls.iter().position(|c| *c == closing_call);
        let stop = calls.iter().rposition(|c| *c == Call::StopSpeaking);
        assert!(stop.unwrap() < closing.unwrap());
    }

    #[tokio::test]
    async fn stale_speaking_done_is_ignored() {
        let (mut controller, speech, _events) = controller(StaticQuestionSource);
        controller.start("Software Engineer").await.unwrap();

        controller
            .handle_speech_event(SpeechEvent::SpeakingDone(UtteranceId(41)))
            .await
            .unwrap();
        assert_eq!(controller.activity(), Activity::Speaking(UtteranceId(1)));
        assert!(!speech.calls().contains(&Call::Listen));

        // A transcript while speaking is not an answer.
        controller
            .handle_speech_event(SpeechEvent::FinalTranscript("hello?".to_string()))
            .await
            .unwrap();
        assert_eq!(controller.session().unwrap().transcript.len(), 1);
    }

    #[tokio::test]
    async fn recognition_error_stops_listening_until_resumed() {
        let (mut controller, speech, mut events) = controller(StaticQuestionSource);
        controller.start("Software Engineer").await.unwrap();
        controller
            .handle_speech_event(SpeechEvent::SpeakingDone(UtteranceId(1)))
            .await
            .unwrap();
        controller
            .handle_speech_event(SpeechEvent::RecognitionError("no-speech".to_string()))
            .await
            .unwrap();

        assert_eq!(controller.state(), InterviewState::Running);
        assert_eq!(controller.activity(), Activity::Quiet);
        assert_eq!(speech.calls().last(), Some(&Call::StopListening));
        assert!(drain(&mut events)
            .iter()
            .any(|e| matches!(e, InterviewEvent::Notice(msg) if msg.contains("no-speech"))));

        controller.handle_control(Control::ResumeListening).await.unwrap();
        assert_eq!(controller.activity(), Activity::Listening);
        answer(&mut controller, "Rust, mostly.").await;
        assert_eq!(controller.session().unwrap().answers, vec!["Rust, mostly."]);
    }

    #[tokio::test]
    async fn repeated_fallbacks_end_the_interview() {
        let mut source = MockQuestionSource::new();
        source.expect_question_cap().return_const(Some(12usize));
        source
            .expect_produce_next()
            .returning(|ctx| Ok(NextQuestion::fallback(ctx.question_count)));

        let (mut controller, speech, _events) = controller(source);
        controller.start("Software Engineer").await.unwrap();
        answer(&mut controller, "first").await;
        assert_eq!(controller.state(), InterviewState::Running);
        answer(&mut controller, "second").await;

        assert_eq!(controller.state(), InterviewState::Done);
        assert_eq!(speech.spoken().last().map(String::as_str), Some(ORACLE_UNAVAILABLE_REMARK));
        assert_eq!(controller.summary().unwrap().questions_asked, 2);
    }

    #[tokio::test]
    async fn source_error_is_replaced_by_fallback() {
        let mut source = MockQuestionSource::new();
        source.expect_question_cap().return_const(None::<usize>);
        source
            .expect_produce_next()
            .returning(|_| Err(crate::error::OracleError::EmptyReply));

        let (mut controller, _speech, mut events) = controller(source);
        controller.start("Software Engineer").await.unwrap();

        assert_eq!(controller.state(), InterviewState::Running);
        let asked = asked(&drain(&mut events));
        assert_eq!(asked, vec![crate::question_source::FALLBACK_QUESTIONS[0].to_string()]);
    }

    #[tokio::test]
    async fn run_loop_finishes_on_end_control() {
        let (mut controller, speech, _events) = controller(StaticQuestionSource);
        let (speech_tx, speech_rx) = mpsc::channel(8);
        let (control_tx, control_rx) = mpsc::channel(8);

        controller.start("Software Engineer").await.unwrap();
        speech_tx.send(SpeechEvent::SpeakingDone(UtteranceId(1))).await.unwrap();
        speech_tx.send(SpeechEvent::PartialTranscript("I have".to_string())).await.unwrap();
        speech_tx
            .send(SpeechEvent::FinalTranscript("I have five years of experience.".to_string()))
            .await
            .unwrap();
        speech_tx.send(SpeechEvent::SpeakingDone(UtteranceId(2))).await.unwrap();

        let driver = async {
            tokio::time::sleep(Duration::from_millis(50)).await;
            control_tx.send(Control::EndInterview).await.unwrap();
        };
        let (summary, ()) = tokio::join!(controller.run(speech_rx, control_rx), driver);

        let summary = summary.unwrap().unwrap();
        assert_eq!(summary.questions_answered, 1);
        assert_eq!(summary.questions_asked, 2);
        assert!(speech.calls().contains(&Call::StopListening));
    }

    #[tokio::test]
    async fn oracle_topic_change_switches_topic_and_resets_count() {
        let mut source = MockQuestionSource::new();
        source.expect_question_cap().return_const(None::<usize>);
        let mut calls = 0;
        source.expect_produce_next().returning(move |_| {
            calls += 1;
            let topic = match calls {
                1 => None,
                2 | 3 => Some("Culture".to_string()),
                _ => None,
            };
            Ok(NextQuestion::ask(format!("Question {calls}"), None, QuestionOrigin::Oracle)
                .with_new_topic(topic))
        });

        let (mut controller, _speech, mut events) = controller(source);
        controller.start("Software Engineer").await.unwrap();
        let opening_topic = controller.session().unwrap().topic.clone();
        assert_eq!(opening_topic, "Background & Experience");

        answer(&mut controller, "I have built a few services.").await;
        let session = controller.session().unwrap();
        assert_eq!(session.topic, "Culture");
        assert_eq!(session.asked_in_topic, 1);
        assert_eq!(session.topics_visited, ["Background & Experience", "Culture"]);

        // Repeating the current label is not a topic change.
        answer(&mut controller, "Small teams suit me.").await;
        let session = controller.session().unwrap();
        assert_eq!(session.topic, "Culture");
        assert_eq!(session.asked_in_topic, 2);
        assert_eq!(session.topics_visited.len(), 2);

        let topics: Vec<_> = drain(&mut events)
            .into_iter()
            .filter_map(|e| match e {
                InterviewEvent::QuestionAsked { topic, .. } => Some(topic),
                _ => None,
            })
            .collect();
        assert_eq!(topics, ["Background & Experience", "Culture", "Culture"]);

        controller.handle_control(Control::EndInterview).await.unwrap();
        assert_eq!(
            controller.summary().unwrap().topics_covered,
            ["Background & Experience", "Culture"]
        );
    }

    #[tokio::test]
    async fn terminate_before_start_is_a_no_op() {
        let (mut controller, speech, mut events) = controller(StaticQuestionSource);
        controller.terminate(None).await.unwrap();

        assert_eq!(controller.state(), InterviewState::Idle);
        assert!(speech.calls().is_empty());
        assert!(drain(&mut events).is_empty());

        controller.start("Software Engineer").await.unwrap();
        assert_eq!(controller.state(), InterviewState::Running);
    }

    #[tokio::test]
    async fn abandon_discards_the_session() {
        let (mut controller, _speech, mut events) = controller(StaticQuestionSource);
        controller.start("Software Engineer").await.unwrap();
        controller.handle_control(Control::Abandon).await.unwrap();

        assert_eq!(controller.state(), InterviewState::Done);
        assert!(controller.session().is_none());
        assert!(controller.summary().is_none());
        assert_eq!(drain(&mut events).last(), Some(&InterviewEvent::Abandoned));
    }

    #[tokio::test(start_paused = true)]
    async fn completion_waits_for_closing_delay() {
        let speech = RecordingSpeech::default();
        let (event_tx, mut event_rx) = mpsc::channel(64);
        let mut controller = InterviewController::new(
            StaticQuestionSource,
            speech,
            InterviewSettings::default(),
            event_tx,
        );
        controller.start("Software Engineer").await.unwrap();

        let before = tokio::time::Instant::now();
        controller.handle_control(Control::EndInterview).await.unwrap();
        assert!(before.elapsed() >= Duration::from_millis(3000));
        assert!(matches!(
            drain(&mut event_rx).last(),
            Some(InterviewEvent::Completed(_))
        ));
    }
}
