//! Survey bot: routes inbound chat messages to per-session workers and
//! executes what the survey state machine decides.
//!
//! Every session key gets its own task that owns the `Session` value and
//! handles that session's messages one at a time. The dispatcher only holds
//! the sender half of each worker's queue.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::StreamExt;
use tokio::sync::RwLock;
use tokio::sync::mpsc::{self, UnboundedReceiver, UnboundedSender, error::SendError};
use tokio::task::JoinSet;
use tracing::{Instrument, debug, info, warn};

use crate::channels::{Channel, IncomingMessage, StatusUpdate, deliver};
use crate::error::{ChannelError, SurveyError};
use crate::scoring::SurveyScorer;
use crate::survey::localization::{Text, format_result, invalid_input_hint, question, text};
use crate::survey::{Language, Session, Survey, SurveyCommand, Transition, transition};

/// Default time a session may stay silent before it is dropped.
pub const DEFAULT_IDLE_TIMEOUT: Duration = Duration::from_secs(3600);

type WorkerMap = HashMap<String, UnboundedSender<IncomingMessage>>;

/// The chat front end of the survey.
#[derive(Clone)]
pub struct SurveyBot {
    channel: Arc<dyn Channel>,
    scorer: Arc<dyn SurveyScorer>,
    idle_timeout: Duration,
    workers: Arc<RwLock<WorkerMap>>,
}

impl SurveyBot {
    pub fn new(channel: Arc<dyn Channel>, scorer: Arc<dyn SurveyScorer>) -> Self {
        Self {
            channel,
            scorer,
            idle_timeout: DEFAULT_IDLE_TIMEOUT,
            workers: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    pub fn with_idle_timeout(mut self, idle_timeout: Duration) -> Self {
        self.idle_timeout = idle_timeout;
        self
    }

    /// Number of sessions that currently have a live worker.
    pub async fn active_sessions(&self) -> usize {
        self.workers.read().await.len()
    }

    /// Consume the channel's inbound stream until it ends.
    ///
    /// When the stream closes, queued messages are still handled before this
    /// returns.
    pub async fn run(&self) -> Result<(), ChannelError> {
        let mut stream = self.channel.start().await?;
        let mut tasks = JoinSet::new();

        info!(channel = self.channel.name(), "Survey bot started");

        while let Some(msg) = stream.next().await {
            self.dispatch(msg, &mut tasks).await;
            // Reap finished workers
            while tasks.try_join_next().is_some() {}
        }

        info!("Inbound stream closed, draining sessions");
        self.workers.write().await.clear();
        while tasks.join_next().await.is_some() {}

        self.channel.shutdown().await
    }

    /// Hand `msg` to its session's worker, starting one if needed.
    async fn dispatch(&self, msg: IncomingMessage, tasks: &mut JoinSet<()>) {
        let key = msg.session_key();
        let mut workers = self.workers.write().await;

        let msg = match workers.get(&key) {
            Some(tx) => match tx.send(msg) {
                Ok(()) => return,
                // Worker exited between lookups; start a fresh one.
                Err(SendError(msg)) => msg,
            },
            None => msg,
        };

        let (tx, rx) = mpsc::unbounded_channel();
        workers.insert(key.clone(), tx);
        drop(workers);

        debug!(session = %key, "Starting session worker");
        let span = tracing::info_span!("session", key = %key);
        tasks.spawn(self.clone().run_worker(key, msg, rx).instrument(span));
    }

    async fn run_worker(
        self,
        key: String,
        first: IncomingMessage,
        mut rx: UnboundedReceiver<IncomingMessage>,
    ) {
        let mut session = Session::new(key.clone());
        let mut pending = Some(first);

        loop {
            let msg = match pending.take() {
                Some(msg) => msg,
                None => match tokio::time::timeout(self.idle_timeout, rx.recv()).await {
                    Ok(Some(msg)) => msg,
                    Ok(None) => break,
                    Err(_) => {
                        // Holding the write lock keeps the dispatcher from
                        // queueing anything while the worker decides to exit.
                        let mut workers = self.workers.write().await;
                        match rx.try_recv() {
                            Ok(msg) => msg,
                            Err(_) if session.is_idle(self.idle_timeout) => {
                                workers.remove(&key);
                                info!(state = %session.state, "Dropping idle session");
                                break;
                            }
                            Err(_) => continue,
                        }
                    }
                },
            };

            self.handle_message(&mut session, &msg).await;
        }
    }

    /// Apply one inbound message to `session` and send every resulting reply.
    pub async fn handle_message(&self, session: &mut Session, msg: &IncomingMessage) {
        session.touch();
        let command = SurveyCommand::parse(&msg.content);
        let input = command.label().to_string();
        let from = session.state;

        match transition(session, command) {
            Ok(Transition {
                replies,
                submission,
            }) => {
                debug_assert!(from == session.state || from.can_transition_to(session.state));
                debug!(input = %input, from = %from, to = %session.state, "Transition");
                for reply in &replies {
                    self.send(msg, reply).await;
                }
                if let Some(survey) = submission {
                    self.submit(session.language, msg, survey).await;
                }
            }
            Err(SurveyError::Validation(reason)) => {
                debug!(reason = %reason, "Answer rejected");
                self.send(msg, text(Text::EmptyAnswer, session.language))
                    .await;
                if let (Some(aspect), Some(lang)) = (session.state.aspect(), session.language) {
                    self.send(msg, question(aspect, lang)).await;
                }
            }
            Err(err @ SurveyError::InvalidTransition { .. }) => {
                debug!(error = %err, "Input not accepted");
                self.send(msg, invalid_input_hint(session.state, session.language))
                    .await;
            }
        }
    }

    /// Score a completed survey and relay the result, or exactly one failure
    /// notice. The session has already been reset by the state machine.
    async fn submit(&self, language: Option<Language>, msg: &IncomingMessage, survey: Survey) {
        let _ = self
            .channel
            .send_status(
                StatusUpdate::Thinking("Scoring survey".into()),
                &msg.metadata,
            )
            .await;

        match self.scorer.score(&survey).await {
            Ok(result) => {
                info!("Survey scored, relaying result");
                let lang = language.unwrap_or(Language::En);
                for part in format_result(&result, lang) {
                    self.send(msg, &part).await;
                }
            }
            Err(e) => {
                warn!(error = %e, "Survey submission failed");
                self.send(msg, text(Text::SubmitFailed, language)).await;
            }
        }
    }

    async fn send(&self, msg: &IncomingMessage, content: &str) {
        if let Err(e) = deliver(self.channel.as_ref(), msg, content).await {
            warn!(channel = self.channel.name(), error = %e, "Failed to deliver reply");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;

    use super::*;
    use crate::channels::{MessageStream, OutgoingResponse};
    use crate::error::ScoringError;
    use crate::survey::{Aspect, ScoringResult, SurveyState};

    /// Channel fed from a test-held sender; records every reply.
    struct TestChannel {
        inbound: Mutex<Option<UnboundedReceiver<IncomingMessage>>>,
        sent: Mutex<Vec<(String, String)>>,
    }

    impl TestChannel {
        fn new() -> (Arc<Self>, UnboundedSender<IncomingMessage>) {
            let (tx, rx) = mpsc::unbounded_channel();
            let channel = Arc::new(Self {
                inbound: Mutex::new(Some(rx)),
                sent: Mutex::new(Vec::new()),
            });
            (channel, tx)
        }

        fn sent(&self) -> Vec<(String, String)> {
            self.sent.lock().unwrap().clone()
        }

        fn sent_to(&self, user: &str) -> Vec<String> {
            self.sent()
                .into_iter()
                .filter(|(u, _)| u == user)
                .map(|(_, text)| text)
                .collect()
        }
    }

    #[async_trait]
    impl Channel for TestChannel {
        fn name(&self) -> &str {
            "test"
        }

        async fn start(&self) -> Result<MessageStream, ChannelError> {
            let rx = self.inbound.lock().unwrap().take().unwrap();
            Ok(Box::pin(futures::stream::unfold(rx, |mut rx| async move {
                rx.recv().await.map(|msg| (msg, rx))
            })))
        }

        async fn respond(
            &self,
            msg: &IncomingMessage,
            response: OutgoingResponse,
        ) -> Result<(), ChannelError> {
            self.sent
                .lock()
                .unwrap()
                .push((msg.user_id.clone(), response.content));
            Ok(())
        }

        async fn send_status(
            &self,
            _status: StatusUpdate,
            _metadata: &serde_json::Value,
        ) -> Result<(), ChannelError> {
            Ok(())
        }

        async fn health_check(&self) -> Result<(), ChannelError> {
            Ok(())
        }

        fn max_message_len(&self) -> Option<usize> {
            Some(4096)
        }
    }

    struct StubScorer {
        fail: bool,
    }

    #[async_trait]
    impl SurveyScorer for StubScorer {
        async fn score(&self, survey: &Survey) -> Result<ScoringResult, ScoringError> {
            if self.fail {
                return Err(ScoringError::RemoteService("HTTP 500".into()));
            }
            Ok(ScoringResult {
                evaluations: survey
                    .iter()
                    .map(|(a, answer)| (a, format!("eval of {answer}")))
                    .collect(),
                overall_status: "almost ready".into(),
                recommendations: "talk to users".into(),
            })
        }
    }

    fn bot(channel: Arc<TestChannel>, fail: bool) -> SurveyBot {
        SurveyBot::new(channel, Arc::new(StubScorer { fail }))
    }

    fn msg(user: &str, content: &str) -> IncomingMessage {
        IncomingMessage::new("test", user, content)
    }

    async fn drive(bot: &SurveyBot, session: &mut Session, user: &str, inputs: &[&str]) {
        for input in inputs {
            bot.handle_message(session, &msg(user, input)).await;
        }
    }

    const FULL_RUN: [&str; 9] = ["/start", "/en", "/survey", "a", "b", "c", "d", "e", "f"];

    #[tokio::test]
    async fn completed_survey_relays_three_result_messages() {
        let (channel, _tx) = TestChannel::new();
        let bot = bot(channel.clone(), false);
        let mut session = Session::new("test:u");

        drive(&bot, &mut session, "u", &FULL_RUN).await;

        let sent = channel.sent_to("u");
        // 3 setup replies, 5 follow-up questions, evaluating notice, 3 result parts.
        assert_eq!(sent.len(), 12);
        assert_eq!(sent[8], text(Text::Evaluating, Some(Language::En)));
        assert!(sent[9].starts_with(text(Text::EvaluationsHeading, Some(Language::En))));
        assert!(sent[9].contains("eval of a"));
        assert!(sent[10].contains("almost ready"));
        assert!(sent[11].contains("talk to users"));
        assert_eq!(session.state, SurveyState::WaitingForSurvey);
    }

    #[tokio::test]
    async fn failed_scoring_sends_one_notice_and_resets() {
        let (channel, _tx) = TestChannel::new();
        let bot = bot(channel.clone(), true);
        let mut session = Session::new("test:u");

        drive(&bot, &mut session, "u", &FULL_RUN).await;

        let sent = channel.sent_to("u");
        let notice = text(Text::SubmitFailed, Some(Language::En));
        assert_eq!(sent.iter().filter(|s| *s == notice).count(), 1);
        assert_eq!(sent.last().unwrap(), notice);
        assert!(!sent.iter().any(|s| s.contains("eval of")));
        assert_eq!(session.state, SurveyState::WaitingForSurvey);
        assert!(session.answers().is_empty());
    }

    #[tokio::test]
    async fn rejected_input_gets_a_hint() {
        let (channel, _tx) = TestChannel::new();
        let bot = bot(channel.clone(), false);
        let mut session = Session::new("test:u");

        drive(&bot, &mut session, "u", &["/start", "hello"]).await;

        let sent = channel.sent_to("u");
        assert_eq!(sent.len(), 2);
        assert_eq!(sent[1], text(Text::ChooseLanguageFirst, None));
        assert_eq!(session.state, SurveyState::ChoosingLanguage);
    }

    #[tokio::test]
    async fn blank_answer_reasks_question() {
        let (channel, _tx) = TestChannel::new();
        let bot = bot(channel.clone(), false);
        let mut session = Session::new("test:u");

        drive(&bot, &mut session, "u", &["/start", "/ru", "/survey", "  "]).await;

        let sent = channel.sent_to("u");
        assert_eq!(sent[3], text(Text::EmptyAnswer, Some(Language::Ru)));
        assert_eq!(sent[4], question(Aspect::TargetAudience, Language::Ru));
        assert_eq!(session.state, SurveyState::Asking(Aspect::TargetAudience));
    }

    #[tokio::test]
    async fn sessions_are_isolated_and_ordered() {
        let (channel, tx) = TestChannel::new();
        let bot = bot(channel.clone(), false);

        for (user, lang) in [("alice", "/en"), ("bob", "/ru")] {
            for input in ["/start", lang, "/survey", "a", "b", "c", "d", "e", "f"] {
                tx.send(msg(user, input)).unwrap();
            }
        }
        drop(tx);

        tokio::time::timeout(Duration::from_secs(5), bot.run())
            .await
            .unwrap()
            .unwrap();

        let alice = channel.sent_to("alice");
        let bob = channel.sent_to("bob");
        assert_eq!(alice.len(), 12);
        assert_eq!(bob.len(), 12);
        assert_eq!(alice[3], question(Aspect::TechnicalSpecifications, Language::En));
        assert_eq!(bob[3], question(Aspect::TechnicalSpecifications, Language::Ru));
        assert_eq!(bot.active_sessions().await, 0);
    }

    #[tokio::test]
    async fn idle_session_is_dropped() {
        let (channel, tx) = TestChannel::new();
        let bot = bot(channel.clone(), false).with_idle_timeout(Duration::from_millis(50));
        let runner = tokio::spawn({
            let bot = bot.clone();
            async move { bot.run().await }
        });

        tx.send(msg("u", "/start")).unwrap();
        tx.send(msg("u", "/en")).unwrap();
        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(bot.active_sessions().await, 1);

        tokio::time::sleep(Duration::from_millis(300)).await;
        assert_eq!(bot.active_sessions().await, 0);

        // A fresh session starts over in the idle state.
        tx.send(msg("u", "/survey")).unwrap();
        drop(tx);
        tokio::time::timeout(Duration::from_secs(5), runner)
            .await
            .unwrap()
            .unwrap()
            .unwrap();

        let sent = channel.sent_to("u");
        assert_eq!(sent.last().unwrap(), text(Text::SendStart, None));
    }
}
