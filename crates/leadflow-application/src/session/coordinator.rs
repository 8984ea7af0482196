//! Session coordinator: the single entry point for realtime client events.

use super::locks::SessionLocks;
use crate::RETRY_NOTICE;
use crate::clock::Clock;
use crate::dispatch::{DelayQueue, DirectiveDispatcher};
use crate::realtime::{EventSender, RealtimeChannel, TypingTracker};
use leadflow_core::LeadflowError;
use leadflow_core::config::FlowConfig;
use leadflow_core::error::Result;
use leadflow_core::flow::FlowEngine;
use leadflow_core::notifier::Notifier;
use leadflow_core::realtime::{ClientEvent, Replay, ServerEvent, SessionState};
use leadflow_core::session::{
    NewMessage, Session, SessionRepository, TranscriptRepository, UserInput,
};
use std::sync::Arc;

/// Serializes all mutating work per session and routes user turns through
/// the flow engine and the directive dispatcher.
///
/// For a given session at most one of these runs at a time: a join, a
/// user turn (evaluate, persist, dispatch), or a queued delayed directive.
/// All room broadcasts except typing presence happen under that lock, so
/// every subscriber observes the same event order.
///
/// # Usage
///
/// ```ignore
/// let coordinator = SessionCoordinator::new(engine, sessions, transcripts, notifier, clock, &config.flow);
/// let (tx, mut rx) = tokio::sync::mpsc::unbounded_channel();
/// coordinator.handle_join("session-1", "conn-1", tx).await?;
/// coordinator.handle_input("session-1", "conn-1", UserInput::choice("Get Started")).await?;
/// ```
pub struct SessionCoordinator {
    engine: FlowEngine,
    sessions: Arc<dyn SessionRepository>,
    transcripts: Arc<dyn TranscriptRepository>,
    channel: Arc<RealtimeChannel>,
    typing: Arc<TypingTracker>,
    locks: Arc<SessionLocks>,
    dispatcher: Arc<DirectiveDispatcher>,
}

impl SessionCoordinator {
    pub fn new(
        engine: FlowEngine,
        sessions: Arc<dyn SessionRepository>,
        transcripts: Arc<dyn TranscriptRepository>,
        notifier: Arc<dyn Notifier>,
        clock: Arc<dyn Clock>,
        config: &FlowConfig,
    ) -> Self {
        let channel = Arc::new(RealtimeChannel::new());
        let locks = Arc::new(SessionLocks::new());
        let typing = Arc::new(TypingTracker::new(
            channel.clone(),
            clock.clone(),
            config.typing_window(),
        ));
        let dispatcher = Arc::new(DirectiveDispatcher::new(
            sessions.clone(),
            transcripts.clone(),
            notifier,
            channel.clone(),
            locks.clone(),
            DelayQueue::new(clock),
            config.notifier_timeout(),
        ));

        Self {
            engine,
            sessions,
            transcripts,
            channel,
            typing,
            locks,
            dispatcher,
        }
    }

    pub fn channel(&self) -> &Arc<RealtimeChannel> {
        &self.channel
    }

    pub fn dispatcher(&self) -> &Arc<DirectiveDispatcher> {
        &self.dispatcher
    }

    /// Routes one client event from `connection_id`.
    ///
    /// `sender` is the connection's outbound half; it is only used by `join`.
    pub async fn handle_event(
        &self,
        connection_id: &str,
        sender: &EventSender,
        event: ClientEvent,
    ) -> Result<()> {
        let session_id = event.session_id().to_string();
        if let Some(input) = event.user_input() {
            return self.handle_input(&session_id, connection_id, input).await;
        }

        match event {
            ClientEvent::Join { .. } => {
                self.handle_join(&session_id, connection_id, sender.clone())
                    .await?;
            }
            ClientEvent::Leave { .. } => self.handle_leave(&session_id, connection_id).await,
            ClientEvent::TypingStart { .. } => {
                self.handle_typing(&session_id, connection_id, true).await
            }
            ClientEvent::TypingStop { .. } => {
                self.handle_typing(&session_id, connection_id, false).await
            }
            ClientEvent::SubmitInput { .. }
            | ClientEvent::SelectOption { .. }
            | ClientEvent::UploadFile { .. } => {}
        }
        Ok(())
    }

    /// Subscribes `connection_id` to the session, creating the session on
    /// first join, and sends it a full replay.
    ///
    /// Joining an existing session never resets it; every joiner receives
    /// the same transcript and state.
    pub async fn handle_join(
        &self,
        session_id: &str,
        connection_id: &str,
        sender: EventSender,
    ) -> Result<Replay> {
        ensure_session_id(session_id)?;
        let _guard = self.locks.acquire(session_id).await;

        let replay = match self.snapshot(session_id).await {
            Ok(replay) => replay,
            Err(e) => {
                tracing::error!(session_id, "[SessionCoordinator] Join failed: {}", e);
                let _ = sender.send(ServerEvent::Error {
                    reason: RETRY_NOTICE.to_string(),
                });
                return Err(e);
            }
        };

        self.channel
            .join(session_id, connection_id, sender)
            .await;
        self.channel
            .send_to(session_id, connection_id, ServerEvent::Replay(replay.clone()))
            .await;

        tracing::info!(
            session_id,
            connection_id,
            step = replay.state.step,
            messages = replay.transcript.len(),
            "[SessionCoordinator] Connection joined"
        );
        Ok(replay)
    }

    /// Processes one user turn.
    ///
    /// Persistence failures are reported to the room as a generic retry
    /// notice and returned to the caller; the session is left as it was
    /// before the turn.
    pub async fn handle_input(
        &self,
        session_id: &str,
        connection_id: &str,
        input: UserInput,
    ) -> Result<()> {
        ensure_session_id(session_id)?;
        let _guard = self.locks.acquire(session_id).await;

        match self.process_input(session_id, connection_id, input).await {
            Ok(()) => Ok(()),
            Err(e) => {
                tracing::error!(session_id, "[SessionCoordinator] Turn failed: {}", e);
                self.dispatcher.report_failure(session_id).await;
                Err(e)
            }
        }
    }

    pub async fn handle_leave(&self, session_id: &str, connection_id: &str) {
        self.typing.stop(session_id, connection_id).await;
        if self.channel.leave(session_id, connection_id).await {
            tracing::info!(session_id, connection_id, "[SessionCoordinator] Connection left");
        }
    }

    pub async fn handle_typing(&self, session_id: &str, connection_id: &str, active: bool) {
        self.typing.set_typing(session_id, connection_id, active).await;
    }

    /// Must be called with the session lock held.
    ///
    /// An accepted turn commits with a single session save before anything
    /// else is written. If that save fails nothing is appended, so the same
    /// input can simply be submitted again. After the commit every directive
    /// still runs and the first error is returned.
    async fn process_input(
        &self,
        session_id: &str,
        connection_id: &str,
        input: UserInput,
    ) -> Result<()> {
        let mut session = self.load_or_create(session_id).await?;
        let outcome = self.engine.evaluate(&session, &input);

        if outcome.is_closed_session() {
            tracing::debug!(session_id, "[SessionCoordinator] Input on closed session ignored");
            self.channel
                .send_to(
                    session_id,
                    connection_id,
                    ServerEvent::Error {
                        reason: outcome.error_text.unwrap_or_default(),
                    },
                )
                .await;
            return Ok(());
        }

        let Some(mutation) = &outcome.mutation else {
            tracing::debug!(
                session_id,
                step = session.step,
                reason = outcome.error_text.as_deref().unwrap_or_default(),
                "[SessionCoordinator] Turn rejected"
            );
            self.append_user_message(session_id, &input).await?;
            return self
                .dispatcher
                .dispatch(&mut session, outcome.directives)
                .await;
        };

        let mut updated = session.clone();
        mutation.apply(&mut updated);
        self.sessions.save(&updated).await?;
        session = updated;

        tracing::info!(
            session_id,
            step = session.step,
            status = %session.status,
            "[SessionCoordinator] Turn accepted"
        );
        let appended = self.append_user_message(session_id, &input).await;
        self.channel
            .broadcast(
                session_id,
                ServerEvent::SessionState(SessionState::from(&session)),
            )
            .await;

        let dispatched = self
            .dispatcher
            .dispatch(&mut session, outcome.directives)
            .await;
        appended.and(dispatched)
    }

    async fn append_user_message(&self, session_id: &str, input: &UserInput) -> Result<()> {
        let message = self
            .transcripts
            .append(NewMessage::user(session_id, input.transcript_text()))
            .await?;
        self.channel
            .broadcast(session_id, ServerEvent::Message { message })
            .await;
        Ok(())
    }

    async fn snapshot(&self, session_id: &str) -> Result<Replay> {
        let session = self.load_or_create(session_id).await?;
        let transcript = self.transcripts.list(session_id).await?;
        Ok(Replay::new(&session, transcript))
    }

    /// Fetch-or-create. A freshly created session gets the welcome
    /// directives dispatched before anyone can observe it; an existing one
    /// has processing flags left over from an interrupted turn cleared.
    async fn load_or_create(&self, session_id: &str) -> Result<Session> {
        let (mut session, created) = self
            .sessions
            .create_if_absent(Session::new(session_id))
            .await?;

        if created {
            tracing::info!(session_id, "[SessionCoordinator] Created session");
            self.dispatcher
                .dispatch(&mut session, self.engine.intro())
                .await?;
        } else {
            self.dispatcher.clear_stale_processing(&mut session).await?;
        }
        Ok(session)
    }
}

fn ensure_session_id(session_id: &str) -> Result<()> {
    if session_id.trim().is_empty() {
        return Err(LeadflowError::validation("session id must not be empty"));
    }
    Ok(())
}

#[cfg(test)]
#[path = "coordinator_test.rs"]
mod tests;
