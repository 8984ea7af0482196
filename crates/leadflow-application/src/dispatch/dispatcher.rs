//! Executes flow directives against the stores, the notifier and the room.

use super::delay_queue::DelayQueue;
use crate::realtime::RealtimeChannel;
use crate::session::SessionLocks;
use leadflow_core::LeadflowError;
use leadflow_core::error::Result;
use leadflow_core::flow::Directive;
use leadflow_core::notifier::{Notification, Notifier};
use leadflow_core::realtime::{ServerEvent, SessionState};
use leadflow_core::session::{
    Answers, Checkpoint, MessageKind, NewMessage, Session, SessionRepository, TranscriptRepository,
};
use std::sync::Arc;
use std::time::Duration;

/// Inline chat message shown when a checkpoint notification could not be delivered.
pub const NOTIFIER_WARNING: &str =
    "We couldn't reach our team right now, but your answers are saved. We'll follow up with you soon.";

/// Executes directive lists in declared order.
///
/// Directives up to the first delayed one run immediately, under the
/// caller's session lock. From the first delayed directive on, every
/// directive of the batch is queued on the session's [`DelayQueue`]; each
/// queued directive later re-acquires the session lock and reloads the
/// session before executing.
///
/// For messages the order is always: append to the transcript (which
/// assigns the sequence), then broadcast.
pub struct DirectiveDispatcher {
    sessions: Arc<dyn SessionRepository>,
    transcripts: Arc<dyn TranscriptRepository>,
    notifier: Arc<dyn Notifier>,
    channel: Arc<RealtimeChannel>,
    locks: Arc<SessionLocks>,
    queue: DelayQueue,
    notifier_timeout: Duration,
}

impl DirectiveDispatcher {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        transcripts: Arc<dyn TranscriptRepository>,
        notifier: Arc<dyn Notifier>,
        channel: Arc<RealtimeChannel>,
        locks: Arc<SessionLocks>,
        queue: DelayQueue,
        notifier_timeout: Duration,
    ) -> Self {
        Self {
            sessions,
            transcripts,
            notifier,
            channel,
            locks,
            queue,
            notifier_timeout,
        }
    }

    /// Dispatches a batch for `session`. The caller must hold the session lock.
    ///
    /// Immediate directives mutate `session` in place and persist it as needed.
    /// A failing directive does not stop the rest of the batch. The first
    /// error is returned once the whole batch has run or been queued.
    pub async fn dispatch(
        self: &Arc<Self>,
        session: &mut Session,
        mut directives: Vec<Directive>,
    ) -> Result<()> {
        let split = directives
            .iter()
            .position(|d| !d.delay().is_zero())
            .unwrap_or(directives.len());
        let delayed = directives.split_off(split);

        let mut first_error = None;
        for directive in directives {
            let label = directive.label();
            if let Err(e) = self.execute(session, directive).await {
                tracing::warn!(
                    session_id = %session.id,
                    "[DirectiveDispatcher] {} failed: {}",
                    label,
                    e
                );
                first_error.get_or_insert(e);
            }
        }

        for directive in delayed {
            let dispatcher = self.clone();
            let session_id = session.id.clone();
            let delay = directive.delay();
            self.queue
                .schedule(
                    &session.id,
                    delay,
                    Box::pin(async move { dispatcher.run_delayed(&session_id, directive).await }),
                )
                .await;
        }

        first_error.map_or(Ok(()), Err)
    }

    /// Clears processing flags that survived an interrupted turn.
    ///
    /// Flags are only raised and lowered within one locked turn, so any flag
    /// still set when a session is loaded under its lock is stale. The
    /// checkpoint is not notified again.
    pub async fn clear_stale_processing(&self, session: &mut Session) -> Result<()> {
        let stale: Vec<Checkpoint> = session
            .processing_flags
            .iter()
            .filter(|(_, active)| **active)
            .map(|(checkpoint, _)| *checkpoint)
            .collect();
        if stale.is_empty() {
            return Ok(());
        }

        for checkpoint in &stale {
            tracing::warn!(
                session_id = %session.id,
                checkpoint = %checkpoint,
                "[DirectiveDispatcher] Clearing stale processing flag"
            );
            session.set_processing(*checkpoint, false);
        }
        self.sessions.save(session).await
    }

    /// Number of sessions with queued directives.
    pub async fn pending_sessions(&self) -> usize {
        self.queue.active_sessions().await
    }

    async fn run_delayed(&self, session_id: &str, directive: Directive) {
        let label = directive.label();
        let _guard = self.locks.acquire(session_id).await;

        let mut session = match self.sessions.find_by_id(session_id).await {
            Ok(Some(mut session)) => match self.clear_stale_processing(&mut session).await {
                Ok(()) => session,
                Err(e) => {
                    tracing::error!(
                        session_id,
                        "[DirectiveDispatcher] Failed to clear stale processing before {}: {}",
                        label,
                        e
                    );
                    session
                }
            },
            Ok(None) => {
                tracing::warn!(
                    session_id,
                    "[DirectiveDispatcher] Session vanished, dropping {}",
                    label
                );
                return;
            }
            Err(e) => {
                tracing::error!(
                    session_id,
                    "[DirectiveDispatcher] Failed to reload session for {}: {}",
                    label,
                    e
                );
                self.report_failure(session_id).await;
                return;
            }
        };

        if let Err(e) = self.execute(&mut session, directive).await {
            tracing::error!(
                session_id,
                "[DirectiveDispatcher] Delayed {} failed: {}",
                label,
                e
            );
            self.report_failure(session_id).await;
        }
    }

    async fn execute(&self, session: &mut Session, directive: Directive) -> Result<()> {
        tracing::debug!(
            session_id = %session.id,
            step = session.step,
            "[DirectiveDispatcher] Executing {}",
            directive.label()
        );

        match directive {
            Directive::EmitMessage { text, kind, .. } => {
                let message = self
                    .transcripts
                    .append(NewMessage::bot(&session.id, text, kind))
                    .await?;
                self.channel
                    .broadcast(&session.id, ServerEvent::Message { message })
                    .await;
            }
            Directive::OfferOptions { options, .. } => {
                let message = self
                    .transcripts
                    .append(NewMessage::options(&session.id, options))
                    .await?;
                self.channel
                    .broadcast(&session.id, ServerEvent::Options { message })
                    .await;
            }
            Directive::SetProcessing { checkpoint, active } => {
                let saved = if session.is_processing(checkpoint) == active {
                    Ok(())
                } else {
                    session.set_processing(checkpoint, active);
                    self.sessions.save(session).await
                };
                // The room always sees the indicator settle, even if the
                // flag could not be stored.
                self.channel
                    .broadcast(&session.id, ServerEvent::Processing { checkpoint, active })
                    .await;
                saved?;
            }
            Directive::TriggerNotification {
                checkpoint,
                payload,
            } => self.notify(session, checkpoint, payload).await?,
        }

        Ok(())
    }

    async fn notify(
        &self,
        session: &mut Session,
        checkpoint: Checkpoint,
        payload: Answers,
    ) -> Result<()> {
        if session.checkpoint_sent(checkpoint) {
            tracing::debug!(
                session_id = %session.id,
                checkpoint = %checkpoint,
                "[DirectiveDispatcher] Checkpoint already notified, skipping"
            );
            return Ok(());
        }

        let notification = Notification {
            checkpoint,
            session_id: session.id.clone(),
            payload,
        };
        let outcome = match tokio::time::timeout(
            self.notifier_timeout,
            self.notifier.notify(&notification),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(LeadflowError::timeout(
                format!("notify {}", checkpoint),
                u64::try_from(self.notifier_timeout.as_millis()).unwrap_or(u64::MAX),
            )),
        };

        match outcome {
            Ok(()) => {
                // Kept in memory even if the save fails; the next save of
                // this session carries it.
                session.mark_checkpoint_sent(checkpoint);
                self.sessions.save(session).await?;
                tracing::info!(
                    session_id = %session.id,
                    checkpoint = %checkpoint,
                    "[DirectiveDispatcher] Checkpoint notification delivered"
                );
                self.channel
                    .broadcast(
                        &session.id,
                        ServerEvent::SessionState(SessionState::from(&*session)),
                    )
                    .await;
            }
            Err(e) => {
                tracing::warn!(
                    session_id = %session.id,
                    checkpoint = %checkpoint,
                    "[DirectiveDispatcher] Notification failed: {}",
                    e
                );
                let message = self
                    .transcripts
                    .append(NewMessage::bot(
                        &session.id,
                        NOTIFIER_WARNING,
                        MessageKind::Text,
                    ))
                    .await?;
                self.channel
                    .broadcast(&session.id, ServerEvent::Message { message })
                    .await;
            }
        }

        Ok(())
    }

    /// Surfaces a generic retry notice to the room.
    pub async fn report_failure(&self, session_id: &str) {
        self.channel
            .broadcast(
                session_id,
                ServerEvent::Error {
                    reason: crate::RETRY_NOTICE.to_string(),
                },
            )
            .await;
    }
}
