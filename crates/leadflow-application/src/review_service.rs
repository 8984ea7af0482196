//! Read-only views over sessions and transcripts for staff review.

use crate::dispatch::DirectiveDispatcher;
use crate::realtime::RealtimeChannel;
use leadflow_core::LeadflowError;
use leadflow_core::error::Result;
use leadflow_core::session::{
    Checkpoint, Message, Session, SessionRepository, SessionStatus, TranscriptRepository,
};
use serde::Serialize;
use std::collections::BTreeMap;
use std::sync::Arc;

/// One row of the staff session overview.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SessionSummary {
    pub session_id: String,
    pub status: SessionStatus,
    pub step: u32,
    pub purpose: Option<String>,
    pub name: Option<String>,
    pub email: Option<String>,
    pub checkpoint_flags: BTreeMap<Checkpoint, bool>,
    pub last_activity_at: String,
}

impl From<&Session> for SessionSummary {
    fn from(session: &Session) -> Self {
        let answer = |field: &str| session.answer(field).map(str::to_string);
        Self {
            session_id: session.id.clone(),
            status: session.status,
            step: session.step,
            purpose: answer("purpose"),
            name: answer("name"),
            email: answer("email"),
            checkpoint_flags: session.checkpoint_flags.clone(),
            last_activity_at: session.last_activity_at.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthStatus {
    pub status: &'static str,
    pub sessions: usize,
    pub active_rooms: usize,
    pub connections: usize,
    /// Sessions with bot replies still waiting out their delay.
    pub pending_replies: usize,
}

/// Retrieval surface for transcripts, session records and health.
pub struct ReviewService {
    sessions: Arc<dyn SessionRepository>,
    transcripts: Arc<dyn TranscriptRepository>,
    channel: Arc<RealtimeChannel>,
    dispatcher: Arc<DirectiveDispatcher>,
}

impl ReviewService {
    pub fn new(
        sessions: Arc<dyn SessionRepository>,
        transcripts: Arc<dyn TranscriptRepository>,
        channel: Arc<RealtimeChannel>,
        dispatcher: Arc<DirectiveDispatcher>,
    ) -> Self {
        Self {
            sessions,
            transcripts,
            channel,
            dispatcher,
        }
    }

    /// Returns the transcript of an existing session in sequence order.
    pub async fn transcript(&self, session_id: &str) -> Result<Vec<Message>> {
        if self.sessions.find_by_id(session_id).await?.is_none() {
            return Err(LeadflowError::not_found("Session", session_id));
        }
        self.transcripts.list(session_id).await
    }

    /// Lists every session, most recently active first.
    pub async fn sessions(&self) -> Result<Vec<SessionSummary>> {
        let mut sessions = self.sessions.list_all().await?;
        sessions.sort_by(|a, b| {
            b.last_activity_at
                .cmp(&a.last_activity_at)
                .then_with(|| a.id.cmp(&b.id))
        });
        Ok(sessions.iter().map(SessionSummary::from).collect())
    }

    pub async fn health(&self) -> Result<HealthStatus> {
        let sessions = self.sessions.list_all().await?.len();
        let stats = self.channel.stats().await;
        Ok(HealthStatus {
            status: "ok",
            sessions,
            active_rooms: stats.rooms,
            connections: stats.connections,
            pending_replies: self.dispatcher.pending_sessions().await,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::TokioClock;
    use crate::dispatch::DelayQueue;
    use crate::session::SessionLocks;
    use async_trait::async_trait;
    use leadflow_core::flow::Directive;
    use leadflow_core::notifier::{Notification, Notifier};
    use leadflow_core::session::{MessageKind, NewMessage};
    use std::collections::HashMap;
    use std::sync::Mutex;
    use std::time::Duration;

    #[derive(Default)]
    struct MockSessionRepository {
        sessions: Mutex<HashMap<String, Session>>,
    }

    #[async_trait]
    impl SessionRepository for MockSessionRepository {
        async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
            Ok(self.sessions.lock().unwrap().get(session_id).cloned())
        }

        async fn create_if_absent(&self, session: Session) -> Result<(Session, bool)> {
            let mut sessions = self.sessions.lock().unwrap();
            if let Some(existing) = sessions.get(&session.id) {
                return Ok((existing.clone(), false));
            }
            sessions.insert(session.id.clone(), session.clone());
            Ok((session, true))
        }

        async fn save(&self, session: &Session) -> Result<()> {
            self.sessions
                .lock()
                .unwrap()
                .insert(session.id.clone(), session.clone());
            Ok(())
        }

        async fn list_all(&self) -> Result<Vec<Session>> {
            Ok(self.sessions.lock().unwrap().values().cloned().collect())
        }
    }

    #[derive(Default)]
    struct MockTranscriptRepository {
        messages: Mutex<Vec<Message>>,
    }

    #[async_trait]
    impl TranscriptRepository for MockTranscriptRepository {
        async fn append(&self, message: NewMessage) -> Result<Message> {
            let mut messages = self.messages.lock().unwrap();
            let committed = message.commit(messages.len() as u64 + 1);
            messages.push(committed.clone());
            Ok(committed)
        }

        async fn list(&self, session_id: &str) -> Result<Vec<Message>> {
            Ok(self
                .messages
                .lock()
                .unwrap()
                .iter()
                .filter(|m| m.session_id == session_id)
                .cloned()
                .collect())
        }
    }

    struct NoopNotifier;

    #[async_trait]
    impl Notifier for NoopNotifier {
        async fn notify(&self, _notification: &Notification) -> Result<()> {
            Ok(())
        }
    }

    fn session(id: &str, last_activity_at: &str, answers: &[(&str, &str)]) -> Session {
        let mut session = Session::new(id);
        session.last_activity_at = last_activity_at.to_string();
        for (k, v) in answers {
            session.answers.insert(k.to_string(), v.to_string());
        }
        session
    }

    async fn service() -> (ReviewService, Arc<DirectiveDispatcher>) {
        let sessions = Arc::new(MockSessionRepository::default());
        sessions
            .save(&session("old", "2024-01-01T00:00:00+00:00", &[("name", "Ana")]))
            .await
            .unwrap();
        sessions
            .save(&session(
                "new",
                "2024-06-01T00:00:00+00:00",
                &[("name", "Ben"), ("purpose", "Study")],
            ))
            .await
            .unwrap();

        let transcripts = Arc::new(MockTranscriptRepository::default());
        transcripts
            .append(NewMessage::user("new", "Study"))
            .await
            .unwrap();

        let channel = Arc::new(RealtimeChannel::new());
        let dispatcher = Arc::new(DirectiveDispatcher::new(
            sessions.clone(),
            transcripts.clone(),
            Arc::new(NoopNotifier),
            channel.clone(),
            Arc::new(SessionLocks::new()),
            DelayQueue::new(Arc::new(TokioClock)),
            Duration::from_secs(10),
        ));
        let service = ReviewService::new(sessions, transcripts, channel, dispatcher.clone());
        (service, dispatcher)
    }

    #[tokio::test]
    async fn test_sessions_sorted_by_recent_activity() {
        let (service, _) = service().await;
        let summaries = service.sessions().await.unwrap();
        let ids: Vec<_> = summaries.iter().map(|s| s.session_id.as_str()).collect();
        assert_eq!(ids, vec!["new", "old"]);
        assert_eq!(summaries[0].purpose.as_deref(), Some("Study"));
        assert_eq!(summaries[1].email, None);
    }

    #[tokio::test]
    async fn test_transcript_requires_known_session() {
        let (service, _) = service().await;
        assert_eq!(service.transcript("new").await.unwrap().len(), 1);
        assert!(service.transcript("ghost").await.unwrap_err().is_not_found());
    }

    #[tokio::test]
    async fn test_health_counts_sessions() {
        let (service, _) = service().await;
        let health = service.health().await.unwrap();
        assert_eq!(health.status, "ok");
        assert_eq!(health.sessions, 2);
        assert_eq!(health.active_rooms, 0);
        assert_eq!(health.pending_replies, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_health_reports_pending_replies_until_they_fire() {
        let (service, dispatcher) = service().await;
        let mut session = Session::new("new");
        dispatcher
            .dispatch(
                &mut session,
                vec![Directive::delayed_message(
                    "Thanks!",
                    Duration::from_millis(600),
                    MessageKind::Text,
                )],
            )
            .await
            .unwrap();

        assert_eq!(service.health().await.unwrap().pending_replies, 1);

        tokio::time::sleep(Duration::from_secs(1)).await;
        assert_eq!(service.health().await.unwrap().pending_replies, 0);
        assert_eq!(service.transcript("new").await.unwrap().len(), 2);
    }
}
