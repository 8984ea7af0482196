//! In-memory SessionRepository implementation.

use async_trait::async_trait;
use leadflow_core::error::Result;
use leadflow_core::session::{Session, SessionRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;

/// Session store backed by a `HashMap`. Contents are lost on drop.
#[derive(Debug, Default)]
pub struct InMemorySessionRepository {
    sessions: RwLock<HashMap<String, Session>>,
}

impl InMemorySessionRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl SessionRepository for InMemorySessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.sessions.read().await.get(session_id).cloned())
    }

    async fn create_if_absent(&self, session: Session) -> Result<(Session, bool)> {
        let mut sessions = self.sessions.write().await;
        if let Some(existing) = sessions.get(&session.id) {
            return Ok((existing.clone(), false));
        }
        sessions.insert(session.id.clone(), session.clone());
        Ok((session, true))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        self.sessions
            .write()
            .await
            .insert(session.id.clone(), session.clone());
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        Ok(self.sessions.read().await.values().cloned().collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_create_if_absent_keeps_first_record() {
        let repo = InMemorySessionRepository::new();

        let (first, created) = repo.create_if_absent(Session::new("s-1")).await.unwrap();
        assert!(created);

        let mut other = Session::new("s-1");
        other.step = 4;
        let (stored, created) = repo.create_if_absent(other).await.unwrap();
        assert!(!created);
        assert_eq!(stored.step, first.step);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_create_reports_one_creation() {
        let repo = Arc::new(InMemorySessionRepository::new());
        let handles: Vec<_> = (0..16)
            .map(|_| {
                let repo = repo.clone();
                tokio::spawn(async move { repo.create_if_absent(Session::new("s-1")).await })
            })
            .collect();

        let mut created = 0;
        for handle in handles {
            if handle.await.unwrap().unwrap().1 {
                created += 1;
            }
        }
        assert_eq!(created, 1);
        assert_eq!(repo.list_all().await.unwrap().len(), 1);
    }
}
