//! In-memory TranscriptRepository implementation.

use async_trait::async_trait;
use leadflow_core::error::Result;
use leadflow_core::session::{Message, NewMessage, TranscriptRepository};
use std::collections::HashMap;
use tokio::sync::RwLock;

#[derive(Debug, Default)]
pub struct InMemoryTranscriptRepository {
    transcripts: RwLock<HashMap<String, Vec<Message>>>,
}

impl InMemoryTranscriptRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TranscriptRepository for InMemoryTranscriptRepository {
    async fn append(&self, message: NewMessage) -> Result<Message> {
        let mut transcripts = self.transcripts.write().await;
        let log = transcripts.entry(message.session_id.clone()).or_default();
        let sequence = log.last().map_or(1, |last| last.sequence + 1);
        let committed = message.commit(sequence);
        log.push(committed.clone());
        Ok(committed)
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Message>> {
        Ok(self
            .transcripts
            .read()
            .await
            .get(session_id)
            .cloned()
            .unwrap_or_default())
    }
}
