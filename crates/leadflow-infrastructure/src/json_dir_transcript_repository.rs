//! JSON Lines TranscriptRepository implementation.

use crate::json_dir_session_repository::ensure_file_safe_id;
use async_trait::async_trait;
use leadflow_core::error::Result;
use leadflow_core::session::{Message, NewMessage, TranscriptRepository};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::fs::{self, OpenOptions};
use tokio::io::AsyncWriteExt;
use tokio::sync::Mutex;

/// Transcript store appending one JSON object per line.
///
/// ```text
/// transcripts/
/// └── <session-id>.jsonl
/// ```
///
/// The last assigned sequence of recently active sessions is cached so
/// that later appends do not rescan the file. The cache holds at most
/// `cache_capacity` sessions; it is emptied when full and refilled from disk.
pub struct JsonDirTranscriptRepository {
    dir: PathBuf,
    last_sequence: Mutex<HashMap<String, u64>>,
    cache_capacity: usize,
}

const DEFAULT_CACHE_CAPACITY: usize = 1024;

impl JsonDirTranscriptRepository {
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        Self::with_cache_capacity(dir, DEFAULT_CACHE_CAPACITY).await
    }

    pub async fn with_cache_capacity(
        dir: impl Into<PathBuf>,
        cache_capacity: usize,
    ) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        tracing::debug!("[JsonDirTranscriptRepository] Using {}", dir.display());
        Ok(Self {
            dir,
            last_sequence: Mutex::new(HashMap::new()),
            cache_capacity: cache_capacity.max(1),
        })
    }

    /// Number of sessions whose last sequence is cached.
    pub async fn cached_sessions(&self) -> usize {
        self.last_sequence.lock().await.len()
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn path(&self, session_id: &str) -> Result<PathBuf> {
        ensure_file_safe_id(session_id)?;
        Ok(self.dir.join(format!("{}.jsonl", session_id)))
    }

    async fn read_all(path: &Path) -> Result<Vec<Message>> {
        let content = match fs::read_to_string(path).await {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut messages = Vec::new();
        for line in content.lines().filter(|l| !l.trim().is_empty()) {
            messages.push(serde_json::from_str::<Message>(line)?);
        }
        messages.sort_by_key(|m| m.sequence);
        Ok(messages)
    }
}

#[async_trait]
impl TranscriptRepository for JsonDirTranscriptRepository {
    async fn append(&self, message: NewMessage) -> Result<Message> {
        let path = self.path(&message.session_id)?;
        let mut last_sequence = self.last_sequence.lock().await;

        let last = match last_sequence.get(&message.session_id) {
            Some(seq) => *seq,
            None => Self::read_all(&path)
                .await?
                .last()
                .map_or(0, |m| m.sequence),
        };

        let session_id = message.session_id.clone();
        let committed = message.commit(last + 1);
        let mut line = serde_json::to_string(&committed)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await?;
        file.write_all(line.as_bytes()).await?;
        file.sync_data().await?;

        if last_sequence.len() >= self.cache_capacity
            && !last_sequence.contains_key(&session_id)
        {
            last_sequence.clear();
        }
        last_sequence.insert(session_id, committed.sequence);
        Ok(committed)
    }

    async fn list(&self, session_id: &str) -> Result<Vec<Message>> {
        let path = self.path(session_id)?;
        Self::read_all(&path).await
    }
}
