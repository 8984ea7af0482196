//! Directory-of-JSON-files SessionRepository implementation.

use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use leadflow_core::LeadflowError;
use leadflow_core::error::Result;
use leadflow_core::session::{Session, SessionRepository};
use std::path::{Path, PathBuf};
use tokio::fs;
use tokio::sync::Mutex;

/// Session repository storing one JSON document per session.
///
/// Directory structure:
/// ```text
/// sessions/
/// ├── <session-id-1>.json
/// └── <session-id-2>.json
/// ```
///
/// Writes go through an internal mutex so that `create_if_absent` is atomic
/// within one process. Documents are replaced via tmp file + rename.
pub struct JsonDirSessionRepository {
    dir: PathBuf,
    write_lock: Mutex<()>,
}

impl JsonDirSessionRepository {
    /// Creates the repository, creating `dir` if needed.
    pub async fn new(dir: impl Into<PathBuf>) -> Result<Self> {
        let dir = dir.into();
        fs::create_dir_all(&dir).await?;
        tracing::debug!("[JsonDirSessionRepository] Using {}", dir.display());
        Ok(Self {
            dir,
            write_lock: Mutex::new(()),
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file(&self, session_id: &str) -> Result<AtomicJsonFile<Session>> {
        ensure_file_safe_id(session_id)?;
        Ok(AtomicJsonFile::new(
            self.dir.join(format!("{}.json", session_id)),
        ))
    }
}

/// Rejects ids that cannot be used verbatim as a file stem.
pub(crate) fn ensure_file_safe_id(session_id: &str) -> Result<()> {
    let valid = !session_id.is_empty()
        && !session_id.starts_with('.')
        && session_id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if valid {
        Ok(())
    } else {
        Err(LeadflowError::validation(format!(
            "session id '{}' contains unsupported characters",
            session_id
        )))
    }
}

#[async_trait]
impl SessionRepository for JsonDirSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>> {
        Ok(self.file(session_id)?.load().await?)
    }

    async fn create_if_absent(&self, session: Session) -> Result<(Session, bool)> {
        let file = self.file(&session.id)?;
        let _guard = self.write_lock.lock().await;

        if let Some(existing) = file.load().await? {
            return Ok((existing, false));
        }
        file.save(&session).await?;
        tracing::info!("[JsonDirSessionRepository] Created session {}", session.id);
        Ok((session, true))
    }

    async fn save(&self, session: &Session) -> Result<()> {
        let file = self.file(&session.id)?;
        let _guard = self.write_lock.lock().await;
        file.save(session).await?;
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<Session>> {
        let mut sessions = Vec::new();
        let mut entries = fs::read_dir(&self.dir).await?;

        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            match AtomicJsonFile::<Session>::new(path.clone()).load().await {
                Ok(Some(session)) => sessions.push(session),
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(
                        "[JsonDirSessionRepository] Skipping unreadable {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        Ok(sessions)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_safe_ids() {
        assert!(ensure_file_safe_id("3f1c-42_a.b").is_ok());
        assert!(ensure_file_safe_id("").is_err());
        assert!(ensure_file_safe_id("../etc").is_err());
        assert!(ensure_file_safe_id(".hidden").is_err());
        assert!(ensure_file_safe_id("a/b").is_err());
    }
}
