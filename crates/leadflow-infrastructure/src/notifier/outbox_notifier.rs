//! Outbox notifier.
//!
//! Renders each checkpoint notification and drops it as a JSON envelope into
//! an outbox directory. A separate mail relay picks envelopes up from there.

use super::templates::NotificationTemplates;
use crate::storage::AtomicJsonFile;
use async_trait::async_trait;
use leadflow_core::LeadflowError;
use leadflow_core::config::NotifierConfig;
use leadflow_core::error::Result;
use leadflow_core::notifier::{Notification, Notifier};
use leadflow_core::session::{Answers, Checkpoint};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// One outgoing mail as written to the outbox.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutboxEnvelope {
    pub id: String,
    pub created_at: String,
    pub checkpoint: Checkpoint,
    pub session_id: String,
    pub from: String,
    pub to: Vec<String>,
    pub subject: String,
    pub body: String,
    pub payload: Answers,
}

pub struct OutboxNotifier {
    dir: PathBuf,
    config: NotifierConfig,
    templates: NotificationTemplates,
}

impl OutboxNotifier {
    pub fn new(dir: impl Into<PathBuf>, config: NotifierConfig) -> Result<Self> {
        Ok(Self {
            dir: dir.into(),
            config,
            templates: NotificationTemplates::new()?,
        })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

#[async_trait]
impl Notifier for OutboxNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        if self.config.staff_recipients.is_empty() {
            return Err(LeadflowError::notification(
                "no staff recipients configured",
            ));
        }

        let rendered = self.templates.render(notification)?;
        let id = uuid::Uuid::new_v4().to_string();
        let envelope = OutboxEnvelope {
            id: id.clone(),
            created_at: chrono::Utc::now().to_rfc3339(),
            checkpoint: notification.checkpoint,
            session_id: notification.session_id.clone(),
            from: self.config.sender.clone(),
            to: self.config.staff_recipients.clone(),
            subject: rendered.subject,
            body: rendered.body,
            payload: notification.payload.clone(),
        };

        let path = self.dir.join(format!("{}-{}.json", notification.checkpoint, id));
        AtomicJsonFile::new(path.clone()).save(&envelope).await?;

        tracing::info!(
            session_id = %notification.session_id,
            checkpoint = %notification.checkpoint,
            "[OutboxNotifier] Queued notification {}",
            path.display()
        );
        Ok(())
    }
}
