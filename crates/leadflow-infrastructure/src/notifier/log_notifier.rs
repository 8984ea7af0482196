use super::templates::NotificationTemplates;
use async_trait::async_trait;
use leadflow_core::error::Result;
use leadflow_core::notifier::{Notification, Notifier};

/// Notifier that only writes the rendered notification to the log.
///
/// Useful for local runs where no mail relay drains the outbox.
pub struct LogNotifier {
    templates: NotificationTemplates,
}

impl LogNotifier {
    pub fn new() -> Result<Self> {
        Ok(Self {
            templates: NotificationTemplates::new()?,
        })
    }
}

#[async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, notification: &Notification) -> Result<()> {
        let rendered = self.templates.render(notification)?;
        tracing::info!(
            session_id = %notification.session_id,
            checkpoint = %notification.checkpoint,
            "[LogNotifier] {}\n{}",
            rendered.subject,
            rendered.body
        );
        Ok(())
    }
}
