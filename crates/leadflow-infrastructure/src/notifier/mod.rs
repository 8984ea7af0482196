//! Notifier adapters.
//!
//! - `OutboxNotifier`: writes rendered mails to the outbox directory
//! - `LogNotifier`: logs rendered mails (development)

pub mod log_notifier;
pub mod outbox_notifier;
pub mod templates;

pub use log_notifier::LogNotifier;
pub use outbox_notifier::{OutboxEnvelope, OutboxNotifier};
pub use templates::{NotificationTemplates, RenderedNotification};
