//! Staff notification contract.

use crate::error::Result;
use crate::session::{Answers, Checkpoint};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Structured data handed to a notifier when a checkpoint is reached.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub checkpoint: Checkpoint,
    pub session_id: String,
    /// The answers relevant to the checkpoint, keyed by field name
    pub payload: Answers,
}

/// External collaborator that delivers checkpoint notifications (e.g. email).
///
/// Implementations report delivery failure through `Err`; callers treat any
/// failure as non-fatal and bound every call with a timeout.
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn notify(&self, notification: &Notification) -> Result<()>;
}
