//! Session and transcript repository traits.
//!
//! Defines the interface for session persistence operations.

use super::message::{Message, NewMessage};
use super::model::Session;
use crate::error::Result;
use async_trait::async_trait;

/// An abstract repository for managing session records.
///
/// This trait decouples the engine from the specific storage mechanism
/// (in-memory maps, JSON files, a database).
///
/// # Implementation Notes
///
/// Implementations must make `create_if_absent` atomic: two concurrent
/// calls for the same id yield one stored record, and exactly one of them
/// reports `created = true`.
#[async_trait]
pub trait SessionRepository: Send + Sync {
    /// Finds a session by its ID.
    ///
    /// # Returns
    ///
    /// - `Ok(Some(Session))`: Session found
    /// - `Ok(None)`: Session not found
    /// - `Err(_)`: Error occurred during retrieval
    async fn find_by_id(&self, session_id: &str) -> Result<Option<Session>>;

    /// Stores `session` unless a record with the same id already exists.
    ///
    /// # Returns
    ///
    /// The stored record and whether this call created it.
    async fn create_if_absent(&self, session: Session) -> Result<(Session, bool)>;

    /// Saves a session, replacing any previous record with the same id.
    async fn save(&self, session: &Session) -> Result<()>;

    /// Lists all stored sessions.
    async fn list_all(&self) -> Result<Vec<Session>>;
}

/// Append-only, per-session ordered message log.
#[async_trait]
pub trait TranscriptRepository: Send + Sync {
    /// Appends a message and assigns the next sequence number of its session.
    async fn append(&self, message: NewMessage) -> Result<Message>;

    /// Returns every message of the session in sequence order.
    async fn list(&self, session_id: &str) -> Result<Vec<Message>>;
}
