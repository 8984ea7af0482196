//! Session rooms and event fan-out.

use leadflow_core::realtime::ServerEvent;
use serde::Serialize;
use std::collections::HashMap;
use tokio::sync::{RwLock, mpsc};

/// Outbound half of one connection.
pub type EventSender = mpsc::UnboundedSender<ServerEvent>;

/// Point-in-time room statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ChannelStats {
    pub rooms: usize,
    pub connections: usize,
}

/// Tracks which connections are subscribed to which session.
///
/// Each room maps connection ids to their outbound sender. Delivery is a
/// synchronous channel send, so every member observes broadcasts in the
/// order they were issued. Callers that need a single authoritative order
/// per session must issue broadcasts while holding the session lock.
#[derive(Debug, Default)]
pub struct RealtimeChannel {
    rooms: RwLock<HashMap<String, HashMap<String, EventSender>>>,
}

impl RealtimeChannel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a fresh connection id.
    pub fn connection_id() -> String {
        uuid::Uuid::new_v4().to_string()
    }

    /// Subscribes a connection to a session room. Re-joining replaces the sender.
    pub async fn join(&self, session_id: &str, connection_id: &str, sender: EventSender) {
        let mut rooms = self.rooms.write().await;
        rooms
            .entry(session_id.to_string())
            .or_default()
            .insert(connection_id.to_string(), sender);
        tracing::debug!(session_id, connection_id, "[RealtimeChannel] Joined room");
    }

    /// Removes a connection from a room. Returns whether it was a member.
    pub async fn leave(&self, session_id: &str, connection_id: &str) -> bool {
        let mut rooms = self.rooms.write().await;
        let Some(room) = rooms.get_mut(session_id) else {
            return false;
        };
        let removed = room.remove(connection_id).is_some();
        if room.is_empty() {
            rooms.remove(session_id);
        }
        if removed {
            tracing::debug!(session_id, connection_id, "[RealtimeChannel] Left room");
        }
        removed
    }

    /// Sends `event` to every member of the room. Returns the number of
    /// members reached; members whose receiver is gone are pruned.
    pub async fn broadcast(&self, session_id: &str, event: ServerEvent) -> usize {
        self.fan_out(session_id, None, event).await
    }

    /// Like [`broadcast`](Self::broadcast), skipping one connection.
    pub async fn broadcast_except(
        &self,
        session_id: &str,
        excluded: &str,
        event: ServerEvent,
    ) -> usize {
        self.fan_out(session_id, Some(excluded), event).await
    }

    /// Sends `event` to a single member of the room.
    pub async fn send_to(&self, session_id: &str, connection_id: &str, event: ServerEvent) -> bool {
        let rooms = self.rooms.read().await;
        rooms
            .get(session_id)
            .and_then(|room| room.get(connection_id))
            .is_some_and(|sender| sender.send(event).is_ok())
    }

    pub async fn stats(&self) -> ChannelStats {
        let rooms = self.rooms.read().await;
        ChannelStats {
            rooms: rooms.len(),
            connections: rooms.values().map(HashMap::len).sum(),
        }
    }

    async fn fan_out(&self, session_id: &str, excluded: Option<&str>, event: ServerEvent) -> usize {
        let mut delivered = 0;
        let mut closed = Vec::new();
        {
            let rooms = self.rooms.read().await;
            let Some(room) = rooms.get(session_id) else {
                return 0;
            };
            for (id, sender) in room {
                if Some(id.as_str()) == excluded {
                    continue;
                }
                if sender.send(event.clone()).is_ok() {
                    delivered += 1;
                } else {
                    closed.push(id.clone());
                }
            }
        }

        if !closed.is_empty() {
            let mut rooms = self.rooms.write().await;
            if let Some(room) = rooms.get_mut(session_id) {
                for id in &closed {
                    room.remove(id);
                }
                if room.is_empty() {
                    rooms.remove(session_id);
                }
            }
            tracing::debug!(
                session_id,
                pruned = closed.len(),
                "[RealtimeChannel] Pruned closed connections"
            );
        }

        delivered
    }
}
