//! Ephemeral typing presence.

use super::channel::RealtimeChannel;
use crate::clock::Clock;
use leadflow_core::realtime::ServerEvent;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

type TypistKey = (String, String);

/// Tracks which connections are currently typing.
///
/// A `typing_start` marks the connection as typing and arms a silence
/// timer; each further start re-arms it. The indicator clears on
/// `typing_stop`, on leave, or once the window passes without a new
/// start. Presence is never persisted and never touches the session.
pub struct TypingTracker {
    channel: Arc<RealtimeChannel>,
    clock: Arc<dyn Clock>,
    window: Duration,
    /// Generation of the latest start per (session, connection)
    typists: Mutex<HashMap<TypistKey, u64>>,
}

impl TypingTracker {
    pub fn new(channel: Arc<RealtimeChannel>, clock: Arc<dyn Clock>, window: Duration) -> Self {
        Self {
            channel,
            clock,
            window,
            typists: Mutex::new(HashMap::new()),
        }
    }

    pub async fn set_typing(self: &Arc<Self>, session_id: &str, connection_id: &str, active: bool) {
        if active {
            self.start(session_id, connection_id).await;
        } else {
            self.stop(session_id, connection_id).await;
        }
    }

    pub async fn is_typing(&self, session_id: &str, connection_id: &str) -> bool {
        self.typists
            .lock()
            .await
            .contains_key(&(session_id.to_string(), connection_id.to_string()))
    }

    async fn start(self: &Arc<Self>, session_id: &str, connection_id: &str) {
        let key = (session_id.to_string(), connection_id.to_string());
        let (generation, was_typing) = {
            let mut typists = self.typists.lock().await;
            let previous = typists.get(&key).copied();
            let generation = previous.map_or(1, |g| g + 1);
            typists.insert(key.clone(), generation);
            (generation, previous.is_some())
        };

        if !was_typing {
            self.announce(session_id, connection_id, true).await;
        }

        let tracker = self.clone();
        tokio::spawn(async move {
            tracker.clock.sleep(tracker.window).await;
            let expired = {
                let mut typists = tracker.typists.lock().await;
                if typists.get(&key) == Some(&generation) {
                    typists.remove(&key);
                    true
                } else {
                    false
                }
            };
            if expired {
                tracker.announce(&key.0, &key.1, false).await;
            }
        });
    }

    /// Clears the indicator if set. Also used when a connection leaves.
    pub async fn stop(&self, session_id: &str, connection_id: &str) {
        let removed = self
            .typists
            .lock()
            .await
            .remove(&(session_id.to_string(), connection_id.to_string()))
            .is_some();
        if removed {
            self.announce(session_id, connection_id, false).await;
        }
    }

    async fn announce(&self, session_id: &str, connection_id: &str, active: bool) {
        self.channel
            .broadcast_except(
                session_id,
                connection_id,
                ServerEvent::Typing {
                    connection_id: connection_id.to_string(),
                    active,
                },
            )
            .await;
    }
}
