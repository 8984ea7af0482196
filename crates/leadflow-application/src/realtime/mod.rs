//! Realtime synchronization: session rooms and typing presence.

mod channel;
mod typing;

pub use channel::{ChannelStats, EventSender, RealtimeChannel};
pub use typing::TypingTracker;
