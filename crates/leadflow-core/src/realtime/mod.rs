//! Realtime event contract shared by the channel and transport adapters.

mod event;

pub use event::{ClientEvent, Replay, ServerEvent, SessionState};
