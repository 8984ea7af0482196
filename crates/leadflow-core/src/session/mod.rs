//! Session domain module.
//!
//! This module contains all session-related domain models and repository
//! interfaces.
//!
//! # Module Structure
//!
//! - `model`: Core session domain model (`Session`, `Checkpoint`, `SessionMutation`)
//! - `message`: Transcript message types (`Message`, `NewMessage`, `Sender`)
//! - `user_input`: User input types (`UserInput`)
//! - `repository`: Repository traits for session and transcript persistence
//!
//! # Usage
//!
//! ```ignore
//! use leadflow_core::session::{Session, SessionRepository, TranscriptRepository};
//! use leadflow_core::session::{Message, NewMessage, UserInput};
//! ```

mod message;
mod model;
mod repository;
mod user_input;

// Re-export public API
pub use message::{Message, MessageKind, NewMessage, Sender, pending_options};
pub use model::{Answers, Checkpoint, Session, SessionMutation, SessionStatus};
pub use repository::{SessionRepository, TranscriptRepository};
pub use user_input::UserInput;
