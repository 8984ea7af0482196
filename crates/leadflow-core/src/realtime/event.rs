use crate::session::{Checkpoint, Message, Session, SessionStatus, UserInput, pending_options};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Events a client sends over its realtime connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientEvent {
    Join {
        session_id: String,
    },
    SubmitInput {
        session_id: String,
        text: String,
    },
    SelectOption {
        session_id: String,
        value: String,
    },
    UploadFile {
        session_id: String,
        file_name: String,
        /// Storage reference of the uploaded bytes; the engine never reads them
        reference: String,
    },
    Leave {
        session_id: String,
    },
    TypingStart {
        session_id: String,
    },
    TypingStop {
        session_id: String,
    },
}

impl ClientEvent {
    pub fn session_id(&self) -> &str {
        match self {
            Self::Join { session_id }
            | Self::SubmitInput { session_id, .. }
            | Self::SelectOption { session_id, .. }
            | Self::UploadFile { session_id, .. }
            | Self::Leave { session_id }
            | Self::TypingStart { session_id }
            | Self::TypingStop { session_id } => session_id,
        }
    }

    /// The conversational turn carried by this event, if any.
    pub fn user_input(&self) -> Option<UserInput> {
        match self {
            Self::SubmitInput { text, .. } => Some(UserInput::text(text.clone())),
            Self::SelectOption { value, .. } => Some(UserInput::choice(value.clone())),
            Self::UploadFile {
                file_name,
                reference,
                ..
            } => Some(UserInput::upload(file_name.clone(), reference.clone())),
            _ => None,
        }
    }
}

/// Snapshot of the wizard position and checkpoint flags.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    pub step: u32,
    pub status: SessionStatus,
    pub checkpoint_flags: BTreeMap<Checkpoint, bool>,
    pub processing_flags: BTreeMap<Checkpoint, bool>,
}

impl From<&Session> for SessionState {
    fn from(session: &Session) -> Self {
        Self {
            step: session.step,
            status: session.status,
            checkpoint_flags: session.checkpoint_flags.clone(),
            processing_flags: session.processing_flags.clone(),
        }
    }
}

/// Everything a joining connection needs to render the session as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    pub session_id: String,
    /// Committed messages in sequence order
    pub transcript: Vec<Message>,
    pub state: SessionState,
    /// Options of a still-pending choice
    pub options: Vec<String>,
}

impl Replay {
    pub fn new(session: &Session, transcript: Vec<Message>) -> Self {
        let options = pending_options(&transcript);
        Self {
            session_id: session.id.clone(),
            transcript,
            state: SessionState::from(session),
            options,
        }
    }
}

/// Events the server pushes to connections.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerEvent {
    Replay(Replay),
    Message { message: Message },
    SessionState(SessionState),
    /// A committed options message
    Options { message: Message },
    Processing { checkpoint: Checkpoint, active: bool },
    Typing { connection_id: String, active: bool },
    Error { reason: String },
}

impl ServerEvent {
    /// The committed transcript entry carried by this event, if any.
    pub fn committed_message(&self) -> Option<&Message> {
        match self {
            Self::Message { message } | Self::Options { message } => Some(message),
            _ => None,
        }
    }
}
