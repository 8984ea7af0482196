//! Transcript message types.

use serde::{Deserialize, Serialize};

/// Who authored a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sender {
    User,
    Bot,
}

/// How a client should render a transcript entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MessageKind {
    #[default]
    Text,
    Options,
    Summary,
}

/// A committed transcript entry.
///
/// `sequence` is assigned by the transcript store when the message is
/// appended and is strictly increasing per session. Clients order by it,
/// never by `created_at`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub session_id: String,
    pub sender: Sender,
    pub text: String,
    pub kind: MessageKind,
    /// Selectable values for `MessageKind::Options`
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
    pub sequence: u64,
    /// Timestamp when the message was committed (ISO 8601 format)
    pub created_at: String,
}

/// A message before the transcript store has assigned its identity and sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewMessage {
    pub session_id: String,
    pub sender: Sender,
    pub text: String,
    pub kind: MessageKind,
    pub options: Vec<String>,
}

impl NewMessage {
    pub fn user(session_id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            session_id: session_id.into(),
            sender: Sender::User,
            text: text.into(),
            kind: MessageKind::Text,
            options: Vec::new(),
        }
    }

    pub fn bot(session_id: impl Into<String>, text: impl Into<String>, kind: MessageKind) -> Self {
        Self {
            session_id: session_id.into(),
            sender: Sender::Bot,
            text: text.into(),
            kind,
            options: Vec::new(),
        }
    }

    pub fn options(session_id: impl Into<String>, options: Vec<String>) -> Self {
        Self {
            session_id: session_id.into(),
            sender: Sender::Bot,
            text: String::new(),
            kind: MessageKind::Options,
            options,
        }
    }

    /// Stamps the message with its store-assigned identity.
    pub fn commit(self, sequence: u64) -> Message {
        Message {
            id: uuid::Uuid::new_v4().to_string(),
            session_id: self.session_id,
            sender: self.sender,
            text: self.text,
            kind: self.kind,
            options: self.options,
            sequence,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Returns the options of the trailing options message, if the transcript
/// currently ends in a pending choice.
pub fn pending_options(transcript: &[Message]) -> Vec<String> {
    match transcript.last() {
        Some(last) if last.kind == MessageKind::Options => last.options.clone(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_options_only_for_trailing_choice() {
        let question = NewMessage::bot("s", "Study or work?", MessageKind::Text).commit(1);
        let choice = NewMessage::options("s", vec!["Study".into(), "Work".into()]).commit(2);
        let answer = NewMessage::user("s", "Work").commit(3);

        assert_eq!(
            pending_options(&[question.clone(), choice.clone()]),
            vec!["Study", "Work"]
        );
        assert!(pending_options(&[question, choice, answer]).is_empty());
        assert!(pending_options(&[]).is_empty());
    }

    #[test]
    fn test_options_field_omitted_when_empty() {
        let msg = NewMessage::user("s", "hi").commit(7);
        let json = serde_json::to_value(&msg).unwrap();
        assert!(json.get("options").is_none());
        assert_eq!(json["sender"], "user");
        assert_eq!(json["sequence"], 7);
    }
}
