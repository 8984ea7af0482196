use serde::{Deserialize, Serialize};

/// One user turn as delivered by a transport adapter.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum UserInput {
    /// Free text typed into the input box.
    Text { text: String },
    /// A value picked from an offered option list.
    Choice { value: String },
    /// A file handed over through the upload control.
    Upload { file_name: String, reference: String },
}

impl UserInput {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    pub fn choice(value: impl Into<String>) -> Self {
        Self::Choice {
            value: value.into(),
        }
    }

    pub fn upload(file_name: impl Into<String>, reference: impl Into<String>) -> Self {
        Self::Upload {
            file_name: file_name.into(),
            reference: reference.into(),
        }
    }

    /// The textual value of a typed or selected input, trimmed.
    /// Uploads have none.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text { text } => Some(text.trim()),
            Self::Choice { value } => Some(value.trim()),
            Self::Upload { .. } => None,
        }
    }

    /// How this turn appears in the transcript.
    pub fn transcript_text(&self) -> String {
        match self {
            Self::Text { text } => text.trim().to_string(),
            Self::Choice { value } => value.trim().to_string(),
            Self::Upload { file_name, .. } => format!("Uploaded: {}", file_name),
        }
    }
}
