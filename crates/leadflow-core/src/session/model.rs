//! Session domain model.
//!
//! This module contains the core Session entity that represents one
//! visitor's run through the qualification questionnaire.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use strum::{Display, EnumString};

/// Collected answers keyed by field name.
pub type Answers = BTreeMap<String, String>;

/// A named point in the flow at which staff must be notified at most once.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
)]
#[serde(rename_all = "camelCase")]
#[strum(serialize_all = "camelCase")]
pub enum Checkpoint {
    /// Work branch, generic path: ready to learn German.
    GermanEmail,
    /// Work branch, UG-major sub-flow: ready to learn German.
    UgEmail,
    /// Study branch: counselling call requested.
    StudyEmail,
}

/// Lifecycle status of a session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum SessionStatus {
    #[default]
    Active,
    Closed,
}

/// Represents a questionnaire session in the domain layer.
///
/// A session contains:
/// - The index of the currently pending question (`step`)
/// - The answers collected so far (grow-only)
/// - Checkpoint flags: true once the checkpoint's notification succeeded
/// - Processing flags: true while a notifier call for the checkpoint is in flight
/// - Lifecycle status and activity timestamps
///
/// Sessions are keyed by `id` alone; connections come and go around them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Session {
    /// Opaque session identifier, stable across reconnects
    pub id: String,
    /// Currently pending question
    pub step: u32,
    /// Collected answers keyed by field name
    #[serde(default)]
    pub answers: Answers,
    #[serde(default)]
    pub checkpoint_flags: BTreeMap<Checkpoint, bool>,
    #[serde(default)]
    pub processing_flags: BTreeMap<Checkpoint, bool>,
    #[serde(default)]
    pub status: SessionStatus,
    /// Timestamp when the session was created (ISO 8601 format)
    pub created_at: String,
    /// Timestamp of the last accepted mutation (ISO 8601 format)
    pub last_activity_at: String,
}

impl Session {
    /// Creates a fresh session parked on the welcome step.
    pub fn new(id: impl Into<String>) -> Self {
        let now = chrono::Utc::now().to_rfc3339();
        Self {
            id: id.into(),
            step: 0,
            answers: Answers::new(),
            checkpoint_flags: BTreeMap::new(),
            processing_flags: BTreeMap::new(),
            status: SessionStatus::Active,
            created_at: now.clone(),
            last_activity_at: now,
        }
    }

    pub fn is_closed(&self) -> bool {
        self.status == SessionStatus::Closed
    }

    /// Returns true once the checkpoint's notification has been delivered.
    pub fn checkpoint_sent(&self, checkpoint: Checkpoint) -> bool {
        self.checkpoint_flags
            .get(&checkpoint)
            .copied()
            .unwrap_or(false)
    }

    pub fn is_processing(&self, checkpoint: Checkpoint) -> bool {
        self.processing_flags
            .get(&checkpoint)
            .copied()
            .unwrap_or(false)
    }

    pub fn answer(&self, field: &str) -> Option<&str> {
        self.answers.get(field).map(String::as_str)
    }

    /// Marks the checkpoint as delivered. Never flips a delivered flag back.
    pub fn mark_checkpoint_sent(&mut self, checkpoint: Checkpoint) {
        self.checkpoint_flags.insert(checkpoint, true);
    }

    pub fn set_processing(&mut self, checkpoint: Checkpoint, active: bool) {
        self.processing_flags.insert(checkpoint, active);
    }

    pub fn touch(&mut self) {
        self.last_activity_at = chrono::Utc::now().to_rfc3339();
    }
}

/// State change produced by an accepted flow evaluation.
///
/// Answers are only ever inserted, never removed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionMutation {
    pub step: u32,
    pub answers: Vec<(String, String)>,
    pub status: Option<SessionStatus>,
}

impl SessionMutation {
    pub fn advance_to(step: u32) -> Self {
        Self {
            step,
            answers: Vec::new(),
            status: None,
        }
    }

    pub fn with_answer(mut self, field: impl Into<String>, value: impl Into<String>) -> Self {
        self.answers.push((field.into(), value.into()));
        self
    }

    pub fn closing(mut self) -> Self {
        self.status = Some(SessionStatus::Closed);
        self
    }

    /// Applies the mutation in place and refreshes the activity timestamp.
    pub fn apply(&self, session: &mut Session) {
        session.step = self.step;
        for (field, value) in &self.answers {
            session.answers.insert(field.clone(), value.clone());
        }
        if let Some(status) = self.status {
            session.status = status;
        }
        session.touch();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_checkpoint_names() {
        assert_eq!(Checkpoint::GermanEmail.to_string(), "germanEmail");
        assert_eq!(Checkpoint::from_str("ugEmail").unwrap(), Checkpoint::UgEmail);
        assert_eq!(
            serde_json::to_string(&Checkpoint::StudyEmail).unwrap(),
            "\"studyEmail\""
        );
    }

    #[test]
    fn test_session_flags_roundtrip_as_json_map() {
        let mut session = Session::new("s-1");
        session.mark_checkpoint_sent(Checkpoint::GermanEmail);
        session.set_processing(Checkpoint::UgEmail, true);

        let json = serde_json::to_value(&session).unwrap();
        assert_eq!(json["checkpoint_flags"]["germanEmail"], true);
        assert_eq!(json["status"], "active");

        let restored: Session = serde_json::from_value(json).unwrap();
        assert!(restored.checkpoint_sent(Checkpoint::GermanEmail));
        assert!(restored.is_processing(Checkpoint::UgEmail));
        assert!(!restored.checkpoint_sent(Checkpoint::StudyEmail));
    }

    #[test]
    fn test_mutation_apply() {
        let mut session = Session::new("s-1");
        session.answers.insert("name".into(), "Asha".into());

        SessionMutation::advance_to(99)
            .with_answer("counselling", "Yes")
            .closing()
            .apply(&mut session);

        assert_eq!(session.step, 99);
        assert!(session.is_closed());
        assert_eq!(session.answer("name"), Some("Asha"));
        assert_eq!(session.answer("counselling"), Some("Yes"));
    }
}
