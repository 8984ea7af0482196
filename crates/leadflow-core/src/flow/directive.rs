use crate::session::{Answers, Checkpoint, MessageKind, SessionMutation};
use std::time::Duration;

/// An instruction emitted by the flow engine for the dispatcher to execute.
///
/// Directives are transient: they are executed once and never stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    /// Append a bot message to the transcript and broadcast it.
    EmitMessage {
        text: String,
        /// Delay relative to the preceding directive of the same batch
        delay: Duration,
        kind: MessageKind,
    },
    /// Append a selectable option list to the transcript and broadcast it.
    OfferOptions {
        options: Vec<String>,
        delay: Duration,
    },
    /// Toggle the transient in-flight flag of a checkpoint.
    SetProcessing { checkpoint: Checkpoint, active: bool },
    /// Notify staff unless the checkpoint was already delivered.
    TriggerNotification {
        checkpoint: Checkpoint,
        payload: Answers,
    },
}

impl Directive {
    pub fn message(text: impl Into<String>) -> Self {
        Self::EmitMessage {
            text: text.into(),
            delay: Duration::ZERO,
            kind: MessageKind::Text,
        }
    }

    pub fn delayed_message(text: impl Into<String>, delay: Duration, kind: MessageKind) -> Self {
        Self::EmitMessage {
            text: text.into(),
            delay,
            kind,
        }
    }

    pub fn options<S: AsRef<str>>(options: &[S]) -> Self {
        Self::OfferOptions {
            options: options.iter().map(|o| o.as_ref().to_string()).collect(),
            delay: Duration::ZERO,
        }
    }

    pub fn delay(&self) -> Duration {
        match self {
            Self::EmitMessage { delay, .. } | Self::OfferOptions { delay, .. } => *delay,
            Self::SetProcessing { .. } | Self::TriggerNotification { .. } => Duration::ZERO,
        }
    }

    /// Short name used in log lines.
    pub fn label(&self) -> &'static str {
        match self {
            Self::EmitMessage { .. } => "emit_message",
            Self::OfferOptions { .. } => "offer_options",
            Self::SetProcessing { .. } => "set_processing",
            Self::TriggerNotification { .. } => "trigger_notification",
        }
    }
}

/// Result of evaluating one user turn.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlowOutcome {
    pub accepted: bool,
    pub error_text: Option<String>,
    pub mutation: Option<SessionMutation>,
    pub directives: Vec<Directive>,
}

impl FlowOutcome {
    pub fn accepted(mutation: SessionMutation, directives: Vec<Directive>) -> Self {
        Self {
            accepted: true,
            error_text: None,
            mutation: Some(mutation),
            directives,
        }
    }

    /// A user-correctable rejection: re-prompt only, no mutation.
    pub fn rejected(error_text: impl Into<String>, reprompt: Vec<Directive>) -> Self {
        Self {
            accepted: false,
            error_text: Some(error_text.into()),
            mutation: None,
            directives: reprompt,
        }
    }

    /// True when the session has already been closed and the turn was
    /// ignored without producing any directive.
    pub fn is_closed_session(&self) -> bool {
        !self.accepted && self.directives.is_empty()
    }
}
