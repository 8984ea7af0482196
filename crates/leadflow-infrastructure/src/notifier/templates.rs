//! Notification templates.
//!
//! Subjects and bodies are minijinja templates keyed by checkpoint. The
//! render context is `{ session_id, checkpoint, fields: [{label, value}] }`.

use leadflow_core::LeadflowError;
use leadflow_core::error::Result;
use leadflow_core::flow::table::field_label;
use leadflow_core::notifier::Notification;
use leadflow_core::session::Checkpoint;
use minijinja::{Environment, context};
use serde::Serialize;

const GERMAN_SUBJECT: &str = "New work-abroad lead: {{ name }}";
const UG_SUBJECT: &str = "New UG-qualified work lead: {{ name }} ({{ ug_major }})";
const STUDY_SUBJECT: &str = "New study-abroad lead: {{ name }}";

const BODY: &str = r#"A visitor reached the {{ checkpoint }} checkpoint.

Session: {{ session_id }}
{% for field in fields %}
{{ field.label }}: {{ field.value }}
{%- endfor %}
"#;

#[derive(Debug, Clone, Serialize)]
struct Field<'a> {
    label: &'a str,
    value: &'a str,
}

/// Rendered subject and body of a notification.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RenderedNotification {
    pub subject: String,
    pub body: String,
}

/// Template registry for checkpoint notifications.
pub struct NotificationTemplates {
    env: Environment<'static>,
}

impl NotificationTemplates {
    pub fn new() -> Result<Self> {
        let mut env = Environment::new();
        for (name, source) in [
            (subject_name(Checkpoint::GermanEmail), GERMAN_SUBJECT),
            (subject_name(Checkpoint::UgEmail), UG_SUBJECT),
            (subject_name(Checkpoint::StudyEmail), STUDY_SUBJECT),
            ("body", BODY),
        ] {
            env.add_template(name, source).map_err(template_error)?;
        }
        Ok(Self { env })
    }

    pub fn render(&self, notification: &Notification) -> Result<RenderedNotification> {
        let fields: Vec<Field<'_>> = notification
            .payload
            .iter()
            .map(|(field, value)| Field {
                label: field_label(field),
                value,
            })
            .collect();

        let subject = self
            .env
            .get_template(subject_name(notification.checkpoint))
            .and_then(|t| {
                t.render(context! {
                    name => answer(notification, "name"),
                    ug_major => answer(notification, "ugMajor"),
                })
            })
            .map_err(template_error)?;

        let body = self
            .env
            .get_template("body")
            .and_then(|t| {
                t.render(context! {
                    session_id => &notification.session_id,
                    checkpoint => notification.checkpoint.to_string(),
                    fields => &fields,
                })
            })
            .map_err(template_error)?;

        Ok(RenderedNotification {
            subject: subject.trim().to_string(),
            body,
        })
    }
}

fn answer<'a>(notification: &'a Notification, field: &str) -> &'a str {
    notification
        .payload
        .get(field)
        .map(String::as_str)
        .unwrap_or("")
}

fn subject_name(checkpoint: Checkpoint) -> &'static str {
    match checkpoint {
        Checkpoint::GermanEmail => "subject.germanEmail",
        Checkpoint::UgEmail => "subject.ugEmail",
        Checkpoint::StudyEmail => "subject.studyEmail",
    }
}

fn template_error(err: minijinja::Error) -> LeadflowError {
    LeadflowError::notification(format!("template error: {}", err))
}
