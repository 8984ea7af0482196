//! The flow engine: a pure decision function over the transition table.

use super::directive::{Directive, FlowOutcome};
use super::table::{
    FIELD_LABELS, InputRule, StepSpec, TERMINAL_STEP, TransitionTable, WELCOME_STEP,
};
use super::validation::{validate_age, validate_email, validate_name};
use crate::session::{Answers, MessageKind, Session, SessionMutation, UserInput};
use std::time::Duration;

pub const CHOICE_ERROR: &str = "Please choose one of the options below.";
pub const UPLOAD_ERROR: &str = "Please upload your CV, or type Skip to continue without it.";
pub const CLOSED_ERROR: &str =
    "This conversation is complete. Our team will get in touch with you soon.";

/// Interprets one user turn against the current session snapshot.
///
/// `FlowEngine` holds only immutable configuration; it performs no I/O and
/// needs no locking. The same `(step, answers, input)` always produces the
/// same outcome.
#[derive(Debug, Clone)]
pub struct FlowEngine {
    table: TransitionTable,
    reply_delay: Duration,
}

impl FlowEngine {
    pub fn new(table: TransitionTable, reply_delay: Duration) -> Self {
        Self { table, reply_delay }
    }

    pub fn table(&self) -> &TransitionTable {
        &self.table
    }

    /// Directives greeting a freshly created session.
    pub fn intro(&self) -> Vec<Directive> {
        match self.table.get(WELCOME_STEP) {
            Some(spec) => question(spec, &Answers::new(), Duration::ZERO),
            None => Vec::new(),
        }
    }

    /// Evaluates `input` against the session's pending step.
    pub fn evaluate(&self, session: &Session, input: &UserInput) -> FlowOutcome {
        if session.is_closed() {
            return FlowOutcome {
                accepted: false,
                error_text: Some(CLOSED_ERROR.to_string()),
                mutation: None,
                directives: Vec::new(),
            };
        }

        let Some(spec) = self.table.get(session.step) else {
            return self.closing(&session.answers, SessionMutation::advance_to(TERMINAL_STEP));
        };

        let value = match accept(spec, input) {
            Ok(value) => value,
            Err(error_text) => return reject(spec, error_text),
        };

        let mut answers = session.answers.clone();
        let mut mutation = SessionMutation::advance_to(spec.next.resolve(&value));
        if let Some(field) = spec.field {
            answers.insert(field.to_string(), value.clone());
            mutation = mutation.with_answer(field, value);
        }

        let mut directives = Vec::new();
        if let Some(checkpoint) = spec.checkpoint {
            directives.push(Directive::SetProcessing {
                checkpoint: checkpoint.checkpoint,
                active: true,
            });
            directives.push(Directive::TriggerNotification {
                checkpoint: checkpoint.checkpoint,
                payload: checkpoint.payload(&answers),
            });
            directives.push(Directive::SetProcessing {
                checkpoint: checkpoint.checkpoint,
                active: false,
            });
        }

        match self.table.get(mutation.step) {
            Some(next) if mutation.step != TERMINAL_STEP => {
                directives.extend(question(next, &answers, self.reply_delay));
                FlowOutcome::accepted(mutation, directives)
            }
            _ => {
                let mut closing = self.closing(&answers, mutation);
                directives.append(&mut closing.directives);
                closing.directives = directives;
                closing
            }
        }
    }

    /// The once-per-session closing outcome: summary message plus the
    /// status flip that prevents it from firing again.
    fn closing(&self, answers: &Answers, mutation: SessionMutation) -> FlowOutcome {
        let mutation = SessionMutation {
            step: TERMINAL_STEP,
            ..mutation
        }
        .closing();
        FlowOutcome::accepted(
            mutation,
            vec![Directive::delayed_message(
                summary_text(answers),
                self.reply_delay,
                MessageKind::Summary,
            )],
        )
    }
}

impl Default for FlowEngine {
    fn default() -> Self {
        Self::new(TransitionTable::standard(), Duration::ZERO)
    }
}

fn accept(spec: &StepSpec, input: &UserInput) -> Result<String, &'static str> {
    match (spec.rule, input) {
        (InputRule::Upload { .. }, UserInput::Upload { file_name, .. }) => {
            Ok(file_name.trim().to_string())
        }
        (InputRule::Upload { skip }, other) => match other.as_text() {
            Some(text) if text == skip => Ok(skip.to_string()),
            _ => Err(UPLOAD_ERROR),
        },
        (_, UserInput::Upload { .. }) => Err(rule_error(spec.rule)),
        (InputRule::Choice(options), other) => match other.as_text() {
            Some(text) if options.iter().any(|option| *option == text) => Ok(text.to_string()),
            _ => Err(CHOICE_ERROR),
        },
        (InputRule::Name, other) => validate_name(other.as_text().unwrap_or_default()),
        (InputRule::Age, other) => validate_age(other.as_text().unwrap_or_default()),
        (InputRule::Email, other) => validate_email(other.as_text().unwrap_or_default()),
    }
}

fn rule_error(rule: InputRule) -> &'static str {
    match rule {
        InputRule::Choice(_) => CHOICE_ERROR,
        InputRule::Name => super::validation::NAME_ERROR,
        InputRule::Age => super::validation::AGE_ERROR,
        InputRule::Email => super::validation::EMAIL_ERROR,
        InputRule::Upload { .. } => UPLOAD_ERROR,
    }
}

fn reject(spec: &StepSpec, error_text: &'static str) -> FlowOutcome {
    let mut reprompt = vec![Directive::message(error_text)];
    if !spec.options().is_empty() {
        reprompt.push(Directive::options(spec.options()));
    }
    FlowOutcome::rejected(error_text, reprompt)
}

fn question(spec: &StepSpec, answers: &Answers, delay: Duration) -> Vec<Directive> {
    let mut directives = vec![Directive::delayed_message(
        spec.prompt.render(answers),
        delay,
        MessageKind::Text,
    )];
    if !spec.options().is_empty() {
        directives.push(Directive::options(spec.options()));
    }
    directives
}

fn summary_text(answers: &Answers) -> String {
    let name = answers.get("name").map(String::as_str).unwrap_or("there");
    let mut text = format!("Thank you, {}! Here is a summary of your details:", name);
    for (field, label) in FIELD_LABELS {
        if let Some(value) = answers.get(*field) {
            text.push_str(&format!("\n- {}: {}", label, value));
        }
    }
    text.push_str("\nOur team will reach out to you shortly.");
    text
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::flow::validation::NAME_ERROR;
    use crate::session::{Checkpoint, SessionStatus};

    fn engine() -> FlowEngine {
        FlowEngine::new(TransitionTable::standard(), Duration::from_millis(600))
    }

    fn session_at(step: u32, answers: &[(&str, &str)]) -> Session {
        let mut session = Session::new("s-test");
        session.step = step;
        for (field, value) in answers {
            session.answers.insert(field.to_string(), value.to_string());
        }
        session
    }

    fn offered(outcome: &FlowOutcome) -> Vec<String> {
        outcome
            .directives
            .iter()
            .find_map(|d| match d {
                Directive::OfferOptions { options, .. } => Some(options.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    fn first_text(outcome: &FlowOutcome) -> String {
        outcome
            .directives
            .iter()
            .find_map(|d| match d {
                Directive::EmitMessage { text, .. } => Some(text.clone()),
                _ => None,
            })
            .unwrap_or_default()
    }

    #[test]
    fn test_intro_offers_get_started() {
        let intro = engine().intro();
        assert_eq!(intro.len(), 2);
        assert_eq!(intro[0].delay(), Duration::ZERO);
        assert_eq!(intro[1], Directive::options(&["Get Started"]));
    }

    #[test]
    fn test_get_started_moves_to_name_prompt() {
        let outcome = engine().evaluate(&session_at(0, &[]), &UserInput::choice("Get Started"));

        assert!(outcome.accepted);
        assert_eq!(outcome.mutation.as_ref().unwrap().step, 1);
        assert!(outcome.mutation.as_ref().unwrap().answers.is_empty());
        assert!(first_text(&outcome).contains("name"));
    }

    #[test]
    fn test_invalid_name_is_rejected_without_mutation() {
        let session = session_at(1, &[]);
        let outcome = engine().evaluate(&session, &UserInput::text("John 123"));

        assert!(!outcome.accepted);
        assert!(outcome.mutation.is_none());
        assert_eq!(outcome.error_text.as_deref(), Some(NAME_ERROR));
        assert!(outcome.error_text.unwrap().contains("letters and spaces"));
        assert_eq!(outcome.directives, vec![Directive::message(NAME_ERROR)]);
        assert_eq!(session.step, 1);
    }

    #[test]
    fn test_name_is_personalised_into_next_prompt() {
        let outcome = engine().evaluate(&session_at(1, &[]), &UserInput::text("  Asha Rao "));
        let mutation = outcome.mutation.as_ref().unwrap();
        assert_eq!(mutation.answers, vec![("name".to_string(), "Asha Rao".to_string())]);
        assert!(first_text(&outcome).contains("Asha Rao"));
    }

    #[test]
    fn test_work_selects_work_branch() {
        let outcome = engine().evaluate(&session_at(4, &[("name", "Asha")]), &UserInput::choice("Work"));

        assert!(outcome.accepted);
        assert_eq!(outcome.mutation.as_ref().unwrap().step, 5);
        assert!(first_text(&outcome).contains("passport"));
        assert_eq!(offered(&outcome), vec!["Yes", "No"]);
    }

    #[test]
    fn test_study_selects_study_branch() {
        let outcome = engine().evaluate(&session_at(4, &[]), &UserInput::text("Study"));
        assert_eq!(outcome.mutation.unwrap().step, 20);
    }

    #[test]
    fn test_choice_is_case_sensitive_and_reoffers_options() {
        let outcome = engine().evaluate(&session_at(4, &[]), &UserInput::text("work"));

        assert!(!outcome.accepted);
        assert_eq!(outcome.error_text.as_deref(), Some(CHOICE_ERROR));
        assert_eq!(offered(&outcome), vec!["Study", "Work"]);
    }

    #[test]
    fn test_ug_completed_enters_ug_major_subflow() {
        let outcome = engine().evaluate(&session_at(7, &[]), &UserInput::choice("UG Completed"));

        assert_eq!(outcome.mutation.as_ref().unwrap().step, 12);
        assert_eq!(
            offered(&outcome),
            vec!["Engineering", "Nursing", "Dentist", "Pharmacy", "Other"]
        );

        let generic = engine().evaluate(&session_at(7, &[]), &UserInput::choice("Diploma"));
        assert_eq!(generic.mutation.unwrap().step, 8);
    }

    #[test]
    fn test_dentist_gets_exam_clause_on_german_question() {
        let dentist = engine().evaluate(
            &session_at(13, &[("ugMajor", "Dentist")]),
            &UserInput::choice("3-5 Years"),
        );
        let nurse = engine().evaluate(
            &session_at(13, &[("ugMajor", "Nursing")]),
            &UserInput::choice("3-5 Years"),
        );

        assert_eq!(dentist.mutation.as_ref().unwrap().step, 14);
        assert_eq!(nurse.mutation.as_ref().unwrap().step, 14);
        assert!(first_text(&dentist).contains("dental licensing exam"));
        assert!(!first_text(&nurse).contains("dental licensing exam"));
    }

    #[test]
    fn test_checkpoint_directive_order() {
        let session = session_at(
            9,
            &[("name", "Asha"), ("email", "asha@example.com"), ("passport", "Yes")],
        );
        let outcome = engine().evaluate(&session, &UserInput::choice("Yes"));

        assert!(outcome.accepted);
        let labels: Vec<&str> = outcome.directives.iter().map(Directive::label).collect();
        assert_eq!(
            labels,
            vec![
                "set_processing",
                "trigger_notification",
                "set_processing",
                "emit_message"
            ]
        );

        match &outcome.directives[1] {
            Directive::TriggerNotification { checkpoint, payload } => {
                assert_eq!(*checkpoint, Checkpoint::GermanEmail);
                assert_eq!(payload.get("germanReady").map(String::as_str), Some("Yes"));
                assert_eq!(payload.get("passport").map(String::as_str), Some("Yes"));
            }
            other => panic!("unexpected directive {:?}", other),
        }
        assert_eq!(
            outcome.directives[0],
            Directive::SetProcessing {
                checkpoint: Checkpoint::GermanEmail,
                active: true
            }
        );
        assert_eq!(
            outcome.directives[2],
            Directive::SetProcessing {
                checkpoint: Checkpoint::GermanEmail,
                active: false
            }
        );
        assert_eq!(outcome.mutation.unwrap().step, 10);
    }

    #[test]
    fn test_upload_step_accepts_file_or_skip() {
        let session = session_at(10, &[("name", "Asha")]);

        let upload = engine().evaluate(&session, &UserInput::upload("cv.pdf", "blob-1"));
        let mutation = upload.mutation.as_ref().unwrap();
        assert_eq!(mutation.step, TERMINAL_STEP);
        assert_eq!(mutation.status, Some(SessionStatus::Closed));
        assert!(mutation.answers.contains(&("cvFile".to_string(), "cv.pdf".to_string())));

        let skip = engine().evaluate(&session, &UserInput::text("Skip"));
        assert!(skip.accepted);

        let typed = engine().evaluate(&session, &UserInput::text("later"));
        assert_eq!(typed.error_text.as_deref(), Some(UPLOAD_ERROR));
    }

    #[test]
    fn test_upload_outside_upload_step_is_rejected() {
        let outcome = engine().evaluate(&session_at(2, &[]), &UserInput::upload("cv.pdf", "r"));
        assert!(!outcome.accepted);
        assert!(outcome.mutation.is_none());
    }

    #[test]
    fn test_terminal_answer_emits_summary_and_closes() {
        let session = session_at(24, &[("name", "Asha"), ("destination", "Germany")]);
        let outcome = engine().evaluate(&session, &UserInput::choice("No"));

        let mutation = outcome.mutation.as_ref().unwrap();
        assert_eq!(mutation.step, TERMINAL_STEP);
        assert_eq!(mutation.status, Some(SessionStatus::Closed));

        let summary = outcome.directives.last().unwrap();
        match summary {
            Directive::EmitMessage { text, kind, .. } => {
                assert_eq!(*kind, MessageKind::Summary);
                assert!(text.contains("Study destination: Germany"));
                assert!(text.contains("Counselling call: No"));
            }
            other => panic!("unexpected directive {:?}", other),
        }
        // study checkpoint still fires before the summary
        assert!(matches!(
            outcome.directives[1],
            Directive::TriggerNotification {
                checkpoint: Checkpoint::StudyEmail,
                ..
            }
        ));
    }

    #[test]
    fn test_closed_session_yields_no_directives() {
        let mut session = session_at(TERMINAL_STEP, &[]);
        session.status = SessionStatus::Closed;

        let outcome = engine().evaluate(&session, &UserInput::text("hello?"));
        assert!(outcome.is_closed_session());
        assert!(outcome.mutation.is_none());
        assert_eq!(outcome.error_text.as_deref(), Some(CLOSED_ERROR));
    }

    #[test]
    fn test_unknown_step_routes_to_closing() {
        let outcome = engine().evaluate(&session_at(57, &[("name", "Asha")]), &UserInput::text("x"));

        assert!(outcome.accepted);
        let mutation = outcome.mutation.unwrap();
        assert_eq!(mutation.step, TERMINAL_STEP);
        assert_eq!(mutation.status, Some(SessionStatus::Closed));
        assert!(mutation.answers.is_empty());
        assert_eq!(outcome.directives.len(), 1);
    }

    #[test]
    fn test_evaluate_is_deterministic() {
        let engine = engine();
        let inputs = [
            (1, UserInput::text("Asha")),
            (2, UserInput::text("17")),
            (7, UserInput::choice("UG Completed")),
            (9, UserInput::choice("No")),
            (4, UserInput::choice("Other")),
        ];
        for (step, input) in inputs {
            let session = session_at(step, &[("name", "Asha"), ("ugMajor", "Dentist")]);
            assert_eq!(engine.evaluate(&session, &input), engine.evaluate(&session, &input));
        }
    }
}
