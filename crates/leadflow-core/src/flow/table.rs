//! The questionnaire as data.
//!
//! Every pending step maps to a [`StepSpec`] describing the question, the
//! accepted input, the answer field it fills, the outgoing edge(s) and an
//! optional checkpoint. Branching (the Study/Work fork, the UG-major fork,
//! the Dentist clause) lives here and nowhere else.

use crate::error::{LeadflowError, Result};
use crate::session::{Answers, Checkpoint};
use std::collections::BTreeMap;

pub const WELCOME_STEP: u32 = 0;
pub const TERMINAL_STEP: u32 = 99;

pub const GET_STARTED: &str = "Get Started";
pub const SKIP_UPLOAD: &str = "Skip";

const YES_NO: &[&str] = &["Yes", "No"];
const EXPERIENCE: &[&str] = &["Fresher", "1-2 Years", "3-5 Years", "5+ Years"];

/// Human labels for the closing summary, in display order.
pub const FIELD_LABELS: &[(&str, &str)] = &[
    ("name", "Name"),
    ("age", "Age"),
    ("email", "Email"),
    ("purpose", "Looking for"),
    ("passport", "Valid passport"),
    ("sector", "Preferred sector"),
    ("qualification", "Highest qualification"),
    ("ugMajor", "UG degree"),
    ("experience", "Work experience"),
    ("germanReady", "Ready to learn German"),
    ("cvFile", "CV"),
    ("destination", "Study destination"),
    ("studyLevel", "Study level"),
    ("intake", "Preferred intake"),
    ("budget", "Budget"),
    ("counselling", "Counselling call"),
];

/// Human label of an answer field, or the field name itself if unlabelled.
pub fn field_label(field: &str) -> &str {
    FIELD_LABELS
        .iter()
        .find(|(name, _)| *name == field)
        .map_or(field, |(_, label)| *label)
}

/// Which part of the questionnaire a step belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Branch {
    Identity,
    Work,
    UgMajor,
    Study,
}

/// What a step accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InputRule {
    /// Exact, case-sensitive match against one of the listed values.
    Choice(&'static [&'static str]),
    Name,
    Age,
    Email,
    /// A file upload, or the typed keyword to continue without one.
    Upload { skip: &'static str },
}

/// Outgoing edge(s) of a step.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Next {
    Step(u32),
    /// First route whose value equals the answer wins, else `otherwise`.
    Branch {
        routes: &'static [(&'static str, u32)],
        otherwise: u32,
    },
}

impl Next {
    pub fn resolve(&self, answer: &str) -> u32 {
        match self {
            Next::Step(step) => *step,
            Next::Branch { routes, otherwise } => routes
                .iter()
                .find(|(value, _)| *value == answer)
                .map(|(_, step)| *step)
                .unwrap_or(*otherwise),
        }
    }

    pub fn targets(&self) -> Vec<u32> {
        match self {
            Next::Step(step) => vec![*step],
            Next::Branch { routes, otherwise } => routes
                .iter()
                .map(|(_, step)| *step)
                .chain(std::iter::once(*otherwise))
                .collect(),
        }
    }
}

/// Extra sentence appended to a question when an earlier answer matches.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Clause {
    pub field: &'static str,
    pub equals: &'static str,
    pub text: &'static str,
}

/// Question text. `{name}` is replaced with the collected name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Prompt {
    pub text: &'static str,
    pub clause: Option<Clause>,
}

impl Prompt {
    const fn plain(text: &'static str) -> Self {
        Self { text, clause: None }
    }

    pub fn render(&self, answers: &Answers) -> String {
        let name = answers.get("name").map(String::as_str).unwrap_or("there");
        let mut text = self.text.replace("{name}", name);
        if let Some(clause) = self.clause {
            if answers.get(clause.field).map(String::as_str) == Some(clause.equals) {
                text.push(' ');
                text.push_str(clause.text);
            }
        }
        text
    }
}

/// Checkpoint reached when a step's answer is accepted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckpointSpec {
    pub checkpoint: Checkpoint,
    /// Answer fields forwarded to the notifier
    pub fields: &'static [&'static str],
}

impl CheckpointSpec {
    pub fn payload(&self, answers: &Answers) -> Answers {
        self.fields
            .iter()
            .filter_map(|field| {
                answers
                    .get(*field)
                    .map(|value| (field.to_string(), value.clone()))
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StepSpec {
    pub step: u32,
    pub branch: Branch,
    pub prompt: Prompt,
    pub rule: InputRule,
    /// Answer field written on acceptance; `None` for pure acknowledgements
    pub field: Option<&'static str>,
    pub next: Next,
    pub checkpoint: Option<CheckpointSpec>,
}

impl StepSpec {
    pub fn options(&self) -> &'static [&'static str] {
        match self.rule {
            InputRule::Choice(options) => options,
            _ => &[],
        }
    }
}

/// Static mapping from step to its handler description.
#[derive(Debug, Clone)]
pub struct TransitionTable {
    steps: BTreeMap<u32, StepSpec>,
}

impl TransitionTable {
    pub fn from_steps(steps: impl IntoIterator<Item = StepSpec>) -> Self {
        Self {
            steps: steps.into_iter().map(|spec| (spec.step, spec)).collect(),
        }
    }

    /// The study/work abroad questionnaire.
    pub fn standard() -> Self {
        Self::from_steps(STANDARD_STEPS.iter().copied())
    }

    pub fn get(&self, step: u32) -> Option<&StepSpec> {
        self.steps.get(&step)
    }

    pub fn iter(&self) -> impl Iterator<Item = &StepSpec> {
        self.steps.values()
    }

    /// Checks that the table is closed: every edge lands on a defined step
    /// or the terminal step, and the terminal step itself has no handler.
    pub fn validate(&self) -> Result<()> {
        if !self.steps.contains_key(&WELCOME_STEP) {
            return Err(LeadflowError::config("transition table has no welcome step"));
        }
        if self.steps.contains_key(&TERMINAL_STEP) {
            return Err(LeadflowError::config(
                "terminal step must not have a handler",
            ));
        }

        let mut errors = Vec::new();
        for spec in self.steps.values() {
            for target in spec.next.targets() {
                if target != TERMINAL_STEP && !self.steps.contains_key(&target) {
                    errors.push(LeadflowError::config(format!(
                        "step {} routes to undefined step {}",
                        spec.step, target
                    )));
                }
            }
            if let (Next::Branch { routes, .. }, InputRule::Choice(options)) = (spec.next, spec.rule)
            {
                for (value, _) in routes {
                    if !options.contains(value) {
                        errors.push(LeadflowError::config(format!(
                            "step {} routes on '{}' which is not an option",
                            spec.step, value
                        )));
                    }
                }
            }
        }

        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(LeadflowError::Multiple(errors)),
        }
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::standard()
    }
}

const GERMAN_FIELDS: &[&str] = &[
    "name",
    "age",
    "email",
    "purpose",
    "passport",
    "sector",
    "qualification",
    "experience",
    "germanReady",
];

const UG_FIELDS: &[&str] = &[
    "name",
    "age",
    "email",
    "purpose",
    "passport",
    "sector",
    "qualification",
    "ugMajor",
    "experience",
    "germanReady",
];

const STUDY_FIELDS: &[&str] = &[
    "name",
    "age",
    "email",
    "purpose",
    "destination",
    "studyLevel",
    "intake",
    "budget",
    "counselling",
];

const STANDARD_STEPS: &[StepSpec] = &[
    // Identity capture
    StepSpec {
        step: WELCOME_STEP,
        branch: Branch::Identity,
        prompt: Prompt::plain(
            "Hello! Welcome to our study and work abroad guidance desk. I'll ask a few quick questions to find the right path for you. Tap Get Started when you're ready.",
        ),
        rule: InputRule::Choice(&[GET_STARTED]),
        field: None,
        next: Next::Step(1),
        checkpoint: None,
    },
    StepSpec {
        step: 1,
        branch: Branch::Identity,
        prompt: Prompt::plain("Great! What's your full name?"),
        rule: InputRule::Name,
        field: Some("name"),
        next: Next::Step(2),
        checkpoint: None,
    },
    StepSpec {
        step: 2,
        branch: Branch::Identity,
        prompt: Prompt::plain("Nice to meet you, {name}! How old are you?"),
        rule: InputRule::Age,
        field: Some("age"),
        next: Next::Step(3),
        checkpoint: None,
    },
    StepSpec {
        step: 3,
        branch: Branch::Identity,
        prompt: Prompt::plain("Thanks! What's your email address? Our team will use it to reach you."),
        rule: InputRule::Email,
        field: Some("email"),
        next: Next::Step(4),
        checkpoint: None,
    },
    StepSpec {
        step: 4,
        branch: Branch::Identity,
        prompt: Prompt::plain("What are you looking for, {name}?"),
        rule: InputRule::Choice(&["Study", "Work"]),
        field: Some("purpose"),
        next: Next::Branch {
            routes: &[("Study", 20), ("Work", 5)],
            otherwise: TERMINAL_STEP,
        },
        checkpoint: None,
    },
    // Work branch
    StepSpec {
        step: 5,
        branch: Branch::Work,
        prompt: Prompt::plain("Do you have a valid passport?"),
        rule: InputRule::Choice(YES_NO),
        field: Some("passport"),
        next: Next::Step(6),
        checkpoint: None,
    },
    StepSpec {
        step: 6,
        branch: Branch::Work,
        prompt: Prompt::plain("Which sector would you like to work in?"),
        rule: InputRule::Choice(&["Healthcare", "Engineering", "IT", "Hospitality", "Other"]),
        field: Some("sector"),
        next: Next::Step(7),
        checkpoint: None,
    },
    StepSpec {
        step: 7,
        branch: Branch::Work,
        prompt: Prompt::plain("What is your highest qualification?"),
        rule: InputRule::Choice(&["12th Pass", "Diploma", "UG Completed", "PG Completed"]),
        field: Some("qualification"),
        next: Next::Branch {
            routes: &[("UG Completed", 12)],
            otherwise: 8,
        },
        checkpoint: None,
    },
    StepSpec {
        step: 8,
        branch: Branch::Work,
        prompt: Prompt::plain("How much work experience do you have?"),
        rule: InputRule::Choice(EXPERIENCE),
        field: Some("experience"),
        next: Next::Step(9),
        checkpoint: None,
    },
    StepSpec {
        step: 9,
        branch: Branch::Work,
        prompt: Prompt::plain(
            "Are you ready to learn German up to B1 level? It is required for most work visas in Germany.",
        ),
        rule: InputRule::Choice(YES_NO),
        field: Some("germanReady"),
        next: Next::Step(10),
        checkpoint: Some(CheckpointSpec {
            checkpoint: Checkpoint::GermanEmail,
            fields: GERMAN_FIELDS,
        }),
    },
    StepSpec {
        step: 10,
        branch: Branch::Work,
        prompt: Prompt::plain(
            "Please upload your CV so our team can review your profile, or type Skip to continue without it.",
        ),
        rule: InputRule::Upload { skip: SKIP_UPLOAD },
        field: Some("cvFile"),
        next: Next::Step(TERMINAL_STEP),
        checkpoint: None,
    },
    // UG-major sub-flow
    StepSpec {
        step: 12,
        branch: Branch::UgMajor,
        prompt: Prompt::plain("Which undergraduate degree have you completed?"),
        rule: InputRule::Choice(&["Engineering", "Nursing", "Dentist", "Pharmacy", "Other"]),
        field: Some("ugMajor"),
        next: Next::Step(13),
        checkpoint: None,
    },
    StepSpec {
        step: 13,
        branch: Branch::UgMajor,
        prompt: Prompt::plain("How much work experience do you have after your degree?"),
        rule: InputRule::Choice(EXPERIENCE),
        field: Some("experience"),
        next: Next::Step(14),
        checkpoint: None,
    },
    StepSpec {
        step: 14,
        branch: Branch::UgMajor,
        prompt: Prompt {
            text: "Are you ready to learn German up to B1 level? It is required for professional recognition in Germany.",
            clause: Some(Clause {
                field: "ugMajor",
                equals: "Dentist",
                text: "As a dentist you will also need to clear the Kenntnisprüfung, the German dental licensing exam. Are you ready to prepare for it as well?",
            }),
        },
        rule: InputRule::Choice(YES_NO),
        field: Some("germanReady"),
        next: Next::Step(10),
        checkpoint: Some(CheckpointSpec {
            checkpoint: Checkpoint::UgEmail,
            fields: UG_FIELDS,
        }),
    },
    // Study branch
    StepSpec {
        step: 20,
        branch: Branch::Study,
        prompt: Prompt::plain("Which country would you like to study in?"),
        rule: InputRule::Choice(&["Germany", "UK", "Canada", "Australia", "Ireland"]),
        field: Some("destination"),
        next: Next::Step(21),
        checkpoint: None,
    },
    StepSpec {
        step: 21,
        branch: Branch::Study,
        prompt: Prompt::plain("What level of study are you planning?"),
        rule: InputRule::Choice(&["Bachelors", "Masters", "PhD", "Diploma"]),
        field: Some("studyLevel"),
        next: Next::Step(22),
        checkpoint: None,
    },
    StepSpec {
        step: 22,
        branch: Branch::Study,
        prompt: Prompt::plain("When would you like to start?"),
        rule: InputRule::Choice(&["Within 6 months", "6-12 months", "Next year"]),
        field: Some("intake"),
        next: Next::Step(23),
        checkpoint: None,
    },
    StepSpec {
        step: 23,
        branch: Branch::Study,
        prompt: Prompt::plain("What is your approximate budget for tuition and living costs?"),
        rule: InputRule::Choice(&["Under 10 Lakhs", "10-20 Lakhs", "20+ Lakhs"]),
        field: Some("budget"),
        next: Next::Step(24),
        checkpoint: None,
    },
    StepSpec {
        step: 24,
        branch: Branch::Study,
        prompt: Prompt::plain("Would you like a free counselling call with one of our study advisors?"),
        rule: InputRule::Choice(YES_NO),
        field: Some("counselling"),
        next: Next::Step(TERMINAL_STEP),
        checkpoint: Some(CheckpointSpec {
            checkpoint: Checkpoint::StudyEmail,
            fields: STUDY_FIELDS,
        }),
    },
];

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_standard_table_is_closed() {
        TransitionTable::standard().validate().unwrap();
    }

    #[test]
    fn test_branches_use_disjoint_steps() {
        let table = TransitionTable::standard();
        let steps_of = |branch: Branch| -> HashSet<u32> {
            table
                .iter()
                .filter(|spec| spec.branch == branch)
                .map(|spec| spec.step)
                .collect()
        };

        let study = steps_of(Branch::Study);
        let work: HashSet<u32> = steps_of(Branch::Work)
            .union(&steps_of(Branch::UgMajor))
            .copied()
            .collect();
        assert!(study.is_disjoint(&work));
        assert_eq!(steps_of(Branch::Identity), HashSet::from([0, 1, 2, 3, 4]));
    }

    #[test]
    fn test_edges_never_cross_between_study_and_work() {
        let table = TransitionTable::standard();
        for spec in table.iter() {
            for target in spec.next.targets() {
                let Some(next) = table.get(target) else {
                    continue;
                };
                let crosses = matches!(
                    (spec.branch, next.branch),
                    (Branch::Study, Branch::Work | Branch::UgMajor)
                        | (Branch::Work | Branch::UgMajor, Branch::Study)
                );
                assert!(!crosses, "step {} -> {}", spec.step, target);
            }
        }
    }

    #[test]
    fn test_every_checkpoint_is_reachable_once() {
        let table = TransitionTable::standard();
        let checkpoints: Vec<Checkpoint> = table
            .iter()
            .filter_map(|spec| spec.checkpoint.map(|c| c.checkpoint))
            .collect();
        assert_eq!(
            checkpoints,
            vec![Checkpoint::GermanEmail, Checkpoint::UgEmail, Checkpoint::StudyEmail]
        );
    }

    #[test]
    fn test_qualification_fork() {
        let table = TransitionTable::standard();
        let spec = table.get(7).unwrap();
        assert_eq!(spec.next.resolve("UG Completed"), 12);
        assert_eq!(spec.next.resolve("Diploma"), 8);
        assert_eq!(spec.next.resolve("PG Completed"), 8);
    }

    #[test]
    fn test_dentist_clause_is_content_only() {
        let table = TransitionTable::standard();
        let spec = table.get(14).unwrap();

        let mut answers = Answers::new();
        answers.insert("ugMajor".into(), "Nursing".into());
        let plain = spec.prompt.render(&answers);
        answers.insert("ugMajor".into(), "Dentist".into());
        let dentist = spec.prompt.render(&answers);

        assert!(dentist.starts_with(&plain));
        assert!(dentist.contains("Kenntnisprüfung"));
        assert!(!plain.contains("Kenntnisprüfung"));
    }

    #[test]
    fn test_validate_reports_dangling_edges() {
        let broken = TransitionTable::from_steps([StepSpec {
            step: WELCOME_STEP,
            branch: Branch::Identity,
            prompt: Prompt::plain("hi"),
            rule: InputRule::Choice(&["Go"]),
            field: None,
            next: Next::Step(42),
            checkpoint: None,
        }]);
        let err = broken.validate().unwrap_err();
        assert!(err.is_config());
        assert!(err.to_string().contains("undefined step 42"));
    }

    #[test]
    fn test_checkpoint_payload_only_carries_listed_fields() {
        let spec = TransitionTable::standard().get(24).unwrap().checkpoint.unwrap();
        let mut answers = Answers::new();
        answers.insert("name".into(), "Asha".into());
        answers.insert("passport".into(), "Yes".into());
        answers.insert("counselling".into(), "No".into());

        let payload = spec.payload(&answers);
        assert_eq!(payload.len(), 2);
        assert_eq!(payload.get("counselling").map(String::as_str), Some("No"));
        assert!(!payload.contains_key("passport"));
    }
}
