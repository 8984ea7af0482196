//! Conversation flow module.
//!
//! - `table`: the questionnaire as data (`TransitionTable`, `StepSpec`)
//! - `validation`: free-text field validators
//! - `directive`: instructions handed to the dispatcher (`Directive`, `FlowOutcome`)
//! - `engine`: the pure `evaluate` function (`FlowEngine`)

mod directive;
mod engine;
pub mod table;
pub mod validation;

pub use directive::{Directive, FlowOutcome};
pub use engine::{CHOICE_ERROR, CLOSED_ERROR, FlowEngine, UPLOAD_ERROR};
pub use table::{TERMINAL_STEP, TransitionTable, WELCOME_STEP};
