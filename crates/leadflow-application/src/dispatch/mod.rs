//! Directive execution.
//!
//! - `dispatcher`: runs a directive batch against stores, notifier and room
//! - `delay_queue`: per-session FIFO for the delayed tail of a batch

mod delay_queue;
mod dispatcher;

pub use delay_queue::DelayQueue;
pub use dispatcher::{DirectiveDispatcher, NOTIFIER_WARNING};
