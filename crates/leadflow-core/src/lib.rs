//! Domain layer of Leadflow.
//!
//! Holds the session model, the repository and notifier contracts, the
//! questionnaire transition table with its pure flow engine, and the
//! realtime event vocabulary. Nothing in this crate performs I/O.

pub mod config;
pub mod error;
pub mod flow;
pub mod notifier;
pub mod realtime;
pub mod session;

// Re-export common error type
pub use error::LeadflowError;
