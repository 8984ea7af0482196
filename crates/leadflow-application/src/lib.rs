//! Application layer for Leadflow.
//!
//! This crate wires the pure flow engine from `leadflow-core` to storage,
//! notification and realtime delivery.
//!
//! # Module Structure
//!
//! - `session`: `SessionCoordinator` and the per-session lock registry
//! - `dispatch`: `DirectiveDispatcher` and the delayed-directive queue
//! - `realtime`: session rooms and typing presence
//! - `clock`: injectable time source
//! - `review_service`: read-only views for staff review

pub mod clock;
pub mod dispatch;
pub mod realtime;
pub mod review_service;
pub mod session;

pub use clock::{Clock, TokioClock};
pub use dispatch::DirectiveDispatcher;
pub use realtime::RealtimeChannel;
pub use review_service::ReviewService;
pub use session::SessionCoordinator;

/// User-facing notice for failures the user cannot fix.
pub const RETRY_NOTICE: &str = "Something went wrong on our side. Please try again.";
