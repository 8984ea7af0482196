//! Session application services.
//!
//! This module contains the coordinator that owns the per-session
//! serialization, and the lock registry it is built on.

mod coordinator;
mod locks;

pub use coordinator::SessionCoordinator;
pub use locks::SessionLocks;
