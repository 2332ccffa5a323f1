//! Backmerge workflow: build an integration branch from a destination branch
//! and replay a chosen set of commits onto it.
//!
//! [`BackmergeOrchestrator`] drives the git layer through a
//! [`BackmergeSession`]; a failed replay deletes the partial branch before the
//! error is returned.

mod error;
mod orchestrator;
pub mod ordering;
mod session;

pub use error::{BackmergeError, RollbackOutcome};
pub use orchestrator::{BackmergeOrchestrator, BackmergeReport};
pub use ordering::{order_selection, OrderingError};
pub use session::{BackmergeSession, BackmergeState};
