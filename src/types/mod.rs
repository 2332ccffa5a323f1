//! Shared types for the backmerge core and its UI protocol.
//!
//! These types use ts-rs to generate TypeScript definitions for the webview
//! from a single Rust source of truth.

mod branch;
mod commit;
mod error_code;

pub use branch::BranchStatus;
pub use commit::Commit;
pub use error_code::ErrorCode;
