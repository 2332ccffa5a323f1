//! Stable error classification carried next to every error message.

use std::fmt;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// Machine-readable error class so the UI never has to match on message text
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "snake_case")]
#[ts(export)]
pub enum ErrorCode {
    /// Required input was missing or malformed
    Validation,
    /// A git subprocess failed or could not be started
    GitCommand,
    /// The operation's precondition did not hold
    Precondition,
    /// Another pull or backmerge is already running against the repository
    Busy,
    /// The inbound message could not be decoded
    InvalidMessage,
    /// No repository is open in the workspace
    NoWorkspace,
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorCode::Validation => "validation",
            ErrorCode::GitCommand => "git_command",
            ErrorCode::Precondition => "precondition",
            ErrorCode::Busy => "busy",
            ErrorCode::InvalidMessage => "invalid_message",
            ErrorCode::NoWorkspace => "no_workspace",
        };
        f.write_str(name)
    }
}
