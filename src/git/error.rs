//! Error taxonomy for git operations.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::ErrorCode;

/// Errors produced by the git inspector and mutator
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GitError {
    /// Missing or malformed input, caught before any subprocess runs
    #[error("{0}")]
    Validation(String),

    /// A git subprocess exited non-zero; `message` is its stderr verbatim
    #[error("git {command} failed: {message}")]
    Command {
        command: String,
        message: String,
        exit_code: Option<i32>,
    },

    /// The git binary could not be started
    #[error("failed to run git {command}: {message}")]
    Spawn { command: String, message: String },

    /// The operation's invariant does not hold (e.g. deleting the checked-out branch)
    #[error("{0}")]
    Precondition(String),

    /// Another pull or backmerge is in flight on the repository
    #[error("another pull or backmerge is already running in {}", .0.display())]
    Busy(PathBuf),
}

impl GitError {
    pub fn code(&self) -> ErrorCode {
        match self {
            GitError::Validation(_) => ErrorCode::Validation,
            GitError::Command { .. } | GitError::Spawn { .. } => ErrorCode::GitCommand,
            GitError::Precondition(_) => ErrorCode::Precondition,
            GitError::Busy(_) => ErrorCode::Busy,
        }
    }
}

pub type GitResult<T> = std::result::Result<T, GitError>;
