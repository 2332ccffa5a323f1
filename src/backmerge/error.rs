//! Backmerge failure reporting.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::git::GitError;
use crate::types::ErrorCode;

/// What happened to the partially built branch after a failed replay
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RollbackOutcome {
    Deleted { branch: String },
    DeleteFailed { branch: String, reason: String },
}

impl RollbackOutcome {
    pub fn branch_deleted(&self) -> bool {
        matches!(self, RollbackOutcome::Deleted { .. })
    }
}

impl fmt::Display for RollbackOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RollbackOutcome::Deleted { branch } => {
                write!(f, "Branch {branch} has been deleted.")
            }
            RollbackOutcome::DeleteFailed { branch, reason } => {
                write!(f, "Branch {branch} could not be deleted: {reason}")
            }
        }
    }
}

/// Errors from a backmerge run
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BackmergeError {
    /// Rejected before any subprocess ran
    #[error("{0}")]
    Validation(String),

    /// Another pull or backmerge is in flight on the repository
    #[error("another pull or backmerge is already running in {}", .0.display())]
    Busy(PathBuf),

    /// The integration branch could not be created; nothing to roll back
    #[error("Failed to create backmerge branch: {0}")]
    Create(#[source] GitError),

    /// A cherry-pick failed and the branch was rolled back
    #[error("Failed to cherry-pick commit {commit_id}: {cause}. {rollback}")]
    Replay {
        commit_id: String,
        branch_name: String,
        applied: Vec<String>,
        #[source]
        cause: GitError,
        rollback: RollbackOutcome,
    },
}

impl BackmergeError {
    pub fn code(&self) -> ErrorCode {
        match self {
            BackmergeError::Validation(_) => ErrorCode::Validation,
            BackmergeError::Busy(_) => ErrorCode::Busy,
            BackmergeError::Create(e) => e.code(),
            BackmergeError::Replay { cause, .. } => cause.code(),
        }
    }
}

impl From<GitError> for BackmergeError {
    fn from(err: GitError) -> Self {
        match err {
            GitError::Validation(msg) => BackmergeError::Validation(msg),
            GitError::Busy(path) => BackmergeError::Busy(path),
            other => BackmergeError::Create(other),
        }
    }
}
