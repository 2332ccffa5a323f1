//! Wire format of the panel messaging channel.
//!
//! Every message is a JSON object tagged by its `command` field. Payload
//! fields use the panel's camelCase names.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

use crate::types::{Commit, ErrorCode};

/// Requests sent by the panel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "command", rename_all = "camelCase")]
#[ts(export)]
pub enum InboundMessage {
    GetLocalBranches {},
    CheckBranchStatus {
        #[serde(rename = "branchName", default)]
        branch_name: String,
    },
    PullBranch {
        #[serde(rename = "branchName", default)]
        branch_name: String,
    },
    GetBranchCommits {
        #[serde(rename = "branchName", default)]
        branch_name: String,
        /// Page size; the configured default when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        limit: Option<usize>,
        /// Commits to skip from the tip; 0 when absent
        #[serde(default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        skip: Option<usize>,
    },
    CreateBackmergeBranch {
        #[serde(rename = "destinationBranch", default)]
        destination_branch: String,
        /// Commit ids, already in replay order
        #[serde(rename = "selectedCommits", default)]
        selected_commits: Vec<String>,
    },
}

impl InboundMessage {
    /// The `command` tag, for logging
    pub fn command_name(&self) -> &'static str {
        match self {
            InboundMessage::GetLocalBranches {} => "getLocalBranches",
            InboundMessage::CheckBranchStatus { .. } => "checkBranchStatus",
            InboundMessage::PullBranch { .. } => "pullBranch",
            InboundMessage::GetBranchCommits { .. } => "getBranchCommits",
            InboundMessage::CreateBackmergeBranch { .. } => "createBackmergeBranch",
        }
    }
}

/// Responses pushed to the panel, exactly one per request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(tag = "command", rename_all = "camelCase")]
#[ts(export)]
pub enum OutboundMessage {
    LocalBranches {
        branches: Vec<String>,
    },
    BranchStatus {
        #[serde(rename = "branchName")]
        branch_name: String,
        #[serde(rename = "isBehind")]
        is_behind: bool,
        #[serde(rename = "commitCount")]
        commit_count: u32,
    },
    PullSuccess {
        #[serde(rename = "branchName")]
        branch_name: String,
    },
    BranchCommits {
        #[serde(rename = "branchName")]
        branch_name: String,
        commits: Vec<Commit>,
    },
    BackmergeBranchCreated {
        #[serde(rename = "branchName")]
        branch_name: String,
    },
    /// Replay failed after the branch was created
    BackmergeBranchError {
        message: String,
        code: ErrorCode,
        #[serde(rename = "failedCommit", default, skip_serializing_if = "Option::is_none")]
        #[ts(optional)]
        failed_commit: Option<String>,
        /// Whether the partial branch is gone
        #[serde(rename = "branchDeleted")]
        branch_deleted: bool,
    },
    Error {
        message: String,
        code: ErrorCode,
    },
}

impl OutboundMessage {
    pub fn error(code: ErrorCode, message: impl Into<String>) -> Self {
        OutboundMessage::Error {
            message: message.into(),
            code,
        }
    }

    /// The `command` tag, for logging
    pub fn command_name(&self) -> &'static str {
        match self {
            OutboundMessage::LocalBranches { .. } => "localBranches",
            OutboundMessage::BranchStatus { .. } => "branchStatus",
            OutboundMessage::PullSuccess { .. } => "pullSuccess",
            OutboundMessage::BranchCommits { .. } => "branchCommits",
            OutboundMessage::BackmergeBranchCreated { .. } => "backmergeBranchCreated",
            OutboundMessage::BackmergeBranchError { .. } => "backmergeBranchError",
            OutboundMessage::Error { .. } => "error",
        }
    }
}
