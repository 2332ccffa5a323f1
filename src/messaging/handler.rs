//! Turns each inbound panel message into exactly one outbound message.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::NaiveDate;
use tracing::{debug, info, instrument, warn};

use crate::backmerge::{BackmergeError, BackmergeOrchestrator};
use crate::config::{BackmergeConfig, Config, GitConfig};
use crate::git::{CommandRunner, GitCli, GitError};
use crate::messaging::protocol::{InboundMessage, OutboundMessage};
use crate::types::ErrorCode;
use crate::workspace::WorkspaceProvider;

const NO_WORKSPACE_MESSAGE: &str = "No workspace folder open";

/// Dispatches panel requests to the backmerge core for the active workspace
#[derive(Clone)]
pub struct MessageHandler {
    workspace: Arc<dyn WorkspaceProvider>,
    runner: Arc<dyn CommandRunner>,
    git: GitConfig,
    backmerge: BackmergeConfig,
    fixed_date: Option<NaiveDate>,
}

impl MessageHandler {
    pub fn new(
        config: &Config,
        workspace: Arc<dyn WorkspaceProvider>,
        runner: Arc<dyn CommandRunner>,
    ) -> Self {
        Self {
            workspace,
            runner,
            git: config.git.clone(),
            backmerge: config.backmerge.clone(),
            fixed_date: None,
        }
    }

    /// Name generated branches after `date` instead of today
    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.fixed_date = Some(date);
        self
    }

    pub fn repository_root(&self) -> Option<PathBuf> {
        self.workspace.repository_root()
    }

    /// Orchestrator for the current workspace repository, if one is open
    pub fn orchestrator(&self) -> Option<BackmergeOrchestrator> {
        let root = self.workspace.repository_root()?;
        let git = GitCli::new(self.runner.clone(), root).with_program(&self.git.program);
        let orchestrator =
            BackmergeOrchestrator::for_repository(git, &self.git.remote, &self.backmerge.branch_prefix);
        Some(match self.fixed_date {
            Some(date) => orchestrator.with_fixed_date(date),
            None => orchestrator,
        })
    }

    /// Decode one raw JSON frame and handle it
    pub async fn handle_json(&self, raw: &str) -> OutboundMessage {
        match serde_json::from_str::<InboundMessage>(raw) {
            Ok(message) => self.handle(message).await,
            Err(e) => {
                warn!(error = %e, "Rejected malformed message");
                OutboundMessage::error(ErrorCode::InvalidMessage, format!("Invalid message: {e}"))
            }
        }
    }

    #[instrument(skip_all, fields(command = message.command_name()))]
    pub async fn handle(&self, message: InboundMessage) -> OutboundMessage {
        let Some(orchestrator) = self.orchestrator() else {
            return OutboundMessage::error(ErrorCode::NoWorkspace, NO_WORKSPACE_MESSAGE);
        };

        let response = match message {
            InboundMessage::GetLocalBranches {} => orchestrator
                .list_local_branches()
                .await
                .map(|branches| OutboundMessage::LocalBranches { branches })
                .unwrap_or_else(git_error),

            InboundMessage::CheckBranchStatus { branch_name } => orchestrator
                .check_branch_status(&branch_name)
                .await
                .map(|status| OutboundMessage::BranchStatus {
                    branch_name,
                    is_behind: status.is_behind,
                    commit_count: status.commit_count,
                })
                .unwrap_or_else(git_error),

            InboundMessage::PullBranch { branch_name } => orchestrator
                .pull_branch(&branch_name)
                .await
                .map(|()| OutboundMessage::PullSuccess { branch_name })
                .unwrap_or_else(git_error),

            InboundMessage::GetBranchCommits {
                branch_name,
                limit,
                skip,
            } => {
                let limit = limit.unwrap_or(self.backmerge.commit_page_size);
                let skip = skip.unwrap_or(0);
                orchestrator
                    .get_branch_commits(&branch_name, limit, skip)
                    .await
                    .map(|commits| OutboundMessage::BranchCommits {
                        branch_name,
                        commits,
                    })
                    .unwrap_or_else(git_error)
            }

            InboundMessage::CreateBackmergeBranch {
                destination_branch,
                selected_commits,
            } => match orchestrator
                .create_backmerge_branch(&destination_branch, &selected_commits)
                .await
            {
                Ok(report) => {
                    info!(branch = %report.branch_name, "Backmerge branch ready");
                    OutboundMessage::BackmergeBranchCreated {
                        branch_name: report.branch_name,
                    }
                }
                Err(e) => backmerge_error(e),
            },
        };

        debug!(response = response.command_name(), "Message handled");
        response
    }
}

fn git_error(err: GitError) -> OutboundMessage {
    OutboundMessage::error(err.code(), err.to_string())
}

/// Replay failures get their own command; everything else is a plain error
fn backmerge_error(err: BackmergeError) -> OutboundMessage {
    let code = err.code();
    let message = err.to_string();
    match err {
        BackmergeError::Replay {
            commit_id,
            rollback,
            ..
        } => OutboundMessage::BackmergeBranchError {
            message,
            code,
            failed_commit: Some(commit_id),
            branch_deleted: rollback.branch_deleted(),
        },
        _ => OutboundMessage::error(code, message),
    }
}
