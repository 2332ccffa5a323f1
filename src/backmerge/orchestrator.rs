//! Backmerge orchestration: branch creation, ordered replay and rollback.

use std::sync::Arc;

use chrono::{Local, NaiveDate};
use tracing::{error, info, instrument, warn};

use crate::backmerge::error::{BackmergeError, RollbackOutcome};
use crate::backmerge::session::{BackmergeSession, BackmergeState};
use crate::git::{
    validate_ref_name, BranchInspector, BranchMutator, GitCli, GitResult, RepositoryLock,
};
use crate::types::{BranchStatus, Commit};

type DateSource = Arc<dyn Fn() -> NaiveDate + Send + Sync>;

/// Result of a successful backmerge run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BackmergeReport {
    pub branch_name: String,
    /// Commits applied, in replay order
    pub applied_commits: Vec<String>,
    pub state: BackmergeState,
}

/// Coordinates the inspector and mutator for one repository.
///
/// Every operation holds the repository lock: a mutation is rejected while
/// another mutation runs, anything else waits its turn.
#[derive(Clone)]
pub struct BackmergeOrchestrator {
    inspector: BranchInspector,
    mutator: BranchMutator,
    lock: RepositoryLock,
    today: DateSource,
}

impl BackmergeOrchestrator {
    pub fn new(inspector: BranchInspector, mutator: BranchMutator, lock: RepositoryLock) -> Self {
        Self {
            inspector,
            mutator,
            lock,
            today: Arc::new(|| Local::now().date_naive()),
        }
    }

    /// Wire an orchestrator for the repository `git` points at
    pub fn for_repository(git: GitCli, remote: &str, branch_prefix: &str) -> Self {
        let lock = RepositoryLock::new(git.repo_path());
        let inspector = BranchInspector::new(git.clone(), remote);
        let mutator = BranchMutator::new(git, remote).with_branch_prefix(branch_prefix);
        Self::new(inspector, mutator, lock)
    }

    /// Name branches after a fixed date instead of today
    pub fn with_fixed_date(mut self, date: NaiveDate) -> Self {
        self.today = Arc::new(move || date);
        self
    }

    pub fn lock(&self) -> &RepositoryLock {
        &self.lock
    }

    pub async fn list_local_branches(&self) -> GitResult<Vec<String>> {
        let _guard = self.lock.acquire().await;
        self.inspector.list_local_branches().await
    }

    pub async fn check_branch_status(&self, branch: &str) -> GitResult<BranchStatus> {
        let _guard = self.lock.acquire().await;
        self.inspector.check_branch_status(branch).await
    }

    pub async fn get_branch_commits(
        &self,
        branch: &str,
        limit: usize,
        skip: usize,
    ) -> GitResult<Vec<Commit>> {
        let _guard = self.lock.acquire().await;
        self.inspector.get_branch_commits(branch, limit, skip).await
    }

    pub async fn pull_branch(&self, branch: &str) -> GitResult<()> {
        validate_ref_name(branch, "Branch name")?;
        let _guard = self.lock.try_acquire().await?;
        self.mutator.pull_branch(branch).await
    }

    /// Build a new integration branch from `destination` and replay
    /// `selected` onto it in the given order.
    ///
    /// On return the branch either exists with every selected commit applied
    /// or has been deleted; a failed deletion is reported in the error.
    #[instrument(skip(self, selected), fields(commits = selected.len()))]
    pub async fn create_backmerge_branch(
        &self,
        destination: &str,
        selected: &[String],
    ) -> Result<BackmergeReport, BackmergeError> {
        if destination.trim().is_empty() {
            return Err(BackmergeError::Validation(
                "Destination branch is required".to_string(),
            ));
        }
        validate_ref_name(destination, "Destination branch")?;
        for commit_id in selected {
            validate_ref_name(commit_id, "Commit id")?;
        }

        let _guard = self.lock.try_acquire().await?;
        let mut session = BackmergeSession::new(destination, selected.to_vec());

        let branch_name = self
            .mutator
            .create_backmerge_branch_on(destination, (self.today)())
            .await
            .map_err(BackmergeError::Create)?;
        session.branch_created(branch_name.clone());
        info!(branch = %branch_name, "Backmerge branch created, replaying commits");

        for commit_id in selected {
            if let Err(cause) = self.mutator.cherry_pick_commit(&branch_name, commit_id).await {
                warn!(
                    commit = %commit_id,
                    pending = session.pending_commits().len(),
                    error = %cause,
                    "Replay failed, rolling back"
                );
                let rollback = self.roll_back(&mut session, &branch_name).await;
                return Err(BackmergeError::Replay {
                    commit_id: commit_id.clone(),
                    branch_name,
                    applied: session.applied_commits().to_vec(),
                    cause,
                    rollback,
                });
            }
            session.commit_applied();
        }

        session.complete();
        info!(branch = %branch_name, applied = selected.len(), "Backmerge completed");

        Ok(BackmergeReport {
            branch_name,
            applied_commits: session.applied_commits().to_vec(),
            state: session.state(),
        })
    }

    /// Delete the partially built branch, checking out the destination if needed
    async fn roll_back(&self, session: &mut BackmergeSession, branch_name: &str) -> RollbackOutcome {
        let destination = session.destination_branch().to_string();
        match self.mutator.delete_branch(branch_name, Some(&destination)).await {
            Ok(()) => {
                session.roll_back(true);
                RollbackOutcome::Deleted {
                    branch: branch_name.to_string(),
                }
            }
            Err(e) => {
                error!(branch = %branch_name, error = %e, "Failed to delete branch after replay error");
                session.roll_back(false);
                RollbackOutcome::DeleteFailed {
                    branch: branch_name.to_string(),
                    reason: e.to_string(),
                }
            }
        }
    }
}
