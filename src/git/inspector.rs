//! Read-only branch queries: listing, tracking status and commit history.
//!
//! Nothing here changes which branch is checked out. Optional sub-steps
//! (fetching, upstream lookup, counting) degrade to safe defaults instead of
//! failing the whole query.

use tracing::{debug, instrument, warn};

use crate::git::cli::{validate_ref_name, GitCli};
use crate::git::error::GitResult;
use crate::git::log_parser::{parse_commit_log, LOG_FORMAT};
use crate::types::{BranchStatus, Commit};

/// Outcome of fetching a branch before computing its status
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteFetch {
    Fetched,
    /// The remote or the branch on it is not reachable; not an error
    Unavailable { reason: String },
}

/// Read-only git queries against one repository
#[derive(Clone)]
pub struct BranchInspector {
    git: GitCli,
    remote: String,
}

impl BranchInspector {
    pub fn new(git: GitCli, remote: impl Into<String>) -> Self {
        Self {
            git,
            remote: remote.into(),
        }
    }

    /// Local branches in the order git reports them
    pub async fn list_local_branches(&self) -> GitResult<Vec<String>> {
        self.git.local_branches().await
    }

    /// Fetch `branch` from the remote, classifying failure as an expected absence
    pub async fn fetch_remote_branch(&self, branch: &str) -> RemoteFetch {
        match self.git.fetch_branch(&self.remote, branch).await {
            Ok(()) => RemoteFetch::Fetched,
            Err(e) => RemoteFetch::Unavailable {
                reason: e.to_string(),
            },
        }
    }

    /// Determine whether `branch` is behind its remote tracking branch.
    ///
    /// Never fails for a missing remote, missing upstream or failed count;
    /// each of those reports "not behind".
    #[instrument(skip(self))]
    pub async fn check_branch_status(&self, branch: &str) -> GitResult<BranchStatus> {
        validate_ref_name(branch, "Branch name")?;

        if let RemoteFetch::Unavailable { reason } = self.fetch_remote_branch(branch).await {
            warn!(%reason, "Fetch failed (branch might not exist on remote)");
        }

        match self.git.upstream_of(branch).await {
            Ok(Some(upstream)) => debug!(%upstream, "Branch has upstream"),
            Ok(None) | Err(_) => {
                debug!("Branch has no upstream tracking ref");
                return Ok(BranchStatus::default());
            }
        }

        let remote_ref = format!("{}/{}", self.remote, branch);
        match self.git.count_commits_between(branch, &remote_ref).await {
            Ok(count) => Ok(BranchStatus::behind_by(count)),
            Err(e) => {
                warn!(error = %e, "Could not count commits behind, assuming up to date");
                Ok(BranchStatus::default())
            }
        }
    }

    /// One page of `branch`'s history, most recent first.
    ///
    /// `git log` has no skip primitive here, so `skip + limit` commits are
    /// requested and the first `skip` are dropped locally. Cost grows
    /// linearly with `skip`.
    #[instrument(skip(self))]
    pub async fn get_branch_commits(
        &self,
        branch: &str,
        limit: usize,
        skip: usize,
    ) -> GitResult<Vec<Commit>> {
        validate_ref_name(branch, "Branch name")?;
        if limit == 0 {
            return Ok(Vec::new());
        }

        let total = skip.saturating_add(limit);
        let raw = self.git.log(branch, LOG_FORMAT, total).await?;
        let commits = parse_commit_log(&raw);
        debug!(parsed = commits.len(), "Parsed commit log");

        Ok(commits.into_iter().skip(skip).take(limit).collect())
    }
}
