//! Branch write operations: pull, create, cherry-pick and delete.
//!
//! Every operation either completes or fails with a [`GitError`]; there is no
//! automatic retry. Cherry-pick failures abort the pick before returning so the
//! working tree is never left mid-cherry-pick.

use chrono::{Local, NaiveDate};
use tracing::{debug, error, info, instrument, warn};

use crate::git::cli::{validate_ref_name, GitCli};
use crate::git::error::{GitError, GitResult};

/// Default prefix for generated integration branches
pub const DEFAULT_BRANCH_PREFIX: &str = "backmerge";

/// Mutating git operations against one repository
#[derive(Clone)]
pub struct BranchMutator {
    git: GitCli,
    remote: String,
    branch_prefix: String,
}

impl BranchMutator {
    pub fn new(git: GitCli, remote: impl Into<String>) -> Self {
        Self {
            git,
            remote: remote.into(),
            branch_prefix: DEFAULT_BRANCH_PREFIX.to_string(),
        }
    }

    pub fn with_branch_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.branch_prefix = prefix.into();
        self
    }

    /// Update the local `branch` from the remote without checking it out.
    ///
    /// Success is decided by the exit status alone; anything git prints to
    /// stderr on success (fetch summaries) is only logged.
    #[instrument(skip(self))]
    pub async fn pull_branch(&self, branch: &str) -> GitResult<()> {
        validate_ref_name(branch, "Branch name")?;
        self.git.fetch_into_local(&self.remote, branch).await?;
        info!("Branch updated from remote");
        Ok(())
    }

    /// Create a dated integration branch at `destination`'s tip, named for today
    pub async fn create_backmerge_branch(&self, destination: &str) -> GitResult<String> {
        self.create_backmerge_branch_on(destination, Local::now().date_naive())
            .await
    }

    /// Create `<prefix>/DD-MM-YYYY` (or the first free `-N` suffix) at
    /// `destination`'s tip. The new branch is not checked out.
    #[instrument(skip(self))]
    pub async fn create_backmerge_branch_on(
        &self,
        destination: &str,
        date: NaiveDate,
    ) -> GitResult<String> {
        validate_ref_name(destination, "Destination branch")?;

        let name = self.next_free_branch_name(date).await?;
        self.git.create_branch(&name, destination).await?;

        info!(branch = %name, "Created backmerge branch");
        Ok(name)
    }

    /// First candidate name that exists neither locally nor on the remote
    pub async fn next_free_branch_name(&self, date: NaiveDate) -> GitResult<String> {
        let base = backmerge_base_name(&self.branch_prefix, date);

        for suffix in 0usize.. {
            let candidate = if suffix == 0 {
                base.clone()
            } else {
                format!("{base}-{suffix}")
            };
            if !self.branch_name_taken(&candidate).await? {
                return Ok(candidate);
            }
            debug!(%candidate, "Branch name already taken");
        }

        unreachable!("suffix space is unbounded")
    }

    async fn branch_name_taken(&self, name: &str) -> GitResult<bool> {
        if self.git.local_branch_exists(name).await? {
            return Ok(true);
        }

        // An unreachable remote cannot hold the name
        match self.git.remote_branch_exists(&self.remote, name).await {
            Ok(exists) => Ok(exists),
            Err(e) => {
                warn!(error = %e, "Could not query remote branches, treating name as free");
                Ok(false)
            }
        }
    }

    /// Check out `branch` and cherry-pick `commit` onto it.
    ///
    /// On any failure `cherry-pick --abort` is attempted before the original
    /// error is returned; a failing abort is logged, never surfaced.
    #[instrument(skip(self))]
    pub async fn cherry_pick_commit(&self, branch: &str, commit: &str) -> GitResult<()> {
        validate_ref_name(branch, "Branch name")?;
        validate_ref_name(commit, "Commit id")?;

        let result = match self.git.checkout(branch).await {
            Ok(()) => self.git.cherry_pick(commit).await,
            Err(e) => Err(e),
        };

        if let Err(e) = result {
            warn!(error = %e, "Cherry-pick failed, aborting");
            if let Err(abort_err) = self.git.cherry_pick_abort().await {
                debug!(error = %abort_err, "cherry-pick --abort failed");
            }
            return Err(e);
        }

        debug!("Commit applied");
        Ok(())
    }

    /// Force-delete a local branch.
    ///
    /// Deleting the checked-out branch first switches to `checkout_branch`;
    /// without one it fails with [`GitError::Precondition`].
    #[instrument(skip(self))]
    pub async fn delete_branch(&self, branch: &str, checkout_branch: Option<&str>) -> GitResult<()> {
        validate_ref_name(branch, "Branch name")?;

        let current = self.git.current_branch().await?;
        if current == branch {
            match checkout_branch {
                Some(target) => {
                    validate_ref_name(target, "Checkout branch")?;
                    self.git.checkout(target).await?;
                }
                None => {
                    return Err(GitError::Precondition(format!(
                        "Cannot delete branch '{branch}' while it is checked out; \
                         provide a branch to check out first"
                    )));
                }
            }
        }

        self.git.delete_branch(branch, true).await.inspect_err(|e| {
            error!(error = %e, "Branch deletion failed");
        })?;

        info!("Branch deleted");
        Ok(())
    }
}

/// `<prefix>/DD-MM-YYYY`
pub fn backmerge_base_name(prefix: &str, date: NaiveDate) -> String {
    format!("{}/{}", prefix, date.format("%d-%m-%Y"))
}
