//! Git CLI wrapper for branch inspection and mutation.
//!
//! Uses the git CLI directly (rather than libgit2) so hooks, credential
//! helpers and user configuration behave exactly as they do in a terminal.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, instrument};

use crate::git::error::{GitError, GitResult};
use crate::git::runner::{CommandOutput, CommandRunner};

/// Low-level git command wrapper bound to one repository
#[derive(Clone)]
pub struct GitCli {
    runner: Arc<dyn CommandRunner>,
    repo_path: PathBuf,
    program: String,
}

impl GitCli {
    pub fn new(runner: Arc<dyn CommandRunner>, repo_path: impl Into<PathBuf>) -> Self {
        Self {
            runner,
            repo_path: repo_path.into(),
            program: "git".to_string(),
        }
    }

    /// Use a different git executable (e.g. an absolute path)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    pub fn repo_path(&self) -> &Path {
        &self.repo_path
    }

    /// Execute a git command and return its raw output without judging the exit status
    pub async fn run_git_output(&self, args: &[&str]) -> GitResult<CommandOutput> {
        debug!(?args, cwd = ?self.repo_path, "Running git command");

        let args: Vec<String> = args.iter().map(|s| (*s).to_string()).collect();
        self.runner
            .run(&self.program, &args, &self.repo_path)
            .await
            .map_err(|e| GitError::Spawn {
                command: subcommand(&args),
                message: e.to_string(),
            })
    }

    /// Execute a git command and return trimmed stdout
    pub async fn run_git(&self, args: &[&str]) -> GitResult<String> {
        let output = self.run_git_output(args).await?;

        if !output.success() {
            let stderr = output.stderr.trim();
            let message = if stderr.is_empty() {
                output.stdout.trim()
            } else {
                stderr
            };
            return Err(GitError::Command {
                command: args.first().copied().unwrap_or_default().to_string(),
                message: message.to_string(),
                exit_code: output.exit_code,
            });
        }

        if !output.stderr.trim().is_empty() {
            debug!(stderr = %output.stderr.trim(), "git wrote to stderr");
        }

        Ok(output.stdout.trim().to_string())
    }

    /// Execute a git command, returning Ok(()) on success
    async fn run_git_silent(&self, args: &[&str]) -> GitResult<()> {
        self.run_git(args).await?;
        Ok(())
    }

    /// Get the root of the git repository
    #[instrument(skip_all, fields(path = %self.repo_path.display()))]
    pub async fn repo_root(&self) -> GitResult<String> {
        self.run_git(&["rev-parse", "--show-toplevel"]).await
    }

    /// Get the currently checked-out branch name (`HEAD` when detached)
    #[instrument(skip_all, fields(path = %self.repo_path.display()))]
    pub async fn current_branch(&self) -> GitResult<String> {
        self.run_git(&["rev-parse", "--abbrev-ref", "HEAD"]).await
    }

    /// List local branch short names in the order git reports them
    #[instrument(skip_all, fields(path = %self.repo_path.display()))]
    pub async fn local_branches(&self) -> GitResult<Vec<String>> {
        let output = self
            .run_git(&["branch", "--format=%(refname:short)"])
            .await?;

        Ok(output
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .map(ToString::to_string)
            .collect())
    }

    /// Check if a local branch exists
    #[instrument(skip_all, fields(path = %self.repo_path.display(), branch))]
    pub async fn local_branch_exists(&self, branch: &str) -> GitResult<bool> {
        let reference = format!("refs/heads/{branch}");
        let output = self
            .run_git_output(&["rev-parse", "--verify", "--quiet", &reference])
            .await?;
        Ok(output.success())
    }

    /// Check if a branch exists on remote
    #[instrument(skip_all, fields(path = %self.repo_path.display(), remote, branch))]
    pub async fn remote_branch_exists(&self, remote: &str, branch: &str) -> GitResult<bool> {
        let reference = format!("refs/heads/{branch}");
        let result = self
            .run_git(&["ls-remote", "--heads", remote, &reference])
            .await?;
        Ok(!result.is_empty())
    }

    /// Fetch a single branch from a remote
    #[instrument(skip_all, fields(path = %self.repo_path.display(), remote, branch))]
    pub async fn fetch_branch(&self, remote: &str, branch: &str) -> GitResult<()> {
        self.run_git_silent(&["fetch", remote, branch]).await
    }

    /// Fetch `remote/branch` straight into the local branch of the same name
    #[instrument(skip_all, fields(path = %self.repo_path.display(), remote, branch))]
    pub async fn fetch_into_local(&self, remote: &str, branch: &str) -> GitResult<()> {
        let refspec = format!("{branch}:{branch}");
        self.run_git_silent(&["fetch", remote, &refspec]).await
    }

    /// Short name of the upstream tracking ref, `None` when there is none
    #[instrument(skip_all, fields(path = %self.repo_path.display(), branch))]
    pub async fn upstream_of(&self, branch: &str) -> GitResult<Option<String>> {
        let upstream_ref = format!("{branch}@{{upstream}}");
        let upstream = self.run_git(&["rev-parse", "--abbrev-ref", &upstream_ref]).await?;
        Ok(if upstream.is_empty() {
            None
        } else {
            Some(upstream)
        })
    }

    /// Count commits reachable from `to` but not from `from`
    #[instrument(skip_all, fields(path = %self.repo_path.display(), from, to))]
    pub async fn count_commits_between(&self, from: &str, to: &str) -> GitResult<u32> {
        let range = format!("{from}..{to}");
        let output = self.run_git(&["rev-list", "--count", &range, "--"]).await?;
        output.parse().map_err(|_| GitError::Command {
            command: "rev-list".to_string(),
            message: format!("unexpected commit count output: {output}"),
            exit_code: Some(0),
        })
    }

    /// Raw `git log` output using a custom format
    #[instrument(skip_all, fields(path = %self.repo_path.display(), branch, max_count))]
    pub async fn log(&self, branch: &str, format: &str, max_count: usize) -> GitResult<String> {
        let format_arg = format!("--format={format}");
        let count = max_count.to_string();
        self.run_git(&["log", &format_arg, "--no-patch", "-n", &count, branch, "--"])
            .await
    }

    /// Create a new branch from a base without checking it out
    #[instrument(skip_all, fields(path = %self.repo_path.display(), branch, base))]
    pub async fn create_branch(&self, branch: &str, base: &str) -> GitResult<()> {
        self.run_git_silent(&["branch", branch, base]).await
    }

    /// Switch to an existing branch
    #[instrument(skip_all, fields(path = %self.repo_path.display(), branch))]
    pub async fn checkout(&self, branch: &str) -> GitResult<()> {
        self.run_git_silent(&["checkout", branch]).await
    }

    /// Apply a single commit onto the current branch
    #[instrument(skip_all, fields(path = %self.repo_path.display(), commit))]
    pub async fn cherry_pick(&self, commit: &str) -> GitResult<()> {
        self.run_git_silent(&["cherry-pick", commit]).await
    }

    /// Abandon an in-progress cherry-pick
    #[instrument(skip_all, fields(path = %self.repo_path.display()))]
    pub async fn cherry_pick_abort(&self) -> GitResult<()> {
        self.run_git_silent(&["cherry-pick", "--abort"]).await
    }

    /// Delete a branch (local)
    #[instrument(skip_all, fields(path = %self.repo_path.display(), branch, force))]
    pub async fn delete_branch(&self, branch: &str, force: bool) -> GitResult<()> {
        let flag = if force { "-D" } else { "-d" };
        self.run_git_silent(&["branch", flag, branch]).await
    }
}

/// Reject names git would read as an option, or that are plainly unusable
pub fn validate_ref_name(value: &str, what: &str) -> GitResult<()> {
    if value.trim().is_empty() {
        return Err(GitError::Validation(format!("{what} is required")));
    }
    if value.starts_with('-') {
        return Err(GitError::Validation(format!(
            "{what} '{value}' must not start with '-'"
        )));
    }
    if value.chars().any(|c| c.is_whitespace() || c.is_control()) {
        return Err(GitError::Validation(format!(
            "{what} '{value}' must not contain whitespace"
        )));
    }
    Ok(())
}

fn subcommand(args: &[String]) -> String {
    args.first().cloned().unwrap_or_default()
}
