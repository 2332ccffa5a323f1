//! Workspace context: which repository every git command runs in.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{debug, info};

use crate::config::Config;
use crate::git::{CommandRunner, GitCli};

/// Supplies the active repository root, if there is one
pub trait WorkspaceProvider: Send + Sync {
    fn repository_root(&self) -> Option<PathBuf>;
}

/// Repository root resolved once at startup
#[derive(Debug, Clone, Default)]
pub struct Workspace {
    root: Option<PathBuf>,
}

impl Workspace {
    /// A workspace rooted at `root` without consulting git
    pub fn fixed(root: impl Into<PathBuf>) -> Self {
        Self {
            root: Some(root.into()),
        }
    }

    /// No repository open
    pub fn empty() -> Self {
        Self::default()
    }

    /// Resolve the configured path (or the current directory) to the top
    /// level of the repository containing it.
    pub async fn resolve(config: &Config, runner: Arc<dyn CommandRunner>) -> Self {
        let Some(start) = config.workspace_start() else {
            debug!("No working directory available");
            return Self::empty();
        };
        Self::resolve_from(&start, &config.git.program, runner).await
    }

    pub async fn resolve_from(start: &Path, program: &str, runner: Arc<dyn CommandRunner>) -> Self {
        if !start.is_dir() {
            debug!(path = %start.display(), "Workspace path is not a directory");
            return Self::empty();
        }

        let git = GitCli::new(runner, start).with_program(program);
        match git.repo_root().await {
            Ok(root) if !root.is_empty() => {
                info!(repository = %root, "Workspace repository resolved");
                Self::fixed(root)
            }
            Ok(_) => Self::empty(),
            Err(e) => {
                debug!(path = %start.display(), error = %e, "Not inside a git repository");
                Self::empty()
            }
        }
    }
}

impl WorkspaceProvider for Workspace {
    fn repository_root(&self) -> Option<PathBuf> {
        self.root.clone()
    }
}
