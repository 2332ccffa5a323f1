//! Git operations module - branch inspection, mutation and the CLI wrapper.
//!
//! All git access goes through [`GitCli`], which runs the git binary via a
//! [`CommandRunner`] with an explicit argument vector:
//! - [`BranchInspector`] for read-only queries
//! - [`BranchMutator`] for operations that change refs or the working tree
//! - [`RepositoryLock`] to keep operations on one checkout strictly sequential

mod cli;
mod error;
mod inspector;
pub mod lock;
pub mod log_parser;
mod mutator;
pub mod runner;

pub use cli::{validate_ref_name, GitCli};
pub use error::{GitError, GitResult};
pub use inspector::{BranchInspector, RemoteFetch};
pub use lock::{RepositoryGuard, RepositoryLock};
pub use mutator::{backmerge_base_name, BranchMutator, DEFAULT_BRANCH_PREFIX};
pub use runner::{CommandOutput, CommandRunner, MockCommandRunner, SystemCommandRunner};
