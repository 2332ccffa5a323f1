use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::sync::Arc;

use backmerge::backmerge::{order_selection, BackmergeOrchestrator};
use backmerge::config::Config;
use backmerge::git::{CommandRunner, SystemCommandRunner};
use backmerge::logging;
use backmerge::messaging::{stdio, MessageHandler};
use backmerge::rest::{self, ApiState};
use backmerge::workspace::Workspace;

#[derive(Parser)]
#[command(name = "backmerge")]
#[command(about = "Build backmerge branches by replaying selected commits onto a destination branch")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file path
    #[arg(short, long)]
    config: Option<String>,

    /// Repository to operate on (default: current directory)
    #[arg(short, long)]
    repo: Option<PathBuf>,

    /// Enable debug logging
    #[arg(short, long)]
    debug: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List local branches
    Branches,

    /// Show whether a branch is behind its upstream
    Status {
        /// Branch to check
        branch: String,
    },

    /// Update a local branch from the remote without checking it out
    Pull {
        /// Branch to update
        branch: String,
    },

    /// Show a page of a branch's history, newest first
    Commits {
        /// Branch to read
        branch: String,

        /// Commits per page (default: backmerge.commit_page_size)
        #[arg(short, long)]
        limit: Option<usize>,

        /// Commits to skip from the tip
        #[arg(short, long, default_value_t = 0)]
        skip: usize,
    },

    /// Create a backmerge branch from a destination and replay commits onto it
    Create {
        /// Branch the new branch starts from
        #[arg(long)]
        destination: String,

        /// Branch the commits come from; when given, commits are replayed oldest first
        #[arg(long)]
        source: Option<String>,

        /// Commit to replay (repeatable, applied in the given order without --source)
        #[arg(long = "commit")]
        commits: Vec<String>,
    },

    /// Start the REST API server
    Serve {
        /// Port to listen on (default: api.port)
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Serve the panel protocol as newline-delimited JSON on stdin/stdout
    Bridge,

    /// Print the effective configuration as TOML
    Config,
}

impl Commands {
    fn is_service(&self) -> bool {
        matches!(self, Commands::Serve { .. } | Commands::Bridge)
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load configuration first (needed for logging setup)
    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(repo) = cli.repo {
        config.workspace.path = Some(repo);
    }

    let logging_handle = logging::init_logging(&config, cli.command.is_service(), cli.debug)?;
    if let Some(path) = &logging_handle.log_file_path {
        tracing::debug!(log_file = %path.display(), "Logging to file");
    }

    let runner: Arc<dyn CommandRunner> = Arc::new(SystemCommandRunner::new());
    let workspace = Workspace::resolve(&config, runner.clone()).await;
    let handler = MessageHandler::new(&config, Arc::new(workspace), runner);

    match cli.command {
        Commands::Branches => cmd_branches(&handler).await?,
        Commands::Status { branch } => cmd_status(&handler, &config, &branch).await?,
        Commands::Pull { branch } => cmd_pull(&handler, &branch).await?,
        Commands::Commits {
            branch,
            limit,
            skip,
        } => {
            let limit = limit.unwrap_or(config.backmerge.commit_page_size);
            cmd_commits(&handler, &branch, limit, skip).await?;
        }
        Commands::Create {
            destination,
            source,
            commits,
        } => cmd_create(&handler, &config, &destination, source.as_deref(), commits).await?,
        Commands::Serve { port } => {
            if let Some(port) = port {
                config.api.port = port;
            }
            rest::serve(ApiState::new(config, handler)).await?;
        }
        Commands::Config => print!("{}", config.to_toml()?),
        Commands::Bridge => {
            if handler.repository_root().is_none() {
                tracing::warn!("No repository open, every request will be rejected");
            }
            stdio::run_stdio_bridge(handler)
                .await
                .context("stdio bridge failed")?;
        }
    }

    Ok(())
}

fn open_repository(handler: &MessageHandler) -> Result<BackmergeOrchestrator> {
    match handler.orchestrator() {
        Some(orchestrator) => Ok(orchestrator),
        None => bail!("Not inside a git repository (use --repo or workspace.path)"),
    }
}

async fn cmd_branches(handler: &MessageHandler) -> Result<()> {
    let orchestrator = open_repository(handler)?;
    for branch in orchestrator.list_local_branches().await? {
        println!("{branch}");
    }
    Ok(())
}

async fn cmd_status(handler: &MessageHandler, config: &Config, branch: &str) -> Result<()> {
    let orchestrator = open_repository(handler)?;
    let status = orchestrator.check_branch_status(branch).await?;

    if status.is_behind {
        println!(
            "{} is {} commit(s) behind {}/{}",
            branch, status.commit_count, config.git.remote, branch
        );
    } else {
        println!("{branch} is up to date");
    }
    Ok(())
}

async fn cmd_pull(handler: &MessageHandler, branch: &str) -> Result<()> {
    let orchestrator = open_repository(handler)?;
    orchestrator.pull_branch(branch).await?;
    println!("Updated {branch}");
    Ok(())
}

async fn cmd_commits(handler: &MessageHandler, branch: &str, limit: usize, skip: usize) -> Result<()> {
    let orchestrator = open_repository(handler)?;
    let commits = orchestrator.get_branch_commits(branch, limit, skip).await?;

    if commits.is_empty() {
        println!("No commits");
        return Ok(());
    }

    for commit in commits {
        let short_id: String = commit.id.chars().take(10).collect();
        println!(
            "{}  {}  {:<20}  {}",
            short_id, commit.date_time, commit.committer, commit.message
        );
    }
    Ok(())
}

async fn cmd_create(
    handler: &MessageHandler,
    config: &Config,
    destination: &str,
    source: Option<&str>,
    commits: Vec<String>,
) -> Result<()> {
    let orchestrator = open_repository(handler)?;

    let ordered = match source {
        Some(source) if !commits.is_empty() => {
            let history = orchestrator
                .get_branch_commits(source, config.backmerge.history_scan_limit, 0)
                .await?;
            order_selection(&history, &commits)
                .with_context(|| format!("Commits must come from the last {} commits of {source}", history.len()))?
        }
        _ => commits,
    };

    let report = orchestrator
        .create_backmerge_branch(destination, &ordered)
        .await?;

    println!("Created {}", report.branch_name);
    for commit_id in &report.applied_commits {
        println!("  applied {commit_id}");
    }
    Ok(())
}
