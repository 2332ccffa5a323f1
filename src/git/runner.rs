//! Process execution abstraction for git subprocesses.
//!
//! Provides a trait-based seam over subprocess execution to enable:
//! - Unit testing without a real repository
//! - Scripting failures (conflicts, missing remotes) deterministically
//!
//! Commands are always executed from an explicit argument vector. Nothing is
//! ever passed through a shell, so branch names and commit ids cannot be
//! interpreted as shell syntax.

use std::io;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tokio::process::Command;

/// Captured result of a finished subprocess
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommandOutput {
    pub stdout: String,
    pub stderr: String,
    /// `None` when the process was terminated by a signal
    pub exit_code: Option<i32>,
}

impl CommandOutput {
    /// Successful output with the given stdout
    pub fn ok(stdout: impl Into<String>) -> Self {
        Self {
            stdout: stdout.into(),
            stderr: String::new(),
            exit_code: Some(0),
        }
    }

    /// Failed output with the given exit code and stderr
    pub fn failed(exit_code: i32, stderr: impl Into<String>) -> Self {
        Self {
            stdout: String::new(),
            stderr: stderr.into(),
            exit_code: Some(exit_code),
        }
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Trait abstracting subprocess execution for testability
#[async_trait]
pub trait CommandRunner: Send + Sync {
    /// Run `program` with `args` in `cwd` and wait for it to exit.
    ///
    /// Returns `Err` only when the process could not be started; a non-zero
    /// exit status is reported through [`CommandOutput::exit_code`].
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput>;
}

/// Runs real subprocesses via tokio
#[derive(Debug, Default, Clone)]
pub struct SystemCommandRunner;

impl SystemCommandRunner {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl CommandRunner for SystemCommandRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput> {
        let output = Command::new(program)
            .args(args)
            .current_dir(cwd)
            .env("GIT_TERMINAL_PROMPT", "0")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await?;

        Ok(CommandOutput {
            stdout: String::from_utf8_lossy(&output.stdout).into_owned(),
            stderr: String::from_utf8_lossy(&output.stderr).into_owned(),
            exit_code: output.status.code(),
        })
    }
}

/// Scripted response for a mocked command
#[derive(Debug, Clone)]
pub enum MockResponse {
    Output(CommandOutput),
    /// Simulates the process failing to start
    SpawnError(String),
}

#[derive(Debug, Clone)]
struct MockRule {
    args_prefix: Vec<String>,
    response: MockResponse,
    /// Remaining uses; `None` means unlimited
    remaining: Option<usize>,
}

/// A command recorded by [`MockCommandRunner`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockCommand {
    pub program: String,
    pub args: Vec<String>,
    pub cwd: PathBuf,
}

impl MockCommand {
    /// Arguments joined with single spaces, handy for assertions
    pub fn line(&self) -> String {
        self.args.join(" ")
    }
}

/// Mock implementation for testing.
///
/// Rules are matched in insertion order against the argument prefix. Commands
/// with no matching rule succeed with empty output.
#[derive(Debug, Default, Clone)]
pub struct MockCommandRunner {
    rules: Arc<Mutex<Vec<MockRule>>>,
    command_log: Arc<Mutex<Vec<MockCommand>>>,
}

impl MockCommandRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Respond to every command starting with `args_prefix`
    pub fn on(&self, args_prefix: &[&str], output: CommandOutput) -> &Self {
        self.push_rule(args_prefix, MockResponse::Output(output), None);
        self
    }

    /// Respond to the next command starting with `args_prefix` only
    pub fn once(&self, args_prefix: &[&str], output: CommandOutput) -> &Self {
        self.push_rule(args_prefix, MockResponse::Output(output), Some(1));
        self
    }

    /// Fail to spawn every command starting with `args_prefix`
    pub fn spawn_error(&self, args_prefix: &[&str], message: &str) -> &Self {
        self.push_rule(
            args_prefix,
            MockResponse::SpawnError(message.to_string()),
            None,
        );
        self
    }

    /// Get the command log
    pub fn commands(&self) -> Vec<MockCommand> {
        self.command_log.lock().unwrap().clone()
    }

    /// Command log rendered as argument lines
    pub fn command_lines(&self) -> Vec<String> {
        self.commands().iter().map(MockCommand::line).collect()
    }

    fn push_rule(&self, args_prefix: &[&str], response: MockResponse, remaining: Option<usize>) {
        self.rules.lock().unwrap().push(MockRule {
            args_prefix: args_prefix.iter().map(|s| (*s).to_string()).collect(),
            response,
            remaining,
        });
    }

    fn respond(&self, args: &[String]) -> MockResponse {
        let mut rules = self.rules.lock().unwrap();
        let position = rules.iter().position(|rule| {
            rule.remaining != Some(0) && args.starts_with(&rule.args_prefix)
        });

        match position {
            Some(index) => {
                let rule = &mut rules[index];
                if let Some(ref mut remaining) = rule.remaining {
                    *remaining -= 1;
                }
                rule.response.clone()
            }
            None => MockResponse::Output(CommandOutput::ok("")),
        }
    }
}

#[async_trait]
impl CommandRunner for MockCommandRunner {
    async fn run(&self, program: &str, args: &[String], cwd: &Path) -> io::Result<CommandOutput> {
        self.command_log.lock().unwrap().push(MockCommand {
            program: program.to_string(),
            args: args.to_vec(),
            cwd: cwd.to_path_buf(),
        });

        match self.respond(args) {
            MockResponse::Output(output) => Ok(output),
            MockResponse::SpawnError(message) => Err(io::Error::new(io::ErrorKind::NotFound, message)),
        }
    }
}
