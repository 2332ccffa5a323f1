//! Integration tests for the backmerge workflow against real git repositories
//!
//! Every test builds throwaway repositories under a temp directory, so nothing
//! touches the repository the tests run from. Tests are skipped when no `git`
//! executable is available.
//!
//! ## Running Tests
//!
//! ```bash
//! cargo test --test backmerge_integration
//! ```

use std::path::Path;
use std::process::Command;
use std::sync::Arc;

use backmerge::backmerge::{order_selection, BackmergeError, BackmergeOrchestrator, BackmergeState};
use backmerge::config::Config;
use backmerge::git::{GitCli, SystemCommandRunner};
use backmerge::messaging::{MessageHandler, OutboundMessage};
use backmerge::types::BranchStatus;
use backmerge::workspace::Workspace;
use chrono::NaiveDate;
use tempfile::TempDir;

// ─── Configuration Helpers ───────────────────────────────────────────────────

fn git_available() -> bool {
    Command::new("git")
        .arg("--version")
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

/// Macro to skip test if git is not installed
macro_rules! skip_if_no_git {
    () => {
        if !git_available() {
            eprintln!("Skipping test: git executable not found");
            return;
        }
    };
}

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap()
}

const BRANCH: &str = "backmerge/15-01-2024";

// ─── Repository Fixtures ─────────────────────────────────────────────────────

/// Run git in `dir`, panicking with stderr on failure
fn git(dir: &Path, args: &[&str]) -> String {
    let output = Command::new("git")
        .args(args)
        .current_dir(dir)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
    String::from_utf8_lossy(&output.stdout).trim().to_string()
}

/// Fresh repository with `main` checked out and a local identity
fn init_repo() -> TempDir {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let dir = temp_dir.path();
    git(dir, &["init", "--quiet"]);
    git(dir, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    configure_identity(dir);
    temp_dir
}

fn configure_identity(dir: &Path) {
    git(dir, &["config", "user.name", "Test Dev"]);
    git(dir, &["config", "user.email", "dev@example.com"]);
    git(dir, &["config", "commit.gpgsign", "false"]);
}

/// Write `content` to `file`, commit it with a fixed author date and return the hash
fn commit_file(dir: &Path, file: &str, content: &str, message: &str, date: &str) -> String {
    std::fs::write(dir.join(file), content).expect("Failed to write file");
    git(dir, &["add", file]);
    let status = Command::new("git")
        .args(["commit", "--quiet", "-m", message])
        .env("GIT_AUTHOR_DATE", date)
        .env("GIT_COMMITTER_DATE", date)
        .current_dir(dir)
        .status()
        .expect("Failed to run git commit");
    assert!(status.success(), "git commit failed for {message}");
    git(dir, &["rev-parse", "HEAD"])
}

fn orchestrator(dir: &Path) -> BackmergeOrchestrator {
    let git = GitCli::new(Arc::new(SystemCommandRunner::new()), dir);
    BackmergeOrchestrator::for_repository(git, "origin", "backmerge").with_fixed_date(today())
}

/// `main` with a base commit, and `feature/x` carrying c1 (oldest), c2, c3 (newest)
struct FeatureRepo {
    dir: TempDir,
    c1: String,
    c2: String,
    c3: String,
}

fn feature_repo() -> FeatureRepo {
    let dir = init_repo();
    let path = dir.path();
    commit_file(path, "shared.txt", "base\n", "Base", "2024-01-01 09:00:00 +0000");

    git(path, &["checkout", "--quiet", "-b", "feature/x"]);
    let c1 = commit_file(path, "one.txt", "one\n", "Add one", "2024-01-02 09:00:00 +0000");
    let c2 = commit_file(path, "two.txt", "two\n", "Add two", "2024-01-03 09:00:00 +0000");
    let c3 = commit_file(path, "shared.txt", "feature\n", "Change shared", "2024-01-04 09:00:00 +0000");
    git(path, &["checkout", "--quiet", "main"]);

    FeatureRepo { dir, c1, c2, c3 }
}

fn branch_exists(dir: &Path, branch: &str) -> bool {
    Command::new("git")
        .args(["rev-parse", "--verify", "--quiet", &format!("refs/heads/{branch}")])
        .current_dir(dir)
        .output()
        .map(|o| o.status.success())
        .unwrap_or(false)
}

// ─── Branch Naming ───────────────────────────────────────────────────────────

#[tokio::test]
async fn test_same_day_branches_get_numeric_suffix() {
    skip_if_no_git!();
    let repo = feature_repo();
    let orchestrator = orchestrator(repo.dir.path());

    let first = orchestrator.create_backmerge_branch("main", &[]).await.unwrap();
    let second = orchestrator.create_backmerge_branch("main", &[]).await.unwrap();

    assert_eq!(first.branch_name, BRANCH);
    assert_eq!(second.branch_name, "backmerge/15-01-2024-1");
    assert!(branch_exists(repo.dir.path(), BRANCH));
    assert!(branch_exists(repo.dir.path(), "backmerge/15-01-2024-1"));
}

#[tokio::test]
async fn test_zero_commits_branch_matches_destination_tip() {
    skip_if_no_git!();
    let repo = feature_repo();
    let path = repo.dir.path();

    let report = orchestrator(path)
        .create_backmerge_branch("main", &[])
        .await
        .unwrap();

    assert!(report.applied_commits.is_empty());
    assert_eq!(report.state, BackmergeState::Completed);
    assert_eq!(
        git(path, &["rev-parse", BRANCH]),
        git(path, &["rev-parse", "main"])
    );
    // Nothing was replayed, so HEAD never moved
    assert_eq!(git(path, &["rev-parse", "--abbrev-ref", "HEAD"]), "main");
}

// ─── Replay ──────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_happy_path_replays_oldest_first() {
    skip_if_no_git!();
    let repo = feature_repo();
    let path = repo.dir.path();
    let orchestrator = orchestrator(path);

    // Selected newest first, as a user might click them
    let history = orchestrator
        .get_branch_commits("feature/x", 50, 0)
        .await
        .unwrap();
    let ordered = order_selection(&history, &[repo.c3.clone(), repo.c1.clone()]).unwrap();
    assert_eq!(ordered, vec![repo.c1.clone(), repo.c3.clone()]);

    let report = orchestrator
        .create_backmerge_branch("main", &ordered)
        .await
        .unwrap();

    assert_eq!(report.branch_name, BRANCH);
    assert_eq!(report.applied_commits, ordered);

    let subjects = git(path, &["log", "--format=%s", "main..backmerge/15-01-2024"]);
    assert_eq!(subjects, "Change shared\nAdd one");
    assert!(!path.join("two.txt").exists());
    assert_eq!(git(path, &["rev-parse", "--abbrev-ref", "HEAD"]), BRANCH);
}

#[tokio::test]
async fn test_conflict_rolls_back_and_returns_to_destination() {
    skip_if_no_git!();
    let repo = feature_repo();
    let path = repo.dir.path();
    commit_file(path, "shared.txt", "main\n", "Diverge on main", "2024-01-05 09:00:00 +0000");

    let err = orchestrator(path)
        .create_backmerge_branch("main", &[repo.c1.clone(), repo.c3.clone()])
        .await
        .unwrap_err();

    match &err {
        BackmergeError::Replay {
            commit_id,
            branch_name,
            applied,
            rollback,
            ..
        } => {
            assert_eq!(commit_id, &repo.c3);
            assert_eq!(branch_name, BRANCH);
            assert_eq!(applied, &vec![repo.c1.clone()]);
            assert!(rollback.branch_deleted());
        }
        other => panic!("unexpected error: {other:?}"),
    }

    let message = err.to_string();
    assert!(message.starts_with(&format!("Failed to cherry-pick commit {}", repo.c3)));
    assert!(message.ends_with("Branch backmerge/15-01-2024 has been deleted."));

    assert!(!branch_exists(path, BRANCH));
    assert_eq!(git(path, &["rev-parse", "--abbrev-ref", "HEAD"]), "main");
    assert!(!path.join(".git").join("CHERRY_PICK_HEAD").exists());
    assert_eq!(git(path, &["status", "--porcelain"]), "");
}

#[tokio::test]
async fn test_failure_on_first_commit_leaves_no_branch() {
    skip_if_no_git!();
    let repo = feature_repo();
    let path = repo.dir.path();
    commit_file(path, "shared.txt", "main\n", "Diverge on main", "2024-01-05 09:00:00 +0000");

    let err = orchestrator(path)
        .create_backmerge_branch("main", &[repo.c3.clone(), repo.c2.clone()])
        .await
        .unwrap_err();

    assert!(matches!(err, BackmergeError::Replay { ref applied, .. } if applied.is_empty()));
    assert!(!branch_exists(path, BRANCH));
    assert!(!path.join("two.txt").exists());
}

#[tokio::test]
async fn test_unknown_destination_creates_nothing() {
    skip_if_no_git!();
    let repo = feature_repo();
    let path = repo.dir.path();

    let err = orchestrator(path)
        .create_backmerge_branch("does-not-exist", &[repo.c1.clone()])
        .await
        .unwrap_err();

    assert!(matches!(err, BackmergeError::Create(_)));
    assert!(!branch_exists(path, BRANCH));
}

// ─── History ─────────────────────────────────────────────────────────────────

#[tokio::test]
async fn test_pages_are_contiguous_slices() {
    skip_if_no_git!();
    let dir = init_repo();
    let path = dir.path();
    for i in 1..=7 {
        commit_file(
            path,
            "log.txt",
            &format!("{i}\n"),
            &format!("Commit {i}"),
            &format!("2024-02-{i:02} 10:00:00 +0000"),
        );
    }
    let orchestrator = orchestrator(path);

    let first = orchestrator.get_branch_commits("main", 2, 1).await.unwrap();
    let second = orchestrator.get_branch_commits("main", 2, 3).await.unwrap();
    let whole = orchestrator.get_branch_commits("main", 5, 0).await.unwrap();

    assert_eq!(whole.len(), 5);
    assert_eq!(first, whole[1..3].to_vec());
    assert_eq!(second, whole[3..5].to_vec());
    assert_eq!(whole[0].message, "Commit 7");
}

#[tokio::test]
async fn test_author_date_is_formatted() {
    skip_if_no_git!();
    let dir = init_repo();
    let path = dir.path();
    commit_file(path, "a.txt", "a\n", "Dated", "2024-01-15 14:30:45 +0530");

    let commits = orchestrator(path)
        .get_branch_commits("main", 10, 0)
        .await
        .unwrap();

    assert_eq!(commits.len(), 1);
    assert_eq!(commits[0].date_time, "15/01/2024 02:30:45 PM");
    assert_eq!(commits[0].committer, "Test Dev");
    assert_eq!(commits[0].message, "Dated");
}

#[tokio::test]
async fn test_branch_named_like_directory_is_listed() {
    skip_if_no_git!();
    let dir = init_repo();
    let path = dir.path();
    std::fs::create_dir(path.join("docs")).unwrap();
    commit_file(path, "docs/a.md", "a\n", "Add docs", "2024-03-01 10:00:00 +0000");
    git(path, &["checkout", "--quiet", "-b", "docs"]);
    commit_file(path, "docs/b.md", "b\n", "More docs", "2024-03-02 10:00:00 +0000");

    let orchestrator = orchestrator(path);
    let first = orchestrator.get_branch_commits("docs", 1, 0).await.unwrap();
    let second = orchestrator.get_branch_commits("docs", 1, 1).await.unwrap();

    assert_eq!(first[0].message, "More docs");
    assert_eq!(second[0].message, "Add docs");
    assert_eq!(
        orchestrator.check_branch_status("docs").await.unwrap(),
        BranchStatus::default()
    );
}

// ─── Status and Pull ─────────────────────────────────────────────────────────

#[tokio::test]
async fn test_status_without_upstream_is_default() {
    skip_if_no_git!();
    let repo = feature_repo();

    let status = orchestrator(repo.dir.path())
        .check_branch_status("feature/x")
        .await
        .unwrap();

    assert_eq!(status, BranchStatus::default());
}

#[tokio::test]
async fn test_behind_clone_is_reported_then_pulled() {
    skip_if_no_git!();
    let origin = init_repo();
    commit_file(origin.path(), "a.txt", "a\n", "First", "2024-03-01 10:00:00 +0000");

    let clone_dir = TempDir::new().unwrap();
    let clone = clone_dir.path().join("clone");
    git(
        clone_dir.path(),
        &["clone", "--quiet", origin.path().to_str().unwrap(), "clone"],
    );
    configure_identity(&clone);
    // main must not be checked out to be updated in place
    git(&clone, &["checkout", "--quiet", "-b", "work"]);

    commit_file(origin.path(), "b.txt", "b\n", "Second", "2024-03-02 10:00:00 +0000");
    commit_file(origin.path(), "c.txt", "c\n", "Third", "2024-03-03 10:00:00 +0000");

    let orchestrator = orchestrator(&clone);
    let status = orchestrator.check_branch_status("main").await.unwrap();
    assert_eq!(status, BranchStatus::behind_by(2));

    orchestrator.pull_branch("main").await.unwrap();
    assert_eq!(
        git(&clone, &["rev-parse", "main"]),
        git(origin.path(), &["rev-parse", "main"])
    );

    let status = orchestrator.check_branch_status("main").await.unwrap();
    assert_eq!(status, BranchStatus::default());
}

// ─── Panel Protocol ──────────────────────────────────────────────────────────

#[tokio::test]
async fn test_handler_end_to_end() {
    skip_if_no_git!();
    let repo = feature_repo();
    let path = repo.dir.path();

    let workspace =
        Workspace::resolve_from(path, "git", Arc::new(SystemCommandRunner::new())).await;
    let handler = MessageHandler::new(
        &Config::default(),
        Arc::new(workspace),
        Arc::new(SystemCommandRunner::new()),
    )
    .with_fixed_date(today());

    let branches = handler.handle_json(r#"{"command":"getLocalBranches"}"#).await;
    assert_eq!(
        branches,
        OutboundMessage::LocalBranches {
            branches: vec!["feature/x".to_string(), "main".to_string()]
        }
    );

    let request = serde_json::json!({
        "command": "createBackmergeBranch",
        "destinationBranch": "main",
        "selectedCommits": [repo.c1, repo.c2],
    });
    let created = handler.handle_json(&request.to_string()).await;
    assert_eq!(
        created,
        OutboundMessage::BackmergeBranchCreated {
            branch_name: BRANCH.to_string()
        }
    );
}
