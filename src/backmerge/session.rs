//! Backmerge session state machine.
//!
//! ```text
//! Idle ──create──▶ BranchCreated ──pick──▶ Replaying ──done──▶ Completed
//!                        │                     │
//!                        └──────failure────────┴──────────────▶ RolledBack
//! ```
//!
//! Transitions are only driven by the orchestrator in this module tree. While a
//! session is live, either no branch exists or the branch holds exactly the
//! first `applied` selected commits.

use serde::Serialize;

/// Lifecycle of one backmerge run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BackmergeState {
    Idle,
    BranchCreated,
    Replaying,
    Completed,
    RolledBack,
}

/// Transient state held while a backmerge run is in progress
#[derive(Debug, Clone)]
pub struct BackmergeSession {
    destination_branch: String,
    selected_commit_ids: Vec<String>,
    state: BackmergeState,
    new_branch_name: Option<String>,
    applied: usize,
}

impl BackmergeSession {
    pub fn new(destination_branch: impl Into<String>, selected_commit_ids: Vec<String>) -> Self {
        Self {
            destination_branch: destination_branch.into(),
            selected_commit_ids,
            state: BackmergeState::Idle,
            new_branch_name: None,
            applied: 0,
        }
    }

    pub fn state(&self) -> BackmergeState {
        self.state
    }

    pub fn destination_branch(&self) -> &str {
        &self.destination_branch
    }

    /// Name of the branch while it exists
    pub fn new_branch_name(&self) -> Option<&str> {
        self.new_branch_name.as_deref()
    }

    /// Commits applied so far, always a prefix of the selection
    pub fn applied_commits(&self) -> &[String] {
        &self.selected_commit_ids[..self.applied]
    }

    /// Commits not yet applied, in replay order
    pub fn pending_commits(&self) -> &[String] {
        &self.selected_commit_ids[self.applied..]
    }

    pub(super) fn branch_created(&mut self, name: String) {
        debug_assert_eq!(self.state, BackmergeState::Idle);
        self.new_branch_name = Some(name);
        self.state = BackmergeState::BranchCreated;
    }

    pub(super) fn commit_applied(&mut self) {
        debug_assert!(matches!(
            self.state,
            BackmergeState::BranchCreated | BackmergeState::Replaying
        ));
        debug_assert!(self.applied < self.selected_commit_ids.len());
        self.applied += 1;
        self.state = BackmergeState::Replaying;
    }

    pub(super) fn complete(&mut self) {
        debug_assert!(matches!(
            self.state,
            BackmergeState::BranchCreated | BackmergeState::Replaying
        ));
        self.state = BackmergeState::Completed;
    }

    /// `branch_deleted` is false when cleanup itself failed and the branch remains
    pub(super) fn roll_back(&mut self, branch_deleted: bool) {
        debug_assert!(matches!(
            self.state,
            BackmergeState::BranchCreated | BackmergeState::Replaying
        ));
        if branch_deleted {
            self.new_branch_name = None;
        }
        self.state = BackmergeState::RolledBack;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| (*s).to_string()).collect()
    }

    #[test]
    fn test_new_session_is_idle() {
        let session = BackmergeSession::new("main", ids(&["c1", "c3"]));
        assert_eq!(session.state(), BackmergeState::Idle);
        assert!(session.new_branch_name().is_none());
        assert!(session.applied_commits().is_empty());
        assert_eq!(session.pending_commits(), &["c1", "c3"]);
    }

    #[test]
    fn test_success_path() {
        let mut session = BackmergeSession::new("main", ids(&["c1", "c3"]));
        session.branch_created("backmerge/15-01-2024".to_string());
        assert_eq!(session.state(), BackmergeState::BranchCreated);

        session.commit_applied();
        assert_eq!(session.state(), BackmergeState::Replaying);
        assert_eq!(session.applied_commits(), &["c1"]);
        assert_eq!(session.pending_commits(), &["c3"]);

        session.commit_applied();
        session.complete();
        assert_eq!(session.state(), BackmergeState::Completed);
        assert_eq!(session.destination_branch(), "main");
        assert_eq!(session.new_branch_name(), Some("backmerge/15-01-2024"));
    }

    #[test]
    fn test_zero_commits_completes_from_branch_created() {
        let mut session = BackmergeSession::new("main", Vec::new());
        session.branch_created("backmerge/15-01-2024".to_string());
        session.complete();
        assert_eq!(session.state(), BackmergeState::Completed);
    }

    #[test]
    fn test_roll_back_clears_branch() {
        let mut session = BackmergeSession::new("main", ids(&["c1", "c3"]));
        session.branch_created("backmerge/15-01-2024".to_string());
        session.commit_applied();
        session.roll_back(true);

        assert_eq!(session.state(), BackmergeState::RolledBack);
        assert!(session.new_branch_name().is_none());
    }

    #[test]
    fn test_failed_cleanup_keeps_branch_name() {
        let mut session = BackmergeSession::new("main", ids(&["c1"]));
        session.branch_created("backmerge/15-01-2024".to_string());
        session.roll_back(false);

        assert_eq!(session.state(), BackmergeState::RolledBack);
        assert_eq!(session.new_branch_name(), Some("backmerge/15-01-2024"));
    }
}
