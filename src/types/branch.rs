//! Branch tracking status.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// How far a local branch is behind its remote tracking branch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct BranchStatus {
    pub is_behind: bool,
    pub commit_count: u32,
}

impl BranchStatus {
    /// Status for a branch that is `count` commits behind its upstream
    pub fn behind_by(count: u32) -> Self {
        Self {
            is_behind: count > 0,
            commit_count: count,
        }
    }
}
