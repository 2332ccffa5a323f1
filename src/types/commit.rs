//! Commit records as surfaced to the panel UI.

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use utoipa::ToSchema;

/// One commit, rebuilt from `git log` output on every query
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS, ToSchema)]
#[serde(rename_all = "camelCase")]
#[ts(export)]
pub struct Commit {
    /// Full commit hash
    pub id: String,
    /// Subject line
    pub message: String,
    /// Subject followed by the body, separated by a blank line
    pub description: String,
    /// Author date as `DD/MM/YYYY hh:mm:ss AM|PM`
    pub date_time: String,
    /// Author display name
    pub committer: String,
}
