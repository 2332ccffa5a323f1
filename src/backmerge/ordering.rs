//! Chronological ordering of a commit selection.
//!
//! The panel submits selected commits oldest first. The orchestrator replays
//! exactly the order it is given, so callers sort with [`order_selection`]
//! before submitting.

use std::cmp::Reverse;
use std::collections::HashSet;

use chrono::NaiveDateTime;
use thiserror::Error;

use crate::types::Commit;

const DISPLAY_DATE_FORMAT: &str = "%d/%m/%Y %I:%M:%S %p";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum OrderingError {
    #[error("Commit {0} was not found in the source branch history")]
    UnknownCommit(String),
}

/// Parse a `DD/MM/YYYY hh:mm:ss AM|PM` commit date
pub fn parse_display_date(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DISPLAY_DATE_FORMAT).ok()
}

/// Return `selected` ids sorted oldest first.
///
/// `history` is most-recent-first as returned by the inspector. Equal or
/// unparseable dates fall back to history order, older first. Duplicate ids
/// are collapsed.
pub fn order_selection(history: &[Commit], selected: &[String]) -> Result<Vec<String>, OrderingError> {
    let mut seen = HashSet::new();
    let mut keyed = Vec::with_capacity(selected.len());

    for id in selected {
        if !seen.insert(id.as_str()) {
            continue;
        }
        let (index, commit) = history
            .iter()
            .enumerate()
            .find(|(_, commit)| commit.id == *id)
            .ok_or_else(|| OrderingError::UnknownCommit(id.clone()))?;

        let date = parse_display_date(&commit.date_time).unwrap_or(NaiveDateTime::MIN);
        keyed.push(((date, Reverse(index)), id.clone()));
    }

    keyed.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(keyed.into_iter().map(|(_, id)| id).collect())
}
