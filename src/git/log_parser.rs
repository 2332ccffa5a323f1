//! Parser for the sentinel-delimited `git log` format used for commit lists.
//!
//! Each commit is emitted as
//!
//! ```text
//! COMMIT_START
//! <hash>|<subject>|<body...>|<author date>
//! <author name>
//! COMMIT_END
//! ```
//!
//! where the body may be empty, may span several lines and may itself contain
//! `|`. The author-date line is therefore located by its
//! `YYYY-MM-DD HH:MM:SS ±HHMM` signature, never by position.

use chrono::DateTime;
use once_cell::sync::Lazy;
use regex::Regex;

use crate::types::Commit;

/// Format string passed to `git log --format=`
pub const LOG_FORMAT: &str = "COMMIT_START%n%H|%s|%b|%ai%n%an%nCOMMIT_END";

const COMMIT_START: &str = "COMMIT_START";
const COMMIT_END: &str = "COMMIT_END";

static AUTHOR_DATE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\|\s*(\d{4}-\d{2}-\d{2}\s+\d{2}:\d{2}:\d{2}\s+[+-]\d{4})\s*$")
        .expect("author date pattern is valid")
});

/// Parse raw `git log` output into commits, most recent first.
///
/// Blocks with fewer than two non-empty lines, without a recognizable author
/// date, or without a `hash|subject` prefix are skipped.
pub fn parse_commit_log(raw: &str) -> Vec<Commit> {
    raw.split(COMMIT_START)
        .filter(|block| !block.trim().is_empty())
        .filter_map(parse_block)
        .collect()
}

fn parse_block(block: &str) -> Option<Commit> {
    let content = strip_end_marker(block).trim();
    if content.is_empty() {
        return None;
    }

    let lines: Vec<&str> = content
        .split('\n')
        .map(|line| line.trim_end_matches('\r'))
        .filter(|line| !line.trim().is_empty())
        .collect();
    if lines.len() < 2 {
        return None;
    }

    let committer = lines[lines.len() - 1].trim().to_string();

    // Search backwards from the line above the author name
    let (date_index, raw_date) = lines[..lines.len() - 1]
        .iter()
        .enumerate()
        .rev()
        .find_map(|(index, line)| {
            AUTHOR_DATE
                .captures(line)
                .map(|caps| (index, caps[1].trim().to_string()))
        })?;

    let first_parts: Vec<&str> = lines[0].split('|').collect();
    if first_parts.len() < 2 {
        return None;
    }

    let id = first_parts[0].trim().to_string();
    let message = first_parts[1].trim().to_string();

    let body = if date_index == 0 {
        if first_parts.len() > 3 {
            first_parts[2..first_parts.len() - 1].join("|")
        } else {
            String::new()
        }
    } else {
        let mut body = if first_parts.len() > 2 {
            first_parts[2..].join("|")
        } else {
            String::new()
        };
        for line in &lines[1..date_index] {
            push_line(&mut body, line);
        }
        let date_parts: Vec<&str> = lines[date_index].split('|').collect();
        if date_parts.len() > 1 {
            push_line(&mut body, &date_parts[..date_parts.len() - 1].join("|"));
        }
        body
    };
    let body = body.trim();

    let description = if body.is_empty() {
        message.clone()
    } else {
        format!("{message}\n\n{body}").trim().to_string()
    };

    Some(Commit {
        id,
        message,
        description,
        date_time: format_author_date(&raw_date),
        committer,
    })
}

fn strip_end_marker(block: &str) -> &str {
    let trimmed = block.trim_end();
    trimmed.strip_suffix(COMMIT_END).unwrap_or(block)
}

fn push_line(body: &mut String, line: &str) {
    if !body.is_empty() {
        body.push('\n');
    }
    body.push_str(line);
}

/// Reformat a git author date (`2024-01-15 14:30:45 +0530`) as
/// `15/01/2024 02:30:45 PM`.
///
/// The wall-clock fields are taken as written; the offset is not applied.
/// Unparseable input is returned unchanged.
pub fn format_author_date(raw: &str) -> String {
    let normalized = raw.split_whitespace().collect::<Vec<_>>().join(" ");
    match DateTime::parse_from_str(&normalized, "%Y-%m-%d %H:%M:%S %z") {
        Ok(date) => date.format("%d/%m/%Y %I:%M:%S %p").to_string(),
        Err(_) => raw.to_string(),
    }
}
