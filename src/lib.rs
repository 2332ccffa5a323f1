//! Backmerge - assemble integration branches by replaying selected commits
//!
//! The library drives the local `git` CLI: it inspects branches, pages
//! through their history and builds a dated backmerge branch from a
//! destination branch, rolling it back if any replayed commit fails. The
//! panel protocol in [`messaging`] exposes the same operations to an editor
//! webview over stdio or HTTP.

pub mod backmerge;
pub mod config;
pub mod git;
pub mod logging;
pub mod messaging;
pub mod rest;
pub mod types;
pub mod workspace;
