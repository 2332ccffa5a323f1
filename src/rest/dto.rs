//! Data Transfer Objects for the REST API.
//!
//! Request and response bodies of `/api/v1/messages` are the panel protocol
//! types themselves, see [`crate::messaging::protocol`].

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Health check response
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

/// Status response with workspace info
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct StatusResponse {
    pub status: String,
    pub version: String,
    /// Repository root, absent when no workspace repository is open
    #[serde(skip_serializing_if = "Option::is_none")]
    pub repository: Option<String>,
    /// Whether a git operation currently holds the repository
    pub busy: bool,
}
