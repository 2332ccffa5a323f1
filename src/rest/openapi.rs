//! OpenAPI specification builder using utoipa.

use utoipa::OpenApi;

use crate::messaging::{InboundMessage, OutboundMessage};
use crate::rest::dto::{HealthResponse, StatusResponse};
use crate::rest::error::ErrorResponse;
use crate::types::{Commit, ErrorCode};

/// OpenAPI documentation for the backmerge REST API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "Backmerge API",
        description = "Branch inspection and backmerge assembly over the panel message protocol."
    ),
    paths(
        crate::rest::routes::health::health,
        crate::rest::routes::health::status,
        crate::rest::routes::messages::post_message,
    ),
    components(
        schemas(
            HealthResponse,
            StatusResponse,
            ErrorResponse,
            InboundMessage,
            OutboundMessage,
            Commit,
            ErrorCode,
        )
    ),
    tags(
        (name = "Health", description = "Health check and status endpoints"),
        (name = "Messages", description = "Panel request/response messages"),
    )
)]
pub struct ApiDoc;

impl ApiDoc {
    /// Generate the OpenAPI specification as a JSON string
    pub fn json() -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&Self::openapi())
    }
}
