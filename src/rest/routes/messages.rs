//! Panel message endpoint.

use axum::{extract::rejection::JsonRejection, extract::State, Json};

use crate::messaging::{InboundMessage, OutboundMessage};
use crate::rest::error::{ApiError, ErrorResponse};
use crate::rest::state::ApiState;

/// Handle one panel message and return its response.
///
/// Operation failures are answered with `200` and an `error` or
/// `backmergeBranchError` message; only undecodable bodies are rejected.
#[utoipa::path(
    post,
    path = "/api/v1/messages",
    tag = "Messages",
    request_body = InboundMessage,
    responses(
        (status = 200, description = "Response message", body = OutboundMessage),
        (status = 400, description = "Body is not a valid message", body = ErrorResponse)
    )
)]
pub async fn post_message(
    State(state): State<ApiState>,
    payload: Result<Json<InboundMessage>, JsonRejection>,
) -> Result<Json<OutboundMessage>, ApiError> {
    let Json(message) = payload?;
    Ok(Json(state.handler.handle(message).await))
}
