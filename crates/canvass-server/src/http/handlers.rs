#![deny(clippy::redundant_clone)]

use crate::{gate, AppState};
use axum::body::Body;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use canvass_api::{status_code_for, ApiError, HEADER_SCREEN_ETAG};
use canvass_engine::QuestionGraph;
use canvass_model::ResponseSetId;
use serde_json::json;

pub(crate) fn api_error_response(err: ApiError) -> Response {
    let status = StatusCode::from_u16(status_code_for(err.code))
        .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
    (status, Json(json!({"error": err}))).into_response()
}

/// Emits a pre-serialized JSON body, optionally with the screen ETag header.
pub(crate) fn json_string_response(
    status: StatusCode,
    etag: Option<&str>,
    body: String,
) -> Response {
    let mut builder = Response::builder()
        .status(status)
        .header("content-type", "application/json");
    if let Some(etag) = etag {
        builder = builder.header(HEADER_SCREEN_ETAG, etag);
    }
    builder
        .body(Body::from(body))
        .unwrap_or_else(|_| StatusCode::INTERNAL_SERVER_ERROR.into_response())
}

pub(crate) async fn load_graph(state: &AppState) -> Result<QuestionGraph, ApiError> {
    let questions = state
        .store
        .list_questions()
        .await
        .map_err(gate::store_error)?;
    QuestionGraph::build(questions).map_err(gate::graph_error)
}

/// Step 2 of the gate: the identifier must resolve to an existing set.
pub(crate) async fn ensure_response_set(
    state: &AppState,
    id: &ResponseSetId,
    raw: &str,
) -> Result<(), ApiError> {
    state
        .store
        .get_response_set(id)
        .await
        .map_err(gate::store_error)?
        .ok_or_else(|| ApiError::response_set_not_found(raw))?;
    Ok(())
}

/// Steps 1 and 2 of the gate for a response-set path segment: well-formed
/// UUID, then a resolvable resource.
pub(crate) async fn resolve_response_set(
    state: &AppState,
    raw: &str,
) -> Result<ResponseSetId, ApiError> {
    let id = gate::parse_response_set_id(raw)?;
    ensure_response_set(state, &id, raw).await?;
    Ok(id)
}
