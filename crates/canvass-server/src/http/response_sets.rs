// SPDX-License-Identifier: Apache-2.0

use crate::http::handlers::{api_error_response, load_graph, resolve_response_set};
use crate::{etag, gate, AppState};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use canvass_api::ApiError;

pub(crate) async fn delete_response_set_handler(
    State(state): State<AppState>,
    Path(response_set_id): Path<String>,
    headers: HeaderMap,
) -> Response {
    match delete_response_set(&state, &response_set_id, &headers).await {
        Ok(response) => response,
        Err(err) => api_error_response(err),
    }
}

async fn delete_response_set(
    state: &AppState,
    response_set_id: &str,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let set_id = resolve_response_set(state, response_set_id).await?;
    let graph = load_graph(state).await?;

    // Both precondition headers are required on every mutating call. The
    // cascade removes this set's idempotency records with it, so the key is
    // validated for presence but no replay record survives the delete.
    let mutation = gate::require_mutation_headers(headers, state.api.max_idempotency_key_bytes)?;

    let answers = state
        .store
        .answers_for_set(&set_id)
        .await
        .map_err(gate::store_error)?;
    let current_etag = etag::set_etag(&graph, &answers, &set_id)?;
    if mutation.if_match != current_etag {
        return Err(ApiError::if_match_stale(&current_etag));
    }

    let deleted = state
        .store
        .delete_response_set(&set_id)
        .await
        .map_err(gate::store_error)?;
    if !deleted {
        return Err(ApiError::response_set_not_found(response_set_id));
    }
    Ok(StatusCode::NO_CONTENT.into_response())
}
