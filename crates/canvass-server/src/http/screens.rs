// SPDX-License-Identifier: Apache-2.0

use crate::http::handlers::{api_error_response, json_string_response, load_graph, resolve_response_set};
use crate::{assemble, gate, postcheck, AppState};
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use canvass_api::{ApiError, ScreenViewEnvelope, HEADER_IF_NONE_MATCH, HEADER_SCREEN_ETAG};
use canvass_model::ScreenKey;
use serde_json::json;

pub(crate) async fn get_screen_handler(
    State(state): State<AppState>,
    Path((response_set_id, screen_key)): Path<(String, String)>,
    headers: HeaderMap,
) -> Response {
    match get_screen(&state, &response_set_id, &screen_key, &headers).await {
        Ok(response) => response,
        Err(err) => api_error_response(err),
    }
}

async fn get_screen(
    state: &AppState,
    response_set_id: &str,
    screen_key: &str,
    headers: &HeaderMap,
) -> Result<Response, ApiError> {
    let set_id = resolve_response_set(state, response_set_id).await?;
    let screen = ScreenKey::parse(screen_key)
        .map_err(|_| ApiError::screen_not_found(screen_key))?;

    let graph = load_graph(state).await?;
    if graph.questions_on_screen(&screen).is_empty() {
        return Err(ApiError::screen_not_found(screen_key));
    }

    let answers = state
        .store
        .answers_for_set(&set_id)
        .await
        .map_err(gate::store_error)?;
    let assembly = assemble::assemble_screen(&graph, &answers, &screen)?;
    postcheck::verify_screen_view(&graph, &answers, &screen, &assembly)?;

    let if_none_match = headers
        .get(HEADER_IF_NONE_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::trim);
    if if_none_match == Some(assembly.etag.as_str()) {
        let mut response = StatusCode::NOT_MODIFIED.into_response();
        if let Ok(value) = axum::http::HeaderValue::from_str(&assembly.etag) {
            response.headers_mut().insert(HEADER_SCREEN_ETAG, value);
        }
        return Ok(response);
    }

    let envelope = ScreenViewEnvelope {
        screen_view: assembly.view.clone(),
    };
    let body = serde_json::to_string(&envelope).map_err(|e| {
        ApiError::new(
            canvass_api::ApiErrorCode::PostOutputsKeysNotDeterministic,
            "screen view could not be serialized",
            json!({"reason": e.to_string()}),
        )
    })?;
    Ok(json_string_response(
        StatusCode::OK,
        Some(&assembly.etag),
        body,
    ))
}
