// SPDX-License-Identifier: Apache-2.0

//! Autosave endpoints. Every mutating request runs the gate in order (path
//! identifiers, resource resolution, Idempotency-Key and If-Match, body
//! kind-typing) and only then persists.

use crate::http::handlers::{
    api_error_response, ensure_response_set, json_string_response, load_graph,
    resolve_response_set,
};
use crate::{assemble, etag, gate, postcheck, AppState};
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use canvass_api::{
    AnswerUpsertBody, ApiError, ApiErrorCode, AutosaveEnvelope, AutosaveResult, BatchEnvelope,
    BatchItemResult, BatchResult, BatchUpsertBody,
};
use canvass_core::sha256_hex;
use canvass_engine::{AnswerSet, QuestionGraph};
use canvass_model::{check_answer_kind, AnswerValue, Question, QuestionId, ResponseSetId};
use canvass_store::IdempotencyRecord;
use serde_json::json;

pub(crate) async fn autosave_answer_handler(
    State(state): State<AppState>,
    Path((response_set_id, question_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match autosave_answer(&state, &response_set_id, &question_id, &headers, &body).await {
        Ok(response) => response,
        Err(err) => api_error_response(err),
    }
}

async fn autosave_answer(
    state: &AppState,
    response_set_id: &str,
    question_id: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, ApiError> {
    let set_id = gate::parse_response_set_id(response_set_id)?;
    let question_ref = gate::parse_question_id(question_id)?;
    ensure_response_set(state, &set_id, response_set_id).await?;
    let graph = load_graph(state).await?;
    let question = graph
        .question(&question_ref)
        .cloned()
        .ok_or_else(|| ApiError::question_not_found(question_id))?;

    let gated = check_preconditions(state, &graph, &set_id, &question, headers, body).await?;
    let (mutation, answers_before) = match gated {
        Gated::Replay(response) => return Ok(response),
        Gated::Proceed(mutation, answers_before) => (mutation, answers_before),
    };

    let parsed: AnswerUpsertBody =
        serde_json::from_slice(body).map_err(|e| ApiError::body_malformed(&e.to_string()))?;
    check_answer_kind(question.kind, &question.options, &parsed.value).map_err(gate::kind_error)?;

    state
        .store
        .upsert_answer(&set_id, &question.question_id, &parsed.value)
        .await
        .map_err(gate::store_error)?;

    let mut answers_after = answers_before.clone();
    answers_after.insert(question.question_id, parsed.value);
    finish_autosave(
        state,
        &graph,
        &set_id,
        &question,
        true,
        &answers_before,
        &answers_after,
        &mutation,
    )
    .await
}

pub(crate) async fn delete_answer_handler(
    State(state): State<AppState>,
    Path((response_set_id, question_id)): Path<(String, String)>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match delete_answer(&state, &response_set_id, &question_id, &headers, &body).await {
        Ok(response) => response,
        Err(err) => api_error_response(err),
    }
}

async fn delete_answer(
    state: &AppState,
    response_set_id: &str,
    question_id: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, ApiError> {
    let set_id = gate::parse_response_set_id(response_set_id)?;
    let question_ref = gate::parse_question_id(question_id)?;
    ensure_response_set(state, &set_id, response_set_id).await?;
    let graph = load_graph(state).await?;
    let question = graph
        .question(&question_ref)
        .cloned()
        .ok_or_else(|| ApiError::question_not_found(question_id))?;

    let gated = check_preconditions(state, &graph, &set_id, &question, headers, body).await?;
    let (mutation, answers_before) = match gated {
        Gated::Replay(response) => return Ok(response),
        Gated::Proceed(mutation, answers_before) => (mutation, answers_before),
    };

    let _ = state
        .store
        .delete_answer(&set_id, &question.question_id)
        .await
        .map_err(gate::store_error)?;

    let mut answers_after = answers_before.clone();
    answers_after.remove(&question.question_id);
    finish_autosave(
        state,
        &graph,
        &set_id,
        &question,
        false,
        &answers_before,
        &answers_after,
        &mutation,
    )
    .await
}

pub(crate) async fn batch_upsert_handler(
    State(state): State<AppState>,
    Path(response_set_id): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    match batch_upsert(&state, &response_set_id, &headers, &body).await {
        Ok(response) => response,
        Err(err) => api_error_response(err),
    }
}

async fn batch_upsert(
    state: &AppState,
    response_set_id: &str,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Response, ApiError> {
    let set_id = resolve_response_set(state, response_set_id).await?;
    let graph = load_graph(state).await?;

    let mutation = gate::require_mutation_headers(headers, state.api.max_idempotency_key_bytes)?;
    let body_hash = sha256_hex(body);
    if let Some(record) = state
        .store
        .get_idempotency(&set_id, &mutation.idempotency_key)
        .await
        .map_err(gate::store_error)?
    {
        if record.body_sha256 != body_hash {
            return Err(ApiError::idempotency_key_reused(&mutation.idempotency_key));
        }
        return Ok(replay_response(&record));
    }

    let answers_before = state
        .store
        .answers_for_set(&set_id)
        .await
        .map_err(gate::store_error)?;
    let current_etag = etag::set_etag(&graph, &answers_before, &set_id)?;
    if mutation.if_match != current_etag {
        return Err(ApiError::if_match_stale(&current_etag));
    }

    let parsed: BatchUpsertBody =
        serde_json::from_slice(body).map_err(|e| ApiError::body_malformed(&e.to_string()))?;
    if parsed.items.is_empty() {
        return Err(ApiError::batch_empty());
    }
    if parsed.items.len() > state.api.max_batch_items {
        return Err(ApiError::body_malformed(&format!(
            "batch exceeds the maximum of {} items",
            state.api.max_batch_items
        )));
    }

    // All items validate before any persists: a bad item aborts the whole
    // batch with no side effect.
    let mut staged: Vec<(QuestionId, AnswerValue)> = Vec::with_capacity(parsed.items.len());
    for (index, item) in parsed.items.iter().enumerate() {
        let question_id = QuestionId::parse(&item.question_id).map_err(|_| {
            ApiError::new(
                ApiErrorCode::PreQuestionIdMalformed,
                "question_id is not a valid UUID",
                json!({"index": index, "question_id": item.question_id}),
            )
        })?;
        let question = graph.question(&question_id).ok_or_else(|| {
            ApiError::new(
                ApiErrorCode::PreQuestionNotFound,
                "question not found",
                json!({"index": index, "question_id": item.question_id}),
            )
        })?;
        check_answer_kind(question.kind, &question.options, &item.value).map_err(|e| {
            let mut err = gate::kind_error(e);
            if let serde_json::Value::Object(details) = &mut err.details {
                details.insert("index".to_string(), json!(index));
            } else {
                err.details = json!({"index": index});
            }
            err
        })?;
        staged.push((question_id, item.value.clone()));
    }

    // Applied and reported in input order, never re-sorted.
    let mut current_answers = answers_before;
    let mut items = Vec::with_capacity(staged.len());
    for (question_id, value) in staged {
        state
            .store
            .upsert_answer(&set_id, &question_id, &value)
            .await
            .map_err(gate::store_error)?;
        let step_before = current_answers.clone();
        current_answers.insert(question_id, value);
        let visibility_delta = graph.descendant_delta(&question_id, &step_before, &current_answers);
        items.push(BatchItemResult {
            question_id,
            saved: true,
            visibility_delta,
        });
    }

    let suppressed_answers = assemble::suppressed_answers(&graph, &current_answers);
    let final_etag = etag::set_etag(&graph, &current_answers, &set_id)?;
    verify_etag_is_latest(state, &graph, &set_id, &final_etag).await?;

    let envelope = BatchEnvelope {
        batch_result: BatchResult {
            items,
            etag: final_etag.clone(),
            suppressed_answers,
        },
    };
    let response_json = serialize_envelope(&envelope)?;
    state
        .store
        .put_idempotency(
            &set_id,
            &mutation.idempotency_key,
            &IdempotencyRecord {
                body_sha256: body_hash,
                response_json: response_json.clone(),
            },
        )
        .await
        .map_err(gate::store_error)?;
    Ok(json_string_response(
        StatusCode::OK,
        Some(&final_etag),
        response_json,
    ))
}

enum Gated {
    Replay(Response),
    Proceed(PendingMutation, AnswerSet),
}

struct PendingMutation {
    idempotency_key: String,
    body_hash: String,
}

/// Step 3 of the gate for single-answer mutations: Idempotency-Key replay
/// or reuse detection, then If-Match against the question's screen ETag.
async fn check_preconditions(
    state: &AppState,
    graph: &QuestionGraph,
    set_id: &ResponseSetId,
    question: &Question,
    headers: &HeaderMap,
    body: &[u8],
) -> Result<Gated, ApiError> {
    let mutation = gate::require_mutation_headers(headers, state.api.max_idempotency_key_bytes)?;
    let body_hash = sha256_hex(body);
    if let Some(record) = state
        .store
        .get_idempotency(set_id, &mutation.idempotency_key)
        .await
        .map_err(gate::store_error)?
    {
        if record.body_sha256 != body_hash {
            return Err(ApiError::idempotency_key_reused(&mutation.idempotency_key));
        }
        return Ok(Gated::Replay(replay_response(&record)));
    }

    let answers_before = state
        .store
        .answers_for_set(set_id)
        .await
        .map_err(gate::store_error)?;
    let current_etag = etag::screen_etag(graph, &answers_before, &question.screen_key)?;
    if mutation.if_match != current_etag {
        return Err(ApiError::if_match_stale(&current_etag));
    }
    Ok(Gated::Proceed(
        PendingMutation {
            idempotency_key: mutation.idempotency_key,
            body_hash,
        },
        answers_before,
    ))
}

#[allow(clippy::too_many_arguments)]
async fn finish_autosave(
    state: &AppState,
    graph: &QuestionGraph,
    set_id: &ResponseSetId,
    question: &Question,
    saved: bool,
    answers_before: &AnswerSet,
    answers_after: &AnswerSet,
    mutation: &PendingMutation,
) -> Result<Response, ApiError> {
    let visibility_delta =
        graph.descendant_delta(&question.question_id, answers_before, answers_after);
    let suppressed_answers = assemble::suppressed_answers(graph, answers_after);
    let assembly = assemble::assemble_screen(graph, answers_after, &question.screen_key)?;
    postcheck::verify_screen_view(graph, answers_after, &question.screen_key, &assembly)?;
    verify_screen_etag_is_latest(state, graph, set_id, question, &assembly.etag).await?;

    let envelope = AutosaveEnvelope {
        autosave_result: AutosaveResult {
            saved,
            etag: assembly.etag.clone(),
            visibility_delta,
            suppressed_answers,
        },
    };
    let response_json = serialize_envelope(&envelope)?;
    state
        .store
        .put_idempotency(
            set_id,
            &mutation.idempotency_key,
            &IdempotencyRecord {
                body_sha256: mutation.body_hash.clone(),
                response_json: response_json.clone(),
            },
        )
        .await
        .map_err(gate::store_error)?;
    Ok(json_string_response(
        StatusCode::OK,
        Some(&assembly.etag),
        response_json,
    ))
}

/// The returned ETag must re-derive from the persisted state; anything else
/// means the envelope is not the latest.
async fn verify_screen_etag_is_latest(
    state: &AppState,
    graph: &QuestionGraph,
    set_id: &ResponseSetId,
    question: &Question,
    etag_value: &str,
) -> Result<(), ApiError> {
    let fresh = state
        .store
        .answers_for_set(set_id)
        .await
        .map_err(gate::store_error)?;
    let fresh_etag = etag::screen_etag(graph, &fresh, &question.screen_key)?;
    if fresh_etag != etag_value {
        return Err(etag_not_latest(etag_value, &fresh_etag));
    }
    Ok(())
}

async fn verify_etag_is_latest(
    state: &AppState,
    graph: &QuestionGraph,
    set_id: &ResponseSetId,
    etag_value: &str,
) -> Result<(), ApiError> {
    let fresh = state
        .store
        .answers_for_set(set_id)
        .await
        .map_err(gate::store_error)?;
    let fresh_etag = etag::set_etag(graph, &fresh, set_id)?;
    if fresh_etag != etag_value {
        return Err(etag_not_latest(etag_value, &fresh_etag));
    }
    Ok(())
}

fn etag_not_latest(returned: &str, fresh: &str) -> ApiError {
    ApiError::new(
        ApiErrorCode::PostEtagNotLatest,
        "etag is not derived from the latest persisted state",
        json!({"etag": returned, "fresh_etag": fresh}),
    )
}

fn serialize_envelope<T: serde::Serialize>(envelope: &T) -> Result<String, ApiError> {
    serde_json::to_string(envelope).map_err(|e| {
        ApiError::new(
            ApiErrorCode::PostOutputsKeysNotDeterministic,
            "response envelope could not be serialized",
            json!({"reason": e.to_string()}),
        )
    })
}

fn replay_response(record: &IdempotencyRecord) -> Response {
    let etag_value = serde_json::from_str::<serde_json::Value>(&record.response_json)
        .ok()
        .and_then(|v| {
            ["autosave_result", "batch_result"].iter().find_map(|key| {
                v.get(key)
                    .and_then(|r| r.get("etag"))
                    .and_then(|e| e.as_str())
                    .map(str::to_string)
            })
        });
    json_string_response(
        StatusCode::OK,
        etag_value.as_deref(),
        record.response_json.clone(),
    )
}
