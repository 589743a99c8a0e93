// SPDX-License-Identifier: Apache-2.0

//! Precondition gate helpers: path identifiers, mutation headers, and the
//! translation of engine/store failures into the wire taxonomy. Everything
//! here runs before any persistence side effect.

use axum::http::HeaderMap;
use canvass_api::{ApiError, ApiErrorCode, HEADER_IDEMPOTENCY_KEY, HEADER_IF_MATCH};
use canvass_engine::{GraphError, GraphErrorCode};
use canvass_model::{KindError, QuestionId, ResponseSetId};
use canvass_store::StoreError;
use serde_json::json;

pub(crate) fn parse_response_set_id(raw: &str) -> Result<ResponseSetId, ApiError> {
    ResponseSetId::parse(raw).map_err(|_| ApiError::malformed_response_set_id(raw))
}

pub(crate) fn parse_question_id(raw: &str) -> Result<QuestionId, ApiError> {
    QuestionId::parse(raw).map_err(|_| ApiError::malformed_question_id(raw))
}

#[derive(Debug)]
pub(crate) struct MutationHeaders {
    pub if_match: String,
    pub idempotency_key: String,
}

/// Both headers are required, non-empty, and checked in taxonomy order:
/// Idempotency-Key first, then If-Match.
pub(crate) fn require_mutation_headers(
    headers: &HeaderMap,
    max_idempotency_key_bytes: usize,
) -> Result<MutationHeaders, ApiError> {
    let idempotency_key = headers
        .get(HEADER_IDEMPOTENCY_KEY)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(ApiError::idempotency_key_missing)?
        .to_string();
    if idempotency_key.len() > max_idempotency_key_bytes {
        return Err(ApiError::new(
            ApiErrorCode::PreIdempotencyKeyMissing,
            "Idempotency-Key exceeds the configured maximum length",
            json!({"max_bytes": max_idempotency_key_bytes}),
        ));
    }
    let if_match = headers
        .get(HEADER_IF_MATCH)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .ok_or_else(ApiError::if_match_missing)?
        .to_string();
    Ok(MutationHeaders {
        if_match,
        idempotency_key,
    })
}

pub(crate) fn store_error(err: StoreError) -> ApiError {
    ApiError::new(
        ApiErrorCode::EnvDatabaseUnavailable,
        "datastore request failed",
        json!({"reason": err.to_string()}),
    )
}

pub(crate) fn graph_error(err: GraphError) -> ApiError {
    let question_id = err.question_id.to_string();
    let message = err.message.clone();
    let code = match err.code {
        GraphErrorCode::UnknownParent => ApiErrorCode::PreParentQuestionNotFound,
        GraphErrorCode::ParentCycle => ApiErrorCode::PreParentLinkCyclic,
        GraphErrorCode::RuleNotCanonical => ApiErrorCode::PreVisibilityRuleNotCanonical,
        GraphErrorCode::RuleKindMismatch => ApiErrorCode::PreVisibilityRuleKindMismatch,
        // A definition the backends should never have admitted: surface as
        // an infrastructure failure, not a caller error.
        GraphErrorCode::DuplicateQuestion | GraphErrorCode::InvalidQuestion => {
            ApiErrorCode::EnvDatabaseUnavailable
        }
        _ => ApiErrorCode::EnvDatabaseUnavailable,
    };
    ApiError::new(code, message, json!({"question_id": question_id}))
}

pub(crate) fn kind_error(err: KindError) -> ApiError {
    match err {
        KindError::Mismatch(expected) => ApiError::new(
            ApiErrorCode::PreAnswerKindMismatch,
            "answer value does not match the question's answer kind",
            json!({"expected_kind": expected.as_str()}),
        ),
        KindError::NotFinite => ApiError::new(
            ApiErrorCode::PreNumberNotFinite,
            "number answers must be finite",
            serde_json::Value::Null,
        ),
        KindError::UnknownOption(value) => ApiError::new(
            ApiErrorCode::PreEnumOptionUnknown,
            "enum answer does not name a declared option",
            json!({"value": value}),
        ),
        _ => unreachable!("KindError only has Mismatch, NotFinite, and UnknownOption variants"),
    }
}
