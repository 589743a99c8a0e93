// SPDX-License-Identifier: Apache-2.0

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Fixed wire taxonomy. `PRE_*` failures abort before any persistence side
/// effect, `POST_*` are self-check violations in the engine's own output,
/// `ENV_*` are infrastructure failures that end the request without retry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
#[non_exhaustive]
pub enum ApiErrorCode {
    PreResponseSetIdMalformed,
    PreQuestionIdMalformed,
    PreResponseSetNotFound,
    PreQuestionNotFound,
    PreScreenNotFound,
    PreIdempotencyKeyMissing,
    PreIdempotencyKeyReused,
    PreIfMatchMissing,
    PreIfMatchStale,
    PreBodyMalformed,
    PreAnswerKindMismatch,
    PreNumberNotFinite,
    PreEnumOptionUnknown,
    PreParentQuestionNotFound,
    PreParentLinkCyclic,
    PreVisibilityRuleNotCanonical,
    PreVisibilityRuleKindMismatch,
    PreBatchEmpty,
    PostScreenViewContainsHidden,
    PostOutputsKeysNotDeterministic,
    PostEtagNotLatest,
    EnvDatabaseUnavailable,
    EnvPermissionDenied,
    EnvNetworkUnreachable,
    EnvDnsFailure,
    EnvTlsFailure,
    EnvConfigMissing,
    EnvCredentialsInvalid,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ApiError {
    pub code: ApiErrorCode,
    pub message: String,
    pub details: Value,
}

impl ApiError {
    #[must_use]
    pub fn new(code: ApiErrorCode, message: impl Into<String>, details: Value) -> Self {
        Self {
            code,
            message: message.into(),
            details,
        }
    }

    #[must_use]
    pub fn malformed_response_set_id(value: &str) -> Self {
        Self::new(
            ApiErrorCode::PreResponseSetIdMalformed,
            "response_set_id is not a valid UUID",
            json!({"response_set_id": value}),
        )
    }

    #[must_use]
    pub fn malformed_question_id(value: &str) -> Self {
        Self::new(
            ApiErrorCode::PreQuestionIdMalformed,
            "question_id is not a valid UUID",
            json!({"question_id": value}),
        )
    }

    #[must_use]
    pub fn response_set_not_found(id: &str) -> Self {
        Self::new(
            ApiErrorCode::PreResponseSetNotFound,
            "response set not found",
            json!({"response_set_id": id}),
        )
    }

    #[must_use]
    pub fn question_not_found(id: &str) -> Self {
        Self::new(
            ApiErrorCode::PreQuestionNotFound,
            "question not found",
            json!({"question_id": id}),
        )
    }

    #[must_use]
    pub fn screen_not_found(screen_key: &str) -> Self {
        Self::new(
            ApiErrorCode::PreScreenNotFound,
            "screen not found",
            json!({"screen_key": screen_key}),
        )
    }

    #[must_use]
    pub fn idempotency_key_missing() -> Self {
        Self::new(
            ApiErrorCode::PreIdempotencyKeyMissing,
            "Idempotency-Key header is required and must be non-empty",
            Value::Null,
        )
    }

    #[must_use]
    pub fn idempotency_key_reused(key: &str) -> Self {
        Self::new(
            ApiErrorCode::PreIdempotencyKeyReused,
            "Idempotency-Key was already used with a different request body",
            json!({"idempotency_key": key}),
        )
    }

    #[must_use]
    pub fn if_match_missing() -> Self {
        Self::new(
            ApiErrorCode::PreIfMatchMissing,
            "If-Match header is required and must be non-empty",
            Value::Null,
        )
    }

    #[must_use]
    pub fn if_match_stale(current_etag: &str) -> Self {
        Self::new(
            ApiErrorCode::PreIfMatchStale,
            "If-Match does not match the current ETag",
            json!({"current_etag": current_etag}),
        )
    }

    #[must_use]
    pub fn body_malformed(reason: &str) -> Self {
        Self::new(
            ApiErrorCode::PreBodyMalformed,
            "request body is malformed",
            json!({"reason": reason}),
        )
    }

    #[must_use]
    pub fn batch_empty() -> Self {
        Self::new(
            ApiErrorCode::PreBatchEmpty,
            "batch request must contain at least one item",
            Value::Null,
        )
    }
}
