// SPDX-License-Identifier: Apache-2.0

use crate::ApiErrorCode;

#[must_use]
pub fn status_code_for(code: ApiErrorCode) -> u16 {
    match code {
        ApiErrorCode::PreResponseSetIdMalformed
        | ApiErrorCode::PreQuestionIdMalformed
        | ApiErrorCode::PreParentQuestionNotFound
        | ApiErrorCode::PreParentLinkCyclic
        | ApiErrorCode::PreVisibilityRuleNotCanonical
        | ApiErrorCode::PreVisibilityRuleKindMismatch => 400,
        ApiErrorCode::PreResponseSetNotFound
        | ApiErrorCode::PreQuestionNotFound
        | ApiErrorCode::PreScreenNotFound => 404,
        ApiErrorCode::PreIdempotencyKeyReused => 409,
        ApiErrorCode::PreIfMatchStale => 412,
        ApiErrorCode::PreBodyMalformed
        | ApiErrorCode::PreAnswerKindMismatch
        | ApiErrorCode::PreNumberNotFinite
        | ApiErrorCode::PreEnumOptionUnknown
        | ApiErrorCode::PreBatchEmpty => 422,
        ApiErrorCode::PreIdempotencyKeyMissing | ApiErrorCode::PreIfMatchMissing => 428,
        ApiErrorCode::PostScreenViewContainsHidden
        | ApiErrorCode::PostOutputsKeysNotDeterministic
        | ApiErrorCode::PostEtagNotLatest => 500,
        ApiErrorCode::EnvCredentialsInvalid => 401,
        ApiErrorCode::EnvPermissionDenied => 403,
        ApiErrorCode::EnvDatabaseUnavailable
        | ApiErrorCode::EnvNetworkUnreachable
        | ApiErrorCode::EnvDnsFailure
        | ApiErrorCode::EnvTlsFailure
        | ApiErrorCode::EnvConfigMissing => 503,
    }
}
