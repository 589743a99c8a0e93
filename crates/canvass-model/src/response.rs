// SPDX-License-Identifier: Apache-2.0

use crate::answer::AnswerValue;
use crate::ids::{QuestionId, ResponseSetId};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct ResponseSet {
    pub response_set_id: ResponseSetId,
    pub created_at_unix: i64,
}

impl ResponseSet {
    #[must_use]
    pub const fn new(response_set_id: ResponseSetId, created_at_unix: i64) -> Self {
        Self {
            response_set_id,
            created_at_unix,
        }
    }
}

/// One answer row. Uniqueness per (response_set_id, question_id) is enforced
/// structurally by the store backends.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct Response {
    pub response_set_id: ResponseSetId,
    pub question_id: QuestionId,
    pub value: AnswerValue,
}

impl Response {
    #[must_use]
    pub const fn new(
        response_set_id: ResponseSetId,
        question_id: QuestionId,
        value: AnswerValue,
    ) -> Self {
        Self {
            response_set_id,
            question_id,
            value,
        }
    }
}
