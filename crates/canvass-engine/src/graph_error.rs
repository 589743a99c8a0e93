// SPDX-License-Identifier: Apache-2.0

use canvass_model::QuestionId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum GraphErrorCode {
    DuplicateQuestion,
    InvalidQuestion,
    UnknownParent,
    ParentCycle,
    RuleNotCanonical,
    RuleKindMismatch,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GraphError {
    pub code: GraphErrorCode,
    pub question_id: QuestionId,
    pub message: String,
}

impl GraphError {
    #[must_use]
    pub fn new(code: GraphErrorCode, question_id: QuestionId, message: impl Into<String>) -> Self {
        Self {
            code,
            question_id,
            message: message.into(),
        }
    }
}

impl std::fmt::Display for GraphError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?} ({}): {}", self.code, self.question_id, self.message)
    }
}

impl std::error::Error for GraphError {}
