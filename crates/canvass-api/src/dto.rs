// SPDX-License-Identifier: Apache-2.0

use canvass_engine::VisibilityDelta;
use canvass_model::{AnswerKind, AnswerValue, Question, QuestionId, ScreenKey};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Client-facing projection of a question. Visibility wiring
/// (parent/visible_if) is evaluated server-side and never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct QuestionView {
    pub question_id: QuestionId,
    pub screen_key: ScreenKey,
    pub order: u32,
    pub label: String,
    pub kind: AnswerKind,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub options: Vec<String>,
}

impl From<&Question> for QuestionView {
    fn from(question: &Question) -> Self {
        Self {
            question_id: question.question_id,
            screen_key: question.screen_key.clone(),
            order: question.order,
            label: question.label.clone(),
            kind: question.kind,
            options: question.options.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenViewBody {
    pub questions: Vec<QuestionView>,
    pub answers: BTreeMap<String, AnswerValue>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ScreenViewEnvelope {
    pub screen_view: ScreenViewBody,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutosaveResult {
    pub saved: bool,
    pub etag: String,
    pub visibility_delta: VisibilityDelta,
    pub suppressed_answers: Vec<QuestionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AutosaveEnvelope {
    pub autosave_result: AutosaveResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchItemResult {
    pub question_id: QuestionId,
    pub saved: bool,
    pub visibility_delta: VisibilityDelta,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchResult {
    pub items: Vec<BatchItemResult>,
    pub etag: String,
    pub suppressed_answers: Vec<QuestionId>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchEnvelope {
    pub batch_result: BatchResult,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnswerUpsertBody {
    pub value: AnswerValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchUpsertItem {
    pub question_id: String,
    pub value: AnswerValue,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BatchUpsertBody {
    pub items: Vec<BatchUpsertItem>,
}
