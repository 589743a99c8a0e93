// SPDX-License-Identifier: Apache-2.0

use crate::answer::AnswerKind;
use crate::ids::{ParseError, QuestionId, ScreenKey};
use serde::{Deserialize, Serialize};

pub const LABEL_MAX_LEN: usize = 512;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
#[non_exhaustive]
pub struct Question {
    pub question_id: QuestionId,
    pub screen_key: ScreenKey,
    pub order: u32,
    pub label: String,
    pub kind: AnswerKind,
    #[serde(default)]
    pub options: Vec<String>,
    #[serde(default)]
    pub parent_question_id: Option<QuestionId>,
    #[serde(default)]
    pub visible_if_value: Option<Vec<String>>,
}

impl Question {
    #[allow(clippy::too_many_arguments)]
    #[must_use]
    pub fn new(
        question_id: QuestionId,
        screen_key: ScreenKey,
        order: u32,
        label: impl Into<String>,
        kind: AnswerKind,
        options: Vec<String>,
        parent_question_id: Option<QuestionId>,
        visible_if_value: Option<Vec<String>>,
    ) -> Self {
        Self {
            question_id,
            screen_key,
            order,
            label: label.into(),
            kind,
            options,
            parent_question_id,
            visible_if_value,
        }
    }

    pub fn validate(&self) -> Result<(), ParseError> {
        if self.label.trim().is_empty() {
            return Err(ParseError::Empty("question label"));
        }
        if self.label.len() > LABEL_MAX_LEN {
            return Err(ParseError::TooLong("question label", LABEL_MAX_LEN));
        }
        match self.kind {
            AnswerKind::EnumSingle => {
                if self.options.is_empty() {
                    return Err(ParseError::InvalidFormat(
                        "enum_single questions require at least one option",
                    ));
                }
                for option in &self.options {
                    if option.is_empty() || option.trim() != option {
                        return Err(ParseError::InvalidFormat(
                            "enum options must be non-empty and trimmed",
                        ));
                    }
                }
                let mut seen = std::collections::BTreeSet::new();
                for option in &self.options {
                    if !seen.insert(option.as_str()) {
                        return Err(ParseError::InvalidFormat("enum options must be unique"));
                    }
                }
            }
            _ => {
                if !self.options.is_empty() {
                    return Err(ParseError::InvalidFormat(
                        "options are only valid for enum_single questions",
                    ));
                }
            }
        }
        if let Some(rules) = &self.visible_if_value {
            if rules.is_empty() {
                return Err(ParseError::InvalidFormat(
                    "visible_if_value must list at least one accepted value",
                ));
            }
            if self.parent_question_id.is_none() {
                return Err(ParseError::InvalidFormat(
                    "visible_if_value requires parent_question_id",
                ));
            }
        }
        if self.parent_question_id == Some(self.question_id) {
            return Err(ParseError::InvalidFormat(
                "a question cannot be its own parent",
            ));
        }
        Ok(())
    }
}
