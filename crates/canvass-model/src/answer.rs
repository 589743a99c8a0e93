// SPDX-License-Identifier: Apache-2.0

use crate::ids::ParseError;
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, PartialOrd, Ord,
)]
#[serde(rename_all = "snake_case")]
#[non_exhaustive]
pub enum AnswerKind {
    ShortString,
    LongText,
    Number,
    Boolean,
    EnumSingle,
}

impl AnswerKind {
    pub fn parse(raw: &str) -> Result<Self, ParseError> {
        match raw {
            "short_string" => Ok(Self::ShortString),
            "long_text" => Ok(Self::LongText),
            "number" => Ok(Self::Number),
            "boolean" => Ok(Self::Boolean),
            "enum_single" => Ok(Self::EnumSingle),
            _ => Err(ParseError::InvalidFormat(
                "answer kind must be one of short_string, long_text, number, boolean, enum_single",
            )),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ShortString => "short_string",
            Self::LongText => "long_text",
            Self::Number => "number",
            Self::Boolean => "boolean",
            Self::EnumSingle => "enum_single",
        }
    }
}

/// A stored answer value. Text is kept verbatim; canonicalization happens only
/// at visibility-comparison time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
#[non_exhaustive]
pub enum AnswerValue {
    Bool(bool),
    Number(f64),
    Text(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum KindError {
    Mismatch(AnswerKind),
    NotFinite,
    UnknownOption(String),
}

impl Display for KindError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Mismatch(expected) => {
                write!(f, "value does not match answer kind {}", expected.as_str())
            }
            Self::NotFinite => f.write_str("number answers must be finite"),
            Self::UnknownOption(value) => write!(f, "unknown enum option: {value}"),
        }
    }
}

impl std::error::Error for KindError {}

pub fn check_answer_kind(
    kind: AnswerKind,
    options: &[String],
    value: &AnswerValue,
) -> Result<(), KindError> {
    match kind {
        AnswerKind::Boolean => match value {
            AnswerValue::Bool(_) => Ok(()),
            _ => Err(KindError::Mismatch(kind)),
        },
        AnswerKind::Number => match value {
            AnswerValue::Number(n) if n.is_finite() => Ok(()),
            AnswerValue::Number(_) => Err(KindError::NotFinite),
            _ => Err(KindError::Mismatch(kind)),
        },
        AnswerKind::ShortString | AnswerKind::LongText => match value {
            AnswerValue::Text(_) => Ok(()),
            _ => Err(KindError::Mismatch(kind)),
        },
        AnswerKind::EnumSingle => match value {
            AnswerValue::Text(option) => {
                if options.iter().any(|o| o == option) {
                    Ok(())
                } else {
                    Err(KindError::UnknownOption(option.clone()))
                }
            }
            _ => Err(KindError::Mismatch(kind)),
        },
    }
}

/// Canonical textual form of a number: integer rendering when the value is
/// integral, shortest-roundtrip rendering otherwise.
#[must_use]
pub fn canonical_number(value: f64) -> Option<String> {
    if !value.is_finite() {
        return None;
    }
    if value == value.trunc() && value.abs() < 9.007_199_254_740_992e15 {
        return Some(format!("{}", value as i64));
    }
    Some(format!("{value}"))
}

/// Normalizes an answer into the canonical form used for visibility-rule
/// comparison. Returns None when the stored value cannot be interpreted under
/// the given kind (such an answer never matches a rule).
#[must_use]
pub fn canonical_answer(kind: AnswerKind, value: &AnswerValue) -> Option<String> {
    match kind {
        AnswerKind::Boolean => match value {
            AnswerValue::Bool(b) => Some(b.to_string()),
            AnswerValue::Text(t) => match t.trim().to_ascii_lowercase().as_str() {
                "true" => Some("true".to_string()),
                "false" => Some("false".to_string()),
                _ => None,
            },
            AnswerValue::Number(_) => None,
        },
        AnswerKind::Number => match value {
            AnswerValue::Number(n) => canonical_number(*n),
            AnswerValue::Text(t) => t.trim().parse::<f64>().ok().and_then(canonical_number),
            AnswerValue::Bool(_) => None,
        },
        AnswerKind::ShortString | AnswerKind::LongText => match value {
            AnswerValue::Text(t) => Some(t.trim().to_string()),
            _ => None,
        },
        AnswerKind::EnumSingle => match value {
            AnswerValue::Text(t) => Some(t.clone()),
            _ => None,
        },
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum RuleValueIssue {
    NotCanonical,
    KindMismatch,
}

/// Checks that a `visible_if_value` entry is expressed in canonical form and
/// is type-consistent with the parent question's answer kind.
#[must_use]
pub fn rule_value_issue(
    kind: AnswerKind,
    options: &[String],
    raw: &str,
) -> Option<RuleValueIssue> {
    match kind {
        AnswerKind::Boolean => {
            if raw == "true" || raw == "false" {
                None
            } else if raw.eq_ignore_ascii_case("true") || raw.eq_ignore_ascii_case("false") {
                Some(RuleValueIssue::NotCanonical)
            } else {
                Some(RuleValueIssue::KindMismatch)
            }
        }
        AnswerKind::Number => match raw.parse::<f64>() {
            Ok(n) if n.is_finite() => match canonical_number(n) {
                Some(canonical) if canonical == raw => None,
                _ => Some(RuleValueIssue::NotCanonical),
            },
            _ => Some(RuleValueIssue::KindMismatch),
        },
        AnswerKind::ShortString | AnswerKind::LongText => {
            if raw.is_empty() {
                Some(RuleValueIssue::KindMismatch)
            } else if raw.trim() != raw {
                Some(RuleValueIssue::NotCanonical)
            } else {
                None
            }
        }
        AnswerKind::EnumSingle => {
            if options.iter().any(|o| o == raw) {
                None
            } else {
                Some(RuleValueIssue::KindMismatch)
            }
        }
    }
}
