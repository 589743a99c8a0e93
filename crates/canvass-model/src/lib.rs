#![forbid(unsafe_code)]
//! Canvass domain model SSOT.

mod answer;
mod ids;
mod question;
mod response;

pub use answer::{
    canonical_answer, canonical_number, check_answer_kind, rule_value_issue, AnswerKind,
    AnswerValue, KindError, RuleValueIssue,
};
pub use ids::{ParseError, QuestionId, ResponseSetId, ScreenKey, SCREEN_KEY_MAX_LEN};
pub use question::{Question, LABEL_MAX_LEN};
pub use response::{Response, ResponseSet};

pub const CRATE_NAME: &str = "canvass-model";
