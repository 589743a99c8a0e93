#![forbid(unsafe_code)]

use canvass_model::{AnswerValue, QuestionId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

mod graph;
mod graph_error;

pub use graph::QuestionGraph;
pub use graph_error::{GraphError, GraphErrorCode};

pub const CRATE_NAME: &str = "canvass-engine";

/// Current answers of one response set, keyed by question.
pub type AnswerSet = BTreeMap<QuestionId, AnswerValue>;

/// Questions whose visible/hidden state flipped as the direct result of one
/// answer update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct VisibilityDelta {
    pub now_visible: Vec<QuestionId>,
    pub now_hidden: Vec<QuestionId>,
}

impl VisibilityDelta {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.now_visible.is_empty() && self.now_hidden.is_empty()
    }
}
