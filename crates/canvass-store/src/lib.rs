#![forbid(unsafe_code)]

use async_trait::async_trait;
use canvass_model::{AnswerValue, Question, QuestionId, ResponseSet, ResponseSetId};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter};

mod fake;
mod sqlite;

pub use fake::FakeStore;
pub use sqlite::SqliteStore;

pub const CRATE_NAME: &str = "canvass-store";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[non_exhaustive]
pub enum StoreErrorCode {
    Unavailable,
    Io,
    Corrupt,
    Internal,
}

impl StoreErrorCode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Unavailable => "unavailable",
            Self::Io => "io_error",
            Self::Corrupt => "corrupt",
            Self::Internal => "internal_error",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreError {
    pub code: StoreErrorCode,
    pub message: String,
}

impl StoreError {
    #[must_use]
    pub fn new(code: StoreErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }
}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.code.as_str(), self.message)
    }
}

impl std::error::Error for StoreError {}

/// First-seen request body hash plus the response it produced, keyed by
/// (response set, idempotency key). Replays return `response_json` verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct IdempotencyRecord {
    pub body_sha256: String,
    pub response_json: String,
}

/// Persistence contract shared by the SQLite backend and the in-memory test
/// double. One answer per (response_set_id, question_id) is structural: a
/// second write updates in place.
#[async_trait]
pub trait ResponseStore: Send + Sync + 'static {
    fn backend_tag(&self) -> &'static str;

    async fn list_questions(&self) -> Result<Vec<Question>, StoreError>;
    async fn insert_question(&self, question: &Question) -> Result<(), StoreError>;

    async fn get_response_set(
        &self,
        id: &ResponseSetId,
    ) -> Result<Option<ResponseSet>, StoreError>;
    async fn create_response_set(&self, set: &ResponseSet) -> Result<(), StoreError>;
    /// Deletes the set and cascades to its answers and idempotency records.
    async fn delete_response_set(&self, id: &ResponseSetId) -> Result<bool, StoreError>;

    async fn get_answer(
        &self,
        set: &ResponseSetId,
        question: &QuestionId,
    ) -> Result<Option<AnswerValue>, StoreError>;
    async fn upsert_answer(
        &self,
        set: &ResponseSetId,
        question: &QuestionId,
        value: &AnswerValue,
    ) -> Result<(), StoreError>;
    async fn delete_answer(
        &self,
        set: &ResponseSetId,
        question: &QuestionId,
    ) -> Result<bool, StoreError>;
    async fn answers_for_set(
        &self,
        set: &ResponseSetId,
    ) -> Result<BTreeMap<QuestionId, AnswerValue>, StoreError>;

    async fn get_idempotency(
        &self,
        set: &ResponseSetId,
        key: &str,
    ) -> Result<Option<IdempotencyRecord>, StoreError>;
    async fn put_idempotency(
        &self,
        set: &ResponseSetId,
        key: &str,
        record: &IdempotencyRecord,
    ) -> Result<(), StoreError>;
}
