#![forbid(unsafe_code)]

mod dto;
mod error_mapping;
mod errors;

pub use dto::{
    AnswerUpsertBody, AutosaveEnvelope, AutosaveResult, BatchEnvelope, BatchItemResult,
    BatchResult, BatchUpsertBody, BatchUpsertItem, QuestionView, ScreenViewBody,
    ScreenViewEnvelope,
};
pub use error_mapping::status_code_for;
pub use errors::{ApiError, ApiErrorCode};

pub const CRATE_NAME: &str = "canvass-api";

pub const HEADER_SCREEN_ETAG: &str = "screen-etag";
pub const HEADER_IF_MATCH: &str = "if-match";
pub const HEADER_IF_NONE_MATCH: &str = "if-none-match";
pub const HEADER_IDEMPOTENCY_KEY: &str = "idempotency-key";
