// SPDX-License-Identifier: Apache-2.0

//! Postcondition self-checks over the engine's own output. These exist to
//! catch regressions, not user error: a failure here is a 500.

use crate::assemble::{assemble_screen, ScreenAssembly};
use canvass_api::{ApiError, ApiErrorCode};
use canvass_engine::{AnswerSet, QuestionGraph};
use canvass_model::ScreenKey;
use serde_json::json;

pub(crate) fn verify_screen_view(
    graph: &QuestionGraph,
    answers: &AnswerSet,
    screen_key: &ScreenKey,
    assembly: &ScreenAssembly,
) -> Result<(), ApiError> {
    let visible = graph.visible_set(answers);
    for question in &assembly.view.questions {
        if !visible.contains(&question.question_id) {
            return Err(ApiError::new(
                ApiErrorCode::PostScreenViewContainsHidden,
                "screen view contains a hidden question",
                json!({"question_id": question.question_id.to_string()}),
            ));
        }
    }

    let reassembled = assemble_screen(graph, answers, screen_key)?;
    let first = serde_json::to_string(&assembly.view).map_err(not_deterministic)?;
    let second = serde_json::to_string(&reassembled.view).map_err(not_deterministic)?;
    if first != second {
        return Err(ApiError::new(
            ApiErrorCode::PostOutputsKeysNotDeterministic,
            "screen assembly is not reproducible for identical state",
            serde_json::Value::Null,
        ));
    }
    if reassembled.etag != assembly.etag {
        return Err(ApiError::new(
            ApiErrorCode::PostEtagNotLatest,
            "etag does not match a fresh derivation of the same state",
            json!({"etag": assembly.etag, "fresh_etag": reassembled.etag}),
        ));
    }
    Ok(())
}

fn not_deterministic(e: serde_json::Error) -> ApiError {
    ApiError::new(
        ApiErrorCode::PostOutputsKeysNotDeterministic,
        "screen view could not be serialized for comparison",
        json!({"reason": e.to_string()}),
    )
}
