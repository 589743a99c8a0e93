// SPDX-License-Identifier: Apache-2.0

//! Screen and set-level ETags: the stable-JSON SHA-256 of the visible
//! question set plus the stored answers of those questions. The token changes
//! iff the visible set or a visible answer changes.

use canvass_api::{ApiError, ApiErrorCode};
use canvass_core::canonical;
use canvass_engine::{AnswerSet, QuestionGraph};
use canvass_model::{QuestionId, ResponseSetId, ScreenKey};
use serde_json::json;
use std::collections::BTreeMap;

fn hash_fingerprint(fingerprint: &serde_json::Value) -> Result<String, ApiError> {
    let hex = canonical::stable_json_hash_hex(fingerprint).map_err(|e| {
        ApiError::new(
            ApiErrorCode::PostEtagNotLatest,
            "etag fingerprint could not be derived",
            json!({"reason": e.to_string()}),
        )
    })?;
    Ok(format!("\"{hex}\""))
}

fn visible_answers(
    answers: &AnswerSet,
    visible_ordered: &[QuestionId],
) -> BTreeMap<String, serde_json::Value> {
    let mut out = BTreeMap::new();
    for id in visible_ordered {
        if let Some(value) = answers.get(id) {
            if let Ok(encoded) = serde_json::to_value(value) {
                out.insert(id.to_string(), encoded);
            }
        }
    }
    out
}

pub(crate) fn screen_etag(
    graph: &QuestionGraph,
    answers: &AnswerSet,
    screen_key: &ScreenKey,
) -> Result<String, ApiError> {
    let visible = graph.visible_set(answers);
    let ordered: Vec<QuestionId> = graph
        .questions_on_screen(screen_key)
        .iter()
        .filter(|q| visible.contains(&q.question_id))
        .map(|q| q.question_id)
        .collect();
    let fingerprint = json!({
        "screen_key": screen_key.as_str(),
        "visible": ordered.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "answers": visible_answers(answers, &ordered),
    });
    hash_fingerprint(&fingerprint)
}

/// Fingerprint of every screen of a response set; gates set-level deletes and
/// batch upserts.
pub(crate) fn set_etag(
    graph: &QuestionGraph,
    answers: &AnswerSet,
    response_set_id: &ResponseSetId,
) -> Result<String, ApiError> {
    let visible = graph.visible_set(answers);
    let mut ordered: Vec<QuestionId> = graph
        .questions()
        .filter(|q| visible.contains(&q.question_id))
        .map(|q| q.question_id)
        .collect();
    ordered.sort();
    let fingerprint = json!({
        "response_set_id": response_set_id.to_string(),
        "visible": ordered.iter().map(ToString::to_string).collect::<Vec<_>>(),
        "answers": visible_answers(answers, &ordered),
    });
    hash_fingerprint(&fingerprint)
}

#[cfg(test)]
mod tests {
    use super::*;
    use canvass_model::{AnswerKind, AnswerValue, Question};

    fn qid(n: u8) -> QuestionId {
        QuestionId::parse(&format!("00000000-0000-0000-0000-0000000000{n:02x}"))
            .expect("question id")
    }

    fn graph() -> QuestionGraph {
        let screen = ScreenKey::parse("s").expect("screen");
        QuestionGraph::build(vec![
            Question::new(
                qid(1),
                screen.clone(),
                1,
                "root",
                AnswerKind::Boolean,
                Vec::new(),
                None,
                None,
            ),
            Question::new(
                qid(2),
                screen,
                2,
                "child",
                AnswerKind::LongText,
                Vec::new(),
                Some(qid(1)),
                Some(vec!["true".to_string()]),
            ),
        ])
        .expect("graph")
    }

    #[test]
    fn etag_is_stable_for_identical_state() {
        let graph = graph();
        let screen = ScreenKey::parse("s").expect("screen");
        let answers: AnswerSet = [(qid(1), AnswerValue::Bool(true))].into_iter().collect();
        let a = screen_etag(&graph, &answers, &screen).expect("etag");
        let b = screen_etag(&graph, &answers, &screen).expect("etag");
        assert_eq!(a, b);
    }

    #[test]
    fn etag_changes_when_visible_set_changes() {
        let graph = graph();
        let screen = ScreenKey::parse("s").expect("screen");
        let hidden: AnswerSet = [(qid(1), AnswerValue::Bool(false))].into_iter().collect();
        let shown: AnswerSet = [(qid(1), AnswerValue::Bool(true))].into_iter().collect();
        assert_ne!(
            screen_etag(&graph, &hidden, &screen).expect("etag"),
            screen_etag(&graph, &shown, &screen).expect("etag")
        );
    }

    #[test]
    fn etag_ignores_hidden_answers() {
        let graph = graph();
        let screen = ScreenKey::parse("s").expect("screen");
        let mut without: AnswerSet = [(qid(1), AnswerValue::Bool(false))].into_iter().collect();
        let base = screen_etag(&graph, &without, &screen).expect("etag");
        // q2 is hidden while q1 is false; its retained answer must not move
        // the screen's token.
        without.insert(qid(2), AnswerValue::Text("kept".to_string()));
        assert_eq!(base, screen_etag(&graph, &without, &screen).expect("etag"));
    }
}
