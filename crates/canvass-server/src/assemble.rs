// SPDX-License-Identifier: Apache-2.0

//! The screen assembler. Both the GET-screen path and the post-autosave path
//! go through `assemble_screen`, so the view after a PATCH is computed
//! identically to a fresh GET.

use crate::etag;
use canvass_api::{ApiError, QuestionView, ScreenViewBody};
use canvass_engine::{AnswerSet, QuestionGraph};
use canvass_model::{QuestionId, ScreenKey};
use std::collections::BTreeMap;

pub(crate) struct ScreenAssembly {
    pub view: ScreenViewBody,
    pub etag: String,
}

pub(crate) fn assemble_screen(
    graph: &QuestionGraph,
    answers: &AnswerSet,
    screen_key: &ScreenKey,
) -> Result<ScreenAssembly, ApiError> {
    let visible = graph.visible_set(answers);
    let on_screen = graph.questions_on_screen(screen_key);

    let questions: Vec<QuestionView> = on_screen
        .iter()
        .filter(|q| visible.contains(&q.question_id))
        .map(|q| QuestionView::from(*q))
        .collect();

    let mut view_answers: BTreeMap<String, canvass_model::AnswerValue> = BTreeMap::new();
    for question in &questions {
        if let Some(value) = answers.get(&question.question_id) {
            view_answers.insert(question.question_id.to_string(), value.clone());
        }
    }

    let etag = etag::screen_etag(graph, answers, screen_key)?;
    Ok(ScreenAssembly {
        view: ScreenViewBody {
            questions,
            answers: view_answers,
        },
        etag,
    })
}

/// Stored answers whose question is currently hidden. Retained in the store,
/// reported separately, never serialized into the screen view.
pub(crate) fn suppressed_answers(graph: &QuestionGraph, answers: &AnswerSet) -> Vec<QuestionId> {
    let visible = graph.visible_set(answers);
    let mut suppressed: Vec<QuestionId> = answers
        .keys()
        .filter(|id| graph.contains(id) && !visible.contains(*id))
        .copied()
        .collect();
    suppressed.sort_by_key(|id| {
        (
            graph.question(id).map(|q| q.order).unwrap_or(u32::MAX),
            *id,
        )
    });
    suppressed
}
