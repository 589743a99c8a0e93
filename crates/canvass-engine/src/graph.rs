// SPDX-License-Identifier: Apache-2.0

use crate::graph_error::{GraphError, GraphErrorCode};
use crate::{AnswerSet, VisibilityDelta};
use canvass_model::{canonical_answer, rule_value_issue, Question, QuestionId, RuleValueIssue, ScreenKey};
use std::collections::{BTreeMap, BTreeSet, VecDeque};

/// Question definitions indexed as a DAG: parent edges validated at build
/// time, a parent-to-children index for subtree re-evaluation.
#[derive(Debug, Clone)]
pub struct QuestionGraph {
    by_id: BTreeMap<QuestionId, Question>,
    children: BTreeMap<QuestionId, Vec<QuestionId>>,
    roots: Vec<QuestionId>,
}

impl QuestionGraph {
    pub fn build(questions: Vec<Question>) -> Result<Self, GraphError> {
        let mut by_id: BTreeMap<QuestionId, Question> = BTreeMap::new();
        for question in questions {
            question.validate().map_err(|e| {
                GraphError::new(
                    GraphErrorCode::InvalidQuestion,
                    question.question_id,
                    e.to_string(),
                )
            })?;
            let id = question.question_id;
            if by_id.insert(id, question).is_some() {
                return Err(GraphError::new(
                    GraphErrorCode::DuplicateQuestion,
                    id,
                    "question id appears more than once",
                ));
            }
        }

        for question in by_id.values() {
            let Some(parent_id) = question.parent_question_id else {
                continue;
            };
            let Some(parent) = by_id.get(&parent_id) else {
                return Err(GraphError::new(
                    GraphErrorCode::UnknownParent,
                    question.question_id,
                    format!("parent question {parent_id} not found"),
                ));
            };
            if let Some(rules) = &question.visible_if_value {
                for raw in rules {
                    match rule_value_issue(parent.kind, &parent.options, raw) {
                        None => {}
                        Some(RuleValueIssue::NotCanonical) => {
                            return Err(GraphError::new(
                                GraphErrorCode::RuleNotCanonical,
                                question.question_id,
                                format!(
                                    "visible_if_value {raw:?} is not the canonical form for {}",
                                    parent.kind.as_str()
                                ),
                            ));
                        }
                        Some(RuleValueIssue::KindMismatch) => {
                            return Err(GraphError::new(
                                GraphErrorCode::RuleKindMismatch,
                                question.question_id,
                                format!(
                                    "visible_if_value {raw:?} is not type-consistent with {}",
                                    parent.kind.as_str()
                                ),
                            ));
                        }
                        Some(_) => unreachable!(
                            "rule_value_issue only yields NotCanonical or KindMismatch"
                        ),
                    }
                }
            }
        }

        detect_parent_cycles(&by_id)?;

        let mut children: BTreeMap<QuestionId, Vec<QuestionId>> = BTreeMap::new();
        let mut roots = Vec::new();
        for question in by_id.values() {
            match question.parent_question_id {
                Some(parent_id) => children
                    .entry(parent_id)
                    .or_default()
                    .push(question.question_id),
                None => roots.push(question.question_id),
            }
        }
        let order_key =
            |id: &QuestionId| -> (u32, QuestionId) { (by_id[id].order, *id) };
        for siblings in children.values_mut() {
            siblings.sort_by_key(order_key);
        }
        roots.sort_by_key(order_key);

        Ok(Self {
            by_id,
            children,
            roots,
        })
    }

    #[must_use]
    pub fn question(&self, id: &QuestionId) -> Option<&Question> {
        self.by_id.get(id)
    }

    #[must_use]
    pub fn contains(&self, id: &QuestionId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn questions(&self) -> impl Iterator<Item = &Question> {
        self.by_id.values()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Questions assigned to a screen, in display order.
    #[must_use]
    pub fn questions_on_screen(&self, screen_key: &ScreenKey) -> Vec<&Question> {
        let mut out: Vec<&Question> = self
            .by_id
            .values()
            .filter(|q| &q.screen_key == screen_key)
            .collect();
        out.sort_by_key(|q| (q.order, q.question_id));
        out
    }

    /// Whether `child` is revealed by its parent's current answer. Questions
    /// without a rule inherit the parent's visibility.
    fn rule_matches(&self, child: &Question, answers: &AnswerSet) -> bool {
        let Some(parent_id) = child.parent_question_id else {
            return true;
        };
        let Some(rules) = &child.visible_if_value else {
            return true;
        };
        let Some(parent) = self.by_id.get(&parent_id) else {
            return false;
        };
        let Some(answer) = answers.get(&parent_id) else {
            return false;
        };
        match canonical_answer(parent.kind, answer) {
            Some(canonical) => rules.iter().any(|r| r == &canonical),
            None => false,
        }
    }

    /// The full visible set: parentless questions are visible, a child is
    /// visible iff its parent is visible and its rule matches. Hidden parents
    /// hide entire subtrees regardless of the descendants' own answers.
    #[must_use]
    pub fn visible_set(&self, answers: &AnswerSet) -> BTreeSet<QuestionId> {
        let mut visible = BTreeSet::new();
        let mut queue: VecDeque<QuestionId> = self.roots.iter().copied().collect();
        while let Some(id) = queue.pop_front() {
            visible.insert(id);
            if let Some(child_ids) = self.children.get(&id) {
                for child_id in child_ids {
                    let child = &self.by_id[child_id];
                    if self.rule_matches(child, answers) {
                        queue.push_back(*child_id);
                    }
                }
            }
        }
        visible
    }

    /// Visibility of one question, derived by walking its ancestor chain.
    #[must_use]
    pub fn is_visible(&self, id: &QuestionId, answers: &AnswerSet) -> bool {
        let Some(question) = self.by_id.get(id) else {
            return false;
        };
        match question.parent_question_id {
            None => true,
            Some(parent_id) => {
                self.is_visible(&parent_id, answers) && self.rule_matches(question, answers)
            }
        }
    }

    /// All transitive descendants of a question, parents before children.
    #[must_use]
    pub fn subtree(&self, id: &QuestionId) -> Vec<QuestionId> {
        let mut out = Vec::new();
        let mut queue: VecDeque<QuestionId> = VecDeque::new();
        if let Some(child_ids) = self.children.get(id) {
            queue.extend(child_ids.iter().copied());
        }
        while let Some(current) = queue.pop_front() {
            out.push(current);
            if let Some(child_ids) = self.children.get(&current) {
                queue.extend(child_ids.iter().copied());
            }
        }
        out
    }

    /// Visibility flips among the changed question's descendants, comparing
    /// the answer set before and after one update. Only the changed subtree
    /// is walked; a question's own visibility never depends on its own
    /// answer, so the changed question itself cannot flip.
    #[must_use]
    pub fn descendant_delta(
        &self,
        changed: &QuestionId,
        before: &AnswerSet,
        after: &AnswerSet,
    ) -> VisibilityDelta {
        if !self.by_id.contains_key(changed) {
            return VisibilityDelta::default();
        }
        let changed_visible = self.is_visible(changed, before);

        let mut vis_before: BTreeMap<QuestionId, bool> = BTreeMap::new();
        let mut vis_after: BTreeMap<QuestionId, bool> = BTreeMap::new();
        vis_before.insert(*changed, changed_visible);
        vis_after.insert(*changed, changed_visible);

        let mut now_visible = Vec::new();
        let mut now_hidden = Vec::new();
        for id in self.subtree(changed) {
            let question = &self.by_id[&id];
            let Some(parent_id) = question.parent_question_id else {
                continue;
            };
            let was = vis_before.get(&parent_id).copied().unwrap_or(false)
                && self.rule_matches(question, before);
            let now = vis_after.get(&parent_id).copied().unwrap_or(false)
                && self.rule_matches(question, after);
            vis_before.insert(id, was);
            vis_after.insert(id, now);
            if !was && now {
                now_visible.push(id);
            } else if was && !now {
                now_hidden.push(id);
            }
        }

        let order_key = |id: &QuestionId| (self.by_id[id].order, *id);
        now_visible.sort_by_key(order_key);
        now_hidden.sort_by_key(order_key);
        VisibilityDelta {
            now_visible,
            now_hidden,
        }
    }
}

fn detect_parent_cycles(by_id: &BTreeMap<QuestionId, Question>) -> Result<(), GraphError> {
    let mut settled: BTreeSet<QuestionId> = BTreeSet::new();
    for start in by_id.keys() {
        if settled.contains(start) {
            continue;
        }
        let mut path: Vec<QuestionId> = Vec::new();
        let mut on_path: BTreeSet<QuestionId> = BTreeSet::new();
        let mut current = *start;
        loop {
            if on_path.contains(&current) {
                return Err(GraphError::new(
                    GraphErrorCode::ParentCycle,
                    current,
                    "parent linkage forms a cycle",
                ));
            }
            if settled.contains(&current) {
                break;
            }
            on_path.insert(current);
            path.push(current);
            match by_id.get(&current).and_then(|q| q.parent_question_id) {
                Some(parent) => current = parent,
                None => break,
            }
        }
        settled.extend(path);
    }
    Ok(())
}
