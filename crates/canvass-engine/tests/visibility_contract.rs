use canvass_engine::{AnswerSet, QuestionGraph};
use canvass_model::{AnswerKind, AnswerValue, Question, QuestionId, ScreenKey};

fn qid(n: u8) -> QuestionId {
    QuestionId::parse(&format!("00000000-0000-0000-0000-0000000000{n:02x}")).expect("question id")
}

fn screen() -> ScreenKey {
    ScreenKey::parse("intake").expect("screen key")
}

fn question(
    n: u8,
    kind: AnswerKind,
    options: &[&str],
    parent: Option<u8>,
    rules: &[&str],
) -> Question {
    Question::new(
        qid(n),
        screen(),
        u32::from(n),
        format!("q{n}"),
        kind,
        options.iter().map(|o| (*o).to_string()).collect(),
        parent.map(qid),
        if rules.is_empty() {
            None
        } else {
            Some(rules.iter().map(|r| (*r).to_string()).collect())
        },
    )
}

fn answers(entries: &[(u8, AnswerValue)]) -> AnswerSet {
    entries
        .iter()
        .map(|(n, v)| (qid(*n), v.clone()))
        .collect()
}

#[test]
fn parentless_questions_are_always_visible() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::ShortString, &[], None, &[]),
    ])
    .expect("graph");
    let visible = graph.visible_set(&AnswerSet::new());
    assert!(visible.contains(&qid(1)));
    assert!(visible.contains(&qid(2)));
}

#[test]
fn child_is_visible_iff_parent_answer_matches_rule() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::LongText, &[], Some(1), &["true"]),
    ])
    .expect("graph");

    assert!(!graph
        .visible_set(&answers(&[(1, AnswerValue::Bool(false))]))
        .contains(&qid(2)));
    assert!(graph
        .visible_set(&answers(&[(1, AnswerValue::Bool(true))]))
        .contains(&qid(2)));
    // Unanswered parent keeps the child hidden.
    assert!(!graph.visible_set(&AnswerSet::new()).contains(&qid(2)));
}

#[test]
fn uppercase_boolean_text_normalizes_before_comparison() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::LongText, &[], Some(1), &["true"]),
    ])
    .expect("graph");
    let visible = graph.visible_set(&answers(&[(1, AnswerValue::Text("TRUE".to_string()))]));
    assert!(visible.contains(&qid(2)));
}

#[test]
fn number_rules_match_by_numeric_equality() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Number, &[], None, &[]),
        question(2, AnswerKind::LongText, &[], Some(1), &["10"]),
    ])
    .expect("graph");
    assert!(graph
        .visible_set(&answers(&[(1, AnswerValue::Number(10.0))]))
        .contains(&qid(2)));
    assert!(graph
        .visible_set(&answers(&[(1, AnswerValue::Text("10.0".to_string()))]))
        .contains(&qid(2)));
    assert!(!graph
        .visible_set(&answers(&[(1, AnswerValue::Number(11.0))]))
        .contains(&qid(2)));
}

#[test]
fn text_rules_trim_answers_but_stay_case_sensitive() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::ShortString, &[], None, &[]),
        question(2, AnswerKind::LongText, &[], Some(1), &["Yes"]),
    ])
    .expect("graph");
    assert!(graph
        .visible_set(&answers(&[(1, AnswerValue::Text(" Yes ".to_string()))]))
        .contains(&qid(2)));
    assert!(!graph
        .visible_set(&answers(&[(1, AnswerValue::Text("yes".to_string()))]))
        .contains(&qid(2)));
}

#[test]
fn hiding_a_parent_hides_the_whole_subtree() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::Boolean, &[], Some(1), &["true"]),
        question(3, AnswerKind::LongText, &[], Some(2), &["true"]),
        question(4, AnswerKind::LongText, &[], Some(3), &[]),
    ])
    .expect("graph");

    let shown = answers(&[
        (1, AnswerValue::Bool(true)),
        (2, AnswerValue::Bool(true)),
        (3, AnswerValue::Text("true".to_string())),
    ]);
    let visible = graph.visible_set(&shown);
    assert!(visible.contains(&qid(3)));
    assert!(visible.contains(&qid(4)));

    // Flipping the root hides every descendant even though their own
    // answers still match their rules.
    let hidden = answers(&[
        (1, AnswerValue::Bool(false)),
        (2, AnswerValue::Bool(true)),
        (3, AnswerValue::Text("true".to_string())),
    ]);
    let visible = graph.visible_set(&hidden);
    assert!(visible.contains(&qid(1)));
    assert!(!visible.contains(&qid(2)));
    assert!(!visible.contains(&qid(3)));
    assert!(!visible.contains(&qid(4)));
}

#[test]
fn child_without_rule_inherits_parent_visibility() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::Boolean, &[], Some(1), &["true"]),
        question(3, AnswerKind::LongText, &[], Some(2), &[]),
    ])
    .expect("graph");
    let visible = graph.visible_set(&answers(&[(1, AnswerValue::Bool(true))]));
    assert!(visible.contains(&qid(2)));
    assert!(visible.contains(&qid(3)));
    let visible = graph.visible_set(&answers(&[(1, AnswerValue::Bool(false))]));
    assert!(!visible.contains(&qid(3)));
}

#[test]
fn delta_reports_only_flipped_descendants() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::LongText, &[], Some(1), &["true"]),
        question(3, AnswerKind::LongText, &[], Some(1), &["false"]),
        question(4, AnswerKind::Boolean, &[], None, &[]),
    ])
    .expect("graph");

    let before = answers(&[(1, AnswerValue::Bool(false))]);
    let after = answers(&[(1, AnswerValue::Bool(true))]);
    let delta = graph.descendant_delta(&qid(1), &before, &after);
    assert_eq!(delta.now_visible, vec![qid(2)]);
    assert_eq!(delta.now_hidden, vec![qid(3)]);
}

#[test]
fn delta_for_unrelated_question_is_empty() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::LongText, &[], Some(1), &["true"]),
        question(4, AnswerKind::Boolean, &[], None, &[]),
    ])
    .expect("graph");

    let before = answers(&[(1, AnswerValue::Bool(true))]);
    let mut after = before.clone();
    after.insert(qid(4), AnswerValue::Bool(true));
    let delta = graph.descendant_delta(&qid(4), &before, &after);
    assert!(delta.is_empty());
}

#[test]
fn delta_cascades_through_transitive_descendants() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::Boolean, &[], Some(1), &["true"]),
        question(3, AnswerKind::LongText, &[], Some(2), &["true"]),
    ])
    .expect("graph");

    let before = answers(&[
        (1, AnswerValue::Bool(true)),
        (2, AnswerValue::Bool(true)),
    ]);
    let mut after = before.clone();
    after.insert(qid(1), AnswerValue::Bool(false));
    let delta = graph.descendant_delta(&qid(1), &before, &after);
    assert!(delta.now_visible.is_empty());
    assert_eq!(delta.now_hidden, vec![qid(2), qid(3)]);
}

#[test]
fn delta_ignores_descendants_of_a_hidden_changed_question() {
    // q2 is hidden while q1 is false; changing q2's answer cannot reveal q3.
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::Boolean, &[], Some(1), &["true"]),
        question(3, AnswerKind::LongText, &[], Some(2), &["true"]),
    ])
    .expect("graph");

    let before = answers(&[(1, AnswerValue::Bool(false))]);
    let mut after = before.clone();
    after.insert(qid(2), AnswerValue::Bool(true));
    let delta = graph.descendant_delta(&qid(2), &before, &after);
    assert!(delta.is_empty());
}

#[test]
fn enum_rules_match_exact_option_values() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::EnumSingle, &["red", "green"], None, &[]),
        question(2, AnswerKind::LongText, &[], Some(1), &["red"]),
    ])
    .expect("graph");
    assert!(graph
        .visible_set(&answers(&[(1, AnswerValue::Text("red".to_string()))]))
        .contains(&qid(2)));
    assert!(!graph
        .visible_set(&answers(&[(1, AnswerValue::Text("green".to_string()))]))
        .contains(&qid(2)));
}

#[test]
fn visibility_delta_serializes_question_ids_as_strings() {
    let graph = QuestionGraph::build(vec![
        question(1, AnswerKind::Boolean, &[], None, &[]),
        question(2, AnswerKind::LongText, &[], Some(1), &["true"]),
    ])
    .expect("graph");
    let delta = graph.descendant_delta(
        &qid(1),
        &AnswerSet::new(),
        &answers(&[(1, AnswerValue::Bool(true))]),
    );
    let encoded = serde_json::to_value(&delta).expect("serialize delta");
    assert_eq!(
        encoded["now_visible"][0],
        "00000000-0000-0000-0000-000000000002"
    );
}
