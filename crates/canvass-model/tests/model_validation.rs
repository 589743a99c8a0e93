use canvass_model::{
    check_answer_kind, AnswerKind, AnswerValue, KindError, Question, QuestionId, ScreenKey,
};

fn qid(n: u8) -> QuestionId {
    QuestionId::parse(&format!("00000000-0000-0000-0000-0000000000{n:02x}")).expect("question id")
}

fn screen() -> ScreenKey {
    ScreenKey::parse("intake").expect("screen key")
}

#[test]
fn question_id_parse_rejects_non_uuid_input() {
    assert!(QuestionId::parse("").is_err());
    assert!(QuestionId::parse(" 00000000-0000-0000-0000-000000000001").is_err());
    assert!(QuestionId::parse("not-a-uuid").is_err());
    assert!(QuestionId::parse("00000000-0000-0000-0000-000000000001").is_ok());
}

#[test]
fn screen_key_parse_rejects_whitespace_and_empty() {
    assert!(ScreenKey::parse("").is_err());
    assert!(ScreenKey::parse(" intake").is_err());
    assert!(ScreenKey::parse("intake ").is_err());
    assert!(ScreenKey::parse(&"k".repeat(200)).is_err());
    assert!(ScreenKey::parse("intake").is_ok());
}

#[test]
fn enum_question_requires_options() {
    let q = Question::new(
        qid(1),
        screen(),
        1,
        "Favourite colour",
        AnswerKind::EnumSingle,
        Vec::new(),
        None,
        None,
    );
    assert!(q.validate().is_err());
}

#[test]
fn non_enum_question_rejects_options() {
    let q = Question::new(
        qid(1),
        screen(),
        1,
        "Age",
        AnswerKind::Number,
        vec!["50".to_string()],
        None,
        None,
    );
    assert!(q.validate().is_err());
}

#[test]
fn enum_options_must_be_trimmed_and_unique() {
    let untrimmed = Question::new(
        qid(1),
        screen(),
        1,
        "Colour",
        AnswerKind::EnumSingle,
        vec![" red".to_string()],
        None,
        None,
    );
    assert!(untrimmed.validate().is_err());

    let duplicated = Question::new(
        qid(1),
        screen(),
        1,
        "Colour",
        AnswerKind::EnumSingle,
        vec!["red".to_string(), "red".to_string()],
        None,
        None,
    );
    assert!(duplicated.validate().is_err());
}

#[test]
fn visibility_rule_requires_parent() {
    let q = Question::new(
        qid(2),
        screen(),
        2,
        "Details",
        AnswerKind::LongText,
        Vec::new(),
        None,
        Some(vec!["true".to_string()]),
    );
    assert!(q.validate().is_err());
}

#[test]
fn question_cannot_parent_itself() {
    let q = Question::new(
        qid(3),
        screen(),
        3,
        "Loop",
        AnswerKind::Boolean,
        Vec::new(),
        Some(qid(3)),
        Some(vec!["true".to_string()]),
    );
    assert!(q.validate().is_err());
}

#[test]
fn kind_check_enforces_boolean_and_number_typing() {
    let boolean = Question::new(
        qid(1),
        screen(),
        1,
        "Employed?",
        AnswerKind::Boolean,
        Vec::new(),
        None,
        None,
    );
    assert!(check_answer_kind(boolean.kind, &boolean.options, &AnswerValue::Bool(true)).is_ok());
    assert_eq!(
        check_answer_kind(
            boolean.kind,
            &boolean.options,
            &AnswerValue::Text("true".to_string())
        ),
        Err(KindError::Mismatch(AnswerKind::Boolean))
    );

    let number = Question::new(
        qid(2),
        screen(),
        2,
        "Age",
        AnswerKind::Number,
        Vec::new(),
        None,
        None,
    );
    assert!(check_answer_kind(number.kind, &number.options, &AnswerValue::Number(41.0)).is_ok());
    assert_eq!(
        check_answer_kind(number.kind, &number.options, &AnswerValue::Number(f64::NAN)),
        Err(KindError::NotFinite)
    );
    assert_eq!(
        check_answer_kind(
            number.kind,
            &number.options,
            &AnswerValue::Number(f64::INFINITY)
        ),
        Err(KindError::NotFinite)
    );
}

#[test]
fn kind_check_enforces_known_enum_options() {
    let options = vec!["red".to_string(), "green".to_string()];
    assert!(check_answer_kind(
        AnswerKind::EnumSingle,
        &options,
        &AnswerValue::Text("red".to_string())
    )
    .is_ok());
    assert_eq!(
        check_answer_kind(
            AnswerKind::EnumSingle,
            &options,
            &AnswerValue::Text("blue".to_string())
        ),
        Err(KindError::UnknownOption("blue".to_string()))
    );
}

#[test]
fn text_answers_are_stored_verbatim() {
    let raw = AnswerValue::Text("  spaced  ".to_string());
    assert!(check_answer_kind(AnswerKind::ShortString, &[], &raw).is_ok());
    let encoded = serde_json::to_string(&raw).expect("serialize");
    assert_eq!(encoded, r#""  spaced  ""#);
}
