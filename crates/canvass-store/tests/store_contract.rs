use canvass_model::{
    AnswerKind, AnswerValue, Question, QuestionId, ResponseSet, ResponseSetId, ScreenKey,
};
use canvass_store::{
    FakeStore, IdempotencyRecord, ResponseStore, SqliteStore, StoreErrorCode,
};
use tempfile::tempdir;

fn qid(n: u8) -> QuestionId {
    QuestionId::parse(&format!("00000000-0000-0000-0000-0000000000{n:02x}")).expect("question id")
}

fn sid(n: u8) -> ResponseSetId {
    ResponseSetId::parse(&format!("00000000-0000-0000-0000-00000000ff{n:02x}"))
        .expect("response set id")
}

fn sample_question(n: u8) -> Question {
    Question::new(
        qid(n),
        ScreenKey::parse("intake").expect("screen"),
        u32::from(n),
        format!("q{n}"),
        AnswerKind::ShortString,
        Vec::new(),
        None,
        None,
    )
}

async fn contract_upsert_updates_in_place(store: &dyn ResponseStore) {
    let set = sid(1);
    store
        .create_response_set(&ResponseSet::new(set, 1_700_000_000))
        .await
        .expect("create set");
    store
        .upsert_answer(&set, &qid(1), &AnswerValue::Text("first".to_string()))
        .await
        .expect("first write");
    store
        .upsert_answer(&set, &qid(1), &AnswerValue::Text("second".to_string()))
        .await
        .expect("second write");

    let answers = store.answers_for_set(&set).await.expect("answers");
    assert_eq!(answers.len(), 1, "one row per (set, question)");
    assert_eq!(
        answers.get(&qid(1)),
        Some(&AnswerValue::Text("second".to_string()))
    );
}

async fn contract_answers_survive_other_writes(store: &dyn ResponseStore) {
    let set = sid(2);
    store
        .create_response_set(&ResponseSet::new(set, 1_700_000_000))
        .await
        .expect("create set");
    let original = AnswerValue::Text("  kept verbatim  ".to_string());
    store
        .upsert_answer(&set, &qid(1), &original)
        .await
        .expect("write");
    store
        .upsert_answer(&set, &qid(2), &AnswerValue::Bool(false))
        .await
        .expect("other write");

    let read_back = store
        .get_answer(&set, &qid(1))
        .await
        .expect("read")
        .expect("answer present");
    assert_eq!(
        serde_json::to_string(&read_back).expect("encode"),
        serde_json::to_string(&original).expect("encode"),
        "retained answer must be byte-identical"
    );
}

async fn contract_delete_answer(store: &dyn ResponseStore) {
    let set = sid(3);
    store
        .create_response_set(&ResponseSet::new(set, 1_700_000_000))
        .await
        .expect("create set");
    store
        .upsert_answer(&set, &qid(1), &AnswerValue::Number(2.0))
        .await
        .expect("write");
    assert!(store.delete_answer(&set, &qid(1)).await.expect("delete"));
    assert!(!store.delete_answer(&set, &qid(1)).await.expect("redelete"));
    assert_eq!(store.get_answer(&set, &qid(1)).await.expect("read"), None);
}

async fn contract_delete_set_cascades(store: &dyn ResponseStore) {
    let set = sid(4);
    store
        .create_response_set(&ResponseSet::new(set, 1_700_000_000))
        .await
        .expect("create set");
    store
        .upsert_answer(&set, &qid(1), &AnswerValue::Bool(true))
        .await
        .expect("write");
    store
        .put_idempotency(
            &set,
            "key-1",
            &IdempotencyRecord {
                body_sha256: "aa".to_string(),
                response_json: "{}".to_string(),
            },
        )
        .await
        .expect("record");

    assert!(store.delete_response_set(&set).await.expect("delete"));
    assert!(!store.delete_response_set(&set).await.expect("redelete"));
    assert_eq!(store.get_response_set(&set).await.expect("get"), None);
    assert!(store
        .answers_for_set(&set)
        .await
        .expect("answers")
        .is_empty());
    assert_eq!(
        store
            .get_idempotency(&set, "key-1")
            .await
            .expect("idempotency"),
        None
    );
}

async fn contract_idempotency_roundtrip(store: &dyn ResponseStore) {
    let set = sid(5);
    store
        .create_response_set(&ResponseSet::new(set, 1_700_000_000))
        .await
        .expect("create set");
    assert_eq!(
        store.get_idempotency(&set, "unseen").await.expect("get"),
        None
    );
    let record = IdempotencyRecord {
        body_sha256: "deadbeef".to_string(),
        response_json: r#"{"autosave_result":{}}"#.to_string(),
    };
    store
        .put_idempotency(&set, "key-a", &record)
        .await
        .expect("put");
    assert_eq!(
        store.get_idempotency(&set, "key-a").await.expect("get"),
        Some(record)
    );
}

async fn contract_questions_roundtrip(store: &dyn ResponseStore) {
    let mut with_rule = sample_question(2);
    with_rule.parent_question_id = Some(qid(1));
    with_rule.visible_if_value = Some(vec!["Yes".to_string()]);
    store
        .insert_question(&sample_question(1))
        .await
        .expect("insert");
    store.insert_question(&with_rule).await.expect("insert");

    let questions = store.list_questions().await.expect("list");
    assert_eq!(questions.len(), 2);
    let loaded = questions
        .iter()
        .find(|q| q.question_id == qid(2))
        .expect("question 2");
    assert_eq!(loaded.parent_question_id, Some(qid(1)));
    assert_eq!(loaded.visible_if_value, Some(vec!["Yes".to_string()]));
}

async fn run_contract(store: &dyn ResponseStore) {
    contract_upsert_updates_in_place(store).await;
    contract_answers_survive_other_writes(store).await;
    contract_delete_answer(store).await;
    contract_delete_set_cascades(store).await;
    contract_idempotency_roundtrip(store).await;
    contract_questions_roundtrip(store).await;
}

#[tokio::test]
async fn fake_store_satisfies_contract() {
    let store = FakeStore::default();
    run_contract(&store).await;
}

#[tokio::test]
async fn sqlite_store_satisfies_contract() {
    let dir = tempdir().expect("tempdir");
    let store = SqliteStore::open(&dir.path().join("canvass.sqlite")).expect("open");
    run_contract(&store).await;
}

#[tokio::test]
async fn sqlite_store_persists_across_reopen() {
    let dir = tempdir().expect("tempdir");
    let path = dir.path().join("canvass.sqlite");
    let set = sid(9);
    {
        let store = SqliteStore::open(&path).expect("open");
        store
            .create_response_set(&ResponseSet::new(set, 1_700_000_000))
            .await
            .expect("create set");
        store
            .upsert_answer(&set, &qid(1), &AnswerValue::Text("durable".to_string()))
            .await
            .expect("write");
    }
    let store = SqliteStore::open(&path).expect("reopen");
    assert_eq!(
        store.get_answer(&set, &qid(1)).await.expect("read"),
        Some(AnswerValue::Text("durable".to_string()))
    );
}

#[tokio::test]
async fn fake_store_surfaces_unavailability() {
    let store = FakeStore::default();
    store.set_unavailable(true);
    let err = store
        .answers_for_set(&sid(1))
        .await
        .expect_err("unavailable");
    assert_eq!(err.code, StoreErrorCode::Unavailable);
}
