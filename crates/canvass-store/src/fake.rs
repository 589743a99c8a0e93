// SPDX-License-Identifier: Apache-2.0

use crate::{IdempotencyRecord, ResponseStore, StoreError, StoreErrorCode};
use async_trait::async_trait;
use canvass_model::{AnswerValue, Question, QuestionId, ResponseSet, ResponseSetId};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::Mutex;

/// In-memory double with the same contract as the SQLite backend. The
/// `unavailable` knob makes every call fail, for infrastructure-error paths.
#[derive(Default)]
pub struct FakeStore {
    pub questions: Mutex<BTreeMap<QuestionId, Question>>,
    pub response_sets: Mutex<BTreeMap<ResponseSetId, ResponseSet>>,
    pub answers: Mutex<BTreeMap<(ResponseSetId, QuestionId), AnswerValue>>,
    pub idempotency: Mutex<BTreeMap<(ResponseSetId, String), IdempotencyRecord>>,
    pub unavailable: AtomicBool,
}

impl FakeStore {
    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            return Err(StoreError::new(
                StoreErrorCode::Unavailable,
                "store marked unavailable",
            ));
        }
        Ok(())
    }

    pub fn set_unavailable(&self, value: bool) {
        self.unavailable.store(value, Ordering::Relaxed);
    }
}

#[async_trait]
impl ResponseStore for FakeStore {
    fn backend_tag(&self) -> &'static str {
        "fake"
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        self.check_available()?;
        Ok(self.questions.lock().await.values().cloned().collect())
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        self.check_available()?;
        self.questions
            .lock()
            .await
            .insert(question.question_id, question.clone());
        Ok(())
    }

    async fn get_response_set(
        &self,
        id: &ResponseSetId,
    ) -> Result<Option<ResponseSet>, StoreError> {
        self.check_available()?;
        Ok(self.response_sets.lock().await.get(id).copied())
    }

    async fn create_response_set(&self, set: &ResponseSet) -> Result<(), StoreError> {
        self.check_available()?;
        self.response_sets
            .lock()
            .await
            .insert(set.response_set_id, *set);
        Ok(())
    }

    async fn delete_response_set(&self, id: &ResponseSetId) -> Result<bool, StoreError> {
        self.check_available()?;
        self.answers
            .lock()
            .await
            .retain(|(set, _), _| set != id);
        self.idempotency
            .lock()
            .await
            .retain(|(set, _), _| set != id);
        Ok(self.response_sets.lock().await.remove(id).is_some())
    }

    async fn get_answer(
        &self,
        set: &ResponseSetId,
        question: &QuestionId,
    ) -> Result<Option<AnswerValue>, StoreError> {
        self.check_available()?;
        Ok(self.answers.lock().await.get(&(*set, *question)).cloned())
    }

    async fn upsert_answer(
        &self,
        set: &ResponseSetId,
        question: &QuestionId,
        value: &AnswerValue,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        self.answers
            .lock()
            .await
            .insert((*set, *question), value.clone());
        Ok(())
    }

    async fn delete_answer(
        &self,
        set: &ResponseSetId,
        question: &QuestionId,
    ) -> Result<bool, StoreError> {
        self.check_available()?;
        Ok(self.answers.lock().await.remove(&(*set, *question)).is_some())
    }

    async fn answers_for_set(
        &self,
        set: &ResponseSetId,
    ) -> Result<BTreeMap<QuestionId, AnswerValue>, StoreError> {
        self.check_available()?;
        Ok(self
            .answers
            .lock()
            .await
            .iter()
            .filter(|((s, _), _)| s == set)
            .map(|((_, q), v)| (*q, v.clone()))
            .collect())
    }

    async fn get_idempotency(
        &self,
        set: &ResponseSetId,
        key: &str,
    ) -> Result<Option<IdempotencyRecord>, StoreError> {
        self.check_available()?;
        Ok(self
            .idempotency
            .lock()
            .await
            .get(&(*set, key.to_string()))
            .cloned())
    }

    async fn put_idempotency(
        &self,
        set: &ResponseSetId,
        key: &str,
        record: &IdempotencyRecord,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        self.idempotency
            .lock()
            .await
            .insert((*set, key.to_string()), record.clone());
        Ok(())
    }
}
