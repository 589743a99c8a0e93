// SPDX-License-Identifier: Apache-2.0

use crate::{IdempotencyRecord, ResponseStore, StoreError, StoreErrorCode};
use async_trait::async_trait;
use canvass_model::{
    AnswerKind, AnswerValue, Question, QuestionId, ResponseSet, ResponseSetId, ScreenKey,
};
use rusqlite::{params, Connection, OptionalExtension};
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

const SCHEMA: &str = "
CREATE TABLE IF NOT EXISTS questions (
    question_id        TEXT PRIMARY KEY,
    screen_key         TEXT NOT NULL,
    ord                INTEGER NOT NULL,
    label              TEXT NOT NULL,
    kind               TEXT NOT NULL,
    options_json       TEXT NOT NULL,
    parent_question_id TEXT,
    visible_if_json    TEXT
);
CREATE TABLE IF NOT EXISTS response_sets (
    response_set_id TEXT PRIMARY KEY,
    created_at_unix INTEGER NOT NULL
);
CREATE TABLE IF NOT EXISTS answers (
    response_set_id TEXT NOT NULL,
    question_id     TEXT NOT NULL,
    value_json      TEXT NOT NULL,
    PRIMARY KEY (response_set_id, question_id)
);
CREATE TABLE IF NOT EXISTS idempotency_records (
    response_set_id TEXT NOT NULL,
    idempotency_key TEXT NOT NULL,
    body_sha256     TEXT NOT NULL,
    response_json   TEXT NOT NULL,
    PRIMARY KEY (response_set_id, idempotency_key)
);
";

/// Durable backend over a single SQLite file. The connection is shared behind
/// a mutex; statements are short and never held across await points.
pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn open(path: &Path) -> Result<Self, StoreError> {
        let conn = Connection::open(path)
            .map_err(|e| StoreError::new(StoreErrorCode::Unavailable, e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        let conn = Connection::open_in_memory()
            .map_err(|e| StoreError::new(StoreErrorCode::Unavailable, e.to_string()))?;
        conn.execute_batch(SCHEMA)
            .map_err(|e| StoreError::new(StoreErrorCode::Io, e.to_string()))?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, StoreError> {
        self.conn
            .lock()
            .map_err(|_| StoreError::new(StoreErrorCode::Internal, "connection lock poisoned"))
    }
}

fn io_err(e: rusqlite::Error) -> StoreError {
    StoreError::new(StoreErrorCode::Io, e.to_string())
}

fn corrupt(message: impl Into<String>) -> StoreError {
    StoreError::new(StoreErrorCode::Corrupt, message)
}

fn decode_question(
    question_id: &str,
    screen_key: &str,
    ord: u32,
    label: String,
    kind: &str,
    options_json: &str,
    parent_question_id: Option<&str>,
    visible_if_json: Option<&str>,
) -> Result<Question, StoreError> {
    let question_id = QuestionId::parse(question_id)
        .map_err(|e| corrupt(format!("stored question_id: {e}")))?;
    let screen_key =
        ScreenKey::parse(screen_key).map_err(|e| corrupt(format!("stored screen_key: {e}")))?;
    let kind = AnswerKind::parse(kind).map_err(|e| corrupt(format!("stored kind: {e}")))?;
    let options: Vec<String> = serde_json::from_str(options_json)
        .map_err(|e| corrupt(format!("stored options: {e}")))?;
    let parent_question_id = parent_question_id
        .map(QuestionId::parse)
        .transpose()
        .map_err(|e| corrupt(format!("stored parent_question_id: {e}")))?;
    let visible_if_value: Option<Vec<String>> = visible_if_json
        .map(serde_json::from_str)
        .transpose()
        .map_err(|e| corrupt(format!("stored visible_if_value: {e}")))?;
    Ok(Question::new(
        question_id,
        screen_key,
        ord,
        label,
        kind,
        options,
        parent_question_id,
        visible_if_value,
    ))
}

#[async_trait]
impl ResponseStore for SqliteStore {
    fn backend_tag(&self) -> &'static str {
        "sqlite"
    }

    async fn list_questions(&self) -> Result<Vec<Question>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT question_id, screen_key, ord, label, kind, options_json,
                        parent_question_id, visible_if_json
                 FROM questions ORDER BY question_id",
            )
            .map_err(io_err)?;
        let rows = stmt
            .query_map([], |row| {
                Ok((
                    row.get::<_, String>(0)?,
                    row.get::<_, String>(1)?,
                    row.get::<_, u32>(2)?,
                    row.get::<_, String>(3)?,
                    row.get::<_, String>(4)?,
                    row.get::<_, String>(5)?,
                    row.get::<_, Option<String>>(6)?,
                    row.get::<_, Option<String>>(7)?,
                ))
            })
            .map_err(io_err)?;
        let mut out = Vec::new();
        for row in rows {
            let (id, screen, ord, label, kind, options, parent, visible_if) =
                row.map_err(io_err)?;
            out.push(decode_question(
                &id,
                &screen,
                ord,
                label,
                &kind,
                &options,
                parent.as_deref(),
                visible_if.as_deref(),
            )?);
        }
        Ok(out)
    }

    async fn insert_question(&self, question: &Question) -> Result<(), StoreError> {
        let options_json = serde_json::to_string(&question.options)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        let visible_if_json = question
            .visible_if_value
            .as_ref()
            .map(serde_json::to_string)
            .transpose()
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO questions
                 (question_id, screen_key, ord, label, kind, options_json,
                  parent_question_id, visible_if_json)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
            params![
                question.question_id.to_string(),
                question.screen_key.as_str(),
                question.order,
                question.label,
                question.kind.as_str(),
                options_json,
                question.parent_question_id.map(|id| id.to_string()),
                visible_if_json,
            ],
        )
        .map_err(io_err)?;
        Ok(())
    }

    async fn get_response_set(
        &self,
        id: &ResponseSetId,
    ) -> Result<Option<ResponseSet>, StoreError> {
        let conn = self.lock()?;
        let row = conn
            .query_row(
                "SELECT response_set_id, created_at_unix FROM response_sets
                 WHERE response_set_id = ?1",
                params![id.to_string()],
                |row| Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?)),
            )
            .optional()
            .map_err(io_err)?;
        match row {
            None => Ok(None),
            Some((raw_id, created_at_unix)) => {
                let response_set_id = ResponseSetId::parse(&raw_id)
                    .map_err(|e| corrupt(format!("stored response_set_id: {e}")))?;
                Ok(Some(ResponseSet::new(response_set_id, created_at_unix)))
            }
        }
    }

    async fn create_response_set(&self, set: &ResponseSet) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO response_sets (response_set_id, created_at_unix)
             VALUES (?1, ?2)",
            params![set.response_set_id.to_string(), set.created_at_unix],
        )
        .map_err(io_err)?;
        Ok(())
    }

    async fn delete_response_set(&self, id: &ResponseSetId) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let key = id.to_string();
        conn.execute(
            "DELETE FROM answers WHERE response_set_id = ?1",
            params![key],
        )
        .map_err(io_err)?;
        conn.execute(
            "DELETE FROM idempotency_records WHERE response_set_id = ?1",
            params![key],
        )
        .map_err(io_err)?;
        let deleted = conn
            .execute(
                "DELETE FROM response_sets WHERE response_set_id = ?1",
                params![key],
            )
            .map_err(io_err)?;
        Ok(deleted > 0)
    }

    async fn get_answer(
        &self,
        set: &ResponseSetId,
        question: &QuestionId,
    ) -> Result<Option<AnswerValue>, StoreError> {
        let conn = self.lock()?;
        let raw = conn
            .query_row(
                "SELECT value_json FROM answers
                 WHERE response_set_id = ?1 AND question_id = ?2",
                params![set.to_string(), question.to_string()],
                |row| row.get::<_, String>(0),
            )
            .optional()
            .map_err(io_err)?;
        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| corrupt(format!("stored answer: {e}")))
        })
        .transpose()
    }

    async fn upsert_answer(
        &self,
        set: &ResponseSetId,
        question: &QuestionId,
        value: &AnswerValue,
    ) -> Result<(), StoreError> {
        let value_json = serde_json::to_string(value)
            .map_err(|e| StoreError::new(StoreErrorCode::Internal, e.to_string()))?;
        let conn = self.lock()?;
        conn.execute(
            "INSERT INTO answers (response_set_id, question_id, value_json)
             VALUES (?1, ?2, ?3)
             ON CONFLICT (response_set_id, question_id)
             DO UPDATE SET value_json = excluded.value_json",
            params![set.to_string(), question.to_string(), value_json],
        )
        .map_err(io_err)?;
        Ok(())
    }

    async fn delete_answer(
        &self,
        set: &ResponseSetId,
        question: &QuestionId,
    ) -> Result<bool, StoreError> {
        let conn = self.lock()?;
        let deleted = conn
            .execute(
                "DELETE FROM answers WHERE response_set_id = ?1 AND question_id = ?2",
                params![set.to_string(), question.to_string()],
            )
            .map_err(io_err)?;
        Ok(deleted > 0)
    }

    async fn answers_for_set(
        &self,
        set: &ResponseSetId,
    ) -> Result<BTreeMap<QuestionId, AnswerValue>, StoreError> {
        let conn = self.lock()?;
        let mut stmt = conn
            .prepare(
                "SELECT question_id, value_json FROM answers
                 WHERE response_set_id = ?1 ORDER BY question_id",
            )
            .map_err(io_err)?;
        let rows = stmt
            .query_map(params![set.to_string()], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?))
            })
            .map_err(io_err)?;
        let mut out = BTreeMap::new();
        for row in rows {
            let (raw_id, json) = row.map_err(io_err)?;
            let question_id = QuestionId::parse(&raw_id)
                .map_err(|e| corrupt(format!("stored question_id: {e}")))?;
            let value: AnswerValue = serde_json::from_str(&json)
                .map_err(|e| corrupt(format!("stored answer: {e}")))?;
            out.insert(question_id, value);
        }
        Ok(out)
    }

    async fn get_idempotency(
        &self,
        set: &ResponseSetId,
        key: &str,
    ) -> Result<Option<IdempotencyRecord>, StoreError> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT body_sha256, response_json FROM idempotency_records
             WHERE response_set_id = ?1 AND idempotency_key = ?2",
            params![set.to_string(), key],
            |row| {
                Ok(IdempotencyRecord {
                    body_sha256: row.get(0)?,
                    response_json: row.get(1)?,
                })
            },
        )
        .optional()
        .map_err(io_err)
    }

    async fn put_idempotency(
        &self,
        set: &ResponseSetId,
        key: &str,
        record: &IdempotencyRecord,
    ) -> Result<(), StoreError> {
        let conn = self.lock()?;
        conn.execute(
            "INSERT OR REPLACE INTO idempotency_records
                 (response_set_id, idempotency_key, body_sha256, response_json)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                set.to_string(),
                key,
                record.body_sha256,
                record.response_json,
            ],
        )
        .map_err(io_err)?;
        Ok(())
    }
}
