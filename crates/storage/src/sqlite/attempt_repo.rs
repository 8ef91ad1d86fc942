use quiz_core::model::{AttemptId, BankCode, QuizAttempt};
use sqlx::Row;

use super::SqliteRepository;
use crate::repository::{AttemptRepository, AttemptRow, StorageError};

fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

fn u32_from_i64(field: &'static str, v: i64) -> Result<u32, StorageError> {
    u32::try_from(v).map_err(|_| StorageError::Serialization(format!("invalid {field}: {v}")))
}

fn map_attempt_row(row: &sqlx::sqlite::SqliteRow) -> Result<QuizAttempt, StorageError> {
    let bank_code = BankCode::parse(row.try_get::<String, _>("bank_code").map_err(ser)?)
        .map_err(ser)?;
    let started_at = row.try_get("started_at").map_err(ser)?;
    let completed_at = row.try_get("completed_at").map_err(ser)?;
    let score = u32_from_i64("score", row.try_get::<i64, _>("score").map_err(ser)?)?;
    let total = u32_from_i64(
        "total_questions",
        row.try_get::<i64, _>("total_questions").map_err(ser)?,
    )?;
    let percentage = u32_from_i64(
        "percentage",
        row.try_get::<i64, _>("percentage").map_err(ser)?,
    )?;

    QuizAttempt::from_persisted(bank_code, started_at, completed_at, score, total, percentage)
        .map_err(ser)
}

fn map_attempt_row_with_id(row: &sqlx::sqlite::SqliteRow) -> Result<AttemptRow, StorageError> {
    let id: i64 = row.try_get("id").map_err(ser)?;
    let attempt = map_attempt_row(row)?;
    Ok(AttemptRow::new(AttemptId::new(id), attempt))
}

#[async_trait::async_trait]
impl AttemptRepository for SqliteRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError> {
        let res = sqlx::query(
            r"
                INSERT INTO quiz_attempts (
                    bank_code, started_at, completed_at, score,
                    total_questions, percentage, time_taken_secs
                )
                VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
            ",
        )
        .bind(attempt.bank_code().as_str())
        .bind(attempt.started_at())
        .bind(attempt.completed_at())
        .bind(i64::from(attempt.correct()))
        .bind(i64::from(attempt.total_questions()))
        .bind(i64::from(attempt.percentage()))
        .bind(attempt.time_taken().num_seconds())
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        Ok(AttemptId::new(res.last_insert_rowid()))
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError> {
        let row = sqlx::query(
            r"
                SELECT
                    bank_code, started_at, completed_at, score,
                    total_questions, percentage
                FROM quiz_attempts
                WHERE id = ?1
            ",
        )
        .bind(id.value())
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?
        .ok_or(StorageError::NotFound)?;

        map_attempt_row(&row)
    }

    async fn list_attempts(
        &self,
        bank_code: &BankCode,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let rows = sqlx::query(
            r"
                SELECT
                    id, bank_code, started_at, completed_at, score,
                    total_questions, percentage
                FROM quiz_attempts
                WHERE bank_code = ?1
                ORDER BY completed_at DESC, id DESC
                LIMIT ?2
            ",
        )
        .bind(bank_code.as_str())
        .bind(i64::from(limit))
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut out = Vec::with_capacity(rows.len());
        for row in rows {
            out.push(map_attempt_row_with_id(&row)?);
        }
        Ok(out)
    }
}
