use async_trait::async_trait;
use quiz_core::model::{AttemptId, BankCode, QuizAttempt};
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// A persisted attempt together with its storage id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttemptRow {
    pub id: AttemptId,
    pub attempt: QuizAttempt,
}

impl AttemptRow {
    #[must_use]
    pub fn new(id: AttemptId, attempt: QuizAttempt) -> Self {
        Self { id, attempt }
    }
}

/// Repository contract for completed quiz attempts.
#[async_trait]
pub trait AttemptRepository: Send + Sync {
    /// Append a completed attempt and return its id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the attempt cannot be stored.
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError>;

    /// Fetch an attempt by id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if missing, or other storage errors.
    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError>;

    /// Attempts for a bank, newest first.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on backend failures.
    async fn list_attempts(
        &self,
        bank_code: &BankCode,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError>;
}

/// Simple in-memory repository implementation for testing and prototyping.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    attempts: Arc<Mutex<Vec<AttemptRow>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AttemptRepository for InMemoryRepository {
    async fn append_attempt(&self, attempt: &QuizAttempt) -> Result<AttemptId, StorageError> {
        let mut guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let next = i64::try_from(guard.len())
            .map_err(|_| StorageError::Serialization("attempt id overflow".into()))?
            + 1;
        let id = AttemptId::new(next);
        guard.push(AttemptRow::new(id, attempt.clone()));
        Ok(id)
    }

    async fn get_attempt(&self, id: AttemptId) -> Result<QuizAttempt, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        guard
            .iter()
            .find(|row| row.id == id)
            .map(|row| row.attempt.clone())
            .ok_or(StorageError::NotFound)
    }

    async fn list_attempts(
        &self,
        bank_code: &BankCode,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, StorageError> {
        let guard = self
            .attempts
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))?;
        let mut rows: Vec<AttemptRow> = guard
            .iter()
            .filter(|row| row.attempt.bank_code() == bank_code)
            .cloned()
            .collect();
        rows.sort_by(|a, b| {
            b.attempt
                .completed_at()
                .cmp(&a.attempt.completed_at())
                .then(b.id.cmp(&a.id))
        });
        rows.truncate(usize::try_from(limit).unwrap_or(usize::MAX));
        Ok(rows)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub attempts: Arc<dyn AttemptRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let attempts: Arc<dyn AttemptRepository> = Arc::new(InMemoryRepository::new());
        Self { attempts }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use quiz_core::time::fixed_now;

    fn attempt(code: &str, minutes_ago: i64, correct: u32) -> QuizAttempt {
        let completed = fixed_now() - Duration::minutes(minutes_ago);
        let started = completed - Duration::minutes(5);
        let pct = quiz_core::scoring::round_percentage(correct, 4);
        QuizAttempt::from_persisted(BankCode::parse(code).unwrap(), started, completed, correct, 4, pct)
            .unwrap()
    }

    #[tokio::test]
    async fn append_and_get_round_trip() {
        let repo = InMemoryRepository::new();
        let a = attempt("coshh", 0, 3);
        let id = repo.append_attempt(&a).await.unwrap();
        assert_eq!(id, AttemptId::new(1));
        assert_eq!(repo.get_attempt(id).await.unwrap(), a);
        assert!(matches!(
            repo.get_attempt(AttemptId::new(9)).await,
            Err(StorageError::NotFound)
        ));
    }

    #[tokio::test]
    async fn list_filters_by_bank_and_orders_newest_first() {
        let repo = InMemoryRepository::new();
        repo.append_attempt(&attempt("coshh", 30, 1)).await.unwrap();
        repo.append_attempt(&attempt("first-aid", 20, 2)).await.unwrap();
        repo.append_attempt(&attempt("coshh", 10, 4)).await.unwrap();

        let code = BankCode::parse("coshh").unwrap();
        let rows = repo.list_attempts(&code, 10).await.unwrap();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].attempt.correct(), 4);
        assert_eq!(rows[1].attempt.correct(), 1);

        let limited = repo.list_attempts(&code, 1).await.unwrap();
        assert_eq!(limited.len(), 1);
        assert_eq!(limited[0].id, AttemptId::new(3));
    }
}
