use std::sync::Arc;

use chrono::{DateTime, Utc};

use quiz_core::{
    model::{AttemptId, BankCode, QuizAttempt},
    time::Clock,
};
use storage::repository::{AttemptRepository, AttemptRow, InMemoryRepository};

use crate::error::AttemptServiceError;
use crate::exam::MockExam;
use crate::quiz::QuizSession;

/// Records finished quizzes and answers history queries.
#[derive(Clone)]
pub struct AttemptService {
    clock: Clock,
    attempts: Arc<dyn AttemptRepository>,
}

impl AttemptService {
    #[must_use]
    pub fn new(clock: Clock, attempts: Arc<dyn AttemptRepository>) -> Self {
        Self { clock, attempts }
    }

    /// Service backed by an in-memory repository.
    #[must_use]
    pub fn in_memory(clock: Clock) -> Self {
        Self::new(clock, Arc::new(InMemoryRepository::new()))
    }

    #[must_use]
    pub fn clock(&self) -> Clock {
        self.clock
    }

    /// Persist a completed session. The completion time is taken from the clock.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Incomplete` if the session has not been completed,
    /// `AttemptServiceError::Attempt` if the timestamps are inconsistent, or a storage error.
    pub async fn record(
        &self,
        session: &QuizSession,
        started_at: DateTime<Utc>,
    ) -> Result<AttemptId, AttemptServiceError> {
        let score = session.score().ok_or(AttemptServiceError::Incomplete)?;
        let attempt = QuizAttempt::from_score(
            session.bank().code().clone(),
            started_at,
            self.clock.now(),
            &score,
        )?;
        self.append(&attempt).await
    }

    /// Persist a finished mock exam, using the exam's own start and finish times.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Incomplete` if the exam is still running, or a storage error.
    pub async fn record_exam(&self, exam: &MockExam) -> Result<AttemptId, AttemptServiceError> {
        let finished_at = exam.finished_at().ok_or(AttemptServiceError::Incomplete)?;
        let score = exam
            .session()
            .score()
            .ok_or(AttemptServiceError::Incomplete)?;
        let attempt = QuizAttempt::from_score(
            exam.session().bank().code().clone(),
            exam.started_at(),
            finished_at,
            &score,
        )?;
        self.append(&attempt).await
    }

    async fn append(&self, attempt: &QuizAttempt) -> Result<AttemptId, AttemptServiceError> {
        let id = self.attempts.append_attempt(attempt).await?;
        log::info!(
            "recorded attempt {id} for {}: {}/{} ({}%)",
            attempt.bank_code(),
            attempt.correct(),
            attempt.total_questions(),
            attempt.percentage()
        );
        Ok(id)
    }

    /// Most recent attempts for a bank, newest first.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` on repository failures.
    pub async fn recent(
        &self,
        bank_code: &BankCode,
        limit: u32,
    ) -> Result<Vec<AttemptRow>, AttemptServiceError> {
        Ok(self.attempts.list_attempts(bank_code, limit).await?)
    }

    /// Highest-scoring attempt for a bank. Ties go to the most recent.
    ///
    /// # Errors
    ///
    /// Returns `AttemptServiceError::Storage` on repository failures.
    pub async fn best(
        &self,
        bank_code: &BankCode,
    ) -> Result<Option<AttemptRow>, AttemptServiceError> {
        let rows = self.attempts.list_attempts(bank_code, u32::MAX).await?;
        Ok(rows
            .into_iter()
            .rev()
            .max_by_key(|row| row.attempt.percentage()))
    }
}
