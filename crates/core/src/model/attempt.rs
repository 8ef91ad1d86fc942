use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::BankCode;
use crate::scoring::{Score, round_percentage};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum AttemptError {
    #[error("completed_at is before started_at")]
    InvalidTimeRange,

    #[error("attempt has no questions")]
    NoQuestions,

    #[error("score ({correct}) exceeds question count ({total})")]
    ScoreExceedsTotal { correct: u32, total: u32 },

    #[error("stored percentage {stored} does not match score (expected {expected})")]
    PercentageMismatch { stored: u32, expected: u32 },
}

/// Summary of one completed quiz session, kept after the session is gone.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuizAttempt {
    bank_code: BankCode,
    started_at: DateTime<Utc>,
    completed_at: DateTime<Utc>,
    correct: u32,
    total_questions: u32,
    percentage: u32,
}

impl QuizAttempt {
    /// Build an attempt from a computed score.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError::InvalidTimeRange` if `completed_at` is before `started_at`
    /// and `AttemptError::NoQuestions` for an empty score.
    pub fn from_score(
        bank_code: BankCode,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        score: &Score,
    ) -> Result<Self, AttemptError> {
        Self::from_persisted(
            bank_code,
            started_at,
            completed_at,
            score.correct(),
            score.total(),
            score.percentage(),
        )
    }

    /// Rehydrate an attempt from persisted storage.
    ///
    /// # Errors
    ///
    /// Returns `AttemptError` if the time range, counts or percentage are inconsistent.
    pub fn from_persisted(
        bank_code: BankCode,
        started_at: DateTime<Utc>,
        completed_at: DateTime<Utc>,
        correct: u32,
        total_questions: u32,
        percentage: u32,
    ) -> Result<Self, AttemptError> {
        if completed_at < started_at {
            return Err(AttemptError::InvalidTimeRange);
        }
        if total_questions == 0 {
            return Err(AttemptError::NoQuestions);
        }
        if correct > total_questions {
            return Err(AttemptError::ScoreExceedsTotal {
                correct,
                total: total_questions,
            });
        }
        let expected = round_percentage(correct, total_questions);
        if percentage != expected {
            return Err(AttemptError::PercentageMismatch {
                stored: percentage,
                expected,
            });
        }

        Ok(Self {
            bank_code,
            started_at,
            completed_at,
            correct,
            total_questions,
            percentage,
        })
    }

    #[must_use]
    pub fn bank_code(&self) -> &BankCode {
        &self.bank_code
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn completed_at(&self) -> DateTime<Utc> {
        self.completed_at
    }

    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    #[must_use]
    pub fn time_taken(&self) -> Duration {
        self.completed_at - self.started_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{QuestionBank, QuestionDraft};
    use crate::time::fixed_now;

    fn code() -> BankCode {
        BankCode::parse("level2-module1").unwrap()
    }

    #[test]
    fn attempt_from_score() {
        let questions = (0..3)
            .map(|i| {
                QuestionDraft::new(i, format!("Q{i}"), ["a", "b"], 0)
                    .validate()
                    .unwrap()
            })
            .collect();
        let bank = QuestionBank::new(code(), "Module 1", questions).unwrap();
        let score = Score::compute(&bank, &[Some(0), Some(1), Some(0)]);

        let now = fixed_now();
        let attempt =
            QuizAttempt::from_score(code(), now, now + Duration::seconds(95), &score).unwrap();

        assert_eq!(attempt.correct(), 2);
        assert_eq!(attempt.total_questions(), 3);
        assert_eq!(attempt.percentage(), 67);
        assert_eq!(attempt.time_taken(), Duration::seconds(95));
    }

    #[test]
    fn rejects_reversed_times() {
        let now = fixed_now();
        let err = QuizAttempt::from_persisted(code(), now, now - Duration::seconds(1), 1, 2, 50)
            .unwrap_err();
        assert_eq!(err, AttemptError::InvalidTimeRange);
    }

    #[test]
    fn rejects_inconsistent_counts() {
        let now = fixed_now();
        assert_eq!(
            QuizAttempt::from_persisted(code(), now, now, 4, 3, 100).unwrap_err(),
            AttemptError::ScoreExceedsTotal {
                correct: 4,
                total: 3
            }
        );
        assert_eq!(
            QuizAttempt::from_persisted(code(), now, now, 2, 3, 66).unwrap_err(),
            AttemptError::PercentageMismatch {
                stored: 66,
                expected: 67
            }
        );
        assert_eq!(
            QuizAttempt::from_persisted(code(), now, now, 0, 0, 0).unwrap_err(),
            AttemptError::NoQuestions
        );
    }
}
