//! Shared error types for the services crate.

use thiserror::Error;

use quiz_core::model::{AttemptError, BankError};
use storage::repository::StorageError;

/// Errors emitted when starting a quiz session.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SessionError {
    #[error("question bank is empty")]
    EmptyBank,
}

/// A review filter name that is not one of `all`, `correct`, `incorrect`,
/// `unanswered` or `flagged`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("unknown review filter: {0}")]
pub struct UnknownReviewFilter(pub String);

/// Errors emitted while building a mock exam.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ExamError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Session(#[from] SessionError),
}

/// Errors emitted by `AttemptService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AttemptServiceError {
    #[error("session is not completed")]
    Incomplete,
    #[error(transparent)]
    Attempt(#[from] AttemptError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
