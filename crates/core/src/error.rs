use thiserror::Error;

use crate::model::{AttemptError, BankCodeError, BankError, ExamConfigError, QuestionError};

/// Any domain validation failure raised by this crate.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    BankCode(#[from] BankCodeError),
    #[error(transparent)]
    ExamConfig(#[from] ExamConfigError),
    #[error(transparent)]
    Attempt(#[from] AttemptError),
}
