mod attempt;
mod bank;
mod exam;
mod ids;
mod question;

pub use ids::{AttemptId, BankCode, BankCodeError, ParseIdError, QuestionId};

pub use attempt::{AttemptError, QuizAttempt};
pub use bank::{BankError, QuestionBank};
pub use exam::{
    DifficultyMix, ExamConfigError, MAX_PASS_THRESHOLD, MockExamConfig, MockExamConfigDraft,
};
pub use question::{Difficulty, MIN_OPTIONS, Question, QuestionDraft, QuestionError};
