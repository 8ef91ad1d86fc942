#![forbid(unsafe_code)]

pub mod attempts;
pub mod error;
pub mod exam;
pub mod quiz;

pub use quiz_core::Clock;

pub use attempts::AttemptService;
pub use error::{AttemptServiceError, ExamError, SessionError};
pub use exam::{ExamResult, MockExam};
pub use quiz::{PresenterOptions, QuizSession, QuizView, Refusal, Transition};
