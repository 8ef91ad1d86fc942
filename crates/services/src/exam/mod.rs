mod plan;
mod service;

// Public API of the mock exam subsystem.
pub use crate::error::ExamError;
pub use plan::{ExamBuilder, select_balanced, select_by_difficulty, select_random};
pub use service::{ExamResult, MockExam};
