mod progress;
mod session;
mod view;

// Public API of the quiz subsystem.
pub use crate::error::{SessionError, UnknownReviewFilter};
pub use progress::QuizProgress;
pub use session::{QuizSession, Refusal, SessionSnapshot, SessionState, Transition};
pub use view::{
    OptionView, PresenterOptions, QuestionView, QuizView, ResultItem, ResultsView, ReviewFilter,
};
