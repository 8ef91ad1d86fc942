use std::fmt;
use std::sync::Arc;

use quiz_core::Score;
use quiz_core::model::{Question, QuestionBank};

use super::progress::QuizProgress;
use crate::error::SessionError;

//
// ─── TRANSITIONS ───────────────────────────────────────────────────────────────
//

/// Why a session refused an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Refusal {
    /// The session is already showing results.
    Completed,
    /// `advance` needs an answer for the current question first.
    Unanswered,
    /// `retreat` on the first question.
    AtFirstQuestion,
    /// The option does not exist on the current question.
    OptionOutOfRange { option: usize, len: usize },
    /// `jump_to` past the end of the session.
    QuestionOutOfRange { index: usize, len: usize },
    /// `jump_to_next_flagged` with nothing flagged.
    NoFlaggedQuestions,
}

impl fmt::Display for Refusal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Refusal::Completed => f.write_str("quiz already completed"),
            Refusal::Unanswered => f.write_str("select an answer first"),
            Refusal::AtFirstQuestion => f.write_str("already at the first question"),
            Refusal::OptionOutOfRange { option, len } => {
                write!(f, "option {option} does not exist ({len} options)")
            }
            Refusal::QuestionOutOfRange { index, len } => {
                write!(f, "question {} does not exist ({len} questions)", index + 1)
            }
            Refusal::NoFlaggedQuestions => f.write_str("no questions are flagged"),
        }
    }
}

/// Outcome of a session input. Refused inputs leave the state unchanged.
#[must_use]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    Applied,
    Refused(Refusal),
}

impl Transition {
    #[must_use]
    pub fn is_applied(self) -> bool {
        matches!(self, Transition::Applied)
    }

    #[must_use]
    pub fn refusal(self) -> Option<Refusal> {
        match self {
            Transition::Applied => None,
            Transition::Refused(r) => Some(r),
        }
    }
}

/// Coarse session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    InProgress { current: usize },
    Completed,
}

//
// ─── SNAPSHOT ──────────────────────────────────────────────────────────────────
//

/// Read-only view of the session handed to presenters.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionSnapshot<'a> {
    pub current_index: usize,
    pub len: usize,
    pub current_question: &'a Question,
    pub selected_answers: &'a [Option<usize>],
    pub flagged: &'a [bool],
    pub completed: bool,
    pub score: Option<Score>,
}

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Single-user quiz over a shared, read-only question bank.
///
/// Questions are answered in order; `advance` is refused until the current
/// question has an answer. Advancing past the last question completes the
/// session. `jump_to` and the flag helpers move freely for review, and
/// `submit` completes early. `reset` returns to the first question with no
/// answers and no flags.
#[derive(Clone)]
pub struct QuizSession {
    bank: Arc<QuestionBank>,
    current: usize,
    answers: Vec<Option<usize>>,
    flagged: Vec<bool>,
    completed: bool,
}

impl QuizSession {
    /// Start a session at the first question with no answers.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::EmptyBank` if the bank has no questions.
    pub fn new(bank: Arc<QuestionBank>) -> Result<Self, SessionError> {
        if bank.is_empty() {
            return Err(SessionError::EmptyBank);
        }
        let answers = vec![None; bank.len()];
        let flagged = vec![false; bank.len()];
        Ok(Self {
            bank,
            current: 0,
            answers,
            flagged,
            completed: false,
        })
    }

    #[must_use]
    pub fn bank(&self) -> &QuestionBank {
        &self.bank
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.answers.len()
    }

    /// Always false; empty banks are rejected at construction.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.answers.is_empty()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.bank.questions()[self.current]
    }

    /// Answer recorded for the current question, if any.
    #[must_use]
    pub fn current_answer(&self) -> Option<usize> {
        self.answers[self.current]
    }

    #[must_use]
    pub fn answer_for(&self, index: usize) -> Option<usize> {
        self.answers.get(index).copied().flatten()
    }

    #[must_use]
    pub fn selected_answers(&self) -> &[Option<usize>] {
        &self.answers
    }

    #[must_use]
    pub fn is_flagged(&self, index: usize) -> bool {
        self.flagged.get(index).copied().unwrap_or(false)
    }

    #[must_use]
    pub fn flagged(&self) -> &[bool] {
        &self.flagged
    }

    #[must_use]
    pub fn flagged_count(&self) -> usize {
        self.flagged.iter().filter(|f| **f).count()
    }

    /// Index `jump_to_next_flagged` would move to.
    ///
    /// From a flagged question this is the next flagged one after it,
    /// wrapping around; otherwise the first flagged question.
    #[must_use]
    pub fn next_flagged(&self) -> Option<usize> {
        if self.flagged[self.current] {
            let len = self.len();
            (1..=len)
                .map(|step| (self.current + step) % len)
                .find(|&i| self.flagged[i])
        } else {
            self.flagged.iter().position(|f| *f)
        }
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.completed
    }

    #[must_use]
    pub fn state(&self) -> SessionState {
        if self.completed {
            SessionState::Completed
        } else {
            SessionState::InProgress {
                current: self.current,
            }
        }
    }

    #[must_use]
    pub fn progress(&self) -> QuizProgress {
        let answered = self.answers.iter().filter(|a| a.is_some()).count();
        QuizProgress {
            total: self.len(),
            answered,
            remaining: self.len() - answered,
            position: self.current + 1,
            flagged: self.flagged_count(),
            is_complete: self.completed,
        }
    }

    /// Score of the recorded answers; `None` until completed.
    #[must_use]
    pub fn score(&self) -> Option<Score> {
        self.completed
            .then(|| Score::compute(&self.bank, &self.answers))
    }

    #[must_use]
    pub fn snapshot(&self) -> SessionSnapshot<'_> {
        SessionSnapshot {
            current_index: self.current,
            len: self.len(),
            current_question: self.current_question(),
            selected_answers: &self.answers,
            flagged: &self.flagged,
            completed: self.completed,
            score: self.score(),
        }
    }

    /// Record `option` for the current question, replacing any earlier choice.
    pub fn select_answer(&mut self, option: usize) -> Transition {
        if self.completed {
            return Transition::Refused(Refusal::Completed);
        }
        let len = self.current_question().option_count();
        if option >= len {
            return Transition::Refused(Refusal::OptionOutOfRange { option, len });
        }
        self.answers[self.current] = Some(option);
        log::debug!("question {} answered with option {option}", self.current);
        Transition::Applied
    }

    /// Move to the next question, or complete the session on the last one.
    pub fn advance(&mut self) -> Transition {
        if self.completed {
            return Transition::Refused(Refusal::Completed);
        }
        if self.answers[self.current].is_none() {
            return Transition::Refused(Refusal::Unanswered);
        }
        if self.current + 1 < self.len() {
            self.current += 1;
            log::debug!("advanced to question {}", self.current);
        } else {
            self.completed = true;
            log::debug!("quiz {} completed", self.bank.code());
        }
        Transition::Applied
    }

    /// Step back one question. Recorded answers are kept.
    pub fn retreat(&mut self) -> Transition {
        if self.completed {
            return Transition::Refused(Refusal::Completed);
        }
        if self.current == 0 {
            return Transition::Refused(Refusal::AtFirstQuestion);
        }
        self.current -= 1;
        log::debug!("moved back to question {}", self.current);
        Transition::Applied
    }

    /// Move straight to question `index`. Answers are not required.
    pub fn jump_to(&mut self, index: usize) -> Transition {
        if self.completed {
            return Transition::Refused(Refusal::Completed);
        }
        if index >= self.len() {
            return Transition::Refused(Refusal::QuestionOutOfRange {
                index,
                len: self.len(),
            });
        }
        self.current = index;
        log::debug!("jumped to question {index}");
        Transition::Applied
    }

    /// Flag or unflag the current question for review.
    pub fn toggle_flag(&mut self) -> Transition {
        if self.completed {
            return Transition::Refused(Refusal::Completed);
        }
        let flag = &mut self.flagged[self.current];
        *flag = !*flag;
        log::debug!("question {} flagged: {}", self.current, *flag);
        Transition::Applied
    }

    pub fn jump_to_next_flagged(&mut self) -> Transition {
        if self.completed {
            return Transition::Refused(Refusal::Completed);
        }
        match self.next_flagged() {
            Some(index) => self.jump_to(index),
            None => Transition::Refused(Refusal::NoFlaggedQuestions),
        }
    }

    /// Complete now, scoring unanswered questions as incorrect.
    pub fn submit(&mut self) -> Transition {
        if self.completed {
            return Transition::Refused(Refusal::Completed);
        }
        self.completed = true;
        log::debug!(
            "quiz {} submitted with {} unanswered",
            self.bank.code(),
            self.progress().remaining
        );
        Transition::Applied
    }

    /// Clear every answer and flag and restart from the first question.
    pub fn reset(&mut self) {
        self.answers.iter_mut().for_each(|a| *a = None);
        self.flagged.iter_mut().for_each(|f| *f = false);
        self.current = 0;
        self.completed = false;
        log::debug!("quiz {} reset", self.bank.code());
    }
}

impl fmt::Debug for QuizSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QuizSession")
            .field("bank", self.bank.code())
            .field("len", &self.answers.len())
            .field("current", &self.current)
            .field("flagged", &self.flagged_count())
            .field("completed", &self.completed)
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
