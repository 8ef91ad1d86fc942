use std::collections::HashSet;
use thiserror::Error;

use crate::model::ids::{BankCode, QuestionId};
use crate::model::question::{Difficulty, Question};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("question index {index} is out of range for a bank of {len}")]
    IndexOutOfRange { index: usize, len: usize },

    #[error("duplicate question id {0}")]
    DuplicateId(QuestionId),

    #[error("bank title cannot be empty")]
    EmptyTitle,
}

//
// ─── BANK ──────────────────────────────────────────────────────────────────────
//

/// Ordered, immutable sequence of questions backing one quiz.
///
/// A bank may be empty as a value (filters can produce one); sessions refuse it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    code: BankCode,
    title: String,
    questions: Vec<Question>,
}

impl QuestionBank {
    /// Build a bank from already validated questions.
    ///
    /// # Errors
    ///
    /// Returns `BankError::EmptyTitle` for a blank title and
    /// `BankError::DuplicateId` if two questions share an id.
    pub fn new(
        code: BankCode,
        title: impl Into<String>,
        questions: Vec<Question>,
    ) -> Result<Self, BankError> {
        let title = title.into();
        if title.trim().is_empty() {
            return Err(BankError::EmptyTitle);
        }

        let mut seen = HashSet::with_capacity(questions.len());
        for q in &questions {
            if !seen.insert(q.id()) {
                return Err(BankError::DuplicateId(q.id()));
            }
        }

        Ok(Self {
            code,
            title,
            questions,
        })
    }

    #[must_use]
    pub fn code(&self) -> &BankCode {
        &self.code
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    /// Question at `index`.
    ///
    /// # Errors
    ///
    /// Returns `BankError::IndexOutOfRange` if `index >= len()`.
    pub fn get(&self, index: usize) -> Result<&Question, BankError> {
        self.questions.get(index).ok_or(BankError::IndexOutOfRange {
            index,
            len: self.questions.len(),
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    pub fn iter(&self) -> impl Iterator<Item = &Question> {
        self.questions.iter()
    }

    #[must_use]
    pub fn find(&self, id: QuestionId) -> Option<&Question> {
        self.questions.iter().find(|q| q.id() == id)
    }

    /// Distinct categories in first-appearance order.
    #[must_use]
    pub fn categories(&self) -> Vec<&str> {
        let mut seen = HashSet::new();
        self.questions
            .iter()
            .filter_map(Question::category)
            .filter(|c| seen.insert(*c))
            .collect()
    }

    #[must_use]
    pub fn by_section(&self, section: &str) -> Self {
        self.filtered(|q| q.section() == Some(section))
    }

    #[must_use]
    pub fn by_difficulty(&self, difficulty: Difficulty) -> Self {
        self.filtered(|q| q.difficulty() == Some(difficulty))
    }

    #[must_use]
    pub fn by_category(&self, category: &str) -> Self {
        self.filtered(|q| q.category() == Some(category))
    }

    /// New bank with the same code and title holding only `questions`.
    ///
    /// Used by exam selection, which draws from this bank and therefore
    /// cannot introduce duplicate ids unless the caller repeats a question.
    ///
    /// # Errors
    ///
    /// Returns `BankError::DuplicateId` if `questions` repeats an id.
    pub fn with_questions(&self, questions: Vec<Question>) -> Result<Self, BankError> {
        Self::new(self.code.clone(), self.title.clone(), questions)
    }

    fn filtered(&self, keep: impl Fn(&Question) -> bool) -> Self {
        Self {
            code: self.code.clone(),
            title: self.title.clone(),
            questions: self.questions.iter().filter(|q| keep(q)).cloned().collect(),
        }
    }
}

impl<'a> IntoIterator for &'a QuestionBank {
    type Item = &'a Question;
    type IntoIter = std::slice::Iter<'a, Question>;

    fn into_iter(self) -> Self::IntoIter {
        self.questions.iter()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
