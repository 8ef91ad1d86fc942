//! Pure scoring of recorded answers against a question bank.

use serde::Serialize;

use crate::model::QuestionBank;

/// Percentage of `correct` out of `total`, rounded half up.
///
/// Integer arithmetic: 2/3 → 67, 1/8 → 13. An empty total scores 0.
#[must_use]
pub fn round_percentage(correct: u32, total: u32) -> u32 {
    if total == 0 {
        return 0;
    }
    let correct = u64::from(correct.min(total));
    let total = u64::from(total);
    let pct = (correct * 200 + total) / (total * 2);
    // pct <= 100
    u32::try_from(pct).unwrap_or(100)
}

/// Correct-answer count for one category.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CategoryScore {
    pub category: String,
    pub correct: u32,
    pub total: u32,
}

impl CategoryScore {
    #[must_use]
    pub fn percentage(&self) -> u32 {
        round_percentage(self.correct, self.total)
    }
}

/// Result of scoring a set of answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Score {
    correct: u32,
    total: u32,
    percentage: u32,
    per_question: Vec<bool>,
    by_category: Vec<CategoryScore>,
}

impl Score {
    /// Score `answers` against `bank`.
    ///
    /// `answers[i]` is the option chosen for question `i`; `None` and missing
    /// entries count as incorrect. Extra entries past the bank are ignored.
    #[must_use]
    pub fn compute(bank: &QuestionBank, answers: &[Option<usize>]) -> Self {
        let per_question: Vec<bool> = bank
            .iter()
            .enumerate()
            .map(|(i, q)| {
                answers
                    .get(i)
                    .copied()
                    .flatten()
                    .is_some_and(|choice| q.is_correct(choice))
            })
            .collect();

        let mut by_category: Vec<CategoryScore> = Vec::new();
        for (q, is_correct) in bank.iter().zip(&per_question) {
            let Some(category) = q.category() else {
                continue;
            };
            let idx = match by_category.iter().position(|c| c.category == category) {
                Some(idx) => idx,
                None => {
                    by_category.push(CategoryScore {
                        category: category.to_owned(),
                        correct: 0,
                        total: 0,
                    });
                    by_category.len() - 1
                }
            };
            let entry = &mut by_category[idx];
            entry.total += 1;
            if *is_correct {
                entry.correct += 1;
            }
        }

        let total = u32::try_from(per_question.len()).unwrap_or(u32::MAX);
        let correct = u32::try_from(per_question.iter().filter(|c| **c).count()).unwrap_or(total);

        Self {
            correct,
            total,
            percentage: round_percentage(correct, total),
            per_question,
            by_category,
        }
    }

    /// Number of correctly answered questions.
    #[must_use]
    pub fn correct(&self) -> u32 {
        self.correct
    }

    #[must_use]
    pub fn total(&self) -> u32 {
        self.total
    }

    #[must_use]
    pub fn percentage(&self) -> u32 {
        self.percentage
    }

    /// `true` at `i` when question `i` was answered correctly.
    #[must_use]
    pub fn per_question(&self) -> &[bool] {
        &self.per_question
    }

    /// Per-category breakdown in first-appearance order. Uncategorised questions are skipped.
    #[must_use]
    pub fn by_category(&self) -> &[CategoryScore] {
        &self.by_category
    }

    #[must_use]
    pub fn passed(&self, threshold_percent: u8) -> bool {
        self.percentage >= u32::from(threshold_percent)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{BankCode, QuestionBank, QuestionDraft};

    fn bank(correct: &[usize]) -> QuestionBank {
        let questions = correct
            .iter()
            .enumerate()
            .map(|(i, c)| {
                let category = if i % 2 == 0 { "Testing" } else { "Regulations" };
                QuestionDraft::new(i as u64 + 1, format!("Q{i}"), ["a", "b", "c"], *c)
                    .with_category(category)
                    .validate()
                    .unwrap()
            })
            .collect();
        QuestionBank::new(BankCode::parse("score").unwrap(), "Score", questions).unwrap()
    }

    #[test]
    fn rounding_is_half_up() {
        assert_eq!(round_percentage(2, 3), 67);
        assert_eq!(round_percentage(1, 3), 33);
        assert_eq!(round_percentage(1, 8), 13);
        assert_eq!(round_percentage(1, 2), 50);
        assert_eq!(round_percentage(0, 0), 0);
        assert_eq!(round_percentage(5, 5), 100);
    }

    #[test]
    fn all_correct_scores_full_marks() {
        let b = bank(&[1, 0, 2]);
        let s = Score::compute(&b, &[Some(1), Some(0), Some(2)]);
        assert_eq!(s.correct(), 3);
        assert_eq!(s.percentage(), 100);
        assert_eq!(s.per_question(), &[true, true, true]);
    }

    #[test]
    fn one_wrong_rounds_to_67() {
        let b = bank(&[1, 0, 2]);
        let s = Score::compute(&b, &[Some(1), Some(1), Some(2)]);
        assert_eq!(s.correct(), 2);
        assert_eq!(s.percentage(), 67);
        assert_eq!(s.per_question(), &[true, false, true]);
    }

    #[test]
    fn unanswered_and_missing_count_as_wrong() {
        let b = bank(&[1, 0, 2]);
        let s = Score::compute(&b, &[Some(1), None]);
        assert_eq!(s.correct(), 1);
        assert_eq!(s.total(), 3);
        assert_eq!(s.per_question(), &[true, false, false]);
    }

    #[test]
    fn scoring_is_idempotent() {
        let b = bank(&[1, 0, 2, 1]);
        let answers = [Some(1), Some(2), Some(2), None];
        assert_eq!(Score::compute(&b, &answers), Score::compute(&b, &answers));
    }

    #[test]
    fn category_breakdown() {
        let b = bank(&[1, 0, 2, 1]);
        let s = Score::compute(&b, &[Some(1), Some(2), Some(2), Some(1)]);
        let cats = s.by_category();
        assert_eq!(cats.len(), 2);
        assert_eq!(cats[0].category, "Testing");
        assert_eq!((cats[0].correct, cats[0].total), (2, 2));
        assert_eq!((cats[1].correct, cats[1].total), (1, 2));
        assert_eq!(cats[1].percentage(), 50);
    }

    #[test]
    fn pass_threshold_is_inclusive() {
        let b = bank(&[0, 0, 0, 0, 0]);
        let s = Score::compute(&b, &[Some(0), Some(0), Some(0), Some(0), Some(1)]);
        assert_eq!(s.percentage(), 80);
        assert!(s.passed(80));
        assert!(!s.passed(81));
    }
}
