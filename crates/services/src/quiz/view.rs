use std::fmt;
use std::str::FromStr;

use quiz_core::CategoryScore;
use serde::Serialize;

use super::progress::QuizProgress;
use super::session::QuizSession;
use crate::error::UnknownReviewFilter;

/// Presenter switches that are not part of the session itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenterOptions {
    /// Offer a Previous control. Some quizzes only move forward.
    pub show_previous: bool,
    /// Percentage needed to pass; `None` hides pass/fail.
    pub pass_threshold: Option<u8>,
    /// Offer a Restart control. Mock exams cannot be restarted.
    pub allow_restart: bool,
    /// Offer flag, jump and early submit controls.
    pub exam_controls: bool,
}

impl Default for PresenterOptions {
    fn default() -> Self {
        Self {
            show_previous: true,
            pass_threshold: None,
            allow_restart: true,
            exam_controls: false,
        }
    }
}

impl PresenterOptions {
    /// Options for a practice quiz: restartable, no exam controls.
    #[must_use]
    pub fn practice(show_previous: bool, pass_threshold: Option<u8>) -> Self {
        Self {
            show_previous,
            pass_threshold,
            ..Self::default()
        }
    }

    /// Options for a mock exam: exam controls, no restart.
    #[must_use]
    pub fn exam(show_previous: bool, pass_threshold: u8) -> Self {
        Self {
            show_previous,
            pass_threshold: Some(pass_threshold),
            allow_restart: false,
            exam_controls: true,
        }
    }
}

/// Exactly one of the two screens a quiz can show.
///
/// Not tied to any UI toolkit: strings are plain
/// content and positions are 1-based for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "screen", rename_all = "snake_case")]
pub enum QuizView {
    Question(QuestionView),
    Results(ResultsView),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionView {
    pub index: usize,
    pub text: String,
    pub selected: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct QuestionView {
    pub position: usize,
    pub total: usize,
    pub prompt: String,
    pub section: Option<String>,
    pub options: Vec<OptionView>,
    pub can_go_back: bool,
    /// Next stays disabled until the question is answered.
    pub can_advance: bool,
    pub is_last: bool,
    pub flagged: bool,
    pub can_restart: bool,
    pub exam_controls: bool,
    pub progress: QuizProgress,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultItem {
    pub position: usize,
    pub prompt: String,
    pub selected: Option<String>,
    pub correct_answer: String,
    pub is_correct: bool,
    pub explanation: Option<String>,
    pub flagged: bool,
}

/// Which result items a review screen lists.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewFilter {
    #[default]
    All,
    Correct,
    Incorrect,
    Unanswered,
    Flagged,
}

impl ReviewFilter {
    pub const ALL: [ReviewFilter; 5] = [
        ReviewFilter::All,
        ReviewFilter::Correct,
        ReviewFilter::Incorrect,
        ReviewFilter::Unanswered,
        ReviewFilter::Flagged,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            ReviewFilter::All => "all",
            ReviewFilter::Correct => "correct",
            ReviewFilter::Incorrect => "incorrect",
            ReviewFilter::Unanswered => "unanswered",
            ReviewFilter::Flagged => "flagged",
        }
    }

    /// Unanswered items are neither correct nor incorrect.
    #[must_use]
    pub fn matches(self, item: &ResultItem) -> bool {
        match self {
            ReviewFilter::All => true,
            ReviewFilter::Correct => item.selected.is_some() && item.is_correct,
            ReviewFilter::Incorrect => item.selected.is_some() && !item.is_correct,
            ReviewFilter::Unanswered => item.selected.is_none(),
            ReviewFilter::Flagged => item.flagged,
        }
    }
}

impl fmt::Display for ReviewFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ReviewFilter {
    type Err = UnknownReviewFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|f| f.as_str() == wanted)
            .ok_or_else(|| UnknownReviewFilter(s.to_owned()))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResultsView {
    pub correct: u32,
    pub total: u32,
    pub percentage: u32,
    pub passed: Option<bool>,
    pub items: Vec<ResultItem>,
    pub categories: Vec<CategoryScore>,
    pub can_restart: bool,
}

impl ResultsView {
    pub fn filtered(&self, filter: ReviewFilter) -> impl Iterator<Item = &ResultItem> {
        self.items.iter().filter(move |item| filter.matches(item))
    }

    #[must_use]
    pub fn count(&self, filter: ReviewFilter) -> usize {
        self.filtered(filter).count()
    }
}

impl QuizView {
    #[must_use]
    pub fn from_session(session: &QuizSession, options: PresenterOptions) -> Self {
        match session.score() {
            Some(score) => {
                let items = session
                    .bank()
                    .iter()
                    .zip(score.per_question())
                    .enumerate()
                    .map(|(i, (q, is_correct))| ResultItem {
                        position: i + 1,
                        prompt: q.prompt().to_owned(),
                        selected: session
                            .answer_for(i)
                            .and_then(|o| q.option(o))
                            .map(str::to_owned),
                        correct_answer: q.correct_option().to_owned(),
                        is_correct: *is_correct,
                        explanation: q.explanation().map(str::to_owned),
                        flagged: session.is_flagged(i),
                    })
                    .collect();

                QuizView::Results(ResultsView {
                    correct: score.correct(),
                    total: score.total(),
                    percentage: score.percentage(),
                    passed: options.pass_threshold.map(|t| score.passed(t)),
                    items,
                    categories: score.by_category().to_vec(),
                    can_restart: options.allow_restart,
                })
            }
            None => {
                let q = session.current_question();
                let selected = session.current_answer();
                let index = session.current_index();
                QuizView::Question(QuestionView {
                    position: index + 1,
                    total: session.len(),
                    prompt: q.prompt().to_owned(),
                    section: q.section().map(str::to_owned),
                    options: q
                        .options()
                        .iter()
                        .enumerate()
                        .map(|(i, text)| OptionView {
                            index: i,
                            text: text.clone(),
                            selected: selected == Some(i),
                        })
                        .collect(),
                    can_go_back: options.show_previous && index > 0,
                    can_advance: selected.is_some(),
                    is_last: index + 1 == session.len(),
                    flagged: session.is_flagged(index),
                    can_restart: options.allow_restart,
                    exam_controls: options.exam_controls,
                    progress: session.progress(),
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{BankCode, QuestionBank, QuestionDraft};
    use std::sync::Arc;

    fn session() -> QuizSession {
        let questions = vec![
            QuestionDraft::new(1, "Which colour is the protective conductor?", ["Brown", "Green/yellow"], 1)
                .with_explanation("Green/yellow identifies the protective conductor.")
                .validate()
                .unwrap(),
            QuestionDraft::new(2, "What does RCD stand for?", ["Residual current device", "Rated current device"], 0)
                .validate()
                .unwrap(),
        ];
        let bank = QuestionBank::new(BankCode::parse("view").unwrap(), "View", questions).unwrap();
        QuizSession::new(Arc::new(bank)).unwrap()
    }

    #[test]
    fn question_view_highlights_selection_and_gates_next() {
        let mut s = session();
        let QuizView::Question(v) = QuizView::from_session(&s, PresenterOptions::default()) else {
            panic!("expected question view");
        };
        assert_eq!((v.position, v.total), (1, 2));
        assert!(!v.can_advance);
        assert!(!v.can_go_back);
        assert!(v.options.iter().all(|o| !o.selected));

        let _ = s.select_answer(1);
        let QuizView::Question(v) = QuizView::from_session(&s, PresenterOptions::default()) else {
            panic!("expected question view");
        };
        assert!(v.can_advance);
        assert!(v.options[1].selected);
        assert!(!v.is_last);
    }

    #[test]
    fn previous_is_a_presenter_option() {
        let mut s = session();
        let _ = s.select_answer(1);
        let _ = s.advance();

        let with = QuizView::from_session(&s, PresenterOptions::default());
        let without = QuizView::from_session(&s, PresenterOptions::practice(false, None));
        assert!(matches!(with, QuizView::Question(ref v) if v.can_go_back && v.is_last));
        assert!(matches!(without, QuizView::Question(ref v) if !v.can_go_back));
    }

    #[test]
    fn results_view_lists_every_question() {
        let mut s = session();
        let _ = s.select_answer(1);
        let _ = s.advance();
        let _ = s.select_answer(1);
        let _ = s.advance();

        let view = QuizView::from_session(&s, PresenterOptions::practice(true, Some(80)));
        let QuizView::Results(r) = view else {
            panic!("expected results view");
        };
        assert_eq!((r.correct, r.total, r.percentage), (1, 2, 50));
        assert_eq!(r.passed, Some(false));
        assert!(r.items[0].is_correct);
        assert_eq!(
            r.items[0].explanation.as_deref(),
            Some("Green/yellow identifies the protective conductor.")
        );
        assert!(!r.items[1].is_correct);
        assert_eq!(r.items[1].selected.as_deref(), Some("Rated current device"));
        assert_eq!(r.items[1].correct_answer, "Residual current device");
    }

    #[test]
    fn exam_options_hide_restart() {
        let mut s = session();
        let _ = s.toggle_flag();
        let QuizView::Question(v) = QuizView::from_session(&s, PresenterOptions::exam(true, 70))
        else {
            panic!("expected question view");
        };
        assert!(!v.can_restart);
        assert!(v.exam_controls);
        assert!(v.flagged);
        assert_eq!(v.progress.flagged, 1);

        let _ = s.submit();
        let QuizView::Results(r) = QuizView::from_session(&s, PresenterOptions::exam(true, 70))
        else {
            panic!("expected results view");
        };
        assert!(!r.can_restart);
        assert_eq!(r.passed, Some(false));
    }

    #[test]
    fn review_filter_splits_results() {
        let mut s = session();
        let _ = s.select_answer(1);
        let _ = s.toggle_flag();
        let _ = s.advance();
        let _ = s.submit();

        let QuizView::Results(r) = QuizView::from_session(&s, PresenterOptions::default()) else {
            panic!("expected results view");
        };
        assert!(r.can_restart);
        assert_eq!(r.count(ReviewFilter::All), 2);
        assert_eq!(r.count(ReviewFilter::Correct), 1);
        assert_eq!(r.count(ReviewFilter::Incorrect), 0);
        assert_eq!(r.count(ReviewFilter::Unanswered), 1);
        let flagged: Vec<_> = r.filtered(ReviewFilter::Flagged).map(|i| i.position).collect();
        assert_eq!(flagged, vec![1]);
    }

    #[test]
    fn review_filter_parses_names() {
        assert_eq!("Incorrect".parse::<ReviewFilter>(), Ok(ReviewFilter::Incorrect));
        assert_eq!(" flagged ".parse::<ReviewFilter>(), Ok(ReviewFilter::Flagged));
        assert_eq!(
            "wrong".parse::<ReviewFilter>(),
            Err(UnknownReviewFilter("wrong".into()))
        );
        assert_eq!(ReviewFilter::default().to_string(), "all");
    }

    #[test]
    fn views_serialize_with_screen_tag() {
        let s = session();
        let json = serde_json::to_value(QuizView::from_session(&s, PresenterOptions::default()))
            .unwrap();
        assert_eq!(json["screen"], "question");
        assert_eq!(json["position"], 1);
        assert_eq!(json["options"][1]["text"], "Green/yellow");
    }
}
