use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use quiz_core::Score;
use quiz_core::model::{MockExamConfig, QuestionBank};

use super::plan::ExamBuilder;
use crate::error::ExamError;
use crate::quiz::{QuizProgress, QuizSession, Refusal, Transition};

//
// ─── RESULT ────────────────────────────────────────────────────────────────────
//

/// Outcome of a finished mock exam.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExamResult {
    pub score: Score,
    pub passed: bool,
    pub time_taken: Duration,
    /// The time limit ran out before the last question was submitted.
    pub timed_out: bool,
}

//
// ─── MOCK EXAM ─────────────────────────────────────────────────────────────────
//

/// A timed quiz over a random selection of the bank.
///
/// Every input takes the current time explicitly. Once the time limit has
/// passed, the next input finishes the exam with whatever was answered and
/// is itself refused. `submit` finishes early; unanswered questions score
/// as incorrect.
#[derive(Debug, Clone)]
pub struct MockExam {
    config: MockExamConfig,
    session: QuizSession,
    started_at: DateTime<Utc>,
    finished_at: Option<DateTime<Utc>>,
    timed_out: bool,
}

impl MockExam {
    /// Select the exam questions and start the clock.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Session` if the bank has no questions to pick from.
    pub fn start<R: Rng + ?Sized>(
        bank: &QuestionBank,
        config: MockExamConfig,
        started_at: DateTime<Utc>,
        rng: &mut R,
    ) -> Result<Self, ExamError> {
        let questions = ExamBuilder::new(bank, &config).build(rng)?;
        let session = QuizSession::new(Arc::new(questions))?;
        log::info!(
            "started mock exam {} with {} questions",
            config.exam_id(),
            session.len()
        );
        Ok(Self {
            config,
            session,
            started_at,
            finished_at: None,
            timed_out: false,
        })
    }

    #[must_use]
    pub fn config(&self) -> &MockExamConfig {
        &self.config
    }

    #[must_use]
    pub fn session(&self) -> &QuizSession {
        &self.session
    }

    #[must_use]
    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    #[must_use]
    pub fn finished_at(&self) -> Option<DateTime<Utc>> {
        self.finished_at
    }

    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.finished_at.is_some()
    }

    #[must_use]
    pub fn deadline(&self) -> Option<DateTime<Utc>> {
        self.config.time_limit().map(|limit| self.started_at + limit)
    }

    /// Answered, unanswered (`remaining`) and flagged counts.
    #[must_use]
    pub fn summary(&self) -> QuizProgress {
        self.session.progress()
    }

    /// Time left on the clock; `None` for untimed exams.
    #[must_use]
    pub fn remaining_time(&self, now: DateTime<Utc>) -> Option<Duration> {
        let deadline = self.deadline()?;
        let end = self.finished_at.unwrap_or(now);
        Some((deadline - end).max(Duration::zero()))
    }

    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.deadline().is_some_and(|deadline| now >= deadline)
    }

    /// Finish the exam if the time limit has passed. Returns `true` if it is finished.
    pub fn poll(&mut self, now: DateTime<Utc>) -> bool {
        if self.finished_at.is_none() && self.is_expired(now) {
            let _ = self.session.submit();
            self.finished_at = self.deadline().map(|deadline| deadline.min(now));
            self.timed_out = true;
            log::warn!(
                "mock exam {} ran out of time with {} of {} answered",
                self.config.exam_id(),
                self.session.progress().answered,
                self.session.len()
            );
        }
        self.is_finished()
    }

    /// Apply `input` to the session unless the exam is over, and stamp the
    /// finish time if it completes the session.
    fn apply(
        &mut self,
        now: DateTime<Utc>,
        input: impl FnOnce(&mut QuizSession) -> Transition,
    ) -> Transition {
        if self.poll(now) {
            return Transition::Refused(Refusal::Completed);
        }
        let transition = input(&mut self.session);
        if transition.is_applied() && self.session.is_complete() {
            self.finished_at = Some(now);
            let summary = self.summary();
            log::info!(
                "mock exam {} submitted with {} answered, {} unanswered",
                self.config.exam_id(),
                summary.answered,
                summary.remaining
            );
        }
        transition
    }

    pub fn select_answer(&mut self, option: usize, now: DateTime<Utc>) -> Transition {
        self.apply(now, |s| s.select_answer(option))
    }

    pub fn advance(&mut self, now: DateTime<Utc>) -> Transition {
        self.apply(now, QuizSession::advance)
    }

    pub fn retreat(&mut self, now: DateTime<Utc>) -> Transition {
        self.apply(now, QuizSession::retreat)
    }

    pub fn jump_to(&mut self, index: usize, now: DateTime<Utc>) -> Transition {
        self.apply(now, |s| s.jump_to(index))
    }

    pub fn toggle_flag(&mut self, now: DateTime<Utc>) -> Transition {
        self.apply(now, QuizSession::toggle_flag)
    }

    pub fn jump_to_next_flagged(&mut self, now: DateTime<Utc>) -> Transition {
        self.apply(now, QuizSession::jump_to_next_flagged)
    }

    /// Finish before the time limit with whatever has been answered.
    pub fn submit(&mut self, now: DateTime<Utc>) -> Transition {
        self.apply(now, QuizSession::submit)
    }

    /// Score and verdict; `None` until the exam is finished.
    #[must_use]
    pub fn result(&self) -> Option<ExamResult> {
        let finished_at = self.finished_at?;
        let score = self.session.score()?;
        Some(ExamResult {
            passed: score.passed(self.config.pass_threshold()),
            score,
            time_taken: finished_at - self.started_at,
            timed_out: self.timed_out,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{BankCode, MockExamConfigDraft, QuestionDraft};
    use quiz_core::time::fixed_now;
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    fn bank(n: u64) -> QuestionBank {
        let questions = (1..=n)
            .map(|id| {
                QuestionDraft::new(id, format!("Q{id}"), ["right", "wrong"], 0)
                    .validate()
                    .unwrap()
            })
            .collect();
        QuestionBank::new(BankCode::parse("exam").unwrap(), "Exam", questions).unwrap()
    }

    fn config(total: u32, time_limit_secs: Option<u32>, pass: u8) -> MockExamConfig {
        MockExamConfigDraft {
            exam_id: "mock".into(),
            title: "Mock".into(),
            total_questions: total,
            time_limit_secs,
            pass_threshold: pass,
            categories: Vec::new(),
            difficulty_mix: None,
        }
        .validate()
        .unwrap()
    }

    fn start(total: u32, limit: Option<u32>, pass: u8) -> MockExam {
        let mut rng = StdRng::seed_from_u64(5);
        MockExam::start(&bank(10), config(total, limit, pass), fixed_now(), &mut rng).unwrap()
    }

    #[test]
    fn answering_everything_finishes_and_passes() {
        let mut exam = start(3, Some(600), 60);
        let mut now = fixed_now();
        for _ in 0..3 {
            now += Duration::seconds(10);
            assert!(exam.select_answer(0, now).is_applied());
            assert!(exam.advance(now).is_applied());
        }
        let result = exam.result().unwrap();
        assert_eq!(result.score.correct(), 3);
        assert!(result.passed);
        assert!(!result.timed_out);
        assert_eq!(result.time_taken, Duration::seconds(30));
        assert_eq!(exam.remaining_time(now), Some(Duration::seconds(570)));
    }

    #[test]
    fn expiry_finishes_with_partial_answers() {
        let mut exam = start(4, Some(60), 50);
        let now = fixed_now() + Duration::seconds(5);
        let _ = exam.select_answer(0, now);
        let _ = exam.advance(now);
        assert!(exam.result().is_none());

        let late = fixed_now() + Duration::seconds(90);
        assert_eq!(
            exam.select_answer(0, late),
            Transition::Refused(Refusal::Completed)
        );
        let result = exam.result().unwrap();
        assert!(result.timed_out);
        assert_eq!(result.score.correct(), 1);
        assert_eq!(result.score.total(), 4);
        assert!(!result.passed);
        assert_eq!(result.time_taken, Duration::seconds(60));
        assert_eq!(exam.remaining_time(late), Some(Duration::zero()));
    }

    #[test]
    fn untimed_exam_never_expires() {
        let mut exam = start(2, None, 50);
        let much_later = fixed_now() + Duration::days(2);
        assert!(!exam.poll(much_later));
        assert_eq!(exam.remaining_time(much_later), None);
        assert!(exam.select_answer(1, much_later).is_applied());
    }

    #[test]
    fn early_submit_scores_unanswered_as_wrong() {
        let mut exam = start(4, Some(600), 50);
        let now = fixed_now() + Duration::seconds(20);
        let _ = exam.select_answer(0, now);
        let _ = exam.toggle_flag(now);
        assert!(exam.jump_to(3, now).is_applied());
        let _ = exam.select_answer(1, now);

        let summary = exam.summary();
        assert_eq!((summary.answered, summary.remaining, summary.flagged), (2, 2, 1));

        assert!(exam.submit(now).is_applied());
        assert_eq!(exam.finished_at(), Some(now));
        let result = exam.result().unwrap();
        assert!(!result.timed_out);
        assert_eq!(result.score.correct(), 1);
        assert_eq!(result.score.total(), 4);
        assert_eq!(result.time_taken, Duration::seconds(20));
        assert_eq!(exam.submit(now), Transition::Refused(Refusal::Completed));
    }

    #[test]
    fn flag_navigation_is_refused_after_time_runs_out() {
        let mut exam = start(3, Some(60), 50);
        let now = fixed_now() + Duration::seconds(1);
        let _ = exam.toggle_flag(now);
        let _ = exam.jump_to(2, now);
        assert!(exam.jump_to_next_flagged(now).is_applied());
        assert_eq!(exam.session().current_index(), 0);

        let late = fixed_now() + Duration::seconds(61);
        assert_eq!(exam.toggle_flag(late), Transition::Refused(Refusal::Completed));
        assert!(exam.result().unwrap().timed_out);
    }

    #[test]
    fn exam_size_is_capped_by_bank() {
        let exam = start(50, Some(60), 50);
        assert_eq!(exam.session().len(), 10);
    }
}
