//! Interactive quiz loop over line-based input.

use std::fmt;
use std::io::{self, BufRead, Write};

use chrono::{DateTime, Duration, Utc};
use services::quiz::{
    PresenterOptions, QuizSession, QuizView, ResultsView, ReviewFilter, Transition,
};
use services::{AttemptService, Clock, MockExam};

use crate::render::{format_duration, render_question, render_results};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// 1-based option number as typed.
    Choose(usize),
    Next,
    Previous,
    Restart,
    Quit,
    Flag,
    NextFlagged,
    /// 1-based question number as typed.
    GoTo(usize),
    Submit,
    Review(ReviewFilter),
    Unknown(String),
}

impl Input {
    pub fn parse(line: &str) -> Self {
        let trimmed = line.trim();
        let lower = trimmed.to_ascii_lowercase();
        let mut words = lower.split_whitespace();
        let command = words.next().unwrap_or("");
        let arg = words.next();
        if words.next().is_some() {
            return Self::Unknown(trimmed.to_owned());
        }

        let unknown = || Self::Unknown(trimmed.to_owned());
        match (command, arg) {
            ("n" | "next" | "", None) => Self::Next,
            ("p" | "prev" | "previous", None) => Self::Previous,
            ("r" | "restart", None) => Self::Restart,
            ("q" | "quit", None) => Self::Quit,
            ("f" | "flag", None) => Self::Flag,
            ("nf", None) => Self::NextFlagged,
            ("s" | "submit", None) => Self::Submit,
            ("v" | "view", None) => Self::Review(ReviewFilter::All),
            ("v" | "view", Some(name)) => name
                .parse::<ReviewFilter>()
                .map_or_else(|_| unknown(), Self::Review),
            ("g" | "go", Some(n)) => match n.parse::<usize>() {
                Ok(n) if n >= 1 => Self::GoTo(n),
                _ => unknown(),
            },
            (other, None) => match other.parse::<usize>() {
                Ok(n) if n >= 1 => Self::Choose(n),
                _ => unknown(),
            },
            _ => unknown(),
        }
    }
}

/// How the question phase of a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Completed,
    Quit,
}

/// What the user asked for on the results screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AfterResults {
    Restart,
    Quit,
}

fn prompt(lines: &mut impl Iterator<Item = io::Result<String>>, out: &mut impl Write) -> io::Result<Input> {
    write!(out, "> ")?;
    out.flush()?;
    match lines.next() {
        Some(line) => Ok(Input::parse(&line?)),
        None => Ok(Input::Quit),
    }
}

fn report(transition: Transition, out: &mut impl Write) -> io::Result<()> {
    if let Transition::Refused(refusal) = transition {
        writeln!(out, "({refusal})")?;
    }
    Ok(())
}

fn results_of(session: &QuizSession, options: PresenterOptions) -> Option<ResultsView> {
    match QuizView::from_session(session, options) {
        QuizView::Results(results) => Some(results),
        QuizView::Question(_) => None,
    }
}

/// Answer questions until the session completes or the user quits.
///
/// `started_at` moves to the restart time when the user restarts.
pub fn play_quiz(
    session: &mut QuizSession,
    options: PresenterOptions,
    clock: &Clock,
    started_at: &mut DateTime<Utc>,
    lines: &mut impl Iterator<Item = io::Result<String>>,
    out: &mut impl Write,
) -> io::Result<Outcome> {
    loop {
        let QuizView::Question(view) = QuizView::from_session(session, options) else {
            return Ok(Outcome::Completed);
        };
        render_question(&view, out)?;

        match prompt(lines, out)? {
            Input::Choose(n) => report(session.select_answer(n - 1), out)?,
            Input::Next => report(session.advance(), out)?,
            Input::Previous if options.show_previous => report(session.retreat(), out)?,
            Input::Previous => writeln!(out, "(going back is disabled)")?,
            Input::Restart if options.allow_restart => {
                session.reset();
                *started_at = clock.now();
            }
            Input::Restart => writeln!(out, "(this quiz cannot be restarted)")?,
            Input::Flag if options.exam_controls => report(session.toggle_flag(), out)?,
            Input::NextFlagged if options.exam_controls => {
                report(session.jump_to_next_flagged(), out)?;
            }
            Input::GoTo(n) if options.exam_controls => report(session.jump_to(n - 1), out)?,
            Input::Submit if options.exam_controls => report(session.submit(), out)?,
            Input::Flag | Input::NextFlagged | Input::GoTo(_) | Input::Submit => {
                writeln!(out, "(only available in a mock exam)")?;
            }
            Input::Review(_) => writeln!(out, "(results are not ready yet)")?,
            Input::Quit => return Ok(Outcome::Quit),
            Input::Unknown(raw) => writeln!(out, "(unrecognised input: {raw})")?,
        }
    }
}

/// Answer exam questions until the exam is submitted, times out, or the user quits.
pub fn play_exam(
    exam: &mut MockExam,
    options: PresenterOptions,
    clock: &Clock,
    lines: &mut impl Iterator<Item = io::Result<String>>,
    out: &mut impl Write,
) -> io::Result<Outcome> {
    loop {
        let now = clock.now();
        exam.poll(now);
        let QuizView::Question(view) = QuizView::from_session(exam.session(), options) else {
            if exam.result().is_some_and(|r| r.timed_out) {
                writeln!(out, "\nTime is up.")?;
            }
            return Ok(Outcome::Completed);
        };
        if let Some(left) = exam.remaining_time(now) {
            writeln!(out, "\nTime left: {}", format_duration(left))?;
        }
        render_question(&view, out)?;

        let command = prompt(lines, out)?;
        let now = clock.now();
        match command {
            Input::Choose(n) => report(exam.select_answer(n - 1, now), out)?,
            Input::Next => report(exam.advance(now), out)?,
            Input::Previous if options.show_previous => report(exam.retreat(now), out)?,
            Input::Previous => writeln!(out, "(going back is disabled)")?,
            Input::Restart => writeln!(out, "(a mock exam cannot be restarted)")?,
            Input::Flag => report(exam.toggle_flag(now), out)?,
            Input::NextFlagged => report(exam.jump_to_next_flagged(now), out)?,
            Input::GoTo(n) => report(exam.jump_to(n - 1, now), out)?,
            Input::Submit => report(exam.submit(now), out)?,
            Input::Review(_) => writeln!(out, "(results are not ready yet)")?,
            Input::Quit => return Ok(Outcome::Quit),
            Input::Unknown(raw) => writeln!(out, "(unrecognised input: {raw})")?,
        }
    }
}

/// Show results and let the user filter the review, restart, or quit.
pub fn review_results(
    results: &ResultsView,
    time_taken: Option<Duration>,
    lines: &mut impl Iterator<Item = io::Result<String>>,
    out: &mut impl Write,
) -> io::Result<AfterResults> {
    render_results(results, ReviewFilter::All, time_taken, out)?;
    loop {
        match prompt(lines, out)? {
            Input::Review(filter) => render_results(results, filter, time_taken, out)?,
            Input::Restart if results.can_restart => return Ok(AfterResults::Restart),
            Input::Restart => writeln!(out, "(a mock exam cannot be restarted)")?,
            Input::Quit => return Ok(AfterResults::Quit),
            Input::Unknown(raw) => writeln!(out, "(unrecognised input: {raw})")?,
            _ => writeln!(out, "(quiz already completed)")?,
        }
    }
}

/// Practice loop: play, record the attempt once per completion, review, and
/// go again on restart.
pub async fn run_practice(
    session: &mut QuizSession,
    options: PresenterOptions,
    clock: &Clock,
    attempts: &AttemptService,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    let mut lines = input.lines();
    let mut started_at = clock.now();
    loop {
        if play_quiz(session, options, clock, &mut started_at, &mut lines, out)? == Outcome::Quit {
            return Ok(());
        }
        let time_taken = clock.elapsed_since(started_at);
        record_or_warn(attempts.record(session, started_at).await);

        let Some(results) = results_of(session, options) else {
            return Ok(());
        };
        match review_results(&results, Some(time_taken), &mut lines, out)? {
            AfterResults::Restart => {
                session.reset();
                started_at = clock.now();
            }
            AfterResults::Quit => return Ok(()),
        }
    }
}

/// Mock exam run: play until finished, record the attempt, then review.
pub async fn run_exam(
    exam: &mut MockExam,
    show_previous: bool,
    clock: &Clock,
    attempts: &AttemptService,
    input: impl BufRead,
    out: &mut impl Write,
) -> io::Result<()> {
    let options = PresenterOptions::exam(show_previous, exam.config().pass_threshold());
    let mut lines = input.lines();
    if play_exam(exam, options, clock, &mut lines, out)? == Outcome::Quit {
        return Ok(());
    }
    record_or_warn(attempts.record_exam(exam).await);

    if let Some(results) = results_of(exam.session(), options) {
        let time_taken = exam.result().map(|r| r.time_taken);
        review_results(&results, time_taken, &mut lines, out)?;
    }
    Ok(())
}

fn record_or_warn<T, E: fmt::Display>(result: Result<T, E>) {
    if let Err(err) = result {
        log::warn!("attempt was not saved: {err}");
        eprintln!("warning: attempt was not saved: {err}");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use quiz_core::model::{BankCode, MockExamConfigDraft, QuestionBank, QuestionDraft};
    use quiz_core::time::{fixed_clock, fixed_now};
    use rand::SeedableRng;
    use rand::rngs::StdRng;
    use std::io::Cursor;
    use std::sync::Arc;

    fn bank() -> QuestionBank {
        let questions = vec![
            QuestionDraft::new(1, "Unit of current?", ["Ampere", "Volt"], 0)
                .validate()
                .unwrap(),
            QuestionDraft::new(2, "Unit of power?", ["Ohm", "Watt"], 1)
                .validate()
                .unwrap(),
        ];
        QuestionBank::new(BankCode::parse("units").unwrap(), "Units", questions).unwrap()
    }

    fn exam(time_limit_secs: Option<u32>) -> MockExam {
        let config = MockExamConfigDraft {
            exam_id: "units".into(),
            title: "Units".into(),
            total_questions: 2,
            time_limit_secs,
            pass_threshold: 50,
            categories: Vec::new(),
            difficulty_mix: None,
        }
        .validate()
        .unwrap();
        MockExam::start(&bank(), config, fixed_now(), &mut StdRng::seed_from_u64(1)).unwrap()
    }

    async fn practice(script: &str) -> (String, AttemptService) {
        let mut session = QuizSession::new(Arc::new(bank())).unwrap();
        let clock = fixed_clock();
        let attempts = AttemptService::in_memory(clock);
        let mut out = Vec::new();
        run_practice(
            &mut session,
            PresenterOptions::default(),
            &clock,
            &attempts,
            Cursor::new(script.to_owned()),
            &mut out,
        )
        .await
        .unwrap();
        (String::from_utf8(out).unwrap(), attempts)
    }

    #[test]
    fn parses_commands() {
        assert_eq!(Input::parse(" 2 "), Input::Choose(2));
        assert_eq!(Input::parse("N"), Input::Next);
        assert_eq!(Input::parse("previous"), Input::Previous);
        assert_eq!(Input::parse("r"), Input::Restart);
        assert_eq!(Input::parse("q"), Input::Quit);
        assert_eq!(Input::parse("f"), Input::Flag);
        assert_eq!(Input::parse("nf"), Input::NextFlagged);
        assert_eq!(Input::parse("g 3"), Input::GoTo(3));
        assert_eq!(Input::parse("s"), Input::Submit);
        assert_eq!(Input::parse("v"), Input::Review(ReviewFilter::All));
        assert_eq!(Input::parse("v Incorrect"), Input::Review(ReviewFilter::Incorrect));
        assert_eq!(Input::parse("v wrong"), Input::Unknown("v wrong".into()));
        assert_eq!(Input::parse("g 0"), Input::Unknown("g 0".into()));
        assert_eq!(Input::parse("0"), Input::Unknown("0".into()));
        assert_eq!(Input::parse("maybe"), Input::Unknown("maybe".into()));
    }

    #[tokio::test]
    async fn scripted_quiz_completes() {
        let (text, attempts) = practice("n\n1\nn\np\n1\nn\n1\nn\n").await;
        assert!(text.contains("(select an answer first)"));
        assert!(text.contains("Score: 1/2 (50%)"));
        assert!(text.contains("Time: 00:00"));
        assert_eq!(attempts.recent(bank().code(), 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn restart_after_results_plays_again() {
        let (text, attempts) = practice("1\nn\n1\nn\nr\n1\nn\n2\nn\nq\n").await;

        let first = text.find("Score: 1/2 (50%)").unwrap();
        let second = text.find("Score: 2/2 (100%)").unwrap();
        assert!(first < second);
        assert!(text.contains("r restart"));

        let rows = attempts.recent(bank().code(), 10).await.unwrap();
        let scores: Vec<u32> = rows.iter().map(|r| r.attempt.percentage()).collect();
        assert_eq!(scores, vec![100, 50]);
    }

    #[tokio::test]
    async fn review_filter_lists_only_matching_items() {
        let (text, _) = practice("1\nn\n1\nn\nv incorrect\nq\n").await;
        let filtered = &text[text.find("Review: incorrect").unwrap()..];
        assert!(filtered.contains("Unit of power?"));
        assert!(!filtered.contains("Unit of current?"));
    }

    #[tokio::test]
    async fn end_of_input_quits_without_recording() {
        let (text, attempts) = practice("1\n").await;
        assert!(!text.contains("Score:"));
        assert!(attempts.recent(bank().code(), 10).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn expired_exam_shows_results() {
        let mut exam = exam(Some(60));
        let mut clock = fixed_clock();
        clock.advance(Duration::minutes(5));
        let attempts = AttemptService::in_memory(clock);
        let mut out = Vec::new();

        run_exam(&mut exam, true, &clock, &attempts, Cursor::new(""), &mut out)
            .await
            .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.contains("Time is up."));
        assert!(text.contains("Result: FAIL"));
        assert_eq!(attempts.recent(bank().code(), 10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn exam_submits_early_and_refuses_restart() {
        let mut exam = exam(Some(600));
        let clock = fixed_clock();
        let attempts = AttemptService::in_memory(clock);
        let mut out = Vec::new();

        run_exam(
            &mut exam,
            true,
            &clock,
            &attempts,
            Cursor::new("f\ng 2\nnf\ns\nr\nv flagged\nq\n"),
            &mut out,
        )
        .await
        .unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(!text.contains("r restart"));
        assert!(text.contains("s submit"));
        assert!(text.contains("Score: 0/2 (0%)"));
        assert!(text.contains("(a mock exam cannot be restarted)"));
        assert!(text.contains("Review: flagged (1)"));
        assert_eq!(exam.session().flagged_count(), 1);
    }

    #[tokio::test]
    async fn exam_controls_are_refused_in_practice() {
        let (text, _) = practice("f\ns\nq\n").await;
        assert_eq!(text.matches("(only available in a mock exam)").count(), 2);
        assert!(!text.contains("f flag"));
    }
}
