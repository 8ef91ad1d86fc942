//! Plain-text rendering of quiz views.

use std::io::{self, Write};

use chrono::Duration;
use services::quiz::{QuestionView, ResultsView, ReviewFilter};
use storage::repository::AttemptRow;

pub fn render_question(view: &QuestionView, out: &mut impl Write) -> io::Result<()> {
    writeln!(out)?;
    let flag = if view.flagged { " [flagged]" } else { "" };
    match &view.section {
        Some(section) => writeln!(
            out,
            "Question {} of {} · {section}{flag}",
            view.position, view.total
        )?,
        None => writeln!(out, "Question {} of {}{flag}", view.position, view.total)?,
    }
    if view.exam_controls {
        let p = &view.progress;
        writeln!(
            out,
            "Answered {} · unanswered {} · flagged {}",
            p.answered, p.remaining, p.flagged
        )?;
    }
    writeln!(out, "{}", view.prompt)?;
    for option in &view.options {
        let marker = if option.selected { '*' } else { ' ' };
        writeln!(out, " {marker} {}. {}", option.index + 1, option.text)?;
    }

    let mut controls = vec![format!("1-{} choose", view.options.len())];
    if view.can_advance {
        controls.push(if view.is_last { "n finish" } else { "n next" }.to_owned());
    }
    if view.can_go_back {
        controls.push("p previous".to_owned());
    }
    if view.exam_controls {
        controls.push(if view.flagged { "f unflag" } else { "f flag" }.to_owned());
        if view.progress.flagged > 0 {
            controls.push("nf next flagged".to_owned());
        }
        controls.push(format!("g 1-{} go to", view.total));
        controls.push("s submit".to_owned());
    }
    if view.can_restart {
        controls.push("r restart".to_owned());
    }
    controls.push("q quit".to_owned());
    writeln!(out, "[{}]", controls.join(", "))
}

/// Score summary followed by the items `filter` keeps.
pub fn render_results(
    view: &ResultsView,
    filter: ReviewFilter,
    time_taken: Option<Duration>,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out)?;
    writeln!(
        out,
        "Score: {}/{} ({}%)",
        view.correct, view.total, view.percentage
    )?;
    match view.passed {
        Some(true) => writeln!(out, "Result: PASS")?,
        Some(false) => writeln!(out, "Result: FAIL")?,
        None => {}
    }
    if let Some(taken) = time_taken {
        writeln!(out, "Time: {}", format_duration(taken))?;
    }

    if !view.categories.is_empty() {
        writeln!(out)?;
        for category in &view.categories {
            writeln!(
                out,
                "  {:<32} {}/{} ({}%)",
                category.category,
                category.correct,
                category.total,
                category.percentage()
            )?;
        }
    }

    writeln!(out)?;
    writeln!(out, "Review: {filter} ({})", view.count(filter))?;
    let mut shown = 0;
    for item in view.filtered(filter) {
        shown += 1;
        let mark = if item.is_correct { "✓" } else { "✗" };
        let flag = if item.flagged { " [flagged]" } else { "" };
        writeln!(out, "{mark} {}. {}{flag}", item.position, item.prompt)?;
        if !item.is_correct {
            let selected = item.selected.as_deref().unwrap_or("(no answer)");
            writeln!(out, "    your answer: {selected}")?;
            writeln!(out, "    correct:     {}", item.correct_answer)?;
        }
        if let Some(explanation) = &item.explanation {
            writeln!(out, "    {explanation}")?;
        }
    }
    if shown == 0 {
        writeln!(out, "  nothing to show")?;
    }

    let filters: Vec<&str> = ReviewFilter::ALL.iter().map(|f| f.as_str()).collect();
    let mut controls = vec![format!("v <{}> review", filters.join("|"))];
    if view.can_restart {
        controls.push("r restart".to_owned());
    }
    controls.push("q quit".to_owned());
    writeln!(out, "[{}]", controls.join(", "))
}

pub fn format_duration(duration: Duration) -> String {
    let secs = duration.num_seconds().max(0);
    format!("{:02}:{:02}", secs / 60, secs % 60)
}

pub fn render_history(
    title: &str,
    rows: &[AttemptRow],
    best: Option<&AttemptRow>,
    out: &mut impl Write,
) -> io::Result<()> {
    writeln!(out, "{title}")?;
    if rows.is_empty() {
        return writeln!(out, "  no attempts yet");
    }
    for row in rows {
        let a = &row.attempt;
        writeln!(
            out,
            "  #{:<4} {}  {:>3}/{:<3} {:>3}%  {}",
            row.id,
            a.completed_at().format("%Y-%m-%d %H:%M"),
            a.correct(),
            a.total_questions(),
            a.percentage(),
            format_duration(a.time_taken())
        )?;
    }
    if let Some(best) = best {
        writeln!(
            out,
            "Best: {}% on {}",
            best.attempt.percentage(),
            best.attempt.completed_at().format("%Y-%m-%d")
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use services::quiz::{OptionView, QuizProgress, ResultItem};

    fn question(exam_controls: bool) -> QuestionView {
        QuestionView {
            position: 2,
            total: 3,
            prompt: "What is the unit of resistance?".into(),
            section: None,
            options: vec![
                OptionView { index: 0, text: "Ohm".into(), selected: true },
                OptionView { index: 1, text: "Volt".into(), selected: false },
            ],
            can_go_back: true,
            can_advance: true,
            is_last: false,
            flagged: exam_controls,
            can_restart: !exam_controls,
            exam_controls,
            progress: QuizProgress {
                total: 3,
                answered: 2,
                remaining: 1,
                position: 2,
                flagged: usize::from(exam_controls),
                is_complete: false,
            },
        }
    }

    fn render_q(view: &QuestionView) -> String {
        let mut out = Vec::new();
        render_question(view, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    fn render_r(view: &ResultsView, filter: ReviewFilter) -> String {
        let mut out = Vec::new();
        render_results(view, filter, Some(Duration::seconds(95)), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn question_shows_selection_and_controls() {
        let text = render_q(&question(false));
        assert!(text.contains("Question 2 of 3"));
        assert!(text.contains(" * 1. Ohm"));
        assert!(text.contains("   2. Volt"));
        assert!(text.contains("n next"));
        assert!(text.contains("p previous"));
        assert!(text.contains("r restart"));
        assert!(!text.contains("s submit"));
    }

    #[test]
    fn exam_question_lists_exam_controls_only() {
        let text = render_q(&question(true));
        assert!(text.contains("Question 2 of 3 [flagged]"));
        assert!(text.contains("Answered 2 · unanswered 1 · flagged 1"));
        assert!(text.contains("f unflag, nf next flagged, g 1-3 go to, s submit"));
        assert!(!text.contains("r restart"));
    }

    fn results() -> ResultsView {
        ResultsView {
            correct: 0,
            total: 1,
            percentage: 0,
            passed: Some(false),
            items: vec![ResultItem {
                position: 1,
                prompt: "What is the unit of resistance?".into(),
                selected: Some("Volt".into()),
                correct_answer: "Ohm".into(),
                is_correct: false,
                explanation: None,
                flagged: true,
            }],
            categories: Vec::new(),
            can_restart: false,
        }
    }

    #[test]
    fn results_show_wrong_answers() {
        let text = render_r(&results(), ReviewFilter::All);
        assert!(text.contains("Score: 0/1 (0%)"));
        assert!(text.contains("Result: FAIL"));
        assert!(text.contains("Time: 01:35"));
        assert!(text.contains("Review: all (1)"));
        assert!(text.contains("✗ 1. What is the unit of resistance? [flagged]"));
        assert!(text.contains("your answer: Volt"));
        assert!(text.contains("correct:     Ohm"));
        assert!(text.contains("[v <all|correct|incorrect|unanswered|flagged> review, q quit]"));
    }

    #[test]
    fn empty_review_says_so() {
        let text = render_r(&results(), ReviewFilter::Correct);
        assert!(text.contains("Review: correct (0)"));
        assert!(text.contains("nothing to show"));
        assert!(!text.contains("your answer"));
    }

    #[test]
    fn durations_are_minutes_and_seconds() {
        assert_eq!(format_duration(Duration::seconds(125)), "02:05");
        assert_eq!(format_duration(Duration::seconds(-3)), "00:00");
    }
}
