use chrono::Duration;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::model::question::Difficulty;

/// Upper bound for a pass threshold, in percent.
pub const MAX_PASS_THRESHOLD: u8 = 100;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum ExamConfigError {
    #[error("exam id cannot be empty")]
    EmptyExamId,

    #[error("exam must ask at least one question")]
    ZeroQuestions,

    #[error("pass threshold must be between 0 and 100, got {0}")]
    InvalidPassThreshold(u8),

    #[error("time limit must be > 0 seconds")]
    ZeroTimeLimit,

    #[error("difficulty mix must give at least one difficulty a weight")]
    EmptyDifficultyMix,

    #[error("an exam selects by categories or by difficulty mix, not both")]
    ConflictingSelection,
}

//
// ─── DIFFICULTY MIX ────────────────────────────────────────────────────────────
//

/// Relative weights of each difficulty in an exam, e.g. 40 / 45 / 15.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DifficultyMix {
    #[serde(default)]
    pub basic: u32,
    #[serde(default)]
    pub intermediate: u32,
    #[serde(default)]
    pub advanced: u32,
}

impl DifficultyMix {
    #[must_use]
    pub fn total(&self) -> u64 {
        u64::from(self.basic) + u64::from(self.intermediate) + u64::from(self.advanced)
    }

    /// Questions per difficulty for an exam of `count`.
    ///
    /// Basic and intermediate shares are rounded half up; advanced takes the
    /// remainder, so the quotas always sum to `count`.
    #[must_use]
    pub fn quotas(&self, count: usize) -> [(Difficulty, usize); 3] {
        let total = self.total();
        if total == 0 {
            return [
                (Difficulty::Basic, 0),
                (Difficulty::Intermediate, 0),
                (Difficulty::Advanced, 0),
            ];
        }
        let share = |weight: u32| {
            let n = u64::try_from(count).unwrap_or(u64::MAX);
            let rounded = (n * u64::from(weight) * 2 + total) / (total * 2);
            usize::try_from(rounded).unwrap_or(count).min(count)
        };
        let basic = share(self.basic);
        let intermediate = share(self.intermediate).min(count - basic);
        let advanced = count - basic - intermediate;
        [
            (Difficulty::Basic, basic),
            (Difficulty::Intermediate, intermediate),
            (Difficulty::Advanced, advanced),
        ]
    }
}

//
// ─── CONFIG ────────────────────────────────────────────────────────────────────
//

/// Mock exam settings as authored next to a question bank.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MockExamConfigDraft {
    pub exam_id: String,
    #[serde(rename = "examTitle")]
    pub title: String,
    pub total_questions: u32,
    /// Seconds; `None` means untimed.
    #[serde(default, rename = "timeLimit")]
    pub time_limit_secs: Option<u32>,
    pub pass_threshold: u8,
    #[serde(default)]
    pub categories: Vec<String>,
    #[serde(default)]
    pub difficulty_mix: Option<DifficultyMix>,
}

impl MockExamConfigDraft {
    /// # Errors
    ///
    /// Returns `ExamConfigError` for a blank id, zero questions, a zero time
    /// limit, a threshold above 100, an all-zero difficulty mix, or a mix
    /// combined with category balancing.
    pub fn validate(self) -> Result<MockExamConfig, ExamConfigError> {
        let exam_id = self.exam_id.trim().to_owned();
        if exam_id.is_empty() {
            return Err(ExamConfigError::EmptyExamId);
        }
        if self.total_questions == 0 {
            return Err(ExamConfigError::ZeroQuestions);
        }
        if self.time_limit_secs == Some(0) {
            return Err(ExamConfigError::ZeroTimeLimit);
        }
        if self.pass_threshold > MAX_PASS_THRESHOLD {
            return Err(ExamConfigError::InvalidPassThreshold(self.pass_threshold));
        }
        let categories: Vec<String> = self
            .categories
            .into_iter()
            .filter(|c| !c.trim().is_empty())
            .collect();
        if let Some(mix) = self.difficulty_mix {
            if mix.total() == 0 {
                return Err(ExamConfigError::EmptyDifficultyMix);
            }
            if !categories.is_empty() {
                return Err(ExamConfigError::ConflictingSelection);
            }
        }

        Ok(MockExamConfig {
            exam_id,
            title: self.title,
            total_questions: self.total_questions,
            time_limit_secs: self.time_limit_secs,
            pass_threshold: self.pass_threshold,
            categories,
            difficulty_mix: self.difficulty_mix,
        })
    }
}

/// Validated mock exam configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockExamConfig {
    exam_id: String,
    title: String,
    total_questions: u32,
    time_limit_secs: Option<u32>,
    pass_threshold: u8,
    categories: Vec<String>,
    difficulty_mix: Option<DifficultyMix>,
}

impl MockExamConfig {
    #[must_use]
    pub fn exam_id(&self) -> &str {
        &self.exam_id
    }

    #[must_use]
    pub fn title(&self) -> &str {
        &self.title
    }

    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn time_limit(&self) -> Option<Duration> {
        self.time_limit_secs.map(|s| Duration::seconds(i64::from(s)))
    }

    /// Minimum percentage needed to pass.
    #[must_use]
    pub fn pass_threshold(&self) -> u8 {
        self.pass_threshold
    }

    /// Categories to balance selection across; empty means plain random selection.
    #[must_use]
    pub fn categories(&self) -> &[String] {
        &self.categories
    }

    #[must_use]
    pub fn difficulty_mix(&self) -> Option<DifficultyMix> {
        self.difficulty_mix
    }
}
