use rand::Rng;
use rand::seq::SliceRandom;

use quiz_core::model::{DifficultyMix, MockExamConfig, Question, QuestionBank};

use crate::error::ExamError;

/// Picks the questions for one mock exam sitting.
///
/// A difficulty mix takes precedence: each difficulty gets its weighted share.
/// With categories configured, each category gets an even share of the exam
/// (earlier categories take the remainder). Either way shortfalls are filled
/// from the rest of the bank. With neither the pick is uniformly random.
pub struct ExamBuilder<'a> {
    bank: &'a QuestionBank,
    config: &'a MockExamConfig,
}

impl<'a> ExamBuilder<'a> {
    #[must_use]
    pub fn new(bank: &'a QuestionBank, config: &'a MockExamConfig) -> Self {
        Self { bank, config }
    }

    /// Number of questions the exam will actually contain.
    #[must_use]
    pub fn exam_size(&self) -> usize {
        let wanted = usize::try_from(self.config.total_questions()).unwrap_or(usize::MAX);
        wanted.min(self.bank.len())
    }

    /// Build the exam bank. It keeps the source bank's code and title.
    ///
    /// # Errors
    ///
    /// Returns `ExamError::Bank` if the selected questions cannot form a bank.
    pub fn build<R: Rng + ?Sized>(self, rng: &mut R) -> Result<QuestionBank, ExamError> {
        let count = self.exam_size();
        let picked = match self.config.difficulty_mix() {
            Some(mix) => select_by_difficulty(self.bank, count, mix, rng),
            None if self.config.categories().is_empty() => select_random(self.bank, count, rng),
            None => select_balanced(self.bank, count, self.config.categories(), rng),
        };
        log::debug!(
            "selected {} of {} questions for {}",
            picked.len(),
            self.bank.len(),
            self.config.exam_id()
        );
        Ok(self.bank.with_questions(picked)?)
    }
}

/// Up to `count` distinct questions in random order.
pub fn select_random<R: Rng + ?Sized>(
    bank: &QuestionBank,
    count: usize,
    rng: &mut R,
) -> Vec<Question> {
    let mut pool: Vec<Question> = bank.questions().to_vec();
    pool.shuffle(rng);
    pool.truncate(count);
    pool
}

/// Up to `count` distinct questions spread evenly over `categories`.
pub fn select_balanced<R: Rng + ?Sized>(
    bank: &QuestionBank,
    count: usize,
    categories: &[String],
    rng: &mut R,
) -> Vec<Question> {
    let count = count.min(bank.len());
    if categories.is_empty() {
        return select_random(bank, count, rng);
    }

    let mut pools: Vec<Vec<Question>> = vec![Vec::new(); categories.len()];
    let mut rest: Vec<Question> = Vec::new();
    for q in bank {
        match q
            .category()
            .and_then(|c| categories.iter().position(|wanted| wanted == c))
        {
            Some(slot) => pools[slot].push(q.clone()),
            None => rest.push(q.clone()),
        }
    }

    let base = count / categories.len();
    let extra = count % categories.len();
    let mut selected = Vec::with_capacity(count);
    for (slot, pool) in pools.iter_mut().enumerate() {
        pool.shuffle(rng);
        let quota = base + usize::from(slot < extra);
        let take = quota.min(pool.len());
        selected.extend(pool.drain(..take));
        rest.append(pool);
    }

    if selected.len() < count {
        rest.shuffle(rng);
        let missing = count - selected.len();
        selected.extend(rest.into_iter().take(missing));
    }

    selected.shuffle(rng);
    selected
}

/// Up to `count` distinct questions weighted by difficulty.
///
/// Questions without a difficulty only fill shortfalls.
pub fn select_by_difficulty<R: Rng + ?Sized>(
    bank: &QuestionBank,
    count: usize,
    mix: DifficultyMix,
    rng: &mut R,
) -> Vec<Question> {
    let count = count.min(bank.len());
    let mut selected = Vec::with_capacity(count);
    let mut rest: Vec<Question> = Vec::new();

    for (difficulty, quota) in mix.quotas(count) {
        let mut pool: Vec<Question> = bank
            .iter()
            .filter(|q| q.difficulty() == Some(difficulty))
            .cloned()
            .collect();
        pool.shuffle(rng);
        let take = quota.min(pool.len());
        selected.extend(pool.drain(..take));
        rest.append(&mut pool);
    }
    rest.extend(bank.iter().filter(|q| q.difficulty().is_none()).cloned());

    if selected.len() < count {
        rest.shuffle(rng);
        let missing = count - selected.len();
        selected.extend(rest.into_iter().take(missing));
    }

    selected.shuffle(rng);
    selected
}
