//! JSON question-bank files.
//!
//! Field names follow the authoring format of the course content
//! (`question`, `correctAnswer`, `examTitle`, ...).

use std::path::{Path, PathBuf};

use quiz_core::model::{
    BankCode, MockExamConfig, MockExamConfigDraft, QuestionBank, QuestionDraft, QuestionError,
    QuestionId,
};
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum BankFileError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed bank file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("question {id} is invalid: {source}")]
    Question {
        id: QuestionId,
        #[source]
        source: QuestionError,
    },

    #[error(transparent)]
    Invalid(#[from] quiz_core::Error),
}

#[derive(Debug, Deserialize)]
struct RawBankFile {
    code: String,
    title: String,
    #[serde(default)]
    exam: Option<MockExamConfigDraft>,
    questions: Vec<QuestionDraft>,
}

/// A validated bank file: the bank plus its optional mock exam settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BankFile {
    pub bank: QuestionBank,
    pub exam: Option<MockExamConfig>,
}

impl BankFile {
    /// Parse and validate a bank from JSON text.
    ///
    /// # Errors
    ///
    /// Returns `BankFileError::Json` for malformed JSON, `BankFileError::Question`
    /// naming the first invalid question, or `BankFileError::Invalid` for bank
    /// level problems (bad code, duplicate ids, bad exam settings).
    pub fn parse(json: &str) -> Result<Self, BankFileError> {
        let raw: RawBankFile = serde_json::from_str(json)?;

        let code = BankCode::parse(raw.code).map_err(quiz_core::Error::from)?;
        let mut questions = Vec::with_capacity(raw.questions.len());
        for draft in raw.questions {
            let id = draft.id;
            let question = draft
                .validate()
                .map_err(|source| BankFileError::Question { id, source })?;
            questions.push(question);
        }
        let bank = QuestionBank::new(code, raw.title, questions).map_err(quiz_core::Error::from)?;
        let exam = raw
            .exam
            .map(MockExamConfigDraft::validate)
            .transpose()
            .map_err(quiz_core::Error::from)?;

        Ok(Self { bank, exam })
    }

    /// Read and validate a bank file from disk.
    ///
    /// # Errors
    ///
    /// Returns `BankFileError::Io` if the file cannot be read, otherwise as [`BankFile::parse`].
    pub async fn load(path: impl AsRef<Path>) -> Result<Self, BankFileError> {
        let path = path.as_ref();
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| BankFileError::Io {
                path: path.to_path_buf(),
                source,
            })?;
        let file = Self::parse(&text)?;
        log::info!(
            "loaded bank {} ({} questions) from {}",
            file.bank.code(),
            file.bank.len(),
            path.display()
        );
        Ok(file)
    }
}
