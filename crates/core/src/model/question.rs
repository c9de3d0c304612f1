use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::{OptionId, QuestionId};

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum QuestionError {
    #[error("question text cannot be empty")]
    EmptyText,

    #[error("question subject cannot be empty")]
    EmptySubject,

    #[error("a question needs at least {min} options, got {got}")]
    TooFewOptions { min: usize, got: usize },

    #[error("a question allows at most {max} options, got {got}")]
    TooManyOptions { max: usize, got: usize },

    #[error("option {index} has no text")]
    EmptyOption { index: usize },

    #[error("exactly one option must be correct, found {found}")]
    CorrectOptionCount { found: usize },

    #[error("unknown difficulty: {0}")]
    UnknownDifficulty(String),

    #[error("unknown question status: {0}")]
    UnknownStatus(String),
}

//
// ─── ENUMS ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Difficulty::Easy => "easy",
            Difficulty::Medium => "medium",
            Difficulty::Hard => "hard",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Difficulty {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "easy" => Ok(Self::Easy),
            "medium" => Ok(Self::Medium),
            "hard" => Ok(Self::Hard),
            other => Err(QuestionError::UnknownDifficulty(other.to_owned())),
        }
    }
}

/// Lifecycle of a question in the catalogue. Only active questions are practiced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionStatus {
    #[default]
    Active,
    Archived,
    UnderReview,
}

impl QuestionStatus {
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionStatus::Active => "active",
            QuestionStatus::Archived => "archived",
            QuestionStatus::UnderReview => "under_review",
        }
    }
}

impl fmt::Display for QuestionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuestionStatus {
    type Err = QuestionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "active" => Ok(Self::Active),
            "archived" => Ok(Self::Archived),
            "under_review" => Ok(Self::UnderReview),
            other => Err(QuestionError::UnknownStatus(other.to_owned())),
        }
    }
}

//
// ─── QUESTION ──────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: OptionId,
    pub text: String,
    pub is_correct: bool,
}

impl QuestionOption {
    #[must_use]
    pub fn new(id: impl Into<OptionId>, text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            is_correct,
        }
    }
}

/// A multiple-choice question.
///
/// Loaded questions are trusted as-is; the single-correct-option rule is only
/// enforced for new questions going through [`QuestionDraft::validate`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Question {
    pub id: QuestionId,
    pub text: String,
    pub options: Vec<QuestionOption>,
    pub explanation: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub subject: String,
    pub source: String,
    pub status: QuestionStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Question {
    #[must_use]
    pub fn option(&self, id: &OptionId) -> Option<&QuestionOption> {
        self.options.iter().find(|o| &o.id == id)
    }

    #[must_use]
    pub fn has_option(&self, id: &OptionId) -> bool {
        self.option(id).is_some()
    }

    /// First option flagged correct, if any.
    #[must_use]
    pub fn correct_option(&self) -> Option<&QuestionOption> {
        self.options.iter().find(|o| o.is_correct)
    }

    /// True when `selected` names an option of this question that is correct.
    #[must_use]
    pub fn is_correct(&self, selected: &OptionId) -> bool {
        self.option(selected).is_some_and(|o| o.is_correct)
    }

    #[must_use]
    pub fn is_active(&self) -> bool {
        self.status == QuestionStatus::Active
    }

    #[must_use]
    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t.eq_ignore_ascii_case(tag))
    }
}

//
// ─── DRAFT ─────────────────────────────────────────────────────────────────────
//

/// Unvalidated option as entered by an administrator.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionDraft {
    pub text: String,
    pub is_correct: bool,
}

impl OptionDraft {
    #[must_use]
    pub fn new(text: impl Into<String>, is_correct: bool) -> Self {
        Self {
            text: text.into(),
            is_correct,
        }
    }
}

/// Input for a new question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDraft {
    pub text: String,
    pub options: Vec<OptionDraft>,
    pub explanation: String,
    pub difficulty: Difficulty,
    pub tags: Vec<String>,
    pub subject: String,
    pub source: String,
}

impl QuestionDraft {
    pub const MIN_OPTIONS: usize = 2;
    /// One option per letter `a`..`z`.
    pub const MAX_OPTIONS: usize = 26;

    /// Validate the draft and assign ids, producing an active question.
    ///
    /// Tags are trimmed, blanks dropped and duplicates removed (first wins).
    ///
    /// # Errors
    ///
    /// Returns `QuestionError` when text, subject or options are invalid.
    pub fn validate(self, id: QuestionId, now: DateTime<Utc>) -> Result<Question, QuestionError> {
        let text = self.text.trim();
        if text.is_empty() {
            return Err(QuestionError::EmptyText);
        }
        let subject = self.subject.trim();
        if subject.is_empty() {
            return Err(QuestionError::EmptySubject);
        }
        if self.options.len() < Self::MIN_OPTIONS {
            return Err(QuestionError::TooFewOptions {
                min: Self::MIN_OPTIONS,
                got: self.options.len(),
            });
        }
        if self.options.len() > Self::MAX_OPTIONS {
            return Err(QuestionError::TooManyOptions {
                max: Self::MAX_OPTIONS,
                got: self.options.len(),
            });
        }
        if let Some(index) = self.options.iter().position(|o| o.text.trim().is_empty()) {
            return Err(QuestionError::EmptyOption { index });
        }
        let found = self.options.iter().filter(|o| o.is_correct).count();
        if found != 1 {
            return Err(QuestionError::CorrectOptionCount { found });
        }

        let options = self
            .options
            .iter()
            .enumerate()
            .map(|(i, o)| QuestionOption {
                id: OptionId::for_position(&id, i),
                text: o.text.trim().to_owned(),
                is_correct: o.is_correct,
            })
            .collect();

        let mut tags: Vec<String> = Vec::with_capacity(self.tags.len());
        for tag in &self.tags {
            let tag = tag.trim();
            if !tag.is_empty() && !tags.iter().any(|t| t == tag) {
                tags.push(tag.to_owned());
            }
        }

        Ok(Question {
            id,
            text: text.to_owned(),
            options,
            explanation: self.explanation.trim().to_owned(),
            difficulty: self.difficulty,
            tags,
            subject: subject.to_owned(),
            source: self.source.trim().to_owned(),
            status: QuestionStatus::Active,
            created_at: now,
            updated_at: now,
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
