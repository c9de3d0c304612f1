use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

use crate::model::ids::BankId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum BankError {
    #[error("bank name cannot be empty")]
    EmptyName,

    #[error("completion must be between 0 and 100, got {0}")]
    InvalidCompletion(u8),
}

/// Target audience level of a bank.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BankLevel {
    Beginner,
    Intermediate,
    Advanced,
}

impl fmt::Display for BankLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            BankLevel::Beginner => "beginner",
            BankLevel::Intermediate => "intermediate",
            BankLevel::Advanced => "advanced",
        })
    }
}

/// A named collection of questions a learner can practice from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionBank {
    id: BankId,
    name: String,
    description: String,
    total_questions: u32,
    subjects: Vec<String>,
    completion: u8,
    level: BankLevel,
    last_updated: DateTime<Utc>,
}

impl QuestionBank {
    /// # Errors
    ///
    /// Returns `BankError::EmptyName` if the trimmed name is empty and
    /// `BankError::InvalidCompletion` if `completion` exceeds 100.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        id: BankId,
        name: impl Into<String>,
        description: impl Into<String>,
        total_questions: u32,
        subjects: Vec<String>,
        completion: u8,
        level: BankLevel,
        last_updated: DateTime<Utc>,
    ) -> Result<Self, BankError> {
        let name = name.into().trim().to_owned();
        if name.is_empty() {
            return Err(BankError::EmptyName);
        }
        if completion > 100 {
            return Err(BankError::InvalidCompletion(completion));
        }
        Ok(Self {
            id,
            name,
            description: description.into(),
            total_questions,
            subjects,
            completion,
            level,
            last_updated,
        })
    }

    #[must_use]
    pub fn id(&self) -> BankId {
        self.id
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn description(&self) -> &str {
        &self.description
    }

    /// Advertised size of the bank; may exceed the questions loaded locally.
    #[must_use]
    pub fn total_questions(&self) -> u32 {
        self.total_questions
    }

    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    /// Percentage (0-100) of the bank the learner has completed.
    #[must_use]
    pub fn completion(&self) -> u8 {
        self.completion
    }

    #[must_use]
    pub fn level(&self) -> BankLevel {
        self.level
    }

    #[must_use]
    pub fn last_updated(&self) -> DateTime<Utc> {
        self.last_updated
    }

    /// Record a new question added to this bank.
    pub fn note_question_added(&mut self, at: DateTime<Utc>) {
        self.total_questions = self.total_questions.saturating_add(1);
        self.last_updated = at;
    }
}
