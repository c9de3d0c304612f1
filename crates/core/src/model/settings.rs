use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::question::Difficulty;

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum SettingsError {
    #[error("question count must be > 0")]
    InvalidQuestionCount,

    #[error("unknown practice mode: {0}")]
    UnknownMode(String),

    #[error("unknown difficulty filter: {0}")]
    UnknownDifficulty(String),

    #[error("unknown completion filter: {0}")]
    UnknownCompletion(String),
}

//
// ─── MODE ──────────────────────────────────────────────────────────────────────
//

/// How feedback and answer locking behave during a session.
///
/// - `Explained`: feedback and explanation always visible, answers can change
/// - `Exam`: no feedback until the end, first answer per question is final
/// - `Quick`: feedback after each answer, answers can change
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PracticeMode {
    #[default]
    Explained,
    Exam,
    Quick,
}

impl PracticeMode {
    /// Whether the first recorded answer for a question is final.
    #[must_use]
    pub fn locks_answers(self) -> bool {
        matches!(self, PracticeMode::Exam)
    }
}

impl fmt::Display for PracticeMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            PracticeMode::Explained => "explained",
            PracticeMode::Exam => "exam",
            PracticeMode::Quick => "quick",
        })
    }
}

impl FromStr for PracticeMode {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "explained" => Ok(Self::Explained),
            "exam" => Ok(Self::Exam),
            "quick" => Ok(Self::Quick),
            other => Err(SettingsError::UnknownMode(other.to_owned())),
        }
    }
}

//
// ─── FILTERS ───────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DifficultyFilter {
    #[default]
    All,
    Only(Difficulty),
}

impl DifficultyFilter {
    #[must_use]
    pub fn matches(self, difficulty: Difficulty) -> bool {
        match self {
            DifficultyFilter::All => true,
            DifficultyFilter::Only(d) => d == difficulty,
        }
    }
}

impl FromStr for DifficultyFilter {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.trim().eq_ignore_ascii_case("all") {
            return Ok(Self::All);
        }
        s.parse::<Difficulty>()
            .map(Self::Only)
            .map_err(|_| SettingsError::UnknownDifficulty(s.trim().to_owned()))
    }
}

/// Restricts a session by the learner's previous results.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CompletionFilter {
    #[default]
    All,
    /// Answered correctly before.
    Completed,
    /// Never attempted.
    Unused,
    Incorrect,
    Skipped,
    /// Flagged for review.
    Flagged,
    /// Attempted but not completed correctly.
    Incomplete,
}

impl FromStr for CompletionFilter {
    type Err = SettingsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "all" => Ok(Self::All),
            "complete" | "completed" => Ok(Self::Completed),
            "unused" => Ok(Self::Unused),
            "incorrect" => Ok(Self::Incorrect),
            "skipped" => Ok(Self::Skipped),
            "flagged" | "marked" => Ok(Self::Flagged),
            "incomplete" => Ok(Self::Incomplete),
            other => Err(SettingsError::UnknownCompletion(other.to_owned())),
        }
    }
}

//
// ─── SETTINGS ──────────────────────────────────────────────────────────────────
//

/// Settings chosen before a practice session starts. Immutable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PracticeSettings {
    mode: PracticeMode,
    question_count: u32,
    difficulty: DifficultyFilter,
    subjects: Vec<String>,
    completion: CompletionFilter,
}

impl Default for PracticeSettings {
    fn default() -> Self {
        Self {
            mode: PracticeMode::Explained,
            question_count: Self::DEFAULT_QUESTION_COUNT,
            difficulty: DifficultyFilter::All,
            subjects: Vec::new(),
            completion: CompletionFilter::All,
        }
    }
}

impl PracticeSettings {
    pub const DEFAULT_QUESTION_COUNT: u32 = 50;
    const REVIEW_QUESTION_COUNT: u32 = 10;

    /// # Errors
    ///
    /// Returns `SettingsError::InvalidQuestionCount` if `question_count` is zero.
    pub fn new(
        mode: PracticeMode,
        question_count: u32,
        difficulty: DifficultyFilter,
        subjects: Vec<String>,
        completion: CompletionFilter,
    ) -> Result<Self, SettingsError> {
        if question_count == 0 {
            return Err(SettingsError::InvalidQuestionCount);
        }
        let subjects = subjects
            .into_iter()
            .map(|s| s.trim().to_owned())
            .filter(|s| !s.is_empty())
            .collect();
        Ok(Self {
            mode,
            question_count,
            difficulty,
            subjects,
            completion,
        })
    }

    /// Explained-mode review of up to 10 flagged questions.
    #[must_use]
    pub fn review_flagged() -> Self {
        Self::review(CompletionFilter::Flagged)
    }

    /// Explained-mode review of up to 10 previously missed questions.
    #[must_use]
    pub fn review_incorrect() -> Self {
        Self::review(CompletionFilter::Incorrect)
    }

    fn review(completion: CompletionFilter) -> Self {
        Self {
            question_count: Self::REVIEW_QUESTION_COUNT,
            completion,
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_mode(mut self, mode: PracticeMode) -> Self {
        self.mode = mode;
        self
    }

    #[must_use]
    pub fn mode(&self) -> PracticeMode {
        self.mode
    }

    #[must_use]
    pub fn question_count(&self) -> u32 {
        self.question_count
    }

    #[must_use]
    pub fn difficulty(&self) -> DifficultyFilter {
        self.difficulty
    }

    /// Subjects to draw from; empty means every subject.
    #[must_use]
    pub fn subjects(&self) -> &[String] {
        &self.subjects
    }

    #[must_use]
    pub fn completion(&self) -> CompletionFilter {
        self.completion
    }

    #[must_use]
    pub fn matches_subject(&self, subject: &str) -> bool {
        self.subjects.is_empty() || self.subjects.iter().any(|s| s.eq_ignore_ascii_case(subject))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_practice_dialog() {
        let s = PracticeSettings::default();
        assert_eq!(s.mode(), PracticeMode::Explained);
        assert_eq!(s.question_count(), 50);
        assert_eq!(s.difficulty(), DifficultyFilter::All);
        assert!(s.subjects().is_empty());
        assert_eq!(s.completion(), CompletionFilter::All);
    }

    #[test]
    fn zero_question_count_is_rejected() {
        let err = PracticeSettings::new(
            PracticeMode::Exam,
            0,
            DifficultyFilter::All,
            Vec::new(),
            CompletionFilter::All,
        )
        .unwrap_err();
        assert_eq!(err, SettingsError::InvalidQuestionCount);
    }

    #[test]
    fn review_presets() {
        let flagged = PracticeSettings::review_flagged();
        assert_eq!(flagged.mode(), PracticeMode::Explained);
        assert_eq!(flagged.question_count(), 10);
        assert_eq!(flagged.completion(), CompletionFilter::Flagged);
        assert_eq!(
            PracticeSettings::review_incorrect().completion(),
            CompletionFilter::Incorrect
        );
    }

    #[test]
    fn subject_filter_is_case_insensitive_and_empty_means_all() {
        let s = PracticeSettings::new(
            PracticeMode::Quick,
            5,
            DifficultyFilter::All,
            vec![" Surgery ".into(), "".into()],
            CompletionFilter::All,
        )
        .unwrap();
        assert_eq!(s.subjects(), ["Surgery".to_string()]);
        assert!(s.matches_subject("surgery"));
        assert!(!s.matches_subject("Pharmacology"));
        assert!(PracticeSettings::default().matches_subject("anything"));
    }

    #[test]
    fn filters_parse() {
        assert_eq!("all".parse::<DifficultyFilter>().unwrap(), DifficultyFilter::All);
        assert_eq!(
            "easy".parse::<DifficultyFilter>().unwrap(),
            DifficultyFilter::Only(Difficulty::Easy)
        );
        assert_eq!("marked".parse::<CompletionFilter>().unwrap(), CompletionFilter::Flagged);
        assert!("soon".parse::<PracticeMode>().is_err());
        assert!(PracticeMode::Exam.locks_answers());
        assert!(!PracticeMode::Quick.locks_answers());
    }
}
