use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::model::ids::QuestionId;
use crate::model::settings::CompletionFilter;

/// Outcome of the most recent attempt at a question.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProgressStatus {
    Completed,
    Flagged,
    Incorrect,
    Skipped,
}

/// Per-question practice history of the learner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProgress {
    pub question_id: QuestionId,
    pub status: ProgressStatus,
    pub attempts: u32,
    pub last_attempted: DateTime<Utc>,
}

impl UserProgress {
    #[must_use]
    pub fn first_attempt(question_id: QuestionId, status: ProgressStatus, at: DateTime<Utc>) -> Self {
        Self {
            question_id,
            status,
            attempts: 1,
            last_attempted: at,
        }
    }

    /// Fold a new attempt into existing history.
    pub fn record_attempt(&mut self, status: ProgressStatus, at: DateTime<Utc>) {
        self.status = status;
        self.attempts = self.attempts.saturating_add(1);
        self.last_attempted = at;
    }
}

impl CompletionFilter {
    /// Whether a question with the given history passes this filter.
    /// `None` means the question was never attempted.
    #[must_use]
    pub fn matches(self, progress: Option<&UserProgress>) -> bool {
        let status = progress.map(|p| p.status);
        match self {
            CompletionFilter::All => true,
            CompletionFilter::Unused => status.is_none(),
            CompletionFilter::Completed => status == Some(ProgressStatus::Completed),
            CompletionFilter::Incorrect => status == Some(ProgressStatus::Incorrect),
            CompletionFilter::Skipped => status == Some(ProgressStatus::Skipped),
            CompletionFilter::Flagged => status == Some(ProgressStatus::Flagged),
            CompletionFilter::Incomplete => {
                status.is_some() && status != Some(ProgressStatus::Completed)
            }
        }
    }
}

/// Aggregate counters for the progress dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ProgressStats {
    pub total: u32,
    pub correct: u32,
    pub incorrect: u32,
    pub flagged: u32,
    pub skipped: u32,
}

impl ProgressStats {
    #[must_use]
    pub fn from_progress<'a>(records: impl IntoIterator<Item = &'a UserProgress>) -> Self {
        let mut stats = Self::default();
        for record in records {
            stats.total = stats.total.saturating_add(1);
            match record.status {
                ProgressStatus::Completed => stats.correct = stats.correct.saturating_add(1),
                ProgressStatus::Incorrect => stats.incorrect = stats.incorrect.saturating_add(1),
                ProgressStatus::Flagged => stats.flagged = stats.flagged.saturating_add(1),
                ProgressStatus::Skipped => stats.skipped = stats.skipped.saturating_add(1),
            }
        }
        stats
    }

    /// Rounded percentage of attempted questions answered correctly; 0 when empty.
    #[must_use]
    pub fn accuracy_percent(&self) -> u32 {
        if self.total == 0 {
            return 0;
        }
        let pct = f64::from(self.correct) * 100.0 / f64::from(self.total);
        // pct is within 0..=100
        #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
        let rounded = pct.round() as u32;
        rounded
    }
}
