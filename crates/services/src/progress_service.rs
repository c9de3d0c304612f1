use std::collections::HashMap;
use std::sync::Arc;

use qbank_core::model::{
    OptionId, ProgressStats, ProgressStatus, Question, QuestionId, UserProgress,
};
use storage::{ProgressRepository, StorageError};

use crate::Clock;
use crate::sessions::ExamSession;

/// Outcome recorded for one question at the end of a session.
///
/// A flag wins over the answer; unanswered questions count as skipped.
#[must_use]
pub fn outcome_for(
    question: &Question,
    answer: Option<&OptionId>,
    flagged: bool,
) -> ProgressStatus {
    if flagged {
        return ProgressStatus::Flagged;
    }
    match answer {
        Some(option) if question.is_correct(option) => ProgressStatus::Completed,
        Some(_) => ProgressStatus::Incorrect,
        None => ProgressStatus::Skipped,
    }
}

/// Records per-question practice history and aggregates it.
#[derive(Clone)]
pub struct ProgressService {
    clock: Clock,
    progress: Arc<dyn ProgressRepository>,
}

impl ProgressService {
    #[must_use]
    pub fn new(clock: Clock, progress: Arc<dyn ProgressRepository>) -> Self {
        Self { clock, progress }
    }

    /// Fold the outcome of every question of a finished session into storage.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    pub async fn record_session(
        &self,
        session: &ExamSession,
    ) -> Result<Vec<UserProgress>, StorageError> {
        let now = self.clock.now();
        let mut recorded = Vec::with_capacity(session.question_count());
        for question in session.questions() {
            let status = outcome_for(
                question,
                session.answers().get(&question.id),
                session.flagged().contains(&question.id),
            );
            let entry = match self.progress.get_progress(&question.id).await? {
                Some(mut existing) => {
                    existing.record_attempt(status, now);
                    existing
                }
                None => UserProgress::first_attempt(question.id.clone(), status, now),
            };
            self.progress.upsert_progress(&entry).await?;
            recorded.push(entry);
        }
        tracing::info!(questions = recorded.len(), "session progress recorded");
        Ok(recorded)
    }

    /// Progress keyed by question, for session planning.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    pub async fn progress_map(&self) -> Result<HashMap<QuestionId, UserProgress>, StorageError> {
        let records = self.progress.list_progress().await?;
        Ok(records
            .into_iter()
            .map(|p| (p.question_id.clone(), p))
            .collect())
    }

    /// Aggregate counters over every recorded question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if repository access fails.
    pub async fn stats(&self) -> Result<ProgressStats, StorageError> {
        let records = self.progress.list_progress().await?;
        Ok(ProgressStats::from_progress(&records))
    }
}
