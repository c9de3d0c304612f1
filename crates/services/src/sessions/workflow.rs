use std::sync::Arc;

use qbank_core::model::{BankId, PracticeSettings, SessionScore, UserProgress};
use storage::{BankRepository, ProgressRepository, QuestionRepository};

use super::plan::SessionPlanner;
use super::service::ExamSession;
use super::timer::Ticker;
use crate::Clock;
use crate::error::SessionError;
use crate::progress_service::ProgressService;
use crate::report::ExamReport;

/// What a completed session leaves behind.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionOutcome {
    pub score: SessionScore,
    pub report: ExamReport,
    pub progress: Vec<UserProgress>,
}

/// Orchestrates session planning from storage and the bookkeeping at the end.
#[derive(Clone)]
pub struct SessionLoopService {
    clock: Clock,
    banks: Arc<dyn BankRepository>,
    questions: Arc<dyn QuestionRepository>,
    progress: ProgressService,
    shuffle: bool,
}

impl SessionLoopService {
    #[must_use]
    pub fn new(
        clock: Clock,
        banks: Arc<dyn BankRepository>,
        questions: Arc<dyn QuestionRepository>,
        progress: Arc<dyn ProgressRepository>,
    ) -> Self {
        Self {
            clock,
            banks,
            questions,
            progress: ProgressService::new(clock, progress),
            shuffle: false,
        }
    }

    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Plan a session for the bank without starting it, so callers can attach
    /// callbacks first.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownBank` if the bank does not exist,
    /// `SessionError::Empty` if no question passes the filters.
    pub async fn prepare_session(
        &self,
        bank_id: BankId,
        settings: PracticeSettings,
    ) -> Result<ExamSession, SessionError> {
        if self.banks.get_bank(bank_id).await?.is_none() {
            return Err(SessionError::UnknownBank(bank_id));
        }
        let questions = self.questions.questions_for_bank(bank_id).await?;
        let progress = self.progress.progress_map().await?;

        let plan = SessionPlanner::new(&settings)
            .with_shuffle(self.shuffle)
            .build(questions, &progress);
        tracing::debug!(
            bank = %bank_id,
            matched = plan.matched,
            selected = plan.total(),
            "session planned"
        );
        if plan.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(ExamSession::new(plan.questions, settings)?.with_clock(self.clock))
    }

    /// Plan and start a session for the bank.
    ///
    /// # Errors
    ///
    /// Returns `SessionError` for unknown banks, empty plans, storage failures
    /// or when the ticker cannot be started.
    pub async fn start_session(
        &self,
        bank_id: BankId,
        settings: PracticeSettings,
        ticker: Ticker,
    ) -> Result<ExamSession, SessionError> {
        let mut session = self.prepare_session(bank_id, settings).await?;
        session.start(ticker)?;
        Ok(session)
    }

    /// Record progress for a completed session and build its score and report.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotComplete` unless the session reached its end,
    /// `SessionError::Storage` if progress cannot be stored.
    pub async fn finish_session(
        &self,
        session: &ExamSession,
    ) -> Result<SessionOutcome, SessionError> {
        if !session.is_complete() {
            return Err(SessionError::NotComplete);
        }
        let progress = self.progress.record_session(session).await?;
        Ok(SessionOutcome {
            score: session.score(),
            report: session.report(),
            progress,
        })
    }
}
