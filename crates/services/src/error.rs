//! Shared error types for the services crate.

use thiserror::Error;

use qbank_core::model::{
    BankId, NoteError, NoteId, OptionId, QuestionError, QuestionId, SessionPhase, SettingsError,
};
use storage::StorageError;
use storage::seed::SeedError;

/// Errors emitted by the exam session controller and session workflow.
///
/// Every rejection leaves the session state untouched.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SessionError {
    #[error("no questions available for session")]
    Empty,
    #[error("session already started")]
    AlreadyStarted,
    #[error("session is not in progress (phase: {0:?})")]
    NotInProgress(SessionPhase),
    #[error("session is not complete yet")]
    NotComplete,
    #[error("option {0} does not belong to the current question")]
    UnknownOption(OptionId),
    #[error("note {0} does not exist on the current question")]
    UnknownNote(NoteId),
    #[error("unknown question bank: {0}")]
    UnknownBank(BankId),
    #[error("elapsed-time ticker needs a running tokio runtime")]
    TimerUnavailable,
    #[error(transparent)]
    Note(#[from] NoteError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted by `CatalogueService`.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum CatalogueError {
    #[error("unknown question bank: {0}")]
    UnknownBank(BankId),
    #[error("unknown question: {0}")]
    UnknownQuestion(QuestionId),
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Errors emitted while building or writing an exam report.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ReportError {
    #[error("failed to serialize report: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors emitted while bootstrapping app services.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum AppServicesError {
    #[error(transparent)]
    Seed(#[from] SeedError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
