use thiserror::Error;

use crate::model::{BankError, NoteError, QuestionError, SettingsError};

/// Aggregate of the validation errors raised by the domain model.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Question(#[from] QuestionError),
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Note(#[from] NoteError),
}
