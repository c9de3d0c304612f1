mod bank;
mod ids;
mod note;
mod progress;
mod question;
mod session;
mod settings;

pub use ids::{BankId, NoteId, OptionId, ParseIdError, QuestionId};

pub use bank::{BankError, BankLevel, QuestionBank};
pub use note::{CommunityNote, NoteAuthor, NoteError, VoteDirection, vote_transition};
pub use progress::{ProgressStats, ProgressStatus, UserProgress};
pub use question::{
    Difficulty, OptionDraft, Question, QuestionDraft, QuestionError, QuestionOption,
    QuestionStatus,
};
pub use session::{
    Performance, SessionPhase, SessionScore, format_elapsed, format_stopwatch,
};
pub use settings::{
    CompletionFilter, DifficultyFilter, PracticeMode, PracticeSettings, SettingsError,
};
