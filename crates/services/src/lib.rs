#![forbid(unsafe_code)]

pub mod app_services;
pub mod catalogue_service;
pub mod error;
pub mod progress_service;
pub mod report;
pub mod sessions;

pub use qbank_core::Clock;

pub use app_services::AppServices;
pub use catalogue_service::{CatalogueService, QuestionQuery};
pub use error::{AppServicesError, CatalogueError, ReportError, SessionError};
pub use progress_service::ProgressService;
pub use report::{ExamReport, ReportQuestion};

pub use sessions::{
    AnswerOutcome, ExamSession, Feedback, Navigation, OptionState, SessionLoopService,
    SessionOutcome, Ticker,
};
