#![forbid(unsafe_code)]

pub mod repository;
pub mod seed;

pub use repository::{
    BankRepository, InMemoryRepository, ProgressRepository, QuestionRepository, Storage,
    StorageError,
};
