use async_trait::async_trait;
use qbank_core::model::{BankId, Question, QuestionBank, QuestionId, UserProgress};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    #[error("conflict")]
    Conflict,

    #[error("connection error: {0}")]
    Connection(String),
}

/// Repository contract for question banks.
#[async_trait]
pub trait BankRepository: Send + Sync {
    /// Persist or update a bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the bank cannot be stored.
    async fn upsert_bank(&self, bank: &QuestionBank) -> Result<(), StorageError>;

    /// Fetch a bank by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn get_bank(&self, id: BankId) -> Result<Option<QuestionBank>, StorageError>;

    /// List banks ordered by ID.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn list_banks(&self) -> Result<Vec<QuestionBank>, StorageError>;
}

/// Repository contract for questions and their bank membership.
#[async_trait]
pub trait QuestionRepository: Send + Sync {
    /// Insert a new question into a bank.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::Conflict` if the question id already belongs to the bank.
    async fn insert_question(&self, bank_id: BankId, question: &Question)
    -> Result<(), StorageError>;

    /// Replace an existing question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` if the question does not exist.
    async fn update_question(&self, question: &Question) -> Result<(), StorageError>;

    /// Fetch a question by ID. Returns `Ok(None)` when missing.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn get_question(&self, id: &QuestionId) -> Result<Option<Question>, StorageError>;

    /// Questions of a bank, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn questions_for_bank(&self, bank_id: BankId) -> Result<Vec<Question>, StorageError>;

    /// Allocate an identifier for a new question.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn next_question_id(&self) -> Result<QuestionId, StorageError>;
}

/// Repository contract for the learner's per-question history.
#[async_trait]
pub trait ProgressRepository: Send + Sync {
    /// Persist or update a progress record.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` if the record cannot be stored.
    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError>;

    /// Fetch progress for a question. Returns `Ok(None)` if never attempted.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn get_progress(&self, id: &QuestionId) -> Result<Option<UserProgress>, StorageError>;

    /// All progress records.
    ///
    /// # Errors
    ///
    /// Returns `StorageError` on adapter failures.
    async fn list_progress(&self) -> Result<Vec<UserProgress>, StorageError>;
}

#[derive(Default)]
struct QuestionTable {
    by_id: HashMap<QuestionId, Question>,
    membership: HashMap<BankId, Vec<QuestionId>>,
    next_id: u64,
}

/// In-memory repository; the only backend the application ships with.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    banks: Arc<Mutex<HashMap<BankId, QuestionBank>>>,
    questions: Arc<Mutex<QuestionTable>>,
    progress: Arc<Mutex<HashMap<QuestionId, UserProgress>>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

fn poisoned<T>(e: std::sync::PoisonError<T>) -> StorageError {
    StorageError::Connection(e.to_string())
}

#[async_trait]
impl BankRepository for InMemoryRepository {
    async fn upsert_bank(&self, bank: &QuestionBank) -> Result<(), StorageError> {
        let mut guard = self.banks.lock().map_err(poisoned)?;
        guard.insert(bank.id(), bank.clone());
        Ok(())
    }

    async fn get_bank(&self, id: BankId) -> Result<Option<QuestionBank>, StorageError> {
        let guard = self.banks.lock().map_err(poisoned)?;
        Ok(guard.get(&id).cloned())
    }

    async fn list_banks(&self) -> Result<Vec<QuestionBank>, StorageError> {
        let guard = self.banks.lock().map_err(poisoned)?;
        let mut banks: Vec<_> = guard.values().cloned().collect();
        banks.sort_by_key(QuestionBank::id);
        Ok(banks)
    }
}

#[async_trait]
impl QuestionRepository for InMemoryRepository {
    async fn insert_question(
        &self,
        bank_id: BankId,
        question: &Question,
    ) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let members = guard.membership.entry(bank_id).or_default();
        if members.contains(&question.id) {
            return Err(StorageError::Conflict);
        }
        members.push(question.id.clone());
        if let Ok(numeric) = question.id.as_str().parse::<u64>() {
            guard.next_id = guard.next_id.max(numeric);
        }
        guard.by_id.insert(question.id.clone(), question.clone());
        Ok(())
    }

    async fn update_question(&self, question: &Question) -> Result<(), StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        let slot = guard
            .by_id
            .get_mut(&question.id)
            .ok_or(StorageError::NotFound)?;
        *slot = question.clone();
        Ok(())
    }

    async fn get_question(&self, id: &QuestionId) -> Result<Option<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        Ok(guard.by_id.get(id).cloned())
    }

    async fn questions_for_bank(&self, bank_id: BankId) -> Result<Vec<Question>, StorageError> {
        let guard = self.questions.lock().map_err(poisoned)?;
        let Some(ids) = guard.membership.get(&bank_id) else {
            return Ok(Vec::new());
        };
        Ok(ids
            .iter()
            .filter_map(|id| guard.by_id.get(id).cloned())
            .collect())
    }

    async fn next_question_id(&self) -> Result<QuestionId, StorageError> {
        let mut guard = self.questions.lock().map_err(poisoned)?;
        guard.next_id += 1;
        Ok(QuestionId::new(guard.next_id.to_string()))
    }
}

#[async_trait]
impl ProgressRepository for InMemoryRepository {
    async fn upsert_progress(&self, progress: &UserProgress) -> Result<(), StorageError> {
        let mut guard = self.progress.lock().map_err(poisoned)?;
        guard.insert(progress.question_id.clone(), progress.clone());
        Ok(())
    }

    async fn get_progress(&self, id: &QuestionId) -> Result<Option<UserProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        Ok(guard.get(id).cloned())
    }

    async fn list_progress(&self) -> Result<Vec<UserProgress>, StorageError> {
        let guard = self.progress.lock().map_err(poisoned)?;
        let mut records: Vec<_> = guard.values().cloned().collect();
        records.sort_by(|a, b| a.question_id.cmp(&b.question_id));
        Ok(records)
    }
}

/// Aggregates repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub banks: Arc<dyn BankRepository>,
    pub questions: Arc<dyn QuestionRepository>,
    pub progress: Arc<dyn ProgressRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        Self::from_repository(InMemoryRepository::new())
    }

    #[must_use]
    pub fn from_repository(repo: InMemoryRepository) -> Self {
        let banks: Arc<dyn BankRepository> = Arc::new(repo.clone());
        let questions: Arc<dyn QuestionRepository> = Arc::new(repo.clone());
        let progress: Arc<dyn ProgressRepository> = Arc::new(repo);
        Self {
            banks,
            questions,
            progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbank_core::model::{
        BankLevel, Difficulty, ProgressStatus, QuestionOption, QuestionStatus,
    };
    use qbank_core::time::fixed_now;

    fn build_bank(id: u64) -> QuestionBank {
        QuestionBank::new(
            BankId::new(id),
            format!("Bank {id}"),
            "",
            0,
            Vec::new(),
            0,
            BankLevel::Beginner,
            fixed_now(),
        )
        .unwrap()
    }

    fn build_question(id: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            text: format!("Question {id}"),
            options: vec![
                QuestionOption::new(format!("{id}a").as_str(), "A", true),
                QuestionOption::new(format!("{id}b").as_str(), "B", false),
            ],
            explanation: String::new(),
            difficulty: Difficulty::Easy,
            tags: Vec::new(),
            subject: "Surgery".into(),
            source: "Test".into(),
            status: QuestionStatus::Active,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    #[tokio::test]
    async fn banks_list_in_id_order() {
        let repo = InMemoryRepository::new();
        repo.upsert_bank(&build_bank(2)).await.unwrap();
        repo.upsert_bank(&build_bank(1)).await.unwrap();

        let ids: Vec<_> = repo
            .list_banks()
            .await
            .unwrap()
            .iter()
            .map(QuestionBank::id)
            .collect();
        assert_eq!(ids, vec![BankId::new(1), BankId::new(2)]);
        assert!(repo.get_bank(BankId::new(9)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn questions_keep_bank_order_and_reject_duplicates() {
        let repo = InMemoryRepository::new();
        let bank = BankId::new(1);
        repo.insert_question(bank, &build_question("2")).await.unwrap();
        repo.insert_question(bank, &build_question("1")).await.unwrap();

        let err = repo
            .insert_question(bank, &build_question("1"))
            .await
            .unwrap_err();
        assert!(matches!(err, StorageError::Conflict));

        let ids: Vec<_> = repo
            .questions_for_bank(bank)
            .await
            .unwrap()
            .into_iter()
            .map(|q| q.id)
            .collect();
        assert_eq!(ids, vec![QuestionId::new("2"), QuestionId::new("1")]);
        assert!(repo.questions_for_bank(BankId::new(5)).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn next_question_id_skips_seeded_ids() {
        let repo = InMemoryRepository::new();
        repo.insert_question(BankId::new(1), &build_question("3"))
            .await
            .unwrap();
        assert_eq!(repo.next_question_id().await.unwrap(), QuestionId::new("4"));
        assert_eq!(repo.next_question_id().await.unwrap(), QuestionId::new("5"));
    }

    #[tokio::test]
    async fn update_missing_question_is_not_found() {
        let repo = InMemoryRepository::new();
        let err = repo.update_question(&build_question("1")).await.unwrap_err();
        assert!(matches!(err, StorageError::NotFound));
    }

    #[tokio::test]
    async fn progress_round_trips() {
        let repo = InMemoryRepository::new();
        let record =
            UserProgress::first_attempt(QuestionId::new("1"), ProgressStatus::Skipped, fixed_now());
        repo.upsert_progress(&record).await.unwrap();

        let fetched = repo.get_progress(&QuestionId::new("1")).await.unwrap();
        assert_eq!(fetched, Some(record));
        assert_eq!(repo.list_progress().await.unwrap().len(), 1);
    }
}
