use std::sync::Arc;

use qbank_core::model::{
    BankId, Difficulty, Question, QuestionBank, QuestionDraft, QuestionId, QuestionStatus,
};
use storage::{BankRepository, QuestionRepository};

use crate::Clock;
use crate::error::CatalogueError;

/// Filters for the question list of a bank. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QuestionQuery {
    /// Case-insensitive substring of the question text or one of its tags.
    pub text: Option<String>,
    pub difficulty: Option<Difficulty>,
    pub status: Option<QuestionStatus>,
    pub subject: Option<String>,
    pub source: Option<String>,
}

impl QuestionQuery {
    #[must_use]
    pub fn matches(&self, question: &Question) -> bool {
        let text_ok = self.text.as_deref().map(str::trim).is_none_or(|needle| {
            let needle = needle.to_lowercase();
            needle.is_empty()
                || question.text.to_lowercase().contains(&needle)
                || question
                    .tags
                    .iter()
                    .any(|tag| tag.to_lowercase().contains(&needle))
        });
        text_ok
            && self.difficulty.is_none_or(|d| d == question.difficulty)
            && self.status.is_none_or(|s| s == question.status)
            && self
                .subject
                .as_deref()
                .is_none_or(|s| s.eq_ignore_ascii_case(&question.subject))
            && self
                .source
                .as_deref()
                .is_none_or(|s| s.eq_ignore_ascii_case(&question.source))
    }
}

/// Question bank catalogue and question administration.
#[derive(Clone)]
pub struct CatalogueService {
    clock: Clock,
    banks: Arc<dyn BankRepository>,
    questions: Arc<dyn QuestionRepository>,
}

impl CatalogueService {
    #[must_use]
    pub fn new(
        clock: Clock,
        banks: Arc<dyn BankRepository>,
        questions: Arc<dyn QuestionRepository>,
    ) -> Self {
        Self {
            clock,
            banks,
            questions,
        }
    }

    /// List banks ordered by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::Storage` if repository access fails.
    pub async fn list_banks(&self) -> Result<Vec<QuestionBank>, CatalogueError> {
        Ok(self.banks.list_banks().await?)
    }

    /// Fetch a bank by id.
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::UnknownBank` if the bank does not exist.
    pub async fn get_bank(&self, bank_id: BankId) -> Result<QuestionBank, CatalogueError> {
        self.banks
            .get_bank(bank_id)
            .await?
            .ok_or(CatalogueError::UnknownBank(bank_id))
    }

    /// Questions of a bank that match `query`, in bank order.
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::UnknownBank` if the bank does not exist.
    pub async fn questions(
        &self,
        bank_id: BankId,
        query: &QuestionQuery,
    ) -> Result<Vec<Question>, CatalogueError> {
        self.get_bank(bank_id).await?;
        let questions = self.questions.questions_for_bank(bank_id).await?;
        Ok(questions.into_iter().filter(|q| query.matches(q)).collect())
    }

    /// Validate a draft, store it in the bank and bump the bank's counters.
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::Question` for validation failures and
    /// `CatalogueError::UnknownBank` if the bank does not exist.
    pub async fn add_question(
        &self,
        bank_id: BankId,
        draft: QuestionDraft,
    ) -> Result<Question, CatalogueError> {
        let mut bank = self.get_bank(bank_id).await?;
        let now = self.clock.now();
        // reject invalid drafts before an id is taken
        draft.clone().validate(QuestionId::new(""), now)?;
        let id = self.questions.next_question_id().await?;
        let question = draft.validate(id, now)?;

        self.questions.insert_question(bank_id, &question).await?;
        bank.note_question_added(now);
        self.banks.upsert_bank(&bank).await?;
        tracing::info!(bank = %bank_id, question = %question.id, "question added");
        Ok(question)
    }

    /// Change a question's review status.
    ///
    /// # Errors
    ///
    /// Returns `CatalogueError::UnknownQuestion` if the question does not exist.
    pub async fn set_status(
        &self,
        question_id: &QuestionId,
        status: QuestionStatus,
    ) -> Result<Question, CatalogueError> {
        let mut question = self
            .questions
            .get_question(question_id)
            .await?
            .ok_or_else(|| CatalogueError::UnknownQuestion(question_id.clone()))?;
        if question.status != status {
            question.status = status;
            question.updated_at = self.clock.now();
            self.questions.update_question(&question).await?;
        }
        Ok(question)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use qbank_core::model::{OptionDraft, QuestionError};
    use qbank_core::time::{fixed_clock, fixed_now};
    use storage::seed::seed_sample_catalogue;
    use storage::{InMemoryRepository, Storage};

    async fn seeded(clock: Clock) -> CatalogueService {
        let repo = InMemoryRepository::new();
        seed_sample_catalogue(&repo).await.unwrap();
        let storage = Storage::from_repository(repo);
        CatalogueService::new(clock, storage.banks, storage.questions)
    }

    fn draft(text: &str) -> QuestionDraft {
        QuestionDraft {
            text: text.into(),
            options: vec![
                OptionDraft::new("Right", true),
                OptionDraft::new("Wrong", false),
            ],
            explanation: "Because.".into(),
            difficulty: Difficulty::Medium,
            tags: vec!["Cardiology".into()],
            subject: "Cardiology".into(),
            source: "Custom".into(),
        }
    }

    #[tokio::test]
    async fn lists_seeded_banks() {
        let service = seeded(fixed_clock()).await;
        let banks = service.list_banks().await.unwrap();
        assert_eq!(banks.len(), 2);
        assert_eq!(banks[0].name(), "USMLE Step 1");

        let err = service.get_bank(BankId::new(99)).await.unwrap_err();
        assert!(matches!(err, CatalogueError::UnknownBank(_)));
    }

    #[tokio::test]
    async fn query_filters_by_text_and_tags() {
        let service = seeded(fixed_clock()).await;
        let bank = BankId::new(1);

        let all = service.questions(bank, &QuestionQuery::default()).await.unwrap();
        assert_eq!(all.len(), 3);

        let by_tag = QuestionQuery {
            text: Some("orthopedics".into()),
            ..QuestionQuery::default()
        };
        let hits = service.questions(bank, &by_tag).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, QuestionId::new("2"));

        let by_difficulty = QuestionQuery {
            difficulty: Some(Difficulty::Hard),
            status: Some(QuestionStatus::Active),
            ..QuestionQuery::default()
        };
        let hits = service.questions(bank, &by_difficulty).await.unwrap();
        assert!(hits.iter().all(|q| q.difficulty == Difficulty::Hard));
    }

    #[tokio::test]
    async fn add_question_assigns_id_and_bumps_bank() {
        let service = seeded(fixed_clock()).await;
        let bank = BankId::new(2);
        let before = service.get_bank(bank).await.unwrap().total_questions();

        let question = service.add_question(bank, draft("New question?")).await.unwrap();
        assert_eq!(question.id, QuestionId::new("4"));
        assert_eq!(question.options[1].id.as_str(), "4b");
        assert_eq!(question.created_at, fixed_now());

        let after = service.get_bank(bank).await.unwrap();
        assert_eq!(after.total_questions(), before + 1);
        let listed = service.questions(bank, &QuestionQuery::default()).await.unwrap();
        assert!(listed.iter().any(|q| q.id == question.id));
    }

    #[tokio::test]
    async fn invalid_draft_is_rejected() {
        let service = seeded(fixed_clock()).await;
        let mut bad = draft("Two right answers");
        bad.options[1].is_correct = true;
        let err = service.add_question(BankId::new(1), bad).await.unwrap_err();
        assert!(matches!(
            err,
            CatalogueError::Question(QuestionError::CorrectOptionCount { found: 2 })
        ));
    }

    #[tokio::test]
    async fn rejected_draft_does_not_consume_an_id() {
        let service = seeded(fixed_clock()).await;
        let mut bad = draft("No answer");
        bad.options[0].is_correct = false;
        assert!(service.add_question(BankId::new(1), bad).await.is_err());

        let question = service.add_question(BankId::new(1), draft("Next?")).await.unwrap();
        assert_eq!(question.id, QuestionId::new("4"));
    }

    #[tokio::test]
    async fn set_status_bumps_updated_at() {
        let later = fixed_now() + Duration::hours(1);
        let service = seeded(Clock::fixed(later)).await;
        let id = QuestionId::new("1");

        let updated = service.set_status(&id, QuestionStatus::Archived).await.unwrap();
        assert_eq!(updated.status, QuestionStatus::Archived);
        assert_eq!(updated.updated_at, later);

        let archived = QuestionQuery {
            status: Some(QuestionStatus::Archived),
            ..QuestionQuery::default()
        };
        let hits = service.questions(BankId::new(1), &archived).await.unwrap();
        assert_eq!(hits.len(), 1);

        let err = service
            .set_status(&QuestionId::new("missing"), QuestionStatus::Active)
            .await
            .unwrap_err();
        assert!(matches!(err, CatalogueError::UnknownQuestion(_)));
    }
}
