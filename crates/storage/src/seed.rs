//! Static catalogue the application starts with.

use chrono::{DateTime, NaiveDate, Utc};
use qbank_core::model::{
    BankError, BankId, BankLevel, Difficulty, Question, QuestionBank, QuestionId, QuestionOption,
    QuestionStatus,
};
use thiserror::Error;

use crate::repository::{BankRepository, InMemoryRepository, QuestionRepository, StorageError};

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SeedError {
    #[error(transparent)]
    Bank(#[from] BankError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}

fn utc(y: i32, m: u32, d: u32, h: u32, min: u32) -> DateTime<Utc> {
    NaiveDate::from_ymd_opt(y, m, d)
        .and_then(|date| date.and_hms_opt(h, min, 0))
        .map(|naive| naive.and_utc())
        .unwrap_or_default()
}

#[allow(clippy::too_many_arguments)]
fn question(
    id: &str,
    text: &str,
    options: [(&str, bool); 4],
    explanation: &str,
    difficulty: Difficulty,
    tags: &[&str],
    subject: &str,
    source: &str,
) -> Question {
    let qid = QuestionId::new(id);
    let created = utc(2024, 3, 1, 10, 0);
    Question {
        options: options
            .iter()
            .enumerate()
            .map(|(i, (text, correct))| QuestionOption {
                id: qbank_core::model::OptionId::for_position(&qid, i),
                text: (*text).to_owned(),
                is_correct: *correct,
            })
            .collect(),
        id: qid,
        text: text.to_owned(),
        explanation: explanation.to_owned(),
        difficulty,
        tags: tags.iter().map(|t| (*t).to_owned()).collect(),
        subject: subject.to_owned(),
        source: source.to_owned(),
        status: QuestionStatus::Active,
        created_at: created,
        updated_at: created,
    }
}

/// The three sample questions (ids `1`..`3`, options `1a`..`3d`).
#[must_use]
pub fn sample_questions() -> Vec<Question> {
    vec![
        question(
            "1",
            "What is the primary mechanism of action for propofol?",
            [
                ("GABA receptor modulation", true),
                ("Sodium channel blockade", false),
                ("Calcium channel inhibition", false),
                ("Potassium channel activation", false),
            ],
            "Propofol primarily acts by potentiating GABA-mediated inhibition in the CNS.",
            Difficulty::Hard,
            &["Pharmacology", "Anesthesia"],
            "Pharmacology",
            "Standard Reference",
        ),
        question(
            "2",
            "Which of the following is the most common complication after carpal tunnel release surgery?",
            [
                ("Pillar pain", true),
                ("Infection", false),
                ("Nerve injury", false),
                ("Tendon adhesion", false),
            ],
            "Pillar pain, which is pain and tenderness along the thenar and hypothenar eminences, \
             is the most common complication after carpal tunnel release.",
            Difficulty::Medium,
            &["Surgery", "Orthopedics"],
            "Surgery",
            "Clinical Practice",
        ),
        question(
            "3",
            "What is the first-line antibiotic treatment for community-acquired pneumonia in healthy adults?",
            [
                ("Azithromycin", true),
                ("Amoxicillin-clavulanate", false),
                ("Ceftriaxone", false),
                ("Levofloxacin", false),
            ],
            "Azithromycin is recommended as first-line treatment for community-acquired pneumonia \
             in otherwise healthy adults due to its coverage of typical and atypical pathogens.",
            Difficulty::Easy,
            &["Internal Medicine", "Infectious Disease"],
            "Internal Medicine",
            "Guidelines",
        ),
    ]
}

/// The two sample banks.
///
/// # Errors
///
/// Returns `BankError` if a bank fails validation.
pub fn sample_banks() -> Result<Vec<QuestionBank>, BankError> {
    Ok(vec![
        QuestionBank::new(
            BankId::new(1),
            "USMLE Step 1",
            "Comprehensive question bank for USMLE Step 1",
            2500,
            vec!["Anatomy".into(), "Physiology".into(), "Biochemistry".into()],
            45,
            BankLevel::Advanced,
            utc(2024, 3, 10, 12, 0),
        )?,
        QuestionBank::new(
            BankId::new(2),
            "Clinical Cases",
            "Real-world clinical scenarios",
            1000,
            vec!["Internal Medicine".into(), "Surgery".into(), "Pediatrics".into()],
            30,
            BankLevel::Intermediate,
            utc(2024, 3, 9, 15, 30),
        )?,
    ])
}

/// Load the sample catalogue into a repository. Every bank shares the sample questions.
///
/// # Errors
///
/// Returns `SeedError` if validation or storage fails.
pub async fn seed_sample_catalogue(repo: &InMemoryRepository) -> Result<(), SeedError> {
    let questions = sample_questions();
    for bank in sample_banks()? {
        repo.upsert_bank(&bank).await?;
        for q in &questions {
            repo.insert_question(bank.id(), q).await?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbank_core::model::OptionId;

    #[test]
    fn sample_questions_have_one_correct_option_each() {
        for q in sample_questions() {
            assert_eq!(q.options.iter().filter(|o| o.is_correct).count(), 1);
        }
        let first = &sample_questions()[0];
        assert_eq!(first.correct_option().unwrap().id, OptionId::new("1a"));
        assert_eq!(first.options[1].id, OptionId::new("1b"));
    }

    #[tokio::test]
    async fn seeding_populates_both_banks() {
        let repo = InMemoryRepository::new();
        seed_sample_catalogue(&repo).await.unwrap();

        assert_eq!(repo.list_banks().await.unwrap().len(), 2);
        for id in [1, 2] {
            let qs = repo.questions_for_bank(BankId::new(id)).await.unwrap();
            assert_eq!(qs.len(), 3);
        }
    }
}
