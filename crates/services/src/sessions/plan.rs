use rand::rng;
use rand::seq::SliceRandom;
use std::collections::HashMap;

use qbank_core::model::{PracticeSettings, Question, QuestionId, UserProgress};

/// Selection result for a session build.
#[derive(Debug, Clone, PartialEq)]
pub struct SessionPlan {
    pub questions: Vec<Question>,
    /// Questions that passed every filter before truncation.
    pub matched: usize,
}

impl SessionPlan {
    #[must_use]
    pub fn total(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }
}

/// Picks the questions of a practice session from a bank according to
/// `PracticeSettings` and the learner's recorded progress.
pub struct SessionPlanner<'a> {
    settings: &'a PracticeSettings,
    shuffle: bool,
}

impl<'a> SessionPlanner<'a> {
    #[must_use]
    pub fn new(settings: &'a PracticeSettings) -> Self {
        Self {
            settings,
            shuffle: false,
        }
    }

    /// Enable or disable shuffling of the matched questions before truncation.
    #[must_use]
    pub fn with_shuffle(mut self, shuffle: bool) -> Self {
        self.shuffle = shuffle;
        self
    }

    /// Build a plan from a bank's questions in bank order.
    ///
    /// - archived and under-review questions are skipped;
    /// - difficulty, subject and completion filters apply in that order;
    /// - the result holds at most `question_count` questions.
    pub fn build(
        self,
        questions: impl IntoIterator<Item = Question>,
        progress: &HashMap<QuestionId, UserProgress>,
    ) -> SessionPlan {
        let settings = self.settings;
        let mut matched: Vec<Question> = questions
            .into_iter()
            .filter(Question::is_active)
            .filter(|q| settings.difficulty().matches(q.difficulty))
            .filter(|q| settings.matches_subject(&q.subject))
            .filter(|q| settings.completion().matches(progress.get(&q.id)))
            .collect();
        let matched_len = matched.len();

        if self.shuffle {
            let mut rng = rng();
            matched.as_mut_slice().shuffle(&mut rng);
        }

        let cap = usize::try_from(settings.question_count()).unwrap_or(usize::MAX);
        matched.truncate(cap);

        SessionPlan {
            questions: matched,
            matched: matched_len,
        }
    }
}
