use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::model::ids::{OptionId, QuestionId};
use crate::model::question::Question;

/// Lifecycle of a practice session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionPhase {
    #[default]
    NotStarted,
    InProgress,
    Complete,
    /// Abandoned by the learner before the last question.
    Closed,
}

impl SessionPhase {
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, SessionPhase::Complete | SessionPhase::Closed)
    }
}

/// Qualitative band shown with the results.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Performance {
    Excellent,
    Good,
    KeepPracticing,
}

impl Performance {
    #[must_use]
    pub fn from_accuracy(percent: f64) -> Self {
        if percent >= 80.0 {
            Performance::Excellent
        } else if percent >= 60.0 {
            Performance::Good
        } else {
            Performance::KeepPracticing
        }
    }
}

impl fmt::Display for Performance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Performance::Excellent => "Excellent",
            Performance::Good => "Good",
            Performance::KeepPracticing => "Keep Practicing",
        })
    }
}

/// Formats whole seconds as `"{m}m {s}s"`.
#[must_use]
pub fn format_elapsed(seconds: u64) -> String {
    format!("{}m {}s", seconds / 60, seconds % 60)
}

/// Formats whole seconds as a `"m:ss"` stopwatch.
#[must_use]
pub fn format_stopwatch(seconds: u64) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}

/// Score of a session over its full question list.
///
/// Unanswered questions count as wrong. Average time is rounded half up.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SessionScore {
    pub total: u32,
    pub correct: u32,
    pub answered: u32,
    pub elapsed_secs: u64,
}

impl SessionScore {
    #[must_use]
    pub fn compute(
        questions: &[Question],
        answers: &HashMap<QuestionId, OptionId>,
        elapsed_secs: u64,
    ) -> Self {
        let mut correct = 0_u32;
        let mut answered = 0_u32;
        for question in questions {
            if let Some(selected) = answers.get(&question.id) {
                answered = answered.saturating_add(1);
                if question.is_correct(selected) {
                    correct = correct.saturating_add(1);
                }
            }
        }
        Self {
            total: u32::try_from(questions.len()).unwrap_or(u32::MAX),
            correct,
            answered,
            elapsed_secs,
        }
    }

    /// Fraction correct in `0.0..=1.0`; 0 for an empty session.
    #[must_use]
    pub fn accuracy(&self) -> f64 {
        if self.total == 0 {
            return 0.0;
        }
        f64::from(self.correct) / f64::from(self.total)
    }

    #[must_use]
    pub fn accuracy_percent(&self) -> f64 {
        self.accuracy() * 100.0
    }

    /// Accuracy as a rounded whole percentage, e.g. `"67%"`.
    #[must_use]
    pub fn accuracy_label(&self) -> String {
        format!("{:.0}%", self.accuracy_percent().round())
    }

    #[must_use]
    pub fn average_secs_per_question(&self) -> u64 {
        let total = u64::from(self.total);
        if total == 0 {
            return 0;
        }
        (self.elapsed_secs * 2 + total) / (total * 2)
    }

    #[must_use]
    pub fn time_spent_label(&self) -> String {
        format_elapsed(self.elapsed_secs)
    }

    #[must_use]
    pub fn performance(&self) -> Performance {
        Performance::from_accuracy(self.accuracy_percent())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::question::{Difficulty, QuestionOption, QuestionStatus};
    use crate::time::fixed_now;

    fn question(id: &str) -> Question {
        Question {
            id: QuestionId::new(id),
            text: format!("Q{id}"),
            options: vec![
                QuestionOption::new(format!("{id}a").as_str(), "right", true),
                QuestionOption::new(format!("{id}b").as_str(), "wrong", false),
            ],
            explanation: String::new(),
            difficulty: Difficulty::Medium,
            tags: Vec::new(),
            subject: "Surgery".into(),
            source: "Test".into(),
            status: QuestionStatus::Active,
            created_at: fixed_now(),
            updated_at: fixed_now(),
        }
    }

    #[test]
    fn score_counts_unanswered_as_wrong() {
        let questions = vec![question("1"), question("2"), question("3")];
        let mut answers = HashMap::new();
        answers.insert(QuestionId::new("1"), OptionId::new("1a"));
        answers.insert(QuestionId::new("2"), OptionId::new("2b"));

        let score = SessionScore::compute(&questions, &answers, 125);
        assert_eq!(score.total, 3);
        assert_eq!(score.answered, 2);
        assert_eq!(score.correct, 1);
        assert_eq!(score.accuracy_label(), "33%");
        assert_eq!(score.time_spent_label(), "2m 5s");
        assert_eq!(score.average_secs_per_question(), 42);
        assert_eq!(score.performance(), Performance::KeepPracticing);
    }

    #[test]
    fn average_rounds_half_up() {
        let questions = vec![question("1"), question("2")];
        let score = SessionScore::compute(&questions, &HashMap::new(), 5);
        assert_eq!(score.average_secs_per_question(), 3);
        let score = SessionScore::compute(&questions, &HashMap::new(), 4);
        assert_eq!(score.average_secs_per_question(), 2);
    }

    #[test]
    fn performance_bands() {
        assert_eq!(Performance::from_accuracy(80.0), Performance::Excellent);
        assert_eq!(Performance::from_accuracy(60.0), Performance::Good);
        assert_eq!(Performance::from_accuracy(59.9), Performance::KeepPracticing);
        assert_eq!(Performance::KeepPracticing.to_string(), "Keep Practicing");
    }

    #[test]
    fn stopwatch_pads_seconds() {
        assert_eq!(format_stopwatch(65), "1:05");
        assert_eq!(format_elapsed(0), "0m 0s");
    }
}
