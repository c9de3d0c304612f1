//! Exportable exam report.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use qbank_core::model::{OptionId, Question, QuestionId, SessionScore};

use crate::error::ReportError;

const NOT_ANSWERED: &str = "Not answered";

/// One row of the report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReportQuestion {
    pub question: String,
    /// Text of the chosen option, or `"Not answered"`.
    pub selected_answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub correct_answer: Option<String>,
    /// Absent when the question was not answered.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub is_correct: Option<bool>,
}

/// Summary of a finished session as written to `exam-report-YYYY-MM-DD.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExamReport {
    /// RFC 3339 timestamp with millisecond precision.
    pub date: String,
    pub total_questions: u32,
    pub correct_answers: u32,
    pub accuracy: String,
    pub time_spent: String,
    pub average_time_per_question: String,
    pub questions: Vec<ReportQuestion>,
    #[serde(skip)]
    day: Option<NaiveDate>,
}

impl ExamReport {
    #[must_use]
    pub fn build(
        questions: &[Question],
        answers: &HashMap<QuestionId, OptionId>,
        elapsed_secs: u64,
        at: DateTime<Utc>,
    ) -> Self {
        let score = SessionScore::compute(questions, answers, elapsed_secs);
        let rows = questions
            .iter()
            .map(|question| {
                let selected = answers.get(&question.id).and_then(|id| question.option(id));
                ReportQuestion {
                    question: question.text.clone(),
                    selected_answer: selected
                        .map_or_else(|| NOT_ANSWERED.to_owned(), |o| o.text.clone()),
                    correct_answer: question.correct_option().map(|o| o.text.clone()),
                    is_correct: selected.map(|o| o.is_correct),
                }
            })
            .collect();

        Self {
            date: at.to_rfc3339_opts(SecondsFormat::Millis, true),
            total_questions: score.total,
            correct_answers: score.correct,
            accuracy: score.accuracy_label(),
            time_spent: score.time_spent_label(),
            average_time_per_question: format!("{}s", score.average_secs_per_question()),
            questions: rows,
            day: Some(at.date_naive()),
        }
    }

    /// `exam-report-YYYY-MM-DD.json` for the given day.
    #[must_use]
    pub fn file_name_for(day: NaiveDate) -> String {
        format!("exam-report-{}.json", day.format("%Y-%m-%d"))
    }

    /// File name derived from the report date; falls back to parsing `date`.
    #[must_use]
    pub fn file_name(&self) -> String {
        let day = self.day.or_else(|| {
            DateTime::parse_from_rfc3339(&self.date)
                .ok()
                .map(|d| d.with_timezone(&Utc).date_naive())
        });
        day.map_or_else(
            || "exam-report.json".to_owned(),
            Self::file_name_for,
        )
    }

    /// Two-space indented JSON.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Serialize` if serialization fails.
    pub fn to_pretty_json(&self) -> Result<String, ReportError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Write the report into `dir`, creating it if needed. Returns the file path.
    ///
    /// # Errors
    ///
    /// Returns `ReportError::Io` if the directory or file cannot be written.
    pub fn write_to_dir(&self, dir: &Path) -> Result<PathBuf, ReportError> {
        fs::create_dir_all(dir)?;
        let path = dir.join(self.file_name());
        fs::write(&path, self.to_pretty_json()?)?;
        tracing::info!(path = %path.display(), "exam report written");
        Ok(path)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbank_core::time::fixed_now;
    use storage::seed::sample_questions;

    fn answers(pairs: &[(&str, &str)]) -> HashMap<QuestionId, OptionId> {
        pairs
            .iter()
            .map(|(q, o)| (QuestionId::new(*q), OptionId::new(*o)))
            .collect()
    }

    #[test]
    fn report_summarizes_answers() {
        let questions = sample_questions();
        let report = ExamReport::build(
            &questions,
            &answers(&[("1", "1a"), ("2", "2b")]),
            125,
            fixed_now(),
        );

        assert_eq!(report.date, "2024-03-10T12:00:00.000Z");
        assert_eq!(report.total_questions, 3);
        assert_eq!(report.correct_answers, 1);
        assert_eq!(report.accuracy, "33%");
        assert_eq!(report.time_spent, "2m 5s");
        assert_eq!(report.average_time_per_question, "42s");

        assert_eq!(report.questions[0].is_correct, Some(true));
        assert_eq!(report.questions[1].is_correct, Some(false));
        assert_eq!(report.questions[2].selected_answer, "Not answered");
        assert_eq!(report.questions[2].is_correct, None);
        assert_eq!(
            report.questions[1].correct_answer.as_deref(),
            Some(questions[1].options[0].text.as_str())
        );
    }

    #[test]
    fn json_uses_camel_case_and_omits_missing_fields() {
        let questions = sample_questions();
        let report = ExamReport::build(&questions[..1], &HashMap::new(), 0, fixed_now());
        let json = report.to_pretty_json().unwrap();

        assert!(json.contains("\"totalQuestions\": 1"));
        assert!(json.contains("\"averageTimePerQuestion\": \"0s\""));
        assert!(json.contains("\"selectedAnswer\": \"Not answered\""));
        assert!(!json.contains("isCorrect"));
        assert!(json.starts_with("{\n  \""));
    }

    #[test]
    fn file_name_uses_report_day() {
        let report = ExamReport::build(&sample_questions(), &HashMap::new(), 0, fixed_now());
        assert_eq!(report.file_name(), "exam-report-2024-03-10.json");

        let parsed: ExamReport = serde_json::from_str(&report.to_pretty_json().unwrap()).unwrap();
        assert_eq!(parsed.file_name(), "exam-report-2024-03-10.json");
    }

    #[test]
    fn write_to_dir_creates_file() {
        let dir = tempfile::tempdir().unwrap();
        let target = dir.path().join("reports");
        let report = ExamReport::build(
            &sample_questions(),
            &answers(&[("1", "1a")]),
            30,
            fixed_now(),
        );

        let path = report.write_to_dir(&target).unwrap();
        assert_eq!(path, target.join("exam-report-2024-03-10.json"));

        let written = std::fs::read_to_string(&path).unwrap();
        let parsed: serde_json::Value = serde_json::from_str(&written).unwrap();
        assert_eq!(parsed["correctAnswers"], 1);
        assert_eq!(parsed["timeSpent"], "0m 30s");
    }
}
