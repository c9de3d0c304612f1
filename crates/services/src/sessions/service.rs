use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::fmt;

use qbank_core::Clock;
use qbank_core::model::{
    CommunityNote, NoteId, OptionId, PracticeSettings, Question, QuestionId, SessionPhase,
    SessionScore, VoteDirection,
};

use super::feedback::{Feedback, OptionState, feedback_for, option_states};
use super::state::SessionState;
use super::timer::{SessionTimer, Ticker};
use crate::error::SessionError;
use crate::report::ExamReport;

//
// ─── OUTCOMES ──────────────────────────────────────────────────────────────────
//

/// Result of `select_answer` on a valid option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerOutcome {
    Recorded,
    /// Exam mode: the question already has its final answer.
    Locked,
}

/// Result of a navigation call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Navigation {
    Moved { index: usize },
    /// `retreat` at the first question.
    AtStart,
    /// `advance` at the last question ended the session.
    Completed,
}

type Callback = Box<dyn FnOnce() + Send>;

//
// ─── SESSION ───────────────────────────────────────────────────────────────────
//

/// Linear walk through a fixed question list.
///
/// Tracks position, answers, flags, elapsed time and community notes, and
/// enforces the per-mode answer rules. Every rejected call leaves the state
/// unchanged.
pub struct ExamSession {
    questions: Vec<Question>,
    settings: PracticeSettings,
    clock: Clock,
    phase: SessionPhase,
    state: SessionState,
    timer: Option<SessionTimer>,
    ticker: Ticker,
    on_complete: Option<Callback>,
    on_close: Option<Callback>,
    started_at: Option<DateTime<Utc>>,
    ended_at: Option<DateTime<Utc>>,
}

impl ExamSession {
    /// Create a session over at most `settings.question_count()` questions.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Empty` if no questions are provided.
    pub fn new(mut questions: Vec<Question>, settings: PracticeSettings) -> Result<Self, SessionError> {
        let limit = usize::try_from(settings.question_count()).unwrap_or(usize::MAX);
        questions.truncate(limit);

        if questions.is_empty() {
            return Err(SessionError::Empty);
        }

        Ok(Self {
            questions,
            settings,
            clock: Clock::default(),
            phase: SessionPhase::NotStarted,
            state: SessionState::default(),
            timer: None,
            ticker: Ticker::Manual,
            on_complete: None,
            on_close: None,
            started_at: None,
            ended_at: None,
        })
    }

    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Register the callback fired once when the last question is passed.
    #[must_use]
    pub fn on_complete(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_complete = Some(Box::new(callback));
        self
    }

    /// Register the callback fired when the session is abandoned early.
    #[must_use]
    pub fn on_close(mut self, callback: impl FnOnce() + Send + 'static) -> Self {
        self.on_close = Some(Box::new(callback));
        self
    }

    /// Begin the session with fresh state and start the elapsed-time ticker.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::AlreadyStarted` unless the session is new, and
    /// `SessionError::TimerUnavailable` for an interval ticker outside a tokio runtime.
    pub fn start(&mut self, ticker: Ticker) -> Result<(), SessionError> {
        if self.phase != SessionPhase::NotStarted {
            return Err(SessionError::AlreadyStarted);
        }
        self.state = SessionState::default();
        self.timer = Some(SessionTimer::start(ticker, &self.state.elapsed)?);
        self.ticker = ticker;
        self.phase = SessionPhase::InProgress;
        self.started_at = Some(self.clock.now());
        tracing::info!(
            mode = %self.settings.mode(),
            questions = self.questions.len(),
            "practice session started"
        );
        Ok(())
    }

    //
    // ─── OPERATIONS ────────────────────────────────────────────────────────────
    //

    /// Record `option` as the answer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownOption` if the option is not part of the
    /// current question, `SessionError::NotInProgress` outside an active session.
    pub fn select_answer(&mut self, option: &OptionId) -> Result<AnswerOutcome, SessionError> {
        self.ensure_in_progress()?;
        let question = &self.questions[self.state.current];
        if !question.has_option(option) {
            tracing::debug!(question = %question.id, option = %option, "rejected unknown option");
            return Err(SessionError::UnknownOption(option.clone()));
        }
        if self.settings.mode().locks_answers() && self.state.answer_for(&question.id).is_some() {
            return Ok(AnswerOutcome::Locked);
        }
        let id = question.id.clone();
        self.state.record_answer(&id, option.clone());
        Ok(AnswerOutcome::Recorded)
    }

    /// Move to the next question, or complete the session at the last one.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` if the session is not running;
    /// in particular repeated calls after completion are rejected.
    pub fn advance(&mut self) -> Result<Navigation, SessionError> {
        self.ensure_in_progress()?;
        if self.state.current + 1 >= self.questions.len() {
            self.finish(SessionPhase::Complete);
            return Ok(Navigation::Completed);
        }
        self.state.current += 1;
        Ok(Navigation::Moved {
            index: self.state.current,
        })
    }

    /// Move to the previous question; its recorded answer becomes the selection.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` if the session is not running.
    pub fn retreat(&mut self) -> Result<Navigation, SessionError> {
        self.ensure_in_progress()?;
        if self.state.current == 0 {
            return Ok(Navigation::AtStart);
        }
        self.state.current -= 1;
        Ok(Navigation::Moved {
            index: self.state.current,
        })
    }

    /// Flip the flag on the current question; returns whether it is now flagged.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` if the session is not running.
    pub fn toggle_flag(&mut self) -> Result<bool, SessionError> {
        self.ensure_in_progress()?;
        let id = self.questions[self.state.current].id.clone();
        Ok(self.state.toggle_flag(&id))
    }

    /// Attach a note from the current viewer to the current question.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::Note` for blank text and
    /// `SessionError::NotInProgress` if the session is not running.
    pub fn add_note(&mut self, text: &str) -> Result<NoteId, SessionError> {
        self.ensure_in_progress()?;
        let id = self.questions[self.state.current].id.clone();
        let now = self.clock.now();
        let note = self.state.add_note(&id, text, now).inspect_err(|_| {
            tracing::debug!(question = %id, "rejected blank note");
        })?;
        Ok(note)
    }

    /// Cast the viewer's vote on a note of the current question and return its new score.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::UnknownNote` if the note is not on the current
    /// question, `SessionError::NotInProgress` if the session is not running.
    pub fn vote(&mut self, note: NoteId, direction: VoteDirection) -> Result<i64, SessionError> {
        self.ensure_in_progress()?;
        let id = self.questions[self.state.current].id.clone();
        self.state.vote(&id, note, direction).ok_or_else(|| {
            tracing::debug!(question = %id, note = %note, "rejected vote on unknown note");
            SessionError::UnknownNote(note)
        })
    }

    /// Advance the elapsed time by one second. Ignored unless the session
    /// runs on `Ticker::Manual`.
    pub fn tick(&mut self) {
        if self.phase == SessionPhase::InProgress && self.ticker == Ticker::Manual {
            self.state.elapsed.tick();
        }
    }

    /// Abandon the session early. Stops the ticker and fires `on_close`.
    ///
    /// # Errors
    ///
    /// Returns `SessionError::NotInProgress` if the session already ended.
    pub fn close(&mut self) -> Result<(), SessionError> {
        if self.phase.is_terminal() {
            return Err(SessionError::NotInProgress(self.phase));
        }
        self.finish(SessionPhase::Closed);
        Ok(())
    }

    fn ensure_in_progress(&self) -> Result<(), SessionError> {
        if self.phase == SessionPhase::InProgress {
            Ok(())
        } else {
            Err(SessionError::NotInProgress(self.phase))
        }
    }

    fn finish(&mut self, phase: SessionPhase) {
        self.phase = phase;
        self.ended_at = Some(self.clock.now());
        if let Some(timer) = self.timer.as_mut() {
            timer.stop();
        }
        let callback = match phase {
            SessionPhase::Complete => self.on_complete.take(),
            _ => self.on_close.take(),
        };
        tracing::info!(
            phase = ?phase,
            elapsed_secs = self.state.elapsed_secs(),
            answered = self.state.answers.len(),
            "practice session ended"
        );
        if let Some(callback) = callback {
            callback();
        }
    }

    //
    // ─── QUERIES ───────────────────────────────────────────────────────────────
    //

    #[must_use]
    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.phase == SessionPhase::Complete
    }

    #[must_use]
    pub fn settings(&self) -> &PracticeSettings {
        &self.settings
    }

    #[must_use]
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    #[must_use]
    pub fn question_count(&self) -> usize {
        self.questions.len()
    }

    #[must_use]
    pub fn current_index(&self) -> usize {
        self.state.current
    }

    #[must_use]
    pub fn current_question(&self) -> &Question {
        &self.questions[self.state.current]
    }

    #[must_use]
    pub fn is_last_question(&self) -> bool {
        self.state.current + 1 == self.questions.len()
    }

    /// Active selection: the recorded answer of the current question.
    #[must_use]
    pub fn selected_option(&self) -> Option<&OptionId> {
        self.state.answer_for(&self.current_question().id)
    }

    #[must_use]
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, OptionId> {
        self.state.answers()
    }

    #[must_use]
    pub fn is_flagged(&self) -> bool {
        self.state.is_flagged(&self.current_question().id)
    }

    #[must_use]
    pub fn flagged(&self) -> &[QuestionId] {
        self.state.flagged()
    }

    #[must_use]
    pub fn current_notes(&self) -> &[CommunityNote] {
        self.state.notes(&self.current_question().id)
    }

    #[must_use]
    pub fn notes_for(&self, question: &QuestionId) -> &[CommunityNote] {
        self.state.notes(question)
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.state.elapsed_secs()
    }

    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        self.started_at
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        self.ended_at
    }

    /// True while the elapsed-time ticker task is alive.
    #[must_use]
    pub fn is_ticking(&self) -> bool {
        self.timer.as_ref().is_some_and(SessionTimer::is_running)
    }

    /// Panels visible for the current question.
    #[must_use]
    pub fn feedback(&self) -> Feedback {
        feedback_for(self.settings.mode(), self.selected_option().is_some())
    }

    #[must_use]
    pub fn option_states(&self) -> Vec<OptionState> {
        option_states(self.current_question(), self.selected_option(), self.feedback())
    }

    #[must_use]
    pub fn score(&self) -> SessionScore {
        SessionScore::compute(&self.questions, self.state.answers(), self.state.elapsed_secs())
    }

    /// Build the exportable report, dated with the session clock.
    #[must_use]
    pub fn report(&self) -> ExamReport {
        ExamReport::build(
            &self.questions,
            self.state.answers(),
            self.state.elapsed_secs(),
            self.clock.now(),
        )
    }
}

impl fmt::Debug for ExamSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ExamSession")
            .field("mode", &self.settings.mode())
            .field("phase", &self.phase)
            .field("questions_len", &self.questions.len())
            .field("current", &self.state.current)
            .field("answers_len", &self.state.answers.len())
            .field("elapsed_secs", &self.state.elapsed_secs())
            .finish_non_exhaustive()
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
