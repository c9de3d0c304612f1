use std::collections::HashMap;

use chrono::{DateTime, Utc};
use qbank_core::model::{
    CommunityNote, NoteAuthor, NoteError, NoteId, OptionId, QuestionId, VoteDirection,
};

use super::timer::ElapsedCounter;

/// Mutable state of one practice session.
///
/// Only the session controller mutates it; every field is reset when a new
/// session starts.
#[derive(Debug, Default)]
pub struct SessionState {
    pub(crate) current: usize,
    pub(crate) answers: HashMap<QuestionId, OptionId>,
    pub(crate) elapsed: ElapsedCounter,
    pub(crate) flagged: Vec<QuestionId>,
    pub(crate) notes: HashMap<QuestionId, Vec<CommunityNote>>,
    next_note_id: u64,
}

impl SessionState {
    #[must_use]
    pub fn current_index(&self) -> usize {
        self.current
    }

    #[must_use]
    pub fn answers(&self) -> &HashMap<QuestionId, OptionId> {
        &self.answers
    }

    #[must_use]
    pub fn answer_for(&self, question: &QuestionId) -> Option<&OptionId> {
        self.answers.get(question)
    }

    #[must_use]
    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.seconds()
    }

    /// Flagged question ids in the order they were flagged.
    #[must_use]
    pub fn flagged(&self) -> &[QuestionId] {
        &self.flagged
    }

    #[must_use]
    pub fn is_flagged(&self, question: &QuestionId) -> bool {
        self.flagged.contains(question)
    }

    /// Notes of a question, highest score first.
    #[must_use]
    pub fn notes(&self, question: &QuestionId) -> &[CommunityNote] {
        self.notes.get(question).map(Vec::as_slice).unwrap_or(&[])
    }

    pub(crate) fn record_answer(&mut self, question: &QuestionId, option: OptionId) {
        self.answers.insert(question.clone(), option);
    }

    /// Returns whether the question is flagged afterwards.
    pub(crate) fn toggle_flag(&mut self, question: &QuestionId) -> bool {
        if let Some(pos) = self.flagged.iter().position(|id| id == question) {
            self.flagged.remove(pos);
            false
        } else {
            self.flagged.push(question.clone());
            true
        }
    }

    pub(crate) fn add_note(
        &mut self,
        question: &QuestionId,
        text: &str,
        at: DateTime<Utc>,
    ) -> Result<NoteId, NoteError> {
        let id = NoteId::new(self.next_note_id + 1);
        let note = CommunityNote::new(id, NoteAuthor::current_viewer(), text, at)?;
        self.next_note_id += 1;
        self.notes.entry(question.clone()).or_default().push(note);
        Ok(id)
    }

    /// Apply a vote and re-rank the question's notes. Returns the note's new
    /// score, or `None` if the note is not on this question.
    pub(crate) fn vote(
        &mut self,
        question: &QuestionId,
        note: NoteId,
        direction: VoteDirection,
    ) -> Option<i64> {
        let notes = self.notes.get_mut(question)?;
        let target = notes.iter_mut().find(|n| n.id() == note)?;
        target.apply_vote(direction);
        let score = target.votes();
        // stable: ties keep their relative order
        notes.sort_by(|a, b| b.votes().cmp(&a.votes()));
        Some(score)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use qbank_core::time::fixed_now;

    fn q(id: &str) -> QuestionId {
        QuestionId::new(id)
    }

    #[test]
    fn flag_toggles_pairwise() {
        let mut state = SessionState::default();
        assert!(state.toggle_flag(&q("1")));
        assert!(!state.toggle_flag(&q("1")));
        assert!(state.toggle_flag(&q("1")));
        assert_eq!(state.flagged(), [q("1")]);
    }

    #[test]
    fn notes_get_sequential_ids() {
        let mut state = SessionState::default();
        let a = state.add_note(&q("1"), "first", fixed_now()).unwrap();
        let b = state.add_note(&q("2"), "second", fixed_now()).unwrap();
        assert_eq!(a, NoteId::new(1));
        assert_eq!(b, NoteId::new(2));

        assert!(state.add_note(&q("1"), "   ", fixed_now()).is_err());
        let c = state.add_note(&q("1"), "third", fixed_now()).unwrap();
        assert_eq!(c, NoteId::new(3));
    }

    #[test]
    fn vote_resorts_descending_and_keeps_ties_stable() {
        let mut state = SessionState::default();
        let question = q("1");
        let a = state.add_note(&question, "a", fixed_now()).unwrap();
        let b = state.add_note(&question, "b", fixed_now()).unwrap();
        let c = state.add_note(&question, "c", fixed_now()).unwrap();

        assert_eq!(state.vote(&question, c, VoteDirection::Up), Some(1));
        let order: Vec<_> = state.notes(&question).iter().map(CommunityNote::id).collect();
        assert_eq!(order, vec![c, a, b]);

        assert_eq!(state.vote(&question, a, VoteDirection::Down), Some(-1));
        let order: Vec<_> = state.notes(&question).iter().map(CommunityNote::id).collect();
        assert_eq!(order, vec![c, b, a]);
    }

    #[test]
    fn vote_on_other_question_is_rejected() {
        let mut state = SessionState::default();
        let note = state.add_note(&q("1"), "a", fixed_now()).unwrap();
        assert_eq!(state.vote(&q("2"), note, VoteDirection::Up), None);
        assert_eq!(state.vote(&q("1"), NoteId::new(99), VoteDirection::Up), None);
        assert_eq!(state.notes(&q("1"))[0].votes(), 0);
    }
}
