use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::model::ids::NoteId;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum NoteError {
    #[error("note text cannot be empty")]
    EmptyText,

    #[error("unknown vote direction: {0}")]
    UnknownDirection(String),
}

//
// ─── VOTES ─────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VoteDirection {
    Up,
    Down,
}

impl VoteDirection {
    fn weight(self) -> i64 {
        match self {
            VoteDirection::Up => 1,
            VoteDirection::Down => -1,
        }
    }
}

impl fmt::Display for VoteDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            VoteDirection::Up => "up",
            VoteDirection::Down => "down",
        })
    }
}

impl FromStr for VoteDirection {
    type Err = NoteError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "up" => Ok(Self::Up),
            "down" => Ok(Self::Down),
            other => Err(NoteError::UnknownDirection(other.to_owned())),
        }
    }
}

/// Result of casting one viewer vote: `(score delta, viewer vote afterwards)`.
///
/// Repeating the current vote retracts it; voting the other way retracts and
/// casts the opposite vote in one step.
#[must_use]
pub fn vote_transition(
    prior: Option<VoteDirection>,
    requested: VoteDirection,
) -> (i64, Option<VoteDirection>) {
    match prior {
        None => (requested.weight(), Some(requested)),
        Some(p) if p == requested => (-p.weight(), None),
        Some(p) => (requested.weight() - p.weight(), Some(requested)),
    }
}

//
// ─── NOTE ──────────────────────────────────────────────────────────────────────
//

/// Who wrote a note.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NoteAuthor {
    pub user_id: String,
    pub display_name: String,
}

impl NoteAuthor {
    #[must_use]
    pub fn new(user_id: impl Into<String>, display_name: impl Into<String>) -> Self {
        Self {
            user_id: user_id.into(),
            display_name: display_name.into(),
        }
    }

    /// The local viewer of a session.
    #[must_use]
    pub fn current_viewer() -> Self {
        Self::new("current-user", "You")
    }
}

/// A learner annotation on a question, ranked by peer votes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommunityNote {
    id: NoteId,
    author: NoteAuthor,
    text: String,
    votes: i64,
    viewer_vote: Option<VoteDirection>,
    created_at: DateTime<Utc>,
}

impl CommunityNote {
    /// Create a note with no votes.
    ///
    /// # Errors
    ///
    /// Returns `NoteError::EmptyText` if the text is blank after trimming.
    pub fn new(
        id: NoteId,
        author: NoteAuthor,
        text: &str,
        created_at: DateTime<Utc>,
    ) -> Result<Self, NoteError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(NoteError::EmptyText);
        }
        Ok(Self {
            id,
            author,
            text: text.to_owned(),
            votes: 0,
            viewer_vote: None,
            created_at,
        })
    }

    #[must_use]
    pub fn id(&self) -> NoteId {
        self.id
    }

    #[must_use]
    pub fn author(&self) -> &NoteAuthor {
        &self.author
    }

    #[must_use]
    pub fn text(&self) -> &str {
        &self.text
    }

    /// Net score; may be negative.
    #[must_use]
    pub fn votes(&self) -> i64 {
        self.votes
    }

    #[must_use]
    pub fn viewer_vote(&self) -> Option<VoteDirection> {
        self.viewer_vote
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Apply the viewer's vote and return the score delta.
    pub fn apply_vote(&mut self, direction: VoteDirection) -> i64 {
        let (delta, next) = vote_transition(self.viewer_vote, direction);
        self.votes += delta;
        self.viewer_vote = next;
        delta
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use VoteDirection::{Down, Up};

    fn note() -> CommunityNote {
        CommunityNote::new(NoteId::new(1), NoteAuthor::current_viewer(), "GABA-A", fixed_now())
            .unwrap()
    }

    #[test]
    fn transition_table() {
        assert_eq!(vote_transition(None, Up), (1, Some(Up)));
        assert_eq!(vote_transition(None, Down), (-1, Some(Down)));
        assert_eq!(vote_transition(Some(Up), Up), (-1, None));
        assert_eq!(vote_transition(Some(Down), Down), (1, None));
        assert_eq!(vote_transition(Some(Up), Down), (-2, Some(Down)));
        assert_eq!(vote_transition(Some(Down), Up), (2, Some(Up)));
    }

    #[test]
    fn repeated_vote_nets_to_zero() {
        for dir in [Up, Down] {
            let mut n = note();
            n.apply_vote(dir);
            n.apply_vote(dir);
            assert_eq!(n.votes(), 0);
            assert_eq!(n.viewer_vote(), None);
        }
    }

    #[test]
    fn switching_vote_moves_score_by_two() {
        let mut n = note();
        assert_eq!(n.apply_vote(Down), -1);
        assert_eq!(n.apply_vote(Up), 2);
        assert_eq!(n.votes(), 1);
        assert_eq!(n.viewer_vote(), Some(Up));
    }

    #[test]
    fn blank_text_is_rejected_and_text_trimmed() {
        let err = CommunityNote::new(NoteId::new(1), NoteAuthor::current_viewer(), "  ", fixed_now())
            .unwrap_err();
        assert_eq!(err, NoteError::EmptyText);

        let n = CommunityNote::new(NoteId::new(2), NoteAuthor::current_viewer(), " hi ", fixed_now())
            .unwrap();
        assert_eq!(n.text(), "hi");
        assert_eq!(n.votes(), 0);
        assert_eq!(n.author().display_name, "You");
    }
}
