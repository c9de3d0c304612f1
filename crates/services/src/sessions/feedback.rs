use qbank_core::model::{OptionId, PracticeMode, Question};

/// Which feedback panels a question screen shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Feedback {
    /// Correct/incorrect styling on the options.
    pub show_correctness: bool,
    pub show_explanation: bool,
    pub show_notes: bool,
    /// Whether the "next" control accepts input.
    pub can_advance: bool,
}

/// Display rules per mode: explained always reveals, quick reveals once the
/// question has an answer, exam never reveals mid-session.
#[must_use]
pub fn feedback_for(mode: PracticeMode, has_selection: bool) -> Feedback {
    let reveal = match mode {
        PracticeMode::Explained => true,
        PracticeMode::Quick => has_selection,
        PracticeMode::Exam => false,
    };
    Feedback {
        show_correctness: reveal,
        show_explanation: reveal,
        show_notes: reveal,
        can_advance: mode == PracticeMode::Explained || has_selection,
    }
}

/// Styling of a single option.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OptionState {
    Neutral,
    Selected,
    Correct,
    Incorrect,
}

/// Per-option styling for the current question, in option order.
#[must_use]
pub fn option_states(
    question: &Question,
    selected: Option<&OptionId>,
    feedback: Feedback,
) -> Vec<OptionState> {
    question
        .options
        .iter()
        .map(|option| {
            let is_selected = selected == Some(&option.id);
            match (feedback.show_correctness, option.is_correct, is_selected) {
                (true, true, _) => OptionState::Correct,
                (true, false, true) => OptionState::Incorrect,
                (false, _, true) => OptionState::Selected,
                _ => OptionState::Neutral,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use storage::seed::sample_questions;

    #[test]
    fn explained_always_reveals() {
        for has_selection in [false, true] {
            let f = feedback_for(PracticeMode::Explained, has_selection);
            assert!(f.show_correctness && f.show_explanation && f.show_notes);
            assert!(f.can_advance);
        }
    }

    #[test]
    fn quick_reveals_after_selection() {
        let before = feedback_for(PracticeMode::Quick, false);
        assert!(!before.show_explanation);
        assert!(!before.can_advance);

        let after = feedback_for(PracticeMode::Quick, true);
        assert!(after.show_explanation && after.show_notes && after.show_correctness);
        assert!(after.can_advance);
    }

    #[test]
    fn exam_never_reveals() {
        for has_selection in [false, true] {
            let f = feedback_for(PracticeMode::Exam, has_selection);
            assert!(!f.show_correctness && !f.show_explanation && !f.show_notes);
            assert_eq!(f.can_advance, has_selection);
        }
    }

    #[test]
    fn option_states_follow_feedback() {
        let q = &sample_questions()[0];
        let picked = OptionId::new("1b");

        let revealed = option_states(q, Some(&picked), feedback_for(PracticeMode::Quick, true));
        assert_eq!(
            revealed,
            vec![
                OptionState::Correct,
                OptionState::Incorrect,
                OptionState::Neutral,
                OptionState::Neutral
            ]
        );

        let hidden = option_states(q, Some(&picked), feedback_for(PracticeMode::Exam, true));
        assert_eq!(hidden[0], OptionState::Neutral);
        assert_eq!(hidden[1], OptionState::Selected);
    }
}
