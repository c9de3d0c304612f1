mod feedback;
mod plan;
mod service;
mod state;
mod timer;
mod workflow;

// Public API of the session subsystem.
pub use crate::error::SessionError;
pub use feedback::{Feedback, OptionState, feedback_for, option_states};
pub use plan::{SessionPlan, SessionPlanner};
pub use service::{AnswerOutcome, ExamSession, Navigation};
pub use state::SessionState;
pub use timer::{ElapsedCounter, Ticker};
pub use workflow::{SessionLoopService, SessionOutcome};
