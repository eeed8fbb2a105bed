//! Survey conversation: the six-question readiness survey.
//!
//! A session walks a fixed sequence: language selection, then one question
//! per `Aspect` in canonical order. The transition function is I/O-free; the
//! bot executes its replies and submits the completed survey for scoring.

pub mod command;
pub mod localization;
pub mod machine;
pub mod model;
pub mod session;
pub mod state;

pub use command::SurveyCommand;
pub use machine::{Transition, transition};
pub use model::{Aspect, Evaluations, Language, ScoringResult, Survey};
pub use session::Session;
pub use state::SurveyState;
