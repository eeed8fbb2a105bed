//! Survey scoring: the multi-step model conversation and the client the bot
//! uses to reach it.

pub mod client;
pub mod orchestrator;
pub mod prompts;
pub mod transcript;

pub use client::{HttpScoringClient, SurveyScorer};
pub use orchestrator::ScoringOrchestrator;
pub use transcript::Transcript;
