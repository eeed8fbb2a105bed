//! Startup survey: a chat bot that walks founders through a six-question
//! readiness survey, and the HTTP service that scores the answers with a
//! language model.

pub mod api;
pub mod bot;
pub mod channels;
pub mod config;
pub mod error;
pub mod llm;
pub mod scoring;
pub mod survey;
