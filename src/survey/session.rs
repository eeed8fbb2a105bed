//! Per-user survey session.

use std::collections::BTreeMap;
use std::time::Duration;

use chrono::{DateTime, Utc};

use super::model::{Aspect, Language, Survey};
use super::state::SurveyState;
use crate::error::SurveyError;

/// One user's in-progress or idle survey conversation.
///
/// Sessions live in memory only and are owned by exactly one handler, so
/// nothing here is synchronized.
#[derive(Debug, Clone)]
pub struct Session {
    /// Session identity (channel + chat + user).
    pub id: String,
    pub state: SurveyState,
    pub language: Option<Language>,
    answers: BTreeMap<Aspect, String>,
    pub last_active: DateTime<Utc>,
}

impl Session {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            state: SurveyState::default(),
            language: None,
            answers: BTreeMap::new(),
            last_active: Utc::now(),
        }
    }

    /// Record the answer for `aspect`, replacing any earlier one.
    pub fn record_answer(&mut self, aspect: Aspect, text: impl Into<String>) {
        self.answers.insert(aspect, text.into());
    }

    /// Answers collected so far, in canonical order.
    pub fn answers(&self) -> &BTreeMap<Aspect, String> {
        &self.answers
    }

    /// Discard all collected answers.
    pub fn clear_answers(&mut self) {
        self.answers.clear();
    }

    /// Move the collected answers out as a completed survey.
    ///
    /// The session's answers are empty afterwards whether or not the survey
    /// was complete.
    pub fn take_survey(&mut self) -> Result<Survey, SurveyError> {
        Survey::from_answers(std::mem::take(&mut self.answers))
    }

    /// Mark the session as active now.
    pub fn touch(&mut self) {
        self.last_active = Utc::now();
    }

    /// Whether the session has seen no traffic for at least `timeout`.
    pub fn is_idle(&self, timeout: Duration) -> bool {
        let idle = Utc::now().signed_duration_since(self.last_active);
        idle.to_std().map(|d| d >= timeout).unwrap_or(false)
    }
}
