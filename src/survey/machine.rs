//! Survey transition function.
//!
//! `transition` is pure with respect to I/O: it mutates the session, returns
//! the replies to send in order, and hands back a completed survey when the
//! last question has been answered. The caller performs the submission.

use super::command::SurveyCommand;
use super::localization::{Text, question, text};
use super::model::{Aspect, Language, Survey};
use super::session::Session;
use super::state::SurveyState;
use crate::error::SurveyError;

/// Outcome of one accepted input.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Transition {
    /// Messages to send back, in order.
    pub replies: Vec<String>,
    /// Set when the survey was completed by this input.
    pub submission: Option<Survey>,
}

impl Transition {
    fn reply(text: impl Into<String>) -> Self {
        Self {
            replies: vec![text.into()],
            submission: None,
        }
    }
}

/// Apply `command` to `session`.
///
/// A rejected input (`InvalidTransition` or an empty answer) leaves the
/// session unchanged.
pub fn transition(session: &mut Session, command: SurveyCommand) -> Result<Transition, SurveyError> {
    let lang = session.language;

    match (session.state, command) {
        (_, SurveyCommand::Help) => Ok(Transition::reply(text(Text::Help, lang))),

        (_, SurveyCommand::Start) => {
            session.clear_answers();
            session.state = SurveyState::ChoosingLanguage;
            Ok(Transition::reply(text(Text::ChooseLanguage, lang)))
        }

        (SurveyState::ChoosingLanguage, SurveyCommand::SelectLanguage(language)) => {
            session.language = Some(language);
            session.state = SurveyState::WaitingForSurvey;
            Ok(Transition::reply(text(Text::LanguageSet, Some(language))))
        }

        (SurveyState::WaitingForSurvey, SurveyCommand::BeginSurvey) => {
            let Some(language) = lang else {
                // Re-prompt without changing state.
                return Ok(Transition::reply(text(Text::ChooseLanguageFirst, None)));
            };
            session.clear_answers();
            session.state = SurveyState::first_question();
            let first = session.state.aspect().unwrap_or_else(Aspect::first);
            Ok(Transition::reply(question(first, language)))
        }

        (SurveyState::Asking(_), SurveyCommand::Cancel) => {
            session.clear_answers();
            session.state = if lang.is_some() {
                SurveyState::WaitingForSurvey
            } else {
                SurveyState::ChoosingLanguage
            };
            Ok(Transition::reply(text(Text::Cancelled, lang)))
        }

        (SurveyState::Asking(aspect), SurveyCommand::Text(answer)) => {
            if answer.trim().is_empty() {
                return Err(SurveyError::Validation(format!(
                    "empty answer for {aspect}"
                )));
            }
            session.record_answer(aspect, answer);

            match aspect.next() {
                Some(next) => {
                    session.state = SurveyState::Asking(next);
                    // A session only reaches Asking with a language chosen.
                    let language = lang.unwrap_or(Language::En);
                    Ok(Transition::reply(question(next, language)))
                }
                None => {
                    session.state = SurveyState::WaitingForSurvey;
                    let survey = session.take_survey()?;
                    Ok(Transition {
                        replies: vec![text(Text::Evaluating, lang).to_string()],
                        submission: Some(survey),
                    })
                }
            }
        }

        (state, command) => Err(SurveyError::InvalidTransition {
            state: state.to_string(),
            input: command.label().to_string(),
        }),
    }
}
