//! Parsing inbound chat text into survey commands.

use super::model::Language;

/// An inbound signal for the survey state machine.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SurveyCommand {
    /// `/start`: (re)enter language selection.
    Start,
    /// `/en`, `/ru`: pick the survey language.
    SelectLanguage(Language),
    /// `/survey`: begin the questions.
    BeginSurvey,
    /// `/cancel`: abandon the survey in progress.
    Cancel,
    /// `/help`: list commands.
    Help,
    /// Anything else; an answer while a question is pending.
    Text(String),
}

impl SurveyCommand {
    /// Parse message content into a command.
    ///
    /// Commands match case-insensitively and may carry a Telegram
    /// `@botname` suffix. Unrecognized input, including unknown slash
    /// words, is kept verbatim as `Text`.
    pub fn parse(content: &str) -> SurveyCommand {
        let trimmed = content.trim();
        let lower = trimmed.to_lowercase();
        let command = lower
            .split_once('@')
            .map(|(cmd, _bot)| cmd)
            .unwrap_or(lower.as_str());

        match command {
            "/start" => Self::Start,
            "/survey" => Self::BeginSurvey,
            "/cancel" | "/stop" => Self::Cancel,
            "/help" | "/?" => Self::Help,
            other => match other.strip_prefix('/').and_then(Language::from_code) {
                Some(language) => Self::SelectLanguage(language),
                None => Self::Text(content.to_string()),
            },
        }
    }

    /// Short label for logs and error messages.
    pub fn label(&self) -> &str {
        match self {
            Self::Start => "/start",
            Self::SelectLanguage(Language::En) => "/en",
            Self::SelectLanguage(Language::Ru) => "/ru",
            Self::BeginSurvey => "/survey",
            Self::Cancel => "/cancel",
            Self::Help => "/help",
            Self::Text(_) => "text",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_commands() {
        assert_eq!(SurveyCommand::parse("/start"), SurveyCommand::Start);
        assert_eq!(
            SurveyCommand::parse("/ru"),
            SurveyCommand::SelectLanguage(Language::Ru)
        );
        assert_eq!(
            SurveyCommand::parse("/en"),
            SurveyCommand::SelectLanguage(Language::En)
        );
        assert_eq!(SurveyCommand::parse("/survey"), SurveyCommand::BeginSurvey);
        assert_eq!(SurveyCommand::parse("/cancel"), SurveyCommand::Cancel);
        assert_eq!(SurveyCommand::parse("/help"), SurveyCommand::Help);
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(SurveyCommand::parse("  /START \n"), SurveyCommand::Start);
        assert_eq!(SurveyCommand::parse("/Survey"), SurveyCommand::BeginSurvey);
    }

    #[test]
    fn parse_strips_bot_suffix() {
        assert_eq!(
            SurveyCommand::parse("/survey@startup_readiness_bot"),
            SurveyCommand::BeginSurvey
        );
    }

    #[test]
    fn free_text_is_kept_verbatim() {
        let answer = "  Small businesses in Europe\n";
        assert_eq!(
            SurveyCommand::parse(answer),
            SurveyCommand::Text(answer.to_string())
        );
    }

    #[test]
    fn unknown_slash_word_is_text() {
        assert_eq!(
            SurveyCommand::parse("/n/a"),
            SurveyCommand::Text("/n/a".to_string())
        );
    }

    #[test]
    fn text_containing_at_sign_is_text() {
        let answer = "write to team@example.com";
        assert_eq!(
            SurveyCommand::parse(answer),
            SurveyCommand::Text(answer.to_string())
        );
    }
}
