//! Survey state machine states.

use super::model::Aspect;

/// Where a session is in the survey conversation.
///
/// Progresses: Idle → ChoosingLanguage → WaitingForSurvey →
/// Asking(target_audience) → … → Asking(mvp) → WaitingForSurvey.
/// `/start` re-enters ChoosingLanguage from any state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurveyState {
    /// Fresh session; nothing has been sent yet.
    #[default]
    Idle,
    ChoosingLanguage,
    WaitingForSurvey,
    /// Waiting for the answer to one aspect's question.
    Asking(Aspect),
}

impl SurveyState {
    /// The first question state.
    pub fn first_question() -> Self {
        Self::Asking(Aspect::first())
    }

    /// The aspect being asked, if any.
    pub fn aspect(&self) -> Option<Aspect> {
        match self {
            Self::Asking(aspect) => Some(*aspect),
            _ => None,
        }
    }

    /// Whether a survey is in progress.
    pub fn is_asking(&self) -> bool {
        matches!(self, Self::Asking(_))
    }

    /// Check if a transition from `self` to `target` is valid.
    pub fn can_transition_to(&self, target: SurveyState) -> bool {
        use SurveyState::*;
        match (self, target) {
            (_, ChoosingLanguage) => true,
            (ChoosingLanguage, WaitingForSurvey) => true,
            (WaitingForSurvey, Asking(aspect)) => aspect == Aspect::first(),
            (Asking(current), Asking(next)) => current.next() == Some(next),
            // Completion from the last question, or cancellation mid-survey.
            (Asking(_), WaitingForSurvey) => true,
            _ => false,
        }
    }

    /// Get the next state in the question walk, if any.
    ///
    /// After the last question the survey is submitted and the session
    /// returns to `WaitingForSurvey`.
    pub fn next(&self) -> Option<SurveyState> {
        match self {
            Self::Idle => Some(Self::ChoosingLanguage),
            Self::ChoosingLanguage => Some(Self::WaitingForSurvey),
            Self::WaitingForSurvey => Some(Self::first_question()),
            Self::Asking(aspect) => Some(
                aspect
                    .next()
                    .map(Self::Asking)
                    .unwrap_or(Self::WaitingForSurvey),
            ),
        }
    }
}

impl std::fmt::Display for SurveyState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::ChoosingLanguage => write!(f, "choosing_language"),
            Self::WaitingForSurvey => write!(f, "waiting_for_survey"),
            Self::Asking(aspect) => write!(f, "asking_{}", aspect.key()),
        }
    }
}
