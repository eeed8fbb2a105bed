//! Static localization table: questions, fixed bot messages and result
//! headings for each supported language.

use super::model::{Aspect, Language, ScoringResult};
use super::state::SurveyState;

/// The question asked for `aspect`.
pub fn question(aspect: Aspect, lang: Language) -> &'static str {
    use Aspect::*;
    use Language::*;
    match (aspect, lang) {
        (TargetAudience, En) => "Have you defined your target audience? Who will be your users?",
        (TargetAudience, Ru) => {
            "Определили ли вы вашу целевую аудиторию? Кто будут вашими пользователями?"
        }
        (TechnicalSpecifications, En) => "Do you have a technical specification for development?",
        (TechnicalSpecifications, Ru) => {
            "Есть ли у вас сформированное техническое задание для разработки?"
        }
        (Budget, En) => "Do you have a budget for development and promotion?",
        (Budget, Ru) => "Есть ли у вас бюджет для разработки и последующего продвижения?",
        (Competitors, En) => "Have you analyzed competitors? How do you plan to differ?",
        (Competitors, Ru) => "Провели ли вы анализ конкурентов? Как вы планируете отличаться?",
        (MarketingPlan, En) => "Do you have a marketing plan to attract users?",
        (MarketingPlan, Ru) => "У вас есть план по маркетингу и привлечению пользователей?",
        (Mvp, En) => "Have you determined the minimal viable product (MVP) for your project?",
        (Mvp, Ru) => {
            "Определили ли вы минимальный функционал, который будет включен в ваш продукт?"
        }
    }
}

/// Short human-readable title for `aspect`, used when relaying results.
pub fn aspect_title(aspect: Aspect, lang: Language) -> &'static str {
    use Aspect::*;
    use Language::*;
    match (aspect, lang) {
        (TargetAudience, En) => "Target audience",
        (TargetAudience, Ru) => "Целевая аудитория",
        (TechnicalSpecifications, En) => "Technical specification",
        (TechnicalSpecifications, Ru) => "Техническое задание",
        (Budget, En) => "Budget",
        (Budget, Ru) => "Бюджет",
        (Competitors, En) => "Competitors",
        (Competitors, Ru) => "Конкуренты",
        (MarketingPlan, En) => "Marketing plan",
        (MarketingPlan, Ru) => "Маркетинговый план",
        (Mvp, _) => "MVP",
    }
}

/// Fixed bot messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    ChooseLanguage,
    LanguageSet,
    ChooseLanguageFirst,
    SendStart,
    SendSurvey,
    AnswerOrCancel,
    EmptyAnswer,
    Evaluating,
    SubmitFailed,
    Cancelled,
    Help,
    EvaluationsHeading,
    OverallStatusHeading,
    RecommendationsHeading,
}

/// Look up a fixed message. Sessions without a language get English.
pub fn text(key: Text, lang: Option<Language>) -> &'static str {
    use Language::*;
    use Text::*;
    match (key, lang.unwrap_or(En)) {
        (ChooseLanguage, _) => "Please choose your language:\n1. English (/en)\n2. Русский (/ru)",
        (LanguageSet, En) => "Language set! Type /survey to start the survey.",
        (LanguageSet, Ru) => "Язык выбран! Отправьте /survey, чтобы начать опрос.",
        (ChooseLanguageFirst, _) => "Please choose your language first with /en or /ru.",
        (SendStart, _) => "Send /start to begin.",
        (SendSurvey, En) => "Type /survey to start the survey.",
        (SendSurvey, Ru) => "Отправьте /survey, чтобы начать опрос.",
        (AnswerOrCancel, En) => {
            "Please answer the current question, or send /cancel to stop the survey."
        }
        (AnswerOrCancel, Ru) => {
            "Пожалуйста, ответьте на текущий вопрос или отправьте /cancel, чтобы прервать опрос."
        }
        (EmptyAnswer, En) => "Please send your answer as text.",
        (EmptyAnswer, Ru) => "Пожалуйста, отправьте ответ текстом.",
        (Evaluating, En) => "Thank you! Evaluating your answers, this may take a minute...",
        (Evaluating, Ru) => "Спасибо! Оцениваем ваши ответы, это может занять минуту...",
        (SubmitFailed, En) => "There was an error submitting your survey. Please try again later.",
        (SubmitFailed, Ru) => "Не удалось обработать опрос. Пожалуйста, попробуйте позже.",
        (Cancelled, En) => "Survey cancelled. Type /survey to start again.",
        (Cancelled, Ru) => "Опрос отменён. Отправьте /survey, чтобы начать заново.",
        (Help, En) => {
            "Commands:\n/start - choose the language\n/survey - start the survey\n\
             /cancel - stop the current survey\n/help - show this message"
        }
        (Help, Ru) => {
            "Команды:\n/start - выбрать язык\n/survey - начать опрос\n\
             /cancel - прервать текущий опрос\n/help - показать это сообщение"
        }
        (EvaluationsHeading, En) => "🔍 Evaluations:",
        (EvaluationsHeading, Ru) => "🔍 Оценки:",
        (OverallStatusHeading, En) => "📊 Overall status:",
        (OverallStatusHeading, Ru) => "📊 Общий статус:",
        (RecommendationsHeading, En) => "💡 Recommendations:",
        (RecommendationsHeading, Ru) => "💡 Рекомендации:",
    }
}

/// Hint sent when an input is not accepted in `state`.
pub fn invalid_input_hint(state: SurveyState, lang: Option<Language>) -> &'static str {
    match state {
        SurveyState::Idle => text(Text::SendStart, lang),
        SurveyState::ChoosingLanguage => text(Text::ChooseLanguageFirst, lang),
        SurveyState::WaitingForSurvey => text(Text::SendSurvey, lang),
        SurveyState::Asking(_) => text(Text::AnswerOrCancel, lang),
    }
}

/// Render a scoring result as three messages: evaluations, overall status,
/// recommendations. Each is chunked independently by the transport.
pub fn format_result(result: &ScoringResult, lang: Language) -> Vec<String> {
    let lang_opt = Some(lang);

    let mut evaluations = format!("{}\n", text(Text::EvaluationsHeading, lang_opt));
    for (aspect, evaluation) in &result.evaluations {
        evaluations.push_str(&format!(
            "• {}: {}\n",
            aspect_title(*aspect, lang),
            evaluation.trim()
        ));
    }

    let overall = format!(
        "{} {}",
        text(Text::OverallStatusHeading, lang_opt),
        result.overall_status.trim()
    );

    let recommendations = format!(
        "{}\n{}",
        text(Text::RecommendationsHeading, lang_opt),
        result.recommendations.trim()
    );

    vec![evaluations.trim_end().to_string(), overall, recommendations]
}
