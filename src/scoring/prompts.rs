//! Prompts sent to the model during a scoring run.

use crate::survey::{Aspect, Evaluations};

/// System primer opening every transcript.
pub const SYSTEM_PRIMER: &str = "You are an expert startup evaluator. Answer the questions. \
All answers must be not longer than 200 tokens. Answer in the language of main information";

/// Russian label for an aspect, used inside the prompts.
fn label(aspect: Aspect) -> &'static str {
    match aspect {
        Aspect::TargetAudience => "Целевая аудитория",
        Aspect::TechnicalSpecifications => "Техническое задание",
        Aspect::Budget => "Бюджет",
        Aspect::Competitors => "Анализ конкурентов",
        Aspect::MarketingPlan => "Маркетинг-план",
        Aspect::Mvp => "Минимально жизнеспособный продукт (MVP)",
    }
}

/// Prompt asking the model to evaluate one answer.
pub fn evaluation_prompt(aspect: Aspect, answer: &str) -> String {
    let subject = match aspect {
        Aspect::TargetAudience => "целевой аудитории",
        Aspect::TechnicalSpecifications => "технического задания",
        Aspect::Budget => "бюджета",
        Aspect::Competitors => "анализа конкурентов",
        Aspect::MarketingPlan => "маркетинг-плана",
        Aspect::Mvp => "минимально жизнеспособного продукта (MVP)",
    };
    format!("Оцените готовность {subject}: {answer}")
}

/// All six evaluations as one sentence list, in canonical order.
fn summary(evaluations: &Evaluations) -> String {
    Aspect::ALL
        .iter()
        .map(|aspect| {
            let evaluation = evaluations.get(aspect).map(String::as_str).unwrap_or("");
            format!("{}: {}.", label(*aspect), evaluation)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Prompt asking for the overall readiness verdict.
pub fn overall_status_prompt(evaluations: &Evaluations) -> String {
    format!(
        "Оцените общую готовность стартапа на основе следующих данных: {} \
         Предоставьте общую оценку готовности.",
        summary(evaluations)
    )
}

/// Prompt asking for improvement recommendations.
pub fn recommendations_prompt(evaluations: &Evaluations) -> String {
    format!(
        "На основе следующих данных: {} \
         Предоставьте рекомендации для улучшения проекта. Сплошным текстом с пунктами",
        summary(evaluations)
    )
}
