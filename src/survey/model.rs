//! Survey data model: the fixed aspect set, languages, completed surveys and
//! scoring results.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::error::SurveyError;

/// One of the six fixed survey dimensions.
///
/// Declaration order is the canonical question order; `Ord` follows it, so
/// `BTreeMap<Aspect, _>` iterates in canonical order too.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Aspect {
    TargetAudience,
    TechnicalSpecifications,
    Budget,
    Competitors,
    MarketingPlan,
    Mvp,
}

impl Aspect {
    /// All aspects in canonical order.
    pub const ALL: [Aspect; 6] = [
        Aspect::TargetAudience,
        Aspect::TechnicalSpecifications,
        Aspect::Budget,
        Aspect::Competitors,
        Aspect::MarketingPlan,
        Aspect::Mvp,
    ];

    /// Wire key, as used in JSON bodies.
    pub fn key(&self) -> &'static str {
        match self {
            Self::TargetAudience => "target_audience",
            Self::TechnicalSpecifications => "technical_specifications",
            Self::Budget => "budget",
            Self::Competitors => "competitors",
            Self::MarketingPlan => "marketing_plan",
            Self::Mvp => "mvp",
        }
    }

    /// Position in `ALL`.
    pub fn index(&self) -> usize {
        Self::ALL
            .iter()
            .position(|a| a == self)
            .unwrap_or_default()
    }

    /// The aspect asked after this one, if any.
    pub fn next(&self) -> Option<Aspect> {
        Self::ALL.get(self.index() + 1).copied()
    }

    /// The first aspect asked.
    pub fn first() -> Aspect {
        Self::ALL[0]
    }
}

impl std::fmt::Display for Aspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.key())
    }
}

/// Language a session's questions are shown in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    En,
    Ru,
}

impl Language {
    pub fn code(&self) -> &'static str {
        match self {
            Self::En => "en",
            Self::Ru => "ru",
        }
    }

    pub fn from_code(code: &str) -> Option<Language> {
        match code {
            "en" => Some(Self::En),
            "ru" => Some(Self::Ru),
            _ => None,
        }
    }
}

impl std::fmt::Display for Language {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.code())
    }
}

/// A completed survey: one non-empty answer per aspect.
///
/// Serializes as a flat JSON object keyed by `Aspect::key`. Deserialization
/// rejects unknown keys, non-string values, and missing or blank answers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(
    try_from = "BTreeMap<Aspect, String>",
    into = "BTreeMap<Aspect, String>"
)]
pub struct Survey {
    answers: BTreeMap<Aspect, String>,
}

impl Survey {
    /// Build a survey, checking that every aspect has a non-blank answer.
    pub fn from_answers(answers: BTreeMap<Aspect, String>) -> Result<Self, SurveyError> {
        let missing: Vec<&str> = Aspect::ALL
            .iter()
            .filter(|a| answers.get(a).is_none_or(|text| text.trim().is_empty()))
            .map(|a| a.key())
            .collect();
        if !missing.is_empty() {
            return Err(SurveyError::Validation(format!(
                "missing or empty answers: {}",
                missing.join(", ")
            )));
        }
        Ok(Self { answers })
    }

    /// The answer recorded for `aspect`.
    pub fn answer(&self, aspect: Aspect) -> &str {
        self.answers.get(&aspect).map(String::as_str).unwrap_or("")
    }

    /// Answers in canonical order.
    pub fn iter(&self) -> impl Iterator<Item = (Aspect, &str)> {
        self.answers.iter().map(|(a, text)| (*a, text.as_str()))
    }
}

impl TryFrom<BTreeMap<Aspect, String>> for Survey {
    type Error = SurveyError;

    fn try_from(answers: BTreeMap<Aspect, String>) -> Result<Self, Self::Error> {
        Self::from_answers(answers)
    }
}

impl From<Survey> for BTreeMap<Aspect, String> {
    fn from(survey: Survey) -> Self {
        survey.answers
    }
}

/// Per-aspect evaluation texts, in canonical order.
pub type Evaluations = BTreeMap<Aspect, String>;

/// Outcome of scoring one survey.
///
/// Deserialization requires an evaluation for every aspect, so a partial
/// result from a remote service never reaches the user.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawScoringResult")]
pub struct ScoringResult {
    pub evaluations: Evaluations,
    pub overall_status: String,
    pub recommendations: String,
}

#[derive(Deserialize)]
struct RawScoringResult {
    evaluations: Evaluations,
    overall_status: String,
    recommendations: String,
}

impl TryFrom<RawScoringResult> for ScoringResult {
    type Error = SurveyError;

    fn try_from(raw: RawScoringResult) -> Result<Self, Self::Error> {
        let missing: Vec<&str> = Aspect::ALL
            .iter()
            .filter(|a| !raw.evaluations.contains_key(a))
            .map(|a| a.key())
            .collect();
        if !missing.is_empty() {
            return Err(SurveyError::Validation(format!(
                "scoring result lacks evaluations for: {}",
                missing.join(", ")
            )));
        }
        Ok(Self {
            evaluations: raw.evaluations,
            overall_status: raw.overall_status,
            recommendations: raw.recommendations,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn full_answers() -> BTreeMap<Aspect, String> {
        Aspect::ALL
            .iter()
            .map(|a| (*a, format!("answer for {a}")))
            .collect()
    }

    #[test]
    fn next_walks_all_aspects() {
        let mut current = Aspect::first();
        let mut visited = vec![current];
        while let Some(next) = current.next() {
            visited.push(next);
            current = next;
        }
        assert_eq!(visited, Aspect::ALL.to_vec());
        assert!(Aspect::Mvp.next().is_none());
    }

    #[test]
    fn key_matches_serde() {
        for aspect in Aspect::ALL {
            let json = serde_json::to_string(&aspect).unwrap();
            assert_eq!(json, format!("\"{}\"", aspect.key()));
        }
    }

    #[test]
    fn language_codes() {
        assert_eq!(Language::from_code("ru"), Some(Language::Ru));
        assert_eq!(Language::from_code("en"), Some(Language::En));
        assert_eq!(Language::from_code("de"), None);
        assert_eq!(Language::Ru.to_string(), "ru");
    }

    #[test]
    fn survey_requires_every_aspect() {
        let mut answers = full_answers();
        answers.remove(&Aspect::Budget);
        let err = Survey::from_answers(answers).unwrap_err();
        assert_eq!(
            err,
            SurveyError::Validation("missing or empty answers: budget".into())
        );
    }

    #[test]
    fn survey_rejects_blank_answer() {
        let mut answers = full_answers();
        answers.insert(Aspect::Mvp, "   ".into());
        assert!(Survey::from_answers(answers).is_err());
    }

    #[test]
    fn survey_json_is_flat_object_in_canonical_order() {
        let survey = Survey::from_answers(full_answers()).unwrap();
        let json = serde_json::to_string(&survey).unwrap();
        assert!(json.starts_with(r#"{"target_audience":"#));
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 6);
        assert_eq!(value["mvp"], "answer for mvp");
    }

    #[test]
    fn survey_deserialize_rejects_unknown_field() {
        let mut value = serde_json::to_value(Survey::from_answers(full_answers()).unwrap()).unwrap();
        value["pitch_deck"] = serde_json::json!("yes");
        assert!(serde_json::from_value::<Survey>(value).is_err());
    }

    #[test]
    fn survey_deserialize_rejects_wrong_type() {
        let mut value = serde_json::to_value(Survey::from_answers(full_answers()).unwrap()).unwrap();
        value["budget"] = serde_json::json!(10000);
        assert!(serde_json::from_value::<Survey>(value).is_err());
    }

    #[test]
    fn survey_deserialize_rejects_missing_field() {
        let mut value = serde_json::to_value(Survey::from_answers(full_answers()).unwrap()).unwrap();
        value.as_object_mut().unwrap().remove("competitors");
        let err = serde_json::from_value::<Survey>(value).unwrap_err();
        assert!(err.to_string().contains("competitors"));
    }

    #[test]
    fn scoring_result_shape() {
        let result = ScoringResult {
            evaluations: full_answers(),
            overall_status: "ready".into(),
            recommendations: "ship it".into(),
        };
        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["evaluations"].as_object().unwrap().len(), 6);
        assert_eq!(value["evaluations"]["target_audience"], "answer for target_audience");
        assert_eq!(value["overall_status"], "ready");
        assert_eq!(value["recommendations"], "ship it");
    }

    #[test]
    fn scoring_result_requires_every_evaluation() {
        let partial = serde_json::json!({
            "evaluations": {"budget": "x"},
            "overall_status": "s",
            "recommendations": "r",
        });
        let err = serde_json::from_value::<ScoringResult>(partial).unwrap_err();
        assert!(err.to_string().contains("target_audience"));
        assert!(!err.to_string().contains("budget"));

        let full = serde_json::json!({
            "evaluations": full_answers(),
            "overall_status": "s",
            "recommendations": "r",
        });
        let result: ScoringResult = serde_json::from_value(full).unwrap();
        assert_eq!(result.evaluations.len(), 6);
    }
}
