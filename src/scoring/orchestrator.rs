//! Scoring orchestrator: six aspect evaluations, then overall status and
//! recommendations, all over one growing transcript.

use std::sync::Arc;
use std::time::{Duration, Instant};

use async_trait::async_trait;
use tracing::{Instrument, debug, info, warn};
use uuid::Uuid;

use super::client::SurveyScorer;
use super::prompts::{
    SYSTEM_PRIMER, evaluation_prompt, overall_status_prompt, recommendations_prompt,
};
use super::transcript::Transcript;
use crate::error::{LlmError, ScoringError};
use crate::llm::{CompletionRequest, LlmProvider};
use crate::survey::{Aspect, Evaluations, ScoringResult, Survey};

/// Default upper bound on one model call.
pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(60);

/// Runs the model calls that score one survey.
///
/// Calls are strictly sequential: each one sees every earlier prompt and
/// reply of the same run.
pub struct ScoringOrchestrator {
    llm: Arc<dyn LlmProvider>,
    call_timeout: Duration,
    max_tokens: Option<u32>,
}

impl ScoringOrchestrator {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self {
            llm,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            max_tokens: None,
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: Option<u32>) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Score a survey. Any failed call aborts the run; no partial result is
    /// returned.
    pub async fn evaluate(&self, survey: &Survey) -> Result<ScoringResult, ScoringError> {
        let run_id = Uuid::new_v4();
        let span = tracing::info_span!("scoring_run", %run_id, model = %self.llm.model_name());

        async move {
            let started = Instant::now();
            let mut transcript = Transcript::new(SYSTEM_PRIMER);
            let mut evaluations = Evaluations::new();

            for aspect in Aspect::ALL {
                let prompt = evaluation_prompt(aspect, survey.answer(aspect));
                let (next, reply) = self.ask(transcript, aspect.key(), prompt).await?;
                transcript = next;
                evaluations.insert(aspect, reply);
            }

            let (transcript, overall_status) = self
                .ask(
                    transcript,
                    "overall_status",
                    overall_status_prompt(&evaluations),
                )
                .await?;

            let (transcript, recommendations) = self
                .ask(
                    transcript,
                    "recommendations",
                    recommendations_prompt(&evaluations),
                )
                .await?;

            info!(
                messages = transcript.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Survey scored"
            );

            Ok(ScoringResult {
                evaluations,
                overall_status,
                recommendations,
            })
        }
        .instrument(span)
        .await
    }

    /// Append `prompt`, call the model with the whole transcript, append the
    /// reply. Returns the extended transcript and the reply text.
    async fn ask(
        &self,
        transcript: Transcript,
        step: &str,
        prompt: String,
    ) -> Result<(Transcript, String), ScoringError> {
        let transcript = transcript.push_user(prompt);

        let mut request = CompletionRequest::new(transcript.messages().to_vec());
        if let Some(max_tokens) = self.max_tokens {
            request = request.with_max_tokens(max_tokens);
        }

        let started = Instant::now();
        let response = tokio::time::timeout(self.call_timeout, self.llm.complete(request))
            .await
            .map_err(|_| LlmError::Timeout {
                provider: self.llm.model_name().to_string(),
                timeout: self.call_timeout,
            })
            .and_then(|result| result)
            .map_err(|source| {
                warn!(step, error = %source, "Model call failed");
                ScoringError::Model {
                    step: step.to_string(),
                    source,
                }
            })?;

        if response.content.trim().is_empty() {
            return Err(ScoringError::Model {
                step: step.to_string(),
                source: LlmError::InvalidResponse {
                    provider: self.llm.model_name().to_string(),
                    reason: "empty reply".to_string(),
                },
            });
        }

        debug!(
            step,
            input_tokens = response.input_tokens,
            output_tokens = response.output_tokens,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Model call complete"
        );

        let reply = response.content;
        Ok((transcript.push_assistant(reply.clone()), reply))
    }
}

#[async_trait]
impl SurveyScorer for ScoringOrchestrator {
    async fn score(&self, survey: &Survey) -> Result<ScoringResult, ScoringError> {
        self.evaluate(survey).await
    }
}
