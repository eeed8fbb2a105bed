//! Remote scoring client used by the bot.

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, warn};

use crate::error::ScoringError;
use crate::survey::{ScoringResult, Survey};

/// Something that turns a completed survey into a scoring result.
///
/// The bot only depends on this trait, so it can talk to the HTTP service or
/// to an in-process orchestrator.
#[async_trait]
pub trait SurveyScorer: Send + Sync {
    async fn score(&self, survey: &Survey) -> Result<ScoringResult, ScoringError>;
}

/// Submits surveys to a `POST /survey` endpoint.
pub struct HttpScoringClient {
    client: reqwest::Client,
    url: String,
    timeout: Duration,
}

impl HttpScoringClient {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            timeout,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

#[async_trait]
impl SurveyScorer for HttpScoringClient {
    async fn score(&self, survey: &Survey) -> Result<ScoringResult, ScoringError> {
        debug!(url = %self.url, "Submitting survey for scoring");

        let resp = self
            .client
            .post(&self.url)
            .timeout(self.timeout)
            .json(survey)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    ScoringError::RemoteService(format!(
                        "scoring service timed out after {:?}",
                        self.timeout
                    ))
                } else {
                    ScoringError::RemoteService(format!("request failed: {e}"))
                }
            })?;

        let status = resp.status();
        if status != reqwest::StatusCode::OK {
            let body = resp.text().await.unwrap_or_default();
            warn!(%status, body = %body, "Scoring service returned an error");
            return Err(ScoringError::RemoteService(format!("HTTP {status}: {body}")));
        }

        let body = resp
            .text()
            .await
            .map_err(|e| ScoringError::RemoteService(format!("failed to read response: {e}")))?;
        serde_json::from_str::<ScoringResult>(&body).map_err(|e| {
            warn!(error = %e, "Scoring service returned a malformed result");
            ScoringError::RemoteService(format!("malformed scoring result: {e}"))
        })
    }
}
