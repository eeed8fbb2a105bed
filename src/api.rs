//! HTTP surface of the scoring service.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::scoring::SurveyScorer;
use crate::survey::Survey;

/// Service name reported by `GET /health`.
pub const SERVICE_NAME: &str = "startup-survey";

/// Shared state for the survey routes.
#[derive(Clone)]
pub struct ApiState {
    pub scorer: Arc<dyn SurveyScorer>,
}

/// POST /survey
///
/// Scores a completed survey. Bodies that are not a valid survey are
/// rejected before any model call.
async fn score_survey(
    State(state): State<ApiState>,
    body: Result<Json<Survey>, JsonRejection>,
) -> Response {
    let Json(survey) = match body {
        Ok(body) => body,
        Err(rejection) => {
            tracing::debug!(error = %rejection.body_text(), "Rejected survey body");
            let status = match rejection {
                JsonRejection::JsonDataError(_) => StatusCode::UNPROCESSABLE_ENTITY,
                other => other.status(),
            };
            return error_response(status, rejection_text(status));
        }
    };

    match state.scorer.score(&survey).await {
        Ok(result) => Json(result).into_response(),
        Err(e) => {
            tracing::error!(error = %e, "Survey scoring failed");
            error_response(StatusCode::BAD_GATEWAY, &e.to_string())
        }
    }
}

/// GET /health
async fn health() -> impl IntoResponse {
    Json(serde_json::json!({"status": "ok", "service": SERVICE_NAME}))
}

fn rejection_text(status: StatusCode) -> &'static str {
    if status == StatusCode::UNPROCESSABLE_ENTITY {
        "Survey must contain a non-empty answer for every aspect"
    } else {
        "Request body must be a JSON survey"
    }
}

fn error_response(status: StatusCode, message: &str) -> Response {
    (status, Json(serde_json::json!({"error": message}))).into_response()
}

/// Build the survey REST routes.
pub fn survey_routes(state: ApiState) -> Router {
    Router::new()
        .route("/survey", post(score_survey))
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::{Request, header};
    use http_body_util::BodyExt;
    use tower::ServiceExt;

    use super::*;
    use crate::error::ScoringError;
    use crate::survey::{Aspect, Evaluations, ScoringResult};

    #[derive(Default)]
    struct StubScorer {
        calls: AtomicUsize,
        fail: bool,
    }

    #[async_trait]
    impl SurveyScorer for StubScorer {
        async fn score(&self, survey: &Survey) -> Result<ScoringResult, ScoringError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.fail {
                return Err(ScoringError::RemoteService("model down".into()));
            }
            let evaluations: Evaluations = survey
                .iter()
                .map(|(aspect, answer)| (aspect, format!("ok: {answer}")))
                .collect();
            Ok(ScoringResult {
                evaluations,
                overall_status: "ready".into(),
                recommendations: "ship it".into(),
            })
        }
    }

    fn app(scorer: Arc<StubScorer>) -> Router {
        survey_routes(ApiState { scorer })
    }

    fn survey_body() -> serde_json::Value {
        let mut body = serde_json::Map::new();
        for aspect in Aspect::ALL {
            body.insert(aspect.key().into(), format!("about {aspect}").into());
        }
        body.into()
    }

    fn post_json(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/survey")
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    async fn json_of(resp: Response) -> serde_json::Value {
        let bytes = resp.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn health_reports_service() {
        let resp = app(Arc::default())
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_of(resp).await;
        assert_eq!(body["status"], "ok");
        assert_eq!(body["service"], SERVICE_NAME);
    }

    #[tokio::test]
    async fn valid_survey_is_scored() {
        let scorer = Arc::new(StubScorer::default());
        let resp = app(scorer.clone())
            .oneshot(post_json(survey_body().to_string()))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::OK);
        let body = json_of(resp).await;
        assert_eq!(body["evaluations"]["budget"], "ok: about budget");
        assert_eq!(body["overall_status"], "ready");
        assert_eq!(body["recommendations"], "ship it");
        assert_eq!(body["evaluations"].as_object().unwrap().len(), 6);
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn missing_aspect_is_rejected_without_scoring() {
        let scorer = Arc::new(StubScorer::default());
        let mut body = survey_body();
        body.as_object_mut().unwrap().remove("mvp");

        let resp = app(scorer.clone())
            .oneshot(post_json(body.to_string()))
            .await
            .unwrap();

        assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert!(json_of(resp).await["error"].is_string());
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blank_answer_and_unknown_key_are_rejected() {
        let scorer = Arc::new(StubScorer::default());

        let mut blank = survey_body();
        blank["budget"] = "   ".into();
        let mut extra = survey_body();
        extra["team"] = "two founders".into();
        let mut wrong_type = survey_body();
        wrong_type["budget"] = 5000.into();

        for body in [blank, extra, wrong_type] {
            let resp = app(scorer.clone())
                .oneshot(post_json(body.to_string()))
                .await
                .unwrap();
            assert_eq!(resp.status(), StatusCode::UNPROCESSABLE_ENTITY);
        }
        assert_eq!(scorer.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn malformed_json_is_a_client_error() {
        let resp = app(Arc::default())
            .oneshot(post_json("{not json".into()))
            .await
            .unwrap();
        assert!(resp.status().is_client_error());
    }

    #[tokio::test]
    async fn scoring_failure_maps_to_bad_gateway() {
        let scorer = Arc::new(StubScorer {
            fail: true,
            ..Default::default()
        });
        let resp = app(scorer)
            .oneshot(post_json(survey_body().to_string()))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::BAD_GATEWAY);
        assert!(
            json_of(resp).await["error"]
                .as_str()
                .unwrap()
                .contains("model down")
        );
    }
}
