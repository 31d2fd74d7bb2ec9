use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Router,
};
use chrono::{Local, NaiveDate};
use serde::Deserialize;
use serde_json::json;

use super::metrics::{MetricsError, MetricsProvider, MetricsSnapshot};
use super::service::{ScorecardService, ScorecardServiceError};

/// Evaluation request. Omitting the date scores for today; supplying
/// `raw_metrics` bypasses the metrics provider entirely.
#[derive(Debug, Clone, Deserialize)]
pub struct EvaluateRequest {
    pub agent_id: String,
    #[serde(default)]
    pub date: Option<NaiveDate>,
    #[serde(default)]
    pub raw_metrics: Option<MetricsSnapshot>,
}

/// Router builder exposing the scorecard endpoints.
pub fn scorecard_router<P>(service: Arc<ScorecardService<P>>) -> Router
where
    P: MetricsProvider + 'static,
{
    Router::new()
        .route("/api/v1/scorecard/evaluate", post(evaluate_handler::<P>))
        .route(
            "/api/v1/scorecard/agents/:agent_id",
            get(agent_handler::<P>),
        )
        .with_state(service)
}

pub(crate) async fn evaluate_handler<P>(
    State(service): State<Arc<ScorecardService<P>>>,
    axum::Json(request): axum::Json<EvaluateRequest>,
) -> Response
where
    P: MetricsProvider + 'static,
{
    let date = request.date.unwrap_or_else(|| Local::now().date_naive());

    let scored = match request.raw_metrics {
        Some(snapshot) => Ok(service
            .score_snapshot(&request.agent_id, date, snapshot)
            .await),
        None => service.score_agent_parallel(&request.agent_id, date).await,
    };

    match scored {
        Ok(scorecard) => (StatusCode::OK, axum::Json(scorecard.view())).into_response(),
        Err(error) => error_response(error),
    }
}

pub(crate) async fn agent_handler<P>(
    State(service): State<Arc<ScorecardService<P>>>,
    Path(agent_id): Path<String>,
) -> Response
where
    P: MetricsProvider + 'static,
{
    let date = Local::now().date_naive();
    match service.score_agent_parallel(&agent_id, date).await {
        Ok(scorecard) => (StatusCode::OK, axum::Json(scorecard.view())).into_response(),
        Err(error) => error_response(error),
    }
}

fn error_response(error: ScorecardServiceError) -> Response {
    match error {
        ScorecardServiceError::Metrics(MetricsError::AgentNotFound(agent)) => {
            let payload = json!({
                "error": format!("no metrics recorded for agent {agent}"),
            });
            (StatusCode::NOT_FOUND, axum::Json(payload)).into_response()
        }
        other => {
            let payload = json!({
                "error": other.to_string(),
            });
            (StatusCode::INTERNAL_SERVER_ERROR, axum::Json(payload)).into_response()
        }
    }
}
