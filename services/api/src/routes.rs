use crate::infra::AppState;
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use fieldscore::workflows::scorecard::metrics::MetricsProvider;
use fieldscore::workflows::scorecard::{scorecard_router, ScorecardService};
use serde_json::json;
use std::sync::Arc;

/// Composes the library's scorecard routes with the service-level health,
/// readiness, and metrics endpoints.
pub(crate) fn with_scorecard_routes<P>(service: Arc<ScorecardService<P>>) -> axum::Router
where
    P: MetricsProvider + 'static,
{
    scorecard_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
}

pub(crate) async fn healthcheck() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

pub(crate) async fn readiness_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    let ready = state.readiness.load(std::sync::atomic::Ordering::Relaxed);
    let status = if ready {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let payload = if ready {
        json!({ "status": "ready" })
    } else {
        json!({ "status": "initializing" })
    };

    (status, Json(payload))
}

pub(crate) async fn metrics_endpoint(Extension(state): Extension<AppState>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "text/plain; version=0.0.4")],
        state.metrics.render(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra::seeded_provider;
    use fieldscore::workflows::scorecard::config::ScorecardConfig;
    use metrics_exporter_prometheus::PrometheusBuilder;
    use std::sync::atomic::{AtomicBool, Ordering};
    use tower::ServiceExt;

    fn test_state(ready: bool) -> AppState {
        let handle = PrometheusBuilder::new()
            .build_recorder()
            .handle();
        AppState {
            readiness: Arc::new(AtomicBool::new(ready)),
            metrics: Arc::new(handle),
        }
    }

    fn test_router(ready: bool) -> axum::Router {
        let service = Arc::new(ScorecardService::new(
            Arc::new(seeded_provider()),
            ScorecardConfig::default(),
        ));
        with_scorecard_routes(service).layer(Extension(test_state(ready)))
    }

    async fn get(router: axum::Router, uri: &str) -> axum::response::Response {
        router
            .oneshot(
                axum::http::Request::get(uri)
                    .body(axum::body::Body::empty())
                    .expect("build request"),
            )
            .await
            .expect("route executes")
    }

    #[tokio::test]
    async fn healthcheck_reports_ok() {
        let response = get(test_router(true), "/health").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn readiness_follows_the_flag() {
        let response = get(test_router(false), "/ready").await;
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);

        let state = test_state(false);
        state.readiness.store(true, Ordering::Release);
        let service = Arc::new(ScorecardService::new(
            Arc::new(seeded_provider()),
            ScorecardConfig::default(),
        ));
        let router = with_scorecard_routes(service).layer(Extension(state));
        let response = get(router, "/ready").await;
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn scorecard_routes_are_mounted() {
        let response = get(test_router(true), "/api/v1/scorecard/agents/FA-2002").await;
        assert_eq!(response.status(), StatusCode::OK);
    }
}
