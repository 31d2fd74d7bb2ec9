use crate::cli::ServeArgs;
use crate::infra::{seeded_provider, AppState};
use crate::routes::with_scorecard_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use fieldscore::config::AppConfig;
use fieldscore::error::AppError;
use fieldscore::telemetry;
use fieldscore::workflows::scorecard::config::ScorecardConfig;
use fieldscore::workflows::scorecard::ScorecardService;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use tracing::info;

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let scorecard_config = match &config.scorecard.config_path {
        Some(path) => ScorecardConfig::from_path(path)?,
        None => ScorecardConfig::default(),
    };

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let provider = Arc::new(seeded_provider());
    let scorecard_service = Arc::new(ScorecardService::new(provider, scorecard_config));

    let app = with_scorecard_routes(scorecard_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "field agent scorecard service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
