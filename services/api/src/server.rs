use crate::cli::ServeArgs;
use crate::infra::{AppState, InMemoryComplianceRepository, InMemoryNotifier};
use crate::routes::with_noc_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use noc_compliance::config::AppConfig;
use noc_compliance::error::AppError;
use noc_compliance::telemetry;
use noc_compliance::workflows::noc::{EligibilityEvaluator, NocReviewService};
use std::sync::atomic::{AtomicBool, Ordering};
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

    let evaluator = EligibilityEvaluator::new(config.eligibility.min_attendance_percent);
    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
        evaluator,
    };

    let review_service = Arc::new(NocReviewService::new(
        Arc::new(InMemoryComplianceRepository::default()),
        Arc::new(InMemoryNotifier::default()),
        evaluator,
    ));

    let app = with_noc_routes(review_service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(
        ?config.environment,
        %addr,
        min_attendance_percent = evaluator.min_attendance_percent(),
        "NOC compliance service ready"
    );

    axum::serve(listener, app).await?;
    Ok(())
}
