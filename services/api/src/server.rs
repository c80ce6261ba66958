use crate::cli::ServeArgs;
use crate::infra::{load_engine, AppState, InMemoryAssessmentRepository, InMemoryCareTeamNotifier};
use crate::routes::with_assessment_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use std::sync::atomic::Ordering;
use std::sync::Arc;
use care_ai::config::AppConfig;
use care_ai::error::AppError;
use care_ai::telemetry;
use care_ai::workflows::assessment::AssessmentService;
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

    // Table problems surface here, before the listener binds.
    let engine = Arc::new(load_engine(&config.engine)?);

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let repository = Arc::new(InMemoryAssessmentRepository::default());
    let notifier = Arc::new(InMemoryCareTeamNotifier::default());
    let assessment_service = Arc::new(AssessmentService::new(
        repository,
        notifier,
        engine.as_ref().clone(),
    ));

    let app = with_assessment_routes(assessment_service)
        .layer(Extension(engine))
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "care-level decision service ready");

    axum::serve(listener, app).await?;
    Ok(())
}
