use crate::cli::ServeArgs;
use crate::infra::{default_channels, load_directory, AppState};
use crate::routes::with_coordination_routes;
use axum::Extension;
use axum_prometheus::PrometheusMetricLayer;
use interview_coordinator::config::AppConfig;
use interview_coordinator::coordination::{
    CoordinationService, InMemoryInterviewStore, InterviewerDirectory, SystemClock,
};
use interview_coordinator::error::AppError;
use interview_coordinator::telemetry;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{info, warn};

pub(crate) async fn run(mut args: ServeArgs) -> Result<(), AppError> {
    let mut config = AppConfig::load()?;

    if let Some(host) = args.host.take() {
        config.server.host = host;
    }
    if let Some(port) = args.port.take() {
        config.server.port = port;
    }

    telemetry::init(&config.telemetry)?;

    let (prometheus_layer, prometheus_handle) = PrometheusMetricLayer::pair();
    let readiness_flag = Arc::new(AtomicBool::new(false));
    let app_state = AppState {
        readiness: readiness_flag.clone(),
        metrics: Arc::new(prometheus_handle),
    };

    let directory = load_directory(config.coordination.roster_path.as_deref())?;
    info!(
        interviewers = directory.interviewers().len(),
        roster = ?config.coordination.roster_path,
        "interviewer roster loaded"
    );

    let service = Arc::new(CoordinationService::new(
        Arc::new(directory),
        Arc::new(InMemoryInterviewStore::default()),
        default_channels(),
        config.coordination.options(),
        Arc::new(SystemClock),
    ));
    log_initial_health(&service);

    let app = with_coordination_routes(service)
        .layer(Extension(app_state))
        .layer(prometheus_layer);

    let addr = config.server.socket_addr()?;
    let listener = tokio::net::TcpListener::bind(addr).await?;
    readiness_flag.store(true, Ordering::Release);

    info!(?config.environment, %addr, "interview coordinator ready");

    axum::serve(listener, app).await?;
    Ok(())
}

fn log_initial_health<D>(service: &CoordinationService<D, InMemoryInterviewStore>)
where
    D: InterviewerDirectory + 'static,
{
    let report = service.health_check();
    for (component, health) in &report.components {
        if let Some(detail) = &health.detail {
            warn!(
                component = %component,
                status = ?health.status,
                detail = %detail,
                "component not healthy at startup"
            );
        }
    }
    info!(status = ?report.status, "startup health check complete");
}
