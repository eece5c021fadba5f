use crate::infra::{AppState, RosterCoverage};
use axum::http::{header, StatusCode};
use axum::response::IntoResponse;
use axum::Extension;
use axum::Json;
use interview_coordinator::coordination::{
    interview_router, CoordinationService, InterviewRepository, InterviewerDirectory,
    InterviewerRoster,
};
use interview_coordinator::error::AppError;
use serde::Deserialize;
use serde_json::json;
use std::io::Cursor;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub(crate) struct RosterCheckRequest {
    pub(crate) roster_csv: String,
}

pub(crate) fn with_coordination_routes<D, R>(
    service: Arc<CoordinationService<D, R>>,
) -> axum::Router
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    interview_router(service)
        .route("/health", axum::routing::get(healthcheck))
        .route("/ready", axum::routing::get(readiness_endpoint))
        .route("/metrics", axum::routing::get(metrics_endpoint))
        .route(
            "/api/v1/roster/check",
            axum::routing::post(roster_check_endpoint),
        )
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

/// Validate an uploaded roster export without loading it into the running directory.
pub(crate) async fn roster_check_endpoint(
    Json(payload): Json<RosterCheckRequest>,
) -> Result<Json<RosterCoverage>, AppError> {
    let roster = InterviewerRoster::from_reader(Cursor::new(payload.roster_csv.into_bytes()))?;
    Ok(Json(RosterCoverage::from_roster(&roster)))
}
