use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::error;

use super::directory::{DirectoryError, InterviewerDirectory};
use super::domain::{ApplicantBackground, InterviewId, RescheduleRequest, ScheduleRequest};
use super::format::{FormatCriteria, FormatRecommendation, PreparationGuide};
use super::health::HealthStatus;
use super::matching::{MatchCriteria, MatchingError};
use super::reminders::{ApplicantResponse, ConfirmationRequest, ReminderError};
use super::repository::{InterviewRepository, RepositoryError};
use super::scheduler::SchedulingError;
use super::service::{CoordinationError, CoordinationRequest, CoordinationService};
use super::status::InterviewStatus;

type SharedService<D, R> = Arc<CoordinationService<D, R>>;

/// HTTP endpoints for interview coordination.
pub fn interview_router<D, R>(service: SharedService<D, R>) -> Router
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    Router::new()
        .route(
            "/api/v1/interviews/coordinate",
            post(coordinate_handler::<D, R>),
        )
        .route("/api/v1/interviews", post(schedule_handler::<D, R>))
        .route("/api/v1/interviews/health", get(health_handler::<D, R>))
        .route("/api/v1/interviews/:interview_id", get(get_handler::<D, R>))
        .route(
            "/api/v1/interviews/:interview_id/reschedule",
            post(reschedule_handler::<D, R>),
        )
        .route(
            "/api/v1/interviews/:interview_id/status",
            post(status_handler::<D, R>),
        )
        .route(
            "/api/v1/interviews/:interview_id/reminders",
            post(schedule_reminders_handler::<D, R>).get(reminders_handler::<D, R>),
        )
        .route(
            "/api/v1/interviews/:interview_id/reminders/dispatch",
            post(dispatch_handler::<D, R>),
        )
        .route(
            "/api/v1/interviews/:interview_id/confirmation",
            post(confirmation_handler::<D, R>),
        )
        .route("/api/v1/matches", post(matches_handler::<D, R>))
        .route(
            "/api/v1/formats/recommendation",
            post(format_handler::<D, R>),
        )
        .with_state(service)
}

#[derive(Debug, Clone, Deserialize)]
pub struct RescheduleBody {
    pub preferred_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub background: ApplicantBackground,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StatusBody {
    pub status: InterviewStatus,
    #[serde(default)]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct DispatchBody {
    #[serde(default)]
    pub now: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ConfirmationBody {
    pub response: ApplicantResponse,
    #[serde(default)]
    pub responded_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct MatchBody {
    #[serde(flatten)]
    pub criteria: MatchCriteria,
    #[serde(default)]
    pub count: Option<usize>,
}

#[derive(Debug, Clone, Serialize)]
pub struct FormatResponse {
    pub recommendations: Vec<FormatRecommendation>,
    pub preparation_guide: Option<PreparationGuide>,
}

pub(crate) async fn coordinate_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Json(request): Json<CoordinationRequest>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    match service.coordinate(request) {
        Ok(outcome) => (StatusCode::CREATED, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn schedule_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Json(request): Json<ScheduleRequest>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    match service.schedule_interview(&request) {
        Ok(scheduled) => (StatusCode::CREATED, Json(scheduled)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn get_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Path(interview_id): Path<String>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    match service.get(&InterviewId(interview_id)) {
        Ok(interview) => (StatusCode::OK, Json(interview)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reschedule_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Path(interview_id): Path<String>,
    Json(body): Json<RescheduleBody>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    let request = RescheduleRequest {
        interview_id: InterviewId(interview_id),
        preferred_dates: body.preferred_dates,
        background: body.background,
        reason: body.reason,
    };
    match service.reschedule(request) {
        Ok(outcome) => (StatusCode::OK, Json(outcome)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn status_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Path(interview_id): Path<String>,
    Json(body): Json<StatusBody>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    match service.update_status(&InterviewId(interview_id), body.status, body.reason) {
        Ok(interview) => (StatusCode::OK, Json(interview)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn schedule_reminders_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Path(interview_id): Path<String>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    match service.schedule_reminders(&InterviewId(interview_id)) {
        Ok(schedule) => (StatusCode::CREATED, Json(schedule)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn reminders_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Path(interview_id): Path<String>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    match service.reminders(&InterviewId(interview_id)) {
        Ok(schedule) => (StatusCode::OK, Json(schedule)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn dispatch_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Path(interview_id): Path<String>,
    body: Option<Json<DispatchBody>>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    let now = body
        .and_then(|Json(body)| body.now)
        .unwrap_or_else(|| service.now());
    match service.dispatch_due_reminders(&InterviewId(interview_id), now) {
        Ok(schedule) => (StatusCode::OK, Json(schedule)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn confirmation_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Path(interview_id): Path<String>,
    Json(body): Json<ConfirmationBody>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    let request = ConfirmationRequest {
        interview_id: InterviewId(interview_id),
        response: body.response,
        responded_at: body.responded_at.unwrap_or_else(|| service.now()),
        notes: body.notes,
    };
    match service.process_confirmation(request) {
        Ok(interview) => (StatusCode::OK, Json(interview)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn matches_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Json(body): Json<MatchBody>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    let result = match body.count {
        Some(count) => service.find_multiple_matches(&body.criteria, count),
        None => service.find_best_match(&body.criteria).map(|best| vec![best]),
    };
    match result {
        Ok(matches) => (StatusCode::OK, Json(matches)).into_response(),
        Err(err) => error_response(err),
    }
}

pub(crate) async fn format_handler<D, R>(
    State(service): State<SharedService<D, R>>,
    Json(criteria): Json<FormatCriteria>,
) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    let recommendations = service.recommend_format(&criteria);
    let preparation_guide = recommendations
        .first()
        .map(|top| service.preparation_guide(top.format, criteria.interview_type));
    let payload = FormatResponse {
        recommendations,
        preparation_guide,
    };
    (StatusCode::OK, Json(payload)).into_response()
}

pub(crate) async fn health_handler<D, R>(State(service): State<SharedService<D, R>>) -> Response
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    let report = service.health_check();
    let status = match report.status {
        HealthStatus::Healthy | HealthStatus::Degraded => StatusCode::OK,
        HealthStatus::Unhealthy => StatusCode::SERVICE_UNAVAILABLE,
    };
    (status, Json(report)).into_response()
}

/// HTTP status for a coordination failure.
pub fn status_for(err: &CoordinationError) -> StatusCode {
    use CoordinationError as E;

    match err {
        E::InterviewNotFound(_)
        | E::Scheduling(SchedulingError::InterviewNotFound(_))
        | E::Reminder(ReminderError::InterviewNotFound(_))
        | E::Reminder(ReminderError::ScheduleNotFound(_)) => StatusCode::NOT_FOUND,

        E::Scheduling(SchedulingError::NoAvailableSlot { .. })
        | E::Scheduling(SchedulingError::ConflictDetected(_))
        | E::Scheduling(SchedulingError::InvalidTransition(_))
        | E::Matching(MatchingError::NoAvailableSlot { .. })
        | E::Reminder(ReminderError::InvalidTransition(_))
        | E::InvalidTransition(_) => StatusCode::CONFLICT,

        E::Matching(MatchingError::NoEligibleInterviewers(_))
        | E::Scheduling(SchedulingError::NoEligibleInterviewers(_))
        | E::Scheduling(SchedulingError::InvalidDuration)
        | E::Scheduling(SchedulingError::InvalidWindow(_)) => StatusCode::UNPROCESSABLE_ENTITY,

        E::Matching(MatchingError::Directory(err)) | E::Scheduling(SchedulingError::Directory(err)) => {
            directory_status(err)
        }

        E::Matching(MatchingError::Repository(err))
        | E::Scheduling(SchedulingError::Repository(err))
        | E::Reminder(ReminderError::Repository(err))
        | E::Repository(err) => repository_status(err),
    }
}

fn directory_status(err: &DirectoryError) -> StatusCode {
    match err {
        DirectoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn repository_status(err: &RepositoryError) -> StatusCode {
    match err {
        RepositoryError::NotFound => StatusCode::NOT_FOUND,
        RepositoryError::Conflict | RepositoryError::Stale => StatusCode::CONFLICT,
        RepositoryError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

fn error_response(err: CoordinationError) -> Response {
    let status = status_for(&err);
    if status.is_server_error() {
        error!(error = %err, "coordination request failed");
    }
    let payload = json!({
        "error": err.to_string(),
    });
    (status, Json(payload)).into_response()
}
