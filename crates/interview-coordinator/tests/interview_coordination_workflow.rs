//! End-to-end interview coordination through the public service facade and HTTP
//! router: roster import, booking, confirmation, reminder dispatch and closing
//! out an interview.

mod common {
    use std::io::Cursor;
    use std::sync::{Arc, Mutex};

    use chrono::{DateTime, TimeZone, Utc};

    use interview_coordinator::coordination::{
        ApplicantBackground, ApplicantPreferences, ApplicationId, ChannelKind, CoordinationOptions,
        CoordinationRequest, CoordinationService, FixedClock, InMemoryInterviewStore,
        InterviewType, InterviewerRoster, Notification, NotificationChannel, NotificationError,
        StaticDirectory, TechnologyAccess,
    };

    pub(super) type Service = CoordinationService<StaticDirectory, InMemoryInterviewStore>;

    const ROSTER: &str = "\
id,name,role,email,phone,competencies,languages,cultural_familiarity,alignment
iv-ruth,Ruth Alvarez,Admissions Officer,ruth@example.edu,,Admissions;Communication,English;Spanish,Latin American,0.9
iv-sam,Samuel Okafor,Dean,sam@example.edu,,Leadership;Admissions;Governance,English,,0.85
iv-grace,Grace Lin,Faculty,grace@example.edu,,Curriculum;Research;Academic Advising,English;Mandarin,East Asian,0.7
iv-john,John Mercer,Chaplain,john@example.edu,,Pastoral Care;Theology,English,,0.95
";

    pub(super) fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 4, day, hour, minute, 0)
            .single()
            .expect("valid instant")
    }

    #[derive(Default)]
    pub(super) struct Outbox {
        sent: Mutex<Vec<Notification>>,
    }

    impl Outbox {
        pub(super) fn sent(&self) -> Vec<Notification> {
            self.sent.lock().expect("outbox mutex poisoned").clone()
        }
    }

    impl NotificationChannel for Outbox {
        fn kind(&self) -> ChannelKind {
            ChannelKind::Email
        }

        fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
            self.sent
                .lock()
                .expect("outbox mutex poisoned")
                .push(notification.clone());
            Ok(())
        }
    }

    pub(super) struct Harness {
        pub(super) service: Arc<Service>,
        pub(super) store: Arc<InMemoryInterviewStore>,
        pub(super) outbox: Arc<Outbox>,
        pub(super) clock: Arc<FixedClock>,
    }

    pub(super) fn harness() -> Harness {
        let roster =
            InterviewerRoster::from_reader(Cursor::new(ROSTER)).expect("roster parses");
        let store = Arc::new(InMemoryInterviewStore::default());
        let outbox = Arc::new(Outbox::default());
        let clock = Arc::new(FixedClock::new(at(1, 8, 0)));
        let channels: Vec<Arc<dyn NotificationChannel>> = vec![outbox.clone()];
        let service = Arc::new(CoordinationService::new(
            Arc::new(StaticDirectory::from_roster(roster)),
            store.clone(),
            channels,
            CoordinationOptions::default(),
            clock.clone(),
        ));
        Harness {
            service,
            store,
            outbox,
            clock,
        }
    }

    pub(super) fn request(
        application: &str,
        interview_type: InterviewType,
        dates: Vec<DateTime<Utc>>,
    ) -> CoordinationRequest {
        CoordinationRequest {
            application_id: ApplicationId(application.to_string()),
            interview_type,
            preferences: ApplicantPreferences {
                preferred_dates: dates,
                time_zone: "America/Los_Angeles".to_string(),
                duration_minutes: None,
                format: None,
                background: ApplicantBackground {
                    language_preference: Some("Spanish".to_string()),
                    ..ApplicantBackground::default()
                },
                technology: TechnologyAccess::default(),
                accessibility_needs: Vec::new(),
                preferred_formats: Vec::new(),
                can_attend_in_person: true,
                notes: None,
            },
        }
    }
}

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use chrono::Duration;
use common::*;
use interview_coordinator::coordination::{
    interview_router, ApplicantBackground, ApplicantResponse, ConfirmationRequest,
    CoordinationError, DeliveryStatus, InterviewRepository, InterviewStatus, InterviewType,
    ReminderKind, RescheduleRequest,
};
use serde_json::{json, Value};
use tower::ServiceExt;

#[test]
fn screening_flows_from_booking_to_completion() {
    let Harness {
        service,
        store,
        outbox,
        clock,
    } = harness();

    let outcome = service
        .coordinate(request(
            "app-2025-017",
            InterviewType::InitialScreening,
            vec![at(8, 16, 0), at(9, 16, 0)],
        ))
        .expect("screening coordinated");
    let id = outcome.interview.id.clone();

    assert_eq!(outcome.interview.interviewer_id.0, "iv-ruth");
    assert_eq!(outcome.interview.scheduled_at, at(8, 16, 0));
    assert!(outcome
        .match_result
        .reasons
        .iter()
        .any(|reason| reason.contains("language 'spanish'")));
    assert_eq!(outbox.sent().len(), 1);

    let confirmed = service
        .process_confirmation(ConfirmationRequest {
            interview_id: id.clone(),
            response: ApplicantResponse::Confirmed,
            responded_at: at(1, 12, 0),
            notes: None,
        })
        .expect("confirmed");
    assert_eq!(confirmed.status, InterviewStatus::Scheduled);

    clock.set(at(7, 16, 0));
    let schedule = service
        .dispatch_due_reminders(&id, service.now())
        .expect("dispatch");
    let sent: Vec<ReminderKind> = outbox.sent().iter().map(|n| n.kind).collect();
    assert_eq!(
        sent,
        vec![
            ReminderKind::ConfirmationRequest,
            ReminderKind::PreInterviewReminder,
            ReminderKind::PreInterviewReminder,
        ]
    );
    assert_eq!(schedule.reminders[0].acknowledged_at, Some(at(1, 12, 0)));

    clock.set(at(8, 16, 0));
    service
        .update_status(&id, InterviewStatus::InProgress, None)
        .expect("checked in");
    clock.advance(Duration::minutes(30));
    let completed = service
        .update_status(&id, InterviewStatus::Completed, None)
        .expect("completed");
    assert_eq!(completed.status_history.len(), 2);

    let schedule = service.reminders(&id).expect("schedule");
    assert_eq!(schedule.pending().count(), 0);
    assert_eq!(
        schedule.reminders.last().map(|r| r.status),
        Some(DeliveryStatus::Skipped)
    );
    assert_eq!(
        store.fetch(&id).expect("fetch").map(|i| i.status),
        Some(InterviewStatus::Completed)
    );
}

#[test]
fn reschedule_request_moves_the_interview_and_frees_the_old_slot() {
    let Harness { service, .. } = harness();

    let first = service
        .coordinate(request(
            "app-a",
            InterviewType::InitialScreening,
            vec![at(8, 16, 0)],
        ))
        .expect("first booking")
        .interview;

    let marked = service
        .process_confirmation(ConfirmationRequest {
            interview_id: first.id.clone(),
            response: ApplicantResponse::NeedsReschedule,
            responded_at: at(2, 9, 0),
            notes: Some("travel".to_string()),
        })
        .expect("reschedule requested");
    assert_eq!(marked.status, InterviewStatus::Rescheduled);

    let moved = service
        .reschedule(RescheduleRequest {
            interview_id: first.id.clone(),
            preferred_dates: vec![at(10, 10, 0)],
            background: ApplicantBackground::default(),
            reason: Some("travel".to_string()),
        })
        .expect("moved")
        .interview;
    assert_eq!(moved.status, InterviewStatus::Scheduled);
    assert_eq!(moved.scheduled_at, at(10, 10, 0));
    assert_eq!(moved.interviewer_id, first.interviewer_id);

    let second = service
        .coordinate(request(
            "app-b",
            InterviewType::InitialScreening,
            vec![at(8, 16, 0)],
        ))
        .expect("old slot is free");
    assert_eq!(second.interview.interviewer_id, first.interviewer_id);
}

#[test]
fn failed_coordination_leaves_existing_bookings_untouched() {
    let Harness { service, store, .. } = harness();

    let booked = service
        .coordinate(request(
            "app-c",
            InterviewType::SpiritualEvaluation,
            vec![at(8, 9, 0)],
        ))
        .expect("chaplain available")
        .interview;
    assert_eq!(booked.interviewer_id.0, "iv-john");
    service
        .update_status(
            &booked.id,
            InterviewStatus::Cancelled,
            Some("withdrawn".to_string()),
        )
        .expect("cancelled");

    let err = service
        .coordinate(request("app-d", InterviewType::SpiritualEvaluation, Vec::new()))
        .expect_err("no dates");
    assert!(matches!(err, CoordinationError::Scheduling(_)));
    assert_eq!(store.len(), 1);
    assert_eq!(
        store.fetch(&booked.id).expect("fetch").map(|i| i.status),
        Some(InterviewStatus::Cancelled)
    );
}

async fn send(router: axum::Router, request: Request<Body>) -> (StatusCode, Value) {
    let response = router.oneshot(request).await.expect("route executes");
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    let payload = serde_json::from_slice(&bytes).expect("json payload");
    (status, payload)
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

#[tokio::test]
async fn http_surface_drives_the_same_workflow() {
    let Harness { service, .. } = harness();
    let router = interview_router(service);

    let (status, booked) = send(
        router.clone(),
        post(
            "/api/v1/interviews/coordinate",
            json!({
                "application_id": "app-http",
                "interview_type": "academic_assessment",
                "preferences": {
                    "preferred_dates": ["2025-04-08T17:00:00Z"],
                    "format": "video_conference",
                    "background": { "academic_level": "graduate" }
                }
            }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(booked["interview"]["interviewer_id"], "iv-grace");
    assert_eq!(booked["interview"]["duration_minutes"], 60);
    let id = booked["interview"]["id"]
        .as_str()
        .expect("interview id")
        .to_string();
    assert!(booked["interview"]["meeting_link"]
        .as_str()
        .is_some_and(|link| link.ends_with(&id)));

    let (status, cancelled) = send(
        router.clone(),
        post(
            &format!("/api/v1/interviews/{id}/confirmation"),
            json!({ "response": "cancel", "responded_at": "2025-04-02T10:00:00Z" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cancelled["status"], "cancelled");

    let (status, _) = send(
        router.clone(),
        post(
            &format!("/api/v1/interviews/{id}/reschedule"),
            json!({ "preferred_dates": ["2025-04-09T17:00:00Z"] }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, schedule) = send(
        router,
        post(
            &format!("/api/v1/interviews/{id}/reminders/dispatch"),
            json!({ "now": "2025-04-08T16:00:00Z" }),
        ),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(schedule["reminders"]
        .as_array()
        .expect("reminders")
        .iter()
        .all(|entry| entry["status"] != "pending"));
}
