use crate::infra::{load_roster, RosterCoverage};
use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use clap::Args;
use interview_coordinator::coordination::{
    ApplicantBackground, ApplicantPreferences, ApplicantResponse, ApplicationId, ChannelKind,
    ConfirmationRequest, CoordinationOptions, CoordinationOutcome, CoordinationRequest,
    CoordinationService, FixedClock, InMemoryInterviewStore, InterviewStatus, InterviewType,
    Notification, NotificationChannel, NotificationError, ReminderSchedule, StaticDirectory,
    TechnologyAccess,
};
use interview_coordinator::error::AppError;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

#[derive(Args, Debug, Default)]
pub(crate) struct DemoArgs {
    /// Interviewer roster CSV. Defaults to the built-in demo roster.
    #[arg(long)]
    pub(crate) roster: Option<PathBuf>,
    /// First preferred interview date (YYYY-MM-DD). Defaults to a week from today.
    #[arg(long, value_parser = crate::infra::parse_date)]
    pub(crate) date: Option<NaiveDate>,
    /// Interview type to coordinate.
    #[arg(long, value_enum, default_value_t = DemoInterviewType::InitialScreening)]
    pub(crate) interview_type: DemoInterviewType,
    /// Print the full coordination outcome as JSON.
    #[arg(long)]
    pub(crate) json: bool,
}

#[derive(Args, Debug)]
pub(crate) struct RosterCheckArgs {
    /// Roster CSV to validate
    pub(crate) path: PathBuf,
}

#[derive(clap::ValueEnum, Debug, Clone, Copy, Default, PartialEq, Eq)]
pub(crate) enum DemoInterviewType {
    #[default]
    InitialScreening,
    AcademicAssessment,
    SpiritualEvaluation,
    CharacterInterview,
    FinalInterview,
    CommitteeInterview,
}

impl From<DemoInterviewType> for InterviewType {
    fn from(value: DemoInterviewType) -> Self {
        match value {
            DemoInterviewType::InitialScreening => InterviewType::InitialScreening,
            DemoInterviewType::AcademicAssessment => InterviewType::AcademicAssessment,
            DemoInterviewType::SpiritualEvaluation => InterviewType::SpiritualEvaluation,
            DemoInterviewType::CharacterInterview => InterviewType::CharacterInterview,
            DemoInterviewType::FinalInterview => InterviewType::FinalInterview,
            DemoInterviewType::CommitteeInterview => InterviewType::CommitteeInterview,
        }
    }
}

/// Keeps every notification so the demo can print what would have been sent.
#[derive(Default)]
struct DemoOutbox {
    sent: Mutex<Vec<(ChannelKind, Notification)>>,
}

impl DemoOutbox {
    fn drain(&self) -> Vec<(ChannelKind, Notification)> {
        std::mem::take(&mut *self.sent.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

struct DemoChannel {
    kind: ChannelKind,
    outbox: Arc<DemoOutbox>,
}

impl NotificationChannel for DemoChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.outbox
            .sent
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push((self.kind, notification.clone()));
        Ok(())
    }
}

pub(crate) fn run_demo(args: DemoArgs) -> Result<(), AppError> {
    let DemoArgs {
        roster,
        date,
        interview_type,
        json,
    } = args;

    let interview_type = InterviewType::from(interview_type);
    let first_date = date.unwrap_or_else(|| Local::now().date_naive() + Duration::days(7));
    let first_slot = at_hour(first_date, 16);
    let start = first_slot - Duration::days(7);

    let roster = load_roster(roster.as_deref())?;
    println!("Interview coordination demo");
    println!(
        "- Roster: {} interviewers | interview type: {}",
        roster.len(),
        interview_type
    );

    let clock = Arc::new(FixedClock::new(start));
    let outbox = Arc::new(DemoOutbox::default());
    let channels: Vec<Arc<dyn NotificationChannel>> = vec![
        Arc::new(DemoChannel {
            kind: ChannelKind::Email,
            outbox: outbox.clone(),
        }),
        Arc::new(DemoChannel {
            kind: ChannelKind::InApp,
            outbox: outbox.clone(),
        }),
    ];
    let service = CoordinationService::new(
        Arc::new(StaticDirectory::from_roster(roster)),
        Arc::new(InMemoryInterviewStore::default()),
        channels,
        CoordinationOptions::default(),
        clock.clone(),
    );

    let request = CoordinationRequest {
        application_id: ApplicationId("app-demo-001".to_string()),
        interview_type,
        preferences: ApplicantPreferences {
            preferred_dates: vec![first_slot, first_slot + Duration::days(1)],
            time_zone: "America/Chicago".to_string(),
            duration_minutes: None,
            format: None,
            background: ApplicantBackground {
                language_preference: Some("Spanish".to_string()),
                cultural_background: Some("Latin American".to_string()),
                ..ApplicantBackground::default()
            },
            technology: TechnologyAccess::default(),
            accessibility_needs: Vec::new(),
            preferred_formats: Vec::new(),
            can_attend_in_person: false,
            notes: Some("First-generation applicant".to_string()),
        },
    };

    let outcome = match service.coordinate(request) {
        Ok(outcome) => outcome,
        Err(err) => {
            println!("  Coordination failed: {}", err);
            return Ok(());
        }
    };
    render_outcome(&outcome);
    if json {
        match serde_json::to_string_pretty(&outcome) {
            Ok(payload) => println!("  Outcome payload:\n{}", payload),
            Err(err) => println!("  Outcome payload unavailable: {}", err),
        }
    }
    render_outbox(&outbox);

    let interview_id = outcome.interview.id.clone();
    clock.advance(Duration::hours(5));
    let confirmed = service.process_confirmation(ConfirmationRequest {
        interview_id: interview_id.clone(),
        response: ApplicantResponse::Confirmed,
        responded_at: service.now(),
        notes: None,
    })?;
    println!(
        "\nApplicant confirmed at {} -> status {}",
        service.now().format("%Y-%m-%d %H:%M UTC"),
        confirmed.status
    );

    clock.set(outcome.interview.scheduled_at - Duration::hours(1));
    let schedule = service.dispatch_due_reminders(&interview_id, service.now())?;
    println!(
        "\nDispatching due reminders at {}",
        service.now().format("%Y-%m-%d %H:%M UTC")
    );
    render_schedule(&schedule);
    render_outbox(&outbox);

    clock.set(outcome.interview.scheduled_at);
    service.update_status(&interview_id, InterviewStatus::InProgress, None)?;
    clock.advance(Duration::minutes(i64::from(outcome.interview.duration_minutes)));
    let completed = service.update_status(&interview_id, InterviewStatus::Completed, None)?;
    println!("\nInterview closed -> status {}", completed.status);
    for change in &completed.status_history {
        println!(
            "  - {} -> {} at {} ({})",
            change.from,
            change.to,
            change.at.format("%Y-%m-%d %H:%M"),
            change.reason
        );
    }

    let report = service.health_check();
    println!("\nHealth: {:?}", report.status);
    for (component, health) in &report.components {
        match &health.detail {
            Some(detail) => println!("  - {}: {:?} ({})", component, health.status, detail),
            None => println!("  - {}: {:?}", component, health.status),
        }
    }

    Ok(())
}

pub(crate) fn run_roster_check(args: RosterCheckArgs) -> Result<(), AppError> {
    let roster = load_roster(Some(&args.path))?;
    let coverage = RosterCoverage::from_roster(&roster);

    println!("Roster {}", args.path.display());
    println!(
        "- {} interviewers ({} active)",
        coverage.interviewers, coverage.active
    );
    println!("Active interviewers by role:");
    for (role, count) in &coverage.by_role {
        println!("  - {}: {}", role, count);
    }
    println!("Eligible interviewers by interview type:");
    for entry in &coverage.by_type {
        println!("  - {}: {}", entry.interview_type, entry.eligible);
    }
    if coverage.unstaffed.is_empty() {
        println!("Every interview type is staffed");
    } else {
        let names: Vec<&str> = coverage.unstaffed.iter().map(|t| t.label()).collect();
        println!("Unstaffed interview types: {}", names.join(", "));
    }

    Ok(())
}

fn at_hour(date: NaiveDate, hour: u32) -> DateTime<Utc> {
    date.and_hms_opt(hour, 0, 0)
        .map(|naive| Utc.from_utc_datetime(&naive))
        .unwrap_or_else(Utc::now)
}

fn render_outcome(outcome: &CoordinationOutcome) {
    let interview = &outcome.interview;
    println!(
        "\nBooked {} with {} on {} ({} min, {})",
        interview.id,
        interview.interviewer_name,
        interview.scheduled_at.format("%Y-%m-%d %H:%M UTC"),
        interview.duration_minutes,
        interview.format
    );
    if let Some(link) = &interview.meeting_link {
        println!("  Meeting link: {}", link);
    }
    println!("  Match score {:.2}:", outcome.match_result.score);
    for reason in &outcome.match_result.reasons {
        println!("    - {}", reason);
    }
    println!(
        "  Format: {} (score {:.2})",
        outcome.format_recommendation.format, outcome.format_recommendation.score
    );
    for alternative in &outcome.alternatives {
        println!(
            "    alternative {} (score {:.2})",
            alternative.format, alternative.score
        );
    }
    println!("  Preparation timeline:");
    for phase in &outcome.preparation_guide.timeline {
        println!("    {}: {}", phase.label, phase.tasks.join("; "));
    }
    render_schedule(&outcome.reminder_schedule);
}

fn render_schedule(schedule: &ReminderSchedule) {
    println!("  Reminder plan:");
    for reminder in &schedule.reminders {
        println!(
            "    - {} at {} [{:?}]",
            reminder.kind.label(),
            reminder.scheduled_for.format("%Y-%m-%d %H:%M"),
            reminder.status
        );
    }
}

fn render_outbox(outbox: &DemoOutbox) {
    let sent = outbox.drain();
    if sent.is_empty() {
        println!("  Notifications: none sent");
        return;
    }
    println!("  Notifications:");
    for (channel, notification) in sent {
        println!("    - [{}] {}", channel, notification.subject);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn demo_runs_against_the_builtin_roster() {
        let args = DemoArgs {
            date: NaiveDate::from_ymd_opt(2025, 4, 8),
            ..DemoArgs::default()
        };
        run_demo(args).expect("demo completes");
    }

    #[test]
    fn demo_interview_types_map_one_to_one() {
        let mapped: Vec<InterviewType> = [
            DemoInterviewType::InitialScreening,
            DemoInterviewType::AcademicAssessment,
            DemoInterviewType::SpiritualEvaluation,
            DemoInterviewType::CharacterInterview,
            DemoInterviewType::FinalInterview,
            DemoInterviewType::CommitteeInterview,
        ]
        .into_iter()
        .map(InterviewType::from)
        .collect();
        assert_eq!(mapped, InterviewType::ordered().to_vec());
    }

    #[test]
    fn roster_check_reports_missing_files() {
        let err = run_roster_check(RosterCheckArgs {
            path: PathBuf::from("/nonexistent/roster.csv"),
        })
        .expect_err("file is missing");
        assert!(matches!(err, AppError::Roster(_)));
    }
}
