use chrono::NaiveDate;
use interview_coordinator::coordination::{
    ChannelKind, InterviewType, InterviewerRoster, Notification, NotificationChannel,
    NotificationError, RosterError, StaticDirectory,
};
use metrics_exporter_prometheus::PrometheusHandle;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Cursor;
use std::path::Path;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use tracing::info;

#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) readiness: Arc<AtomicBool>,
    pub(crate) metrics: Arc<PrometheusHandle>,
}

/// Built-in roster used when no `APP_ROSTER_PATH` is configured.
const DEMO_ROSTER: &str = "\
id,name,role,email,phone,competencies,languages,cultural_familiarity,alignment
iv-ruth,Ruth Alvarez,Admissions Officer,ruth.alvarez@example.edu,+1-555-0101,Admissions;Communication,English;Spanish,Latin American,0.9
iv-marcus,Marcus Bell,Admissions Officer,marcus.bell@example.edu,,Admissions,English,,0.7
iv-grace,Grace Lin,Faculty,grace.lin@example.edu,,Curriculum;Research;Academic Advising;Graduate Studies,English;Mandarin,East Asian,0.75
iv-john,John Mercer,Spiritual Advisor,john.mercer@example.edu,,Pastoral Care;Spiritual Formation;Theology;Discipleship,English,,0.95
iv-amara,Amara Nwosu,Faculty,amara.nwosu@example.edu,,Mentoring;Counseling;Curriculum,English;French,West African,0.8
iv-samuel,Samuel Okafor,Dean,samuel.okafor@example.edu,,Leadership;Governance;Admissions;Vision Casting,English,,0.85
iv-helen,Helen Price,Administrator,helen.price@example.edu,,Admissions;Governance,English,,0.6
";

pub(crate) fn demo_roster() -> Result<InterviewerRoster, RosterError> {
    InterviewerRoster::from_reader(Cursor::new(DEMO_ROSTER))
}

pub(crate) fn load_roster(path: Option<&Path>) -> Result<InterviewerRoster, RosterError> {
    match path {
        Some(path) => InterviewerRoster::from_path(path),
        None => demo_roster(),
    }
}

pub(crate) fn load_directory(path: Option<&Path>) -> Result<StaticDirectory, RosterError> {
    load_roster(path).map(StaticDirectory::from_roster)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct TypeCoverage {
    pub(crate) interview_type: InterviewType,
    pub(crate) eligible: usize,
}

/// Staffing summary of a roster: head count per role and per interview type.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct RosterCoverage {
    pub(crate) interviewers: usize,
    pub(crate) active: usize,
    pub(crate) by_role: BTreeMap<String, usize>,
    pub(crate) by_type: Vec<TypeCoverage>,
    pub(crate) unstaffed: Vec<InterviewType>,
}

impl RosterCoverage {
    pub(crate) fn from_roster(roster: &InterviewerRoster) -> Self {
        let interviewers = roster.interviewers();
        let mut by_role = BTreeMap::new();
        for interviewer in interviewers.iter().filter(|i| i.active) {
            *by_role
                .entry(interviewer.role.label().to_string())
                .or_insert(0) += 1;
        }

        let by_type: Vec<TypeCoverage> = InterviewType::ordered()
            .into_iter()
            .map(|interview_type| TypeCoverage {
                interview_type,
                eligible: interviewers
                    .iter()
                    .filter(|interviewer| interviewer.can_conduct(interview_type))
                    .count(),
            })
            .collect();
        let unstaffed = by_type
            .iter()
            .filter(|entry| entry.eligible == 0)
            .map(|entry| entry.interview_type)
            .collect();

        Self {
            interviewers: interviewers.len(),
            active: interviewers.iter().filter(|i| i.active).count(),
            by_role,
            by_type,
            unstaffed,
        }
    }
}

/// Channel that records deliveries in the service log instead of contacting
/// an external provider.
#[derive(Debug, Clone, Copy)]
pub(crate) struct LoggingChannel {
    kind: ChannelKind,
}

impl LoggingChannel {
    pub(crate) fn new(kind: ChannelKind) -> Self {
        Self { kind }
    }
}

impl NotificationChannel for LoggingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        info!(
            channel = %self.kind,
            interview_id = %notification.interview_id,
            application_id = %notification.application_id,
            kind = notification.kind.label(),
            subject = %notification.subject,
            "notification delivered"
        );
        Ok(())
    }
}

pub(crate) fn default_channels() -> Vec<Arc<dyn NotificationChannel>> {
    vec![
        Arc::new(LoggingChannel::new(ChannelKind::Email)),
        Arc::new(LoggingChannel::new(ChannelKind::InApp)),
    ]
}

pub(crate) fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
        .map_err(|err| format!("failed to parse '{raw}' as YYYY-MM-DD ({err})"))
}
