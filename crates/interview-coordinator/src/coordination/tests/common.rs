use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use axum::response::Response;
use chrono::{DateTime, TimeZone, Utc};
use serde_json::Value;

use crate::coordination::clock::{Clock, FixedClock};
use crate::coordination::directory::{
    ContactChannels, DirectoryError, Interviewer, InterviewerDirectory, InterviewerId,
    InterviewerRole, StaticDirectory,
};
use crate::coordination::domain::{
    ApplicantBackground, ApplicationId, Interview, InterviewFormat, InterviewId, InterviewType,
    ScheduleRequest, TimeWindow,
};
use crate::coordination::matching::{InterviewerMatcher, MatchWeights};
use crate::coordination::memory::InMemoryInterviewStore;
use crate::coordination::reminders::{
    ChannelKind, Notification, NotificationChannel, NotificationError, ReminderManager,
    ReminderPolicy, ReminderSchedule,
};
use crate::coordination::repository::{InterviewRepository, RepositoryError};
use crate::coordination::scheduler::{InterviewScheduler, MeetingConfig};
use crate::coordination::service::{CoordinationOptions, CoordinationService};
use crate::coordination::status::InterviewStatus;

pub(super) fn at(day: u32, hour: u32, minute: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2025, 3, day, hour, minute, 0)
        .single()
        .expect("valid instant")
}

/// Clock pinned to 2025-03-01 09:00 UTC, well before the test interview dates.
pub(super) fn fixed_clock() -> Arc<FixedClock> {
    Arc::new(FixedClock::new(at(1, 9, 0)))
}

pub(super) fn interviewer(id: &str, role: InterviewerRole) -> Interviewer {
    Interviewer {
        id: InterviewerId(id.to_string()),
        name: id.replace('-', " "),
        role,
        contact: ContactChannels {
            email: Some(format!("{id}@example.edu")),
            phone: None,
        },
        competencies: Vec::new(),
        languages: vec!["English".to_string()],
        cultural_familiarity: Vec::new(),
        alignment: None,
        active: true,
    }
}

/// Strongest screening candidate: primary role, both screening competencies,
/// high alignment.
pub(super) fn lead_officer() -> Interviewer {
    Interviewer {
        competencies: vec!["Admissions".to_string(), "Communication".to_string()],
        languages: vec!["English".to_string(), "Spanish".to_string()],
        cultural_familiarity: vec!["Latin American".to_string()],
        alignment: Some(0.9),
        ..interviewer("iv-officer-a", InterviewerRole::AdmissionsOfficer)
    }
}

pub(super) fn second_officer() -> Interviewer {
    Interviewer {
        competencies: vec!["Admissions".to_string()],
        alignment: Some(0.6),
        ..interviewer("iv-officer-b", InterviewerRole::AdmissionsOfficer)
    }
}

pub(super) fn full_roster() -> Vec<Interviewer> {
    vec![
        lead_officer(),
        second_officer(),
        Interviewer {
            competencies: vec!["Curriculum".to_string(), "Research".to_string()],
            alignment: Some(0.7),
            ..interviewer("iv-faculty", InterviewerRole::Faculty)
        },
        Interviewer {
            competencies: vec!["Pastoral Care".to_string(), "Theology".to_string()],
            alignment: Some(0.95),
            ..interviewer("iv-chaplain", InterviewerRole::SpiritualAdvisor)
        },
        Interviewer {
            competencies: vec!["Leadership".to_string(), "Governance".to_string()],
            alignment: Some(0.85),
            ..interviewer("iv-dean", InterviewerRole::Dean)
        },
        Interviewer {
            alignment: Some(0.5),
            ..interviewer("iv-admin", InterviewerRole::Administrator)
        },
    ]
}

pub(super) fn schedule_request(
    application: &str,
    interview_type: InterviewType,
    dates: Vec<DateTime<Utc>>,
    format: InterviewFormat,
) -> ScheduleRequest {
    ScheduleRequest {
        application_id: ApplicationId(application.to_string()),
        interview_type,
        preferred_dates: dates,
        format,
        duration_minutes: None,
        time_zone: "America/Chicago".to_string(),
        background: ApplicantBackground::default(),
        notes: None,
    }
}

/// Interview record placed straight into a store, bypassing the scheduler.
pub(super) fn booked(
    id: &str,
    interviewer: &str,
    start: DateTime<Utc>,
    duration_minutes: u32,
) -> Interview {
    Interview {
        id: InterviewId(id.to_string()),
        application_id: ApplicationId(format!("app-{id}")),
        interview_type: InterviewType::InitialScreening,
        scheduled_at: start,
        time_zone: "UTC".to_string(),
        duration_minutes,
        interviewer_id: InterviewerId(interviewer.to_string()),
        interviewer_name: interviewer.to_string(),
        format: InterviewFormat::VideoConference,
        platform: Some("Zoom".to_string()),
        meeting_link: Some(format!("https://meet.example.edu/interviews/{id}")),
        status: InterviewStatus::Scheduled,
        notes: Vec::new(),
        status_history: Vec::new(),
        created_at: at(1, 9, 0),
        updated_at: at(1, 9, 0),
        revision: 0,
    }
}

pub(super) fn scheduler_with<R>(
    interviewers: Vec<Interviewer>,
    repository: Arc<R>,
) -> InterviewScheduler<StaticDirectory, R>
where
    R: InterviewRepository + 'static,
{
    let directory = Arc::new(StaticDirectory::new(interviewers));
    let matcher = Arc::new(InterviewerMatcher::new(
        directory,
        repository.clone(),
        MatchWeights::default(),
    ));
    let clock: Arc<dyn Clock> = fixed_clock();
    InterviewScheduler::new(matcher, repository, MeetingConfig::default(), clock)
}

pub(super) fn build_scheduler(
    interviewers: Vec<Interviewer>,
) -> (
    InterviewScheduler<StaticDirectory, InMemoryInterviewStore>,
    Arc<InMemoryInterviewStore>,
) {
    let store = Arc::new(InMemoryInterviewStore::default());
    (scheduler_with(interviewers, store.clone()), store)
}

pub(super) fn build_reminders(
    channels: Vec<Arc<dyn NotificationChannel>>,
) -> (
    ReminderManager<InMemoryInterviewStore>,
    Arc<InMemoryInterviewStore>,
    Arc<FixedClock>,
) {
    let store = Arc::new(InMemoryInterviewStore::default());
    let clock = fixed_clock();
    let manager = ReminderManager::new(
        store.clone(),
        channels,
        ReminderPolicy::default(),
        clock.clone(),
    );
    (manager, store, clock)
}

pub(super) type TestService = CoordinationService<StaticDirectory, InMemoryInterviewStore>;

pub(super) fn build_service(
    interviewers: Vec<Interviewer>,
    channels: Vec<Arc<dyn NotificationChannel>>,
) -> (TestService, Arc<InMemoryInterviewStore>, Arc<FixedClock>) {
    let store = Arc::new(InMemoryInterviewStore::default());
    let clock = fixed_clock();
    let service = CoordinationService::new(
        Arc::new(StaticDirectory::new(interviewers)),
        store.clone(),
        channels,
        CoordinationOptions::default(),
        clock.clone(),
    );
    (service, store, clock)
}

pub(super) fn find_reminders(
    store: &InMemoryInterviewStore,
    id: &InterviewId,
) -> ReminderSchedule {
    store
        .fetch_reminders(id)
        .expect("fetch succeeds")
        .expect("schedule present")
}

pub(super) struct RecordingChannel {
    kind: ChannelKind,
    sent: Mutex<Vec<Notification>>,
}

impl RecordingChannel {
    pub(super) fn new(kind: ChannelKind) -> Arc<Self> {
        Arc::new(Self {
            kind,
            sent: Mutex::new(Vec::new()),
        })
    }

    pub(super) fn sent(&self) -> Vec<Notification> {
        self.sent.lock().expect("channel mutex poisoned").clone()
    }
}

impl NotificationChannel for RecordingChannel {
    fn kind(&self) -> ChannelKind {
        self.kind
    }

    fn send(&self, notification: &Notification) -> Result<(), NotificationError> {
        self.sent
            .lock()
            .expect("channel mutex poisoned")
            .push(notification.clone());
        Ok(())
    }
}

pub(super) struct FailingChannel(pub(super) ChannelKind);

impl NotificationChannel for FailingChannel {
    fn kind(&self) -> ChannelKind {
        self.0
    }

    fn send(&self, _notification: &Notification) -> Result<(), NotificationError> {
        Err(NotificationError::DeliveryFailed {
            channel: self.0,
            reason: "gateway timeout".to_string(),
        })
    }
}

pub(super) struct OfflineChannel(pub(super) ChannelKind);

impl NotificationChannel for OfflineChannel {
    fn kind(&self) -> ChannelKind {
        self.0
    }

    fn send(&self, _notification: &Notification) -> Result<(), NotificationError> {
        panic!("offline channel must not be used");
    }

    fn is_available(&self) -> bool {
        false
    }
}

pub(super) struct UnavailableRepository;

impl InterviewRepository for UnavailableRepository {
    fn insert(&self, _interview: Interview) -> Result<Interview, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn update(&self, _interview: Interview) -> Result<Interview, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch(&self, _id: &InterviewId) -> Result<Option<Interview>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn bookings_for(
        &self,
        _interviewer: &InterviewerId,
        _window: &TimeWindow,
    ) -> Result<Vec<Interview>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn save_reminders(&self, _schedule: ReminderSchedule) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }

    fn fetch_reminders(
        &self,
        _id: &InterviewId,
    ) -> Result<Option<ReminderSchedule>, RepositoryError> {
        Err(RepositoryError::Unavailable("database offline".to_string()))
    }
}

/// Store where another writer always wins the insert for one interviewer,
/// even though the availability read reported the slot free.
pub(super) struct ContendedRepository {
    pub(super) inner: InMemoryInterviewStore,
    pub(super) contended: InterviewerId,
}

impl InterviewRepository for ContendedRepository {
    fn insert(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        if interview.interviewer_id == self.contended {
            return Err(RepositoryError::Conflict);
        }
        self.inner.insert(interview)
    }

    fn update(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        self.inner.update(interview)
    }

    fn fetch(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn bookings_for(
        &self,
        interviewer: &InterviewerId,
        window: &TimeWindow,
    ) -> Result<Vec<Interview>, RepositoryError> {
        self.inner.bookings_for(interviewer, window)
    }

    fn save_reminders(&self, schedule: ReminderSchedule) -> Result<(), RepositoryError> {
        self.inner.save_reminders(schedule)
    }

    fn fetch_reminders(
        &self,
        id: &InterviewId,
    ) -> Result<Option<ReminderSchedule>, RepositoryError> {
        self.inner.fetch_reminders(id)
    }
}

/// Store that lets another writer cancel `target` the first time anyone
/// checks a calendar, i.e. between a reschedule's read and its write.
pub(super) struct CancellingRepository {
    pub(super) inner: InMemoryInterviewStore,
    pub(super) target: InterviewId,
    fired: AtomicBool,
}

impl CancellingRepository {
    pub(super) fn new(inner: InMemoryInterviewStore, target: InterviewId) -> Self {
        Self {
            inner,
            target,
            fired: AtomicBool::new(false),
        }
    }

    pub(super) fn fired(&self) -> bool {
        self.fired.load(Ordering::SeqCst)
    }
}

impl InterviewRepository for CancellingRepository {
    fn insert(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        self.inner.insert(interview)
    }

    fn update(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        self.inner.update(interview)
    }

    fn fetch(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn bookings_for(
        &self,
        interviewer: &InterviewerId,
        window: &TimeWindow,
    ) -> Result<Vec<Interview>, RepositoryError> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            let mut interview = self.inner.fetch(&self.target)?.ok_or(RepositoryError::NotFound)?;
            interview
                .apply_status(InterviewStatus::Cancelled, at(3, 9, 0), "applicant withdrew")
                .map_err(|err| RepositoryError::Unavailable(err.to_string()))?;
            self.inner.update(interview)?;
        }
        self.inner.bookings_for(interviewer, window)
    }

    fn save_reminders(&self, schedule: ReminderSchedule) -> Result<(), RepositoryError> {
        self.inner.save_reminders(schedule)
    }

    fn fetch_reminders(
        &self,
        id: &InterviewId,
    ) -> Result<Option<ReminderSchedule>, RepositoryError> {
        self.inner.fetch_reminders(id)
    }
}

/// Store where another writer appends a note to the record right before the
/// first `update`, so that update is rejected as stale.
pub(super) struct InterleavedRepository {
    pub(super) inner: InMemoryInterviewStore,
    fired: AtomicBool,
}

impl InterleavedRepository {
    pub(super) fn new(inner: InMemoryInterviewStore) -> Self {
        Self {
            inner,
            fired: AtomicBool::new(false),
        }
    }
}

impl InterviewRepository for InterleavedRepository {
    fn insert(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        self.inner.insert(interview)
    }

    fn update(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        if !self.fired.swap(true, Ordering::SeqCst) {
            let mut current = self.inner.fetch(&interview.id)?.ok_or(RepositoryError::NotFound)?;
            current.append_note("office hours moved");
            self.inner.update(current)?;
        }
        self.inner.update(interview)
    }

    fn fetch(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn bookings_for(
        &self,
        interviewer: &InterviewerId,
        window: &TimeWindow,
    ) -> Result<Vec<Interview>, RepositoryError> {
        self.inner.bookings_for(interviewer, window)
    }

    fn save_reminders(&self, schedule: ReminderSchedule) -> Result<(), RepositoryError> {
        self.inner.save_reminders(schedule)
    }

    fn fetch_reminders(
        &self,
        id: &InterviewId,
    ) -> Result<Option<ReminderSchedule>, RepositoryError> {
        self.inner.fetch_reminders(id)
    }
}

/// Store that books interviews but cannot persist reminder plans.
pub(super) struct ReminderlessRepository {
    pub(super) inner: InMemoryInterviewStore,
}

impl InterviewRepository for ReminderlessRepository {
    fn insert(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        self.inner.insert(interview)
    }

    fn update(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        self.inner.update(interview)
    }

    fn fetch(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError> {
        self.inner.fetch(id)
    }

    fn bookings_for(
        &self,
        interviewer: &InterviewerId,
        window: &TimeWindow,
    ) -> Result<Vec<Interview>, RepositoryError> {
        self.inner.bookings_for(interviewer, window)
    }

    fn save_reminders(&self, _schedule: ReminderSchedule) -> Result<(), RepositoryError> {
        Err(RepositoryError::Unavailable("reminder table locked".to_string()))
    }

    fn fetch_reminders(
        &self,
        id: &InterviewId,
    ) -> Result<Option<ReminderSchedule>, RepositoryError> {
        self.inner.fetch_reminders(id)
    }
}

pub(super) struct UnavailableDirectory;

impl InterviewerDirectory for UnavailableDirectory {
    fn eligible_interviewers(
        &self,
        _interview_type: InterviewType,
    ) -> Result<Vec<Interviewer>, DirectoryError> {
        Err(DirectoryError::Unavailable("ldap timeout".to_string()))
    }

    fn interviewer(&self, _id: &InterviewerId) -> Result<Option<Interviewer>, DirectoryError> {
        Err(DirectoryError::Unavailable("ldap timeout".to_string()))
    }
}

pub(super) async fn read_json_body(response: Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("read body");
    serde_json::from_slice(&body).expect("json payload")
}
