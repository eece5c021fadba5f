mod channels;
mod plan;

pub use channels::{ChannelKind, Notification, NotificationChannel, NotificationError};
pub use plan::{DeliveryStatus, Reminder, ReminderKind, ReminderPolicy, ReminderSchedule};

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::clock::Clock;
use super::domain::{Interview, InterviewId};
use super::repository::{InterviewRepository, RepositoryError, MAX_WRITE_ATTEMPTS};
use super::status::{InterviewStatus, InvalidTransition};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApplicantResponse {
    Confirmed,
    NeedsReschedule,
    Cancel,
}

impl ApplicantResponse {
    /// Status the interview should hold after the response is applied.
    const fn target_status(self) -> InterviewStatus {
        match self {
            Self::Confirmed => InterviewStatus::Scheduled,
            Self::NeedsReschedule => InterviewStatus::Rescheduled,
            Self::Cancel => InterviewStatus::Cancelled,
        }
    }
}

/// Applicant reply to a confirmation request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfirmationRequest {
    pub interview_id: InterviewId,
    pub response: ApplicantResponse,
    pub responded_at: DateTime<Utc>,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum ReminderError {
    #[error("interview {0} not found")]
    InterviewNotFound(InterviewId),
    #[error("no reminder schedule for interview {0}")]
    ScheduleNotFound(InterviewId),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

enum ResponseOutcome {
    Replayed(Interview),
    Committed(Interview),
}

/// Builds reminder plans, fans reminders out to every channel, and applies
/// applicant confirmation responses.
pub struct ReminderManager<R> {
    repository: Arc<R>,
    channels: Vec<Arc<dyn NotificationChannel>>,
    policy: ReminderPolicy,
    clock: Arc<dyn Clock>,
}

impl<R> ReminderManager<R>
where
    R: InterviewRepository + 'static,
{
    pub fn new(
        repository: Arc<R>,
        channels: Vec<Arc<dyn NotificationChannel>>,
        policy: ReminderPolicy,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            repository,
            channels,
            policy,
            clock,
        }
    }

    pub fn policy(&self) -> &ReminderPolicy {
        &self.policy
    }

    pub fn channels(&self) -> impl Iterator<Item = ChannelKind> + '_ {
        self.channels.iter().map(|channel| channel.kind())
    }

    pub fn unavailable_channels(&self) -> Vec<ChannelKind> {
        self.channels
            .iter()
            .filter(|channel| !channel.is_available())
            .map(|channel| channel.kind())
            .collect()
    }

    /// Build and persist the plan for an interview, replacing any earlier
    /// plan. The confirmation request goes out immediately; channel failures
    /// are recorded on the entry and never fail the call.
    pub fn schedule_reminders(
        &self,
        interview_id: &InterviewId,
    ) -> Result<ReminderSchedule, ReminderError> {
        let interview = self.load(interview_id)?;
        let now = self.clock.now();
        let mut schedule = self.policy.build(&interview, now);

        if interview.status.is_terminal() {
            schedule.skip_pending();
        } else {
            self.dispatch(&interview, &mut schedule, now);
        }

        self.repository.save_reminders(schedule.clone())?;
        info!(
            interview_id = %interview_id,
            entries = schedule.reminders.len(),
            "reminder schedule created"
        );
        Ok(schedule)
    }

    /// Fire every pending entry whose time has come. Entries for terminal
    /// interviews are skipped instead.
    pub fn dispatch_due(
        &self,
        interview_id: &InterviewId,
        now: DateTime<Utc>,
    ) -> Result<ReminderSchedule, ReminderError> {
        let interview = self.load(interview_id)?;
        let mut schedule = self
            .repository
            .fetch_reminders(interview_id)?
            .ok_or_else(|| ReminderError::ScheduleNotFound(interview_id.clone()))?;

        if interview.status.is_terminal() {
            let skipped = schedule.skip_pending();
            debug!(interview_id = %interview_id, skipped, "interview closed, skipping reminders");
        } else {
            self.dispatch(&interview, &mut schedule, now);
        }

        self.repository.save_reminders(schedule.clone())?;
        Ok(schedule)
    }

    pub fn reminders(&self, interview_id: &InterviewId) -> Result<ReminderSchedule, ReminderError> {
        self.repository
            .fetch_reminders(interview_id)?
            .ok_or_else(|| ReminderError::ScheduleNotFound(interview_id.clone()))
    }

    /// Apply an applicant response. Replaying the same response leaves the
    /// interview unchanged.
    pub fn process_confirmation(
        &self,
        request: ConfirmationRequest,
    ) -> Result<Interview, ReminderError> {
        let interview = match self.commit_response(&request)? {
            ResponseOutcome::Replayed(interview) => {
                debug!(interview_id = %interview.id, "duplicate response ignored");
                return Ok(interview);
            }
            ResponseOutcome::Committed(interview) => interview,
        };

        if let Some(mut schedule) = self.repository.fetch_reminders(&interview.id)? {
            let mut changed = false;
            if let Some(entry) = schedule.confirmation_request_mut() {
                if entry.acknowledged_at.is_none() {
                    entry.acknowledged_at = Some(request.responded_at);
                    changed = true;
                }
            }
            if interview.status.is_terminal() {
                changed |= schedule.skip_pending() > 0;
            }
            if changed {
                self.repository.save_reminders(schedule)?;
            }
        }

        info!(
            interview_id = %interview.id,
            response = ?request.response,
            status = %interview.status,
            "confirmation processed"
        );
        Ok(interview)
    }

    /// Skip whatever is still pending, used when an interview is closed out.
    pub fn skip_pending(&self, interview_id: &InterviewId) -> Result<usize, ReminderError> {
        let Some(mut schedule) = self.repository.fetch_reminders(interview_id)? else {
            return Ok(0);
        };
        let skipped = schedule.skip_pending();
        if skipped > 0 {
            self.repository.save_reminders(schedule)?;
        }
        Ok(skipped)
    }

    /// Re-reads the interview and retries whenever another writer commits
    /// between the read and the write.
    fn commit_response(
        &self,
        request: &ConfirmationRequest,
    ) -> Result<ResponseOutcome, ReminderError> {
        let target = request.response.target_status();
        let detail = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|notes| !notes.is_empty());

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut interview = self.load(&request.interview_id)?;
            if interview.status.is_terminal() {
                if interview.status == target {
                    return Ok(ResponseOutcome::Replayed(interview));
                }
                return Err(InvalidTransition {
                    from: interview.status,
                    to: target,
                }
                .into());
            }

            let mut changed = false;
            let note = match request.response {
                ApplicantResponse::Confirmed => {
                    with_detail("Applicant confirmed attendance", detail)
                }
                ApplicantResponse::NeedsReschedule => {
                    if interview.status != InterviewStatus::Rescheduled {
                        interview.apply_status(
                            InterviewStatus::Rescheduled,
                            request.responded_at,
                            "applicant requested a new time",
                        )?;
                        changed = true;
                    }
                    with_detail("Applicant requested reschedule", detail)
                }
                ApplicantResponse::Cancel => {
                    interview.apply_status(
                        InterviewStatus::Cancelled,
                        request.responded_at,
                        "applicant cancelled",
                    )?;
                    changed = true;
                    with_detail("Applicant cancelled", detail)
                }
            };
            if interview.append_note(note) {
                interview.updated_at = request.responded_at;
                changed = true;
            }
            if !changed {
                return Ok(ResponseOutcome::Replayed(interview));
            }

            match self.repository.update(interview) {
                Ok(stored) => return Ok(ResponseOutcome::Committed(stored)),
                Err(RepositoryError::Stale) => {
                    debug!(interview_id = %request.interview_id, "interview changed concurrently, re-reading");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(RepositoryError::Stale.into())
    }

    fn load(&self, interview_id: &InterviewId) -> Result<Interview, ReminderError> {
        self.repository
            .fetch(interview_id)?
            .ok_or_else(|| ReminderError::InterviewNotFound(interview_id.clone()))
    }

    fn dispatch(&self, interview: &Interview, schedule: &mut ReminderSchedule, now: DateTime<Utc>) {
        for reminder in schedule
            .reminders
            .iter_mut()
            .filter(|reminder| reminder.is_due(now))
        {
            let notification = compose(interview, reminder.kind);
            let deliveries = self.fan_out(&notification);
            reminder.record_deliveries(deliveries, now);
        }
    }

    fn fan_out(&self, notification: &Notification) -> BTreeMap<ChannelKind, DeliveryStatus> {
        let mut deliveries = BTreeMap::new();
        for channel in &self.channels {
            let kind = channel.kind();
            let status = if !channel.is_available() {
                DeliveryStatus::Skipped
            } else {
                match channel.send(notification) {
                    Ok(()) => DeliveryStatus::Sent,
                    Err(err) => {
                        warn!(
                            interview_id = %notification.interview_id,
                            channel = %kind,
                            error = %err,
                            "notification delivery failed"
                        );
                        DeliveryStatus::Failed
                    }
                }
            };
            deliveries.insert(kind, status);
        }
        deliveries
    }
}

fn with_detail(summary: &str, detail: Option<&str>) -> String {
    match detail {
        Some(detail) => format!("{summary}: {detail}"),
        None => summary.to_string(),
    }
}

fn compose(interview: &Interview, kind: ReminderKind) -> Notification {
    let when = interview.scheduled_at.format("%Y-%m-%d %H:%M UTC");
    let (subject, body) = match kind {
        ReminderKind::ConfirmationRequest => (
            format!("Please confirm your {}", interview.interview_type),
            format!(
                "Your {} with {} is booked for {when} ({}). Reply to confirm, request a new time, or cancel.",
                interview.interview_type, interview.interviewer_name, interview.time_zone
            ),
        ),
        ReminderKind::PreInterviewReminder => (
            format!("Reminder: {} on {when}", interview.interview_type),
            format!(
                "Your {} interview with {} starts at {when} ({}).",
                interview.format, interview.interviewer_name, interview.time_zone
            ),
        ),
        ReminderKind::PostInterviewFollowUp => (
            format!("Thank you for your {}", interview.interview_type),
            "We will be in touch about next steps in your application.".to_string(),
        ),
    };

    let body = match &interview.meeting_link {
        Some(link) if kind != ReminderKind::PostInterviewFollowUp => format!("{body}\nJoin: {link}"),
        _ => body,
    };

    Notification {
        interview_id: interview.id.clone(),
        application_id: interview.application_id.clone(),
        kind,
        scheduled_at: interview.scheduled_at,
        time_zone: interview.time_zone.clone(),
        subject,
        body,
    }
}
