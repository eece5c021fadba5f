use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::availability::{AvailabilityChecker, CalendarLocks};
use super::clock::Clock;
use super::directory::{DirectoryError, InterviewerDirectory};
use super::domain::{
    ApplicationId, Interview, InterviewFormat, InterviewId, InterviewType, RescheduleRequest,
    ScheduleRequest, TimeWindow,
};
use super::matching::{InterviewerMatcher, MatchCriteria, MatchResult, MatchingError};
use super::repository::{InterviewRepository, RepositoryError, MAX_WRITE_ATTEMPTS};
use super::status::{InterviewStatus, InvalidTransition};

/// Platform and link settings stamped onto video interviews.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeetingConfig {
    pub video_platform: String,
    pub meeting_base_url: String,
}

impl Default for MeetingConfig {
    fn default() -> Self {
        Self {
            video_platform: "Zoom".to_string(),
            meeting_base_url: "https://meet.example.edu/interviews".to_string(),
        }
    }
}

impl MeetingConfig {
    fn platform_for(&self, format: InterviewFormat) -> Option<String> {
        format
            .requires_internet()
            .then(|| self.video_platform.clone())
    }

    fn link_for(&self, format: InterviewFormat, id: &InterviewId) -> Option<String> {
        let base = self.meeting_base_url.trim_end_matches('/');
        match format {
            InterviewFormat::VideoConference => Some(format!("{base}/{id}")),
            InterviewFormat::AsynchronousVideo => Some(format!("{base}/async/{id}")),
            InterviewFormat::PhoneCall | InterviewFormat::InPerson => None,
        }
    }
}

/// Booked interview together with the match that won the slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduledInterview {
    pub interview: Interview,
    pub match_result: MatchResult,
}

#[derive(Debug, thiserror::Error)]
pub enum SchedulingError {
    #[error("no available slot for application {application_id} across {candidates} candidate date(s)")]
    NoAvailableSlot {
        application_id: ApplicationId,
        candidates: usize,
    },
    #[error("a concurrent booking took the last free slot for application {0}; retry the slot search")]
    ConflictDetected(ApplicationId),
    #[error("no eligible interviewers for {0}")]
    NoEligibleInterviewers(InterviewType),
    #[error("interview {0} not found")]
    InterviewNotFound(InterviewId),
    #[error("interview duration must be positive")]
    InvalidDuration,
    #[error("an interview starting at {0} would end outside the supported calendar range")]
    InvalidWindow(DateTime<Utc>),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

static INTERVIEW_SEQUENCE: AtomicU64 = AtomicU64::new(1);

fn next_interview_id() -> InterviewId {
    let id = INTERVIEW_SEQUENCE.fetch_add(1, Ordering::Relaxed);
    InterviewId(format!("int-{id:06}"))
}

enum Attempt {
    Booked(Interview),
    Busy,
    LostRace,
}

/// Searches (date, interviewer) slots and commits the first free one while
/// holding that interviewer's calendar lock.
pub struct InterviewScheduler<D, R> {
    matcher: Arc<InterviewerMatcher<D, R>>,
    repository: Arc<R>,
    availability: AvailabilityChecker<R>,
    locks: CalendarLocks,
    meeting: MeetingConfig,
    clock: Arc<dyn Clock>,
}

impl<D, R> InterviewScheduler<D, R>
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    pub fn new(
        matcher: Arc<InterviewerMatcher<D, R>>,
        repository: Arc<R>,
        meeting: MeetingConfig,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            matcher,
            availability: AvailabilityChecker::new(repository.clone()),
            repository,
            locks: CalendarLocks::new(),
            meeting,
            clock,
        }
    }

    pub fn meeting(&self) -> &MeetingConfig {
        &self.meeting
    }

    /// Date-major search: every ranked interviewer is tried for the first
    /// preferred date before moving on to the next date.
    pub fn schedule(
        &self,
        request: &ScheduleRequest,
    ) -> Result<ScheduledInterview, SchedulingError> {
        let duration = request.duration();
        if duration == 0 {
            return Err(SchedulingError::InvalidDuration);
        }
        if request.preferred_dates.is_empty() {
            return Err(self.no_slot(&request.application_id, 0));
        }

        let windows = candidate_windows(&request.preferred_dates, duration)?;

        let criteria = MatchCriteria::new(request.interview_type, request.background.clone());
        let ranked = self.rank(&criteria, &request.application_id)?;
        let mut lost_race = false;

        for window in windows {
            for candidate in &ranked {
                match self.try_book(request, candidate, window)? {
                    Attempt::Booked(interview) => {
                        info!(
                            interview_id = %interview.id,
                            interviewer_id = %interview.interviewer_id,
                            application_id = %interview.application_id,
                            %window,
                            "interview scheduled"
                        );
                        return Ok(ScheduledInterview {
                            interview,
                            match_result: candidate.clone(),
                        });
                    }
                    Attempt::Busy => {}
                    Attempt::LostRace => lost_race = true,
                }
            }
        }

        if lost_race {
            Err(SchedulingError::ConflictDetected(
                request.application_id.clone(),
            ))
        } else {
            Err(self.no_slot(&request.application_id, request.preferred_dates.len()))
        }
    }

    /// Move an existing interview to the first free candidate date. Type,
    /// format and duration stay fixed; the original interviewer is tried on
    /// every date before anyone else.
    pub fn reschedule(
        &self,
        request: &RescheduleRequest,
    ) -> Result<ScheduledInterview, SchedulingError> {
        let existing = self
            .repository
            .fetch(&request.interview_id)?
            .ok_or_else(|| SchedulingError::InterviewNotFound(request.interview_id.clone()))?;

        if existing.status != InterviewStatus::Rescheduled {
            existing.status.transition(InterviewStatus::Rescheduled)?;
        }
        if request.preferred_dates.is_empty() {
            return Err(self.no_slot(&existing.application_id, 0));
        }
        let windows = candidate_windows(&request.preferred_dates, existing.duration_minutes)?;

        let criteria = MatchCriteria {
            duration_minutes: Some(existing.duration_minutes),
            ..MatchCriteria::new(existing.interview_type, request.background.clone())
        };
        let ranked = self.rank(&criteria, &existing.application_id)?;

        let (original, others): (Vec<&MatchResult>, Vec<&MatchResult>) = ranked
            .iter()
            .partition(|candidate| candidate.interviewer_id == existing.interviewer_id);

        let mut slots: Vec<(&MatchResult, TimeWindow)> = Vec::new();
        for candidate in &original {
            slots.extend(windows.iter().map(|window| (*candidate, *window)));
        }
        for window in &windows {
            slots.extend(others.iter().map(|candidate| (*candidate, *window)));
        }

        let mut lost_race = false;
        for (candidate, window) in slots {
            match self.try_move(&existing, request, candidate, window)? {
                Attempt::Booked(interview) => {
                    info!(
                        interview_id = %interview.id,
                        interviewer_id = %interview.interviewer_id,
                        previous_interviewer_id = %existing.interviewer_id,
                        %window,
                        "interview rescheduled"
                    );
                    return Ok(ScheduledInterview {
                        interview,
                        match_result: candidate.clone(),
                    });
                }
                Attempt::Busy => {}
                Attempt::LostRace => lost_race = true,
            }
        }

        if lost_race {
            Err(SchedulingError::ConflictDetected(
                existing.application_id.clone(),
            ))
        } else {
            Err(self.no_slot(&existing.application_id, request.preferred_dates.len()))
        }
    }

    fn rank(
        &self,
        criteria: &MatchCriteria,
        application_id: &ApplicationId,
    ) -> Result<Vec<MatchResult>, SchedulingError> {
        self.matcher.rank(criteria).map_err(|err| match err {
            MatchingError::NoEligibleInterviewers(interview_type) => {
                SchedulingError::NoEligibleInterviewers(interview_type)
            }
            MatchingError::NoAvailableSlot { .. } => self.no_slot(application_id, 0),
            MatchingError::Directory(err) => SchedulingError::Directory(err),
            MatchingError::Repository(err) => SchedulingError::Repository(err),
        })
    }

    fn try_book(
        &self,
        request: &ScheduleRequest,
        candidate: &MatchResult,
        window: TimeWindow,
    ) -> Result<Attempt, SchedulingError> {
        let interviewer_id = &candidate.interviewer_id;
        let attempt = self.locks.with_calendar(interviewer_id, || -> Result<Attempt, RepositoryError> {
            if !self.availability.is_available(interviewer_id, &window, None)? {
                debug!(interviewer_id = %interviewer_id, %window, "slot busy");
                return Ok(Attempt::Busy);
            }

            let interview = self.new_interview(request, candidate, window);
            match self.repository.insert(interview) {
                Ok(stored) => Ok(Attempt::Booked(stored)),
                Err(RepositoryError::Conflict) => Ok(Attempt::LostRace),
                Err(err) => Err(err),
            }
        })?;

        if matches!(attempt, Attempt::LostRace) {
            warn!(interviewer_id = %interviewer_id, %window, "booking lost to a concurrent writer");
        }
        Ok(attempt)
    }

    /// Applies the move to a copy fetched under the calendar lock; the write
    /// commits only if no other update landed in between.
    fn try_move(
        &self,
        existing: &Interview,
        request: &RescheduleRequest,
        candidate: &MatchResult,
        window: TimeWindow,
    ) -> Result<Attempt, SchedulingError> {
        let interviewer_id = &candidate.interviewer_id;
        self.locks.with_calendar(interviewer_id, || -> Result<Attempt, SchedulingError> {
            if !self
                .availability
                .is_available(interviewer_id, &window, Some(&existing.id))?
            {
                debug!(interviewer_id = %interviewer_id, %window, "slot busy");
                return Ok(Attempt::Busy);
            }

            for _ in 0..MAX_WRITE_ATTEMPTS {
                let current = self
                    .repository
                    .fetch(&existing.id)?
                    .ok_or_else(|| SchedulingError::InterviewNotFound(existing.id.clone()))?;
                let moved = self.moved_interview(&current, request, candidate, window)?;
                match self.repository.update(moved) {
                    Ok(stored) => return Ok(Attempt::Booked(stored)),
                    Err(RepositoryError::Stale) => {
                        debug!(interview_id = %existing.id, "interview changed during reschedule, re-reading");
                    }
                    Err(RepositoryError::Conflict) => {
                        warn!(interviewer_id = %interviewer_id, %window, "reschedule lost to a concurrent writer");
                        return Ok(Attempt::LostRace);
                    }
                    Err(err) => return Err(err.into()),
                }
            }
            Ok(Attempt::LostRace)
        })
    }

    fn new_interview(
        &self,
        request: &ScheduleRequest,
        candidate: &MatchResult,
        window: TimeWindow,
    ) -> Interview {
        let id = next_interview_id();
        let now = self.clock.now();
        let mut notes = Vec::new();
        if let Some(note) = request
            .notes
            .as_deref()
            .map(str::trim)
            .filter(|note| !note.is_empty())
        {
            notes.push(note.to_string());
        }

        Interview {
            platform: self.meeting.platform_for(request.format),
            meeting_link: self.meeting.link_for(request.format, &id),
            id,
            application_id: request.application_id.clone(),
            interview_type: request.interview_type,
            scheduled_at: window.start,
            time_zone: request.time_zone.clone(),
            duration_minutes: request.duration(),
            interviewer_id: candidate.interviewer_id.clone(),
            interviewer_name: candidate.interviewer_name.clone(),
            format: request.format,
            status: InterviewStatus::Scheduled,
            notes,
            status_history: Vec::new(),
            created_at: now,
            updated_at: now,
            revision: 0,
        }
    }

    fn moved_interview(
        &self,
        existing: &Interview,
        request: &RescheduleRequest,
        candidate: &MatchResult,
        window: TimeWindow,
    ) -> Result<Interview, InvalidTransition> {
        let now = self.clock.now();
        let reason = request
            .reason
            .as_deref()
            .map(str::trim)
            .filter(|reason| !reason.is_empty())
            .unwrap_or("new time requested");

        let mut moved = existing.clone();
        if moved.status != InterviewStatus::Rescheduled {
            moved.apply_status(InterviewStatus::Rescheduled, now, reason)?;
        }
        moved.scheduled_at = window.start;
        moved.interviewer_id = candidate.interviewer_id.clone();
        moved.interviewer_name = candidate.interviewer_name.clone();
        moved.apply_status(InterviewStatus::Scheduled, now, "new slot committed")?;
        moved.append_note(format!(
            "Rescheduled from {} to {} ({reason})",
            existing.scheduled_at.to_rfc3339(),
            window.start.to_rfc3339()
        ));
        Ok(moved)
    }

    fn no_slot(&self, application_id: &ApplicationId, candidates: usize) -> SchedulingError {
        SchedulingError::NoAvailableSlot {
            application_id: application_id.clone(),
            candidates,
        }
    }
}

/// One window per preferred date, rejecting dates whose window cannot be
/// represented.
fn candidate_windows(
    dates: &[DateTime<Utc>],
    duration_minutes: u32,
) -> Result<Vec<TimeWindow>, SchedulingError> {
    dates
        .iter()
        .map(|date| {
            TimeWindow::checked(*date, duration_minutes)
                .ok_or(SchedulingError::InvalidWindow(*date))
        })
        .collect()
}
