use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use super::clock::Clock;
use super::directory::{InterviewerDirectory, InterviewerId};
use super::domain::{
    ApplicantBackground, ApplicationId, Interview, InterviewFormat, InterviewId, InterviewType,
    RescheduleRequest, ScheduleRequest, TimeWindow,
};
use super::format::{
    AccessibilityNeed, FormatCriteria, FormatRecommendation, FormatSelector, FormatWeights,
    PreparationGuide, TechnologyAccess,
};
use super::health::{ComponentHealth, HealthReport, HealthStatus};
use super::matching::{InterviewerMatcher, MatchCriteria, MatchResult, MatchWeights, MatchingError};
use super::reminders::{
    ConfirmationRequest, NotificationChannel, ReminderError, ReminderManager, ReminderPolicy,
    ReminderSchedule,
};
use super::repository::{InterviewRepository, RepositoryError, MAX_WRITE_ATTEMPTS};
use super::scheduler::{InterviewScheduler, MeetingConfig, ScheduledInterview, SchedulingError};
use super::status::{InterviewStatus, InvalidTransition};

/// Tunables shared by every component of the service.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CoordinationOptions {
    #[serde(default)]
    pub match_weights: MatchWeights,
    #[serde(default)]
    pub format_weights: FormatWeights,
    #[serde(default)]
    pub reminders: ReminderPolicy,
    #[serde(default)]
    pub meeting: MeetingConfig,
}

/// Everything the applicant told us that matters for one coordination run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ApplicantPreferences {
    pub preferred_dates: Vec<DateTime<Utc>>,
    #[serde(default = "default_time_zone")]
    pub time_zone: String,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    /// Explicit format; when absent the top recommendation is used.
    #[serde(default)]
    pub format: Option<InterviewFormat>,
    #[serde(default)]
    pub background: ApplicantBackground,
    #[serde(default)]
    pub technology: TechnologyAccess,
    #[serde(default)]
    pub accessibility_needs: Vec<AccessibilityNeed>,
    #[serde(default)]
    pub preferred_formats: Vec<InterviewFormat>,
    #[serde(default = "default_can_attend")]
    pub can_attend_in_person: bool,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_time_zone() -> String {
    "UTC".to_string()
}

fn default_can_attend() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationRequest {
    pub application_id: ApplicationId,
    pub interview_type: InterviewType,
    pub preferences: ApplicantPreferences,
}

/// Composite result of one orchestrated coordination call.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoordinationOutcome {
    pub interview: Interview,
    pub match_result: MatchResult,
    pub format_recommendation: FormatRecommendation,
    pub alternatives: Vec<FormatRecommendation>,
    pub preparation_guide: PreparationGuide,
    pub reminder_schedule: ReminderSchedule,
}

#[derive(Debug, thiserror::Error)]
pub enum CoordinationError {
    #[error(transparent)]
    Matching(#[from] MatchingError),
    #[error(transparent)]
    Scheduling(#[from] SchedulingError),
    #[error(transparent)]
    Reminder(#[from] ReminderError),
    #[error("interview {0} not found")]
    InterviewNotFound(InterviewId),
    #[error(transparent)]
    InvalidTransition(#[from] InvalidTransition),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Facade composing matcher, scheduler, format selector and reminder manager.
pub struct CoordinationService<D, R> {
    directory: Arc<D>,
    repository: Arc<R>,
    matcher: Arc<InterviewerMatcher<D, R>>,
    scheduler: InterviewScheduler<D, R>,
    formats: FormatSelector,
    reminders: ReminderManager<R>,
    clock: Arc<dyn Clock>,
}

impl<D, R> CoordinationService<D, R>
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    pub fn new(
        directory: Arc<D>,
        repository: Arc<R>,
        channels: Vec<Arc<dyn NotificationChannel>>,
        options: CoordinationOptions,
        clock: Arc<dyn Clock>,
    ) -> Self {
        let matcher = Arc::new(InterviewerMatcher::new(
            directory.clone(),
            repository.clone(),
            options.match_weights,
        ));
        let scheduler = InterviewScheduler::new(
            matcher.clone(),
            repository.clone(),
            options.meeting,
            clock.clone(),
        );
        let reminders =
            ReminderManager::new(repository.clone(), channels, options.reminders, clock.clone());

        Self {
            directory,
            repository,
            matcher,
            scheduler,
            formats: FormatSelector::new(options.format_weights),
            reminders,
            clock,
        }
    }

    /// Match, book, recommend a format and plan reminders in one call. The
    /// first failing component aborts the run and its error is returned as is.
    /// A booking whose reminder plan cannot be stored is cancelled first.
    pub fn coordinate(
        &self,
        request: CoordinationRequest,
    ) -> Result<CoordinationOutcome, CoordinationError> {
        let CoordinationRequest {
            application_id,
            interview_type,
            preferences,
        } = request;

        let criteria = FormatCriteria {
            interview_type,
            technology: preferences.technology,
            accessibility_needs: preferences.accessibility_needs.clone(),
            preferences: preferences.preferred_formats.clone(),
            can_attend_in_person: preferences.can_attend_in_person,
        };
        let ranked_formats = self.formats.recommend_format(&criteria);
        let format = preferences
            .format
            .or_else(|| ranked_formats.first().map(|rec| rec.format))
            .unwrap_or(InterviewFormat::VideoConference);

        let schedule_request = ScheduleRequest {
            application_id,
            interview_type,
            preferred_dates: preferences.preferred_dates,
            format,
            duration_minutes: preferences.duration_minutes,
            time_zone: preferences.time_zone,
            background: preferences.background,
            notes: preferences.notes,
        };
        let ScheduledInterview {
            interview,
            match_result,
        } = self.scheduler.schedule(&schedule_request)?;

        let (format_recommendation, alternatives) = split_recommendations(ranked_formats, format);
        let preparation_guide = self
            .formats
            .generate_preparation_guide(format, interview_type);
        let reminder_schedule = match self.reminders.schedule_reminders(&interview.id) {
            Ok(schedule) => schedule,
            Err(err) => {
                self.release_booking(&interview.id, &err);
                return Err(err.into());
            }
        };

        info!(
            interview_id = %interview.id,
            interviewer_id = %interview.interviewer_id,
            format = %format,
            match_score = match_result.score,
            "interview coordinated"
        );

        Ok(CoordinationOutcome {
            interview,
            match_result,
            format_recommendation,
            alternatives,
            preparation_guide,
            reminder_schedule,
        })
    }

    /// Re-run the slot search for an existing interview and rebuild its
    /// reminder plan. The format is fixed, so the recommendation reflects it.
    pub fn reschedule(
        &self,
        request: RescheduleRequest,
    ) -> Result<CoordinationOutcome, CoordinationError> {
        let ScheduledInterview {
            interview,
            match_result,
        } = self.scheduler.reschedule(&request)?;

        let ranked = self
            .formats
            .recommend_format(&FormatCriteria::neutral(interview.interview_type));
        let (format_recommendation, alternatives) = split_recommendations(ranked, interview.format);
        let preparation_guide = self
            .formats
            .generate_preparation_guide(interview.format, interview.interview_type);
        let reminder_schedule = self.reminders.schedule_reminders(&interview.id)?;

        Ok(CoordinationOutcome {
            interview,
            match_result,
            format_recommendation,
            alternatives,
            preparation_guide,
            reminder_schedule,
        })
    }

    pub fn schedule_interview(
        &self,
        request: &ScheduleRequest,
    ) -> Result<ScheduledInterview, CoordinationError> {
        Ok(self.scheduler.schedule(request)?)
    }

    pub fn find_best_match(
        &self,
        criteria: &MatchCriteria,
    ) -> Result<MatchResult, CoordinationError> {
        Ok(self.matcher.find_best_match(criteria)?)
    }

    pub fn find_multiple_matches(
        &self,
        criteria: &MatchCriteria,
        count: usize,
    ) -> Result<Vec<MatchResult>, CoordinationError> {
        Ok(self.matcher.find_multiple_matches(criteria, count)?)
    }

    pub fn recommend_format(&self, criteria: &FormatCriteria) -> Vec<FormatRecommendation> {
        self.formats.recommend_format(criteria)
    }

    pub fn preparation_guide(
        &self,
        format: InterviewFormat,
        interview_type: InterviewType,
    ) -> PreparationGuide {
        self.formats.generate_preparation_guide(format, interview_type)
    }

    pub fn schedule_reminders(
        &self,
        interview_id: &InterviewId,
    ) -> Result<ReminderSchedule, CoordinationError> {
        Ok(self.reminders.schedule_reminders(interview_id)?)
    }

    pub fn dispatch_due_reminders(
        &self,
        interview_id: &InterviewId,
        now: DateTime<Utc>,
    ) -> Result<ReminderSchedule, CoordinationError> {
        Ok(self.reminders.dispatch_due(interview_id, now)?)
    }

    pub fn reminders(
        &self,
        interview_id: &InterviewId,
    ) -> Result<ReminderSchedule, CoordinationError> {
        Ok(self.reminders.reminders(interview_id)?)
    }

    pub fn process_confirmation(
        &self,
        request: ConfirmationRequest,
    ) -> Result<Interview, CoordinationError> {
        Ok(self.reminders.process_confirmation(request)?)
    }

    /// Apply check-in, completion, cancellation or the external no-show trigger.
    pub fn update_status(
        &self,
        interview_id: &InterviewId,
        status: InterviewStatus,
        reason: Option<String>,
    ) -> Result<Interview, CoordinationError> {
        let reason = reason
            .filter(|reason| !reason.trim().is_empty())
            .unwrap_or_else(|| format!("status set to {status}"));

        for _ in 0..MAX_WRITE_ATTEMPTS {
            let mut interview = self.get(interview_id)?;
            interview.apply_status(status, self.clock.now(), reason.clone())?;
            match self.repository.update(interview) {
                Ok(stored) => {
                    if status.is_terminal() {
                        self.reminders.skip_pending(interview_id)?;
                    }
                    info!(interview_id = %interview_id, status = %status, "interview status updated");
                    return Ok(stored);
                }
                Err(RepositoryError::Stale) => {
                    debug!(interview_id = %interview_id, "interview changed concurrently, re-reading");
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(RepositoryError::Stale.into())
    }

    /// Cancel a fresh booking whose reminder plan could not be stored, so a
    /// failed `coordinate` does not keep holding the interviewer's slot.
    fn release_booking(&self, interview_id: &InterviewId, cause: &ReminderError) {
        let reason = format!("reminder planning failed: {cause}");
        match self.update_status(interview_id, InterviewStatus::Cancelled, Some(reason)) {
            Ok(_) => warn!(
                interview_id = %interview_id,
                error = %cause,
                "booking released after reminder planning failed"
            ),
            Err(err) => error!(
                interview_id = %interview_id,
                error = %err,
                "booking left in place after reminder planning failed"
            ),
        }
    }

    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    pub fn get(&self, interview_id: &InterviewId) -> Result<Interview, CoordinationError> {
        self.repository
            .fetch(interview_id)?
            .ok_or_else(|| CoordinationError::InterviewNotFound(interview_id.clone()))
    }

    /// Exercise each component's read path without mutating anything.
    pub fn health_check(&self) -> HealthReport {
        let now = self.clock.now();
        let mut components = BTreeMap::new();

        let mut unstaffed = Vec::new();
        let mut directory = ComponentHealth::healthy();
        for interview_type in InterviewType::ordered() {
            match self.directory.eligible_interviewers(interview_type) {
                Ok(found) if found.is_empty() => unstaffed.push(interview_type.label()),
                Ok(_) => {}
                Err(err) => {
                    directory = ComponentHealth::unhealthy(err.to_string());
                    break;
                }
            }
        }
        if directory.status == HealthStatus::Healthy && !unstaffed.is_empty() {
            directory = ComponentHealth::degraded(format!(
                "no interviewers for {}",
                unstaffed.join(", ")
            ));
        }
        components.insert("directory".to_string(), directory);

        let sentinel = InterviewId("health-check".to_string());
        let repository = match self.repository.fetch(&sentinel) {
            Ok(_) => ComponentHealth::healthy(),
            Err(err) => ComponentHealth::unhealthy(err.to_string()),
        };
        components.insert("repository".to_string(), repository);

        let criteria =
            MatchCriteria::new(InterviewType::InitialScreening, ApplicantBackground::default());
        let matcher = match self.matcher.rank(&criteria) {
            Ok(_) => ComponentHealth::healthy(),
            Err(MatchingError::NoEligibleInterviewers(_)) => {
                ComponentHealth::degraded("no eligible interviewers for screening")
            }
            Err(err) => ComponentHealth::unhealthy(err.to_string()),
        };
        components.insert("matcher".to_string(), matcher);

        let window = TimeWindow::new(now, 1);
        let scheduler = match self
            .repository
            .bookings_for(&InterviewerId("health-check".to_string()), &window)
        {
            Ok(_) => ComponentHealth::healthy(),
            Err(err) => ComponentHealth::unhealthy(err.to_string()),
        };
        components.insert("scheduler".to_string(), scheduler);

        let recommendations = self
            .formats
            .recommend_format(&FormatCriteria::neutral(InterviewType::InitialScreening));
        let formats = if recommendations.len() == InterviewFormat::ordered().len() {
            ComponentHealth::healthy()
        } else {
            ComponentHealth::unhealthy("format selector returned an incomplete ranking")
        };
        components.insert("format_selector".to_string(), formats);

        let offline = self.reminders.unavailable_channels();
        let reminders = if self.reminders.channels().next().is_none() {
            ComponentHealth::degraded("no notification channels configured")
        } else if !offline.is_empty() {
            let names: Vec<&str> = offline.iter().map(|kind| kind.label()).collect();
            ComponentHealth::degraded(format!("channels unavailable: {}", names.join(", ")))
        } else {
            ComponentHealth::healthy()
        };
        components.insert("reminders".to_string(), reminders);

        HealthReport::from_components(components, now)
    }
}

/// Recommendation for the chosen format plus the remaining ranking.
fn split_recommendations(
    ranked: Vec<FormatRecommendation>,
    chosen: InterviewFormat,
) -> (FormatRecommendation, Vec<FormatRecommendation>) {
    let mut chosen_entry = None;
    let mut alternatives = Vec::with_capacity(ranked.len());
    for rec in ranked {
        if rec.format == chosen && chosen_entry.is_none() {
            chosen_entry = Some(rec);
        } else {
            alternatives.push(rec);
        }
    }
    let chosen_entry = chosen_entry.unwrap_or_else(|| FormatRecommendation {
        format: chosen,
        score: 0.0,
        advantages: Vec::new(),
        disadvantages: Vec::new(),
        components: Vec::new(),
    });
    (chosen_entry, alternatives)
}
