//! Interview coordination: matching, slot booking, format selection and the
//! reminder/confirmation workflow, composed behind [`CoordinationService`].
//!
//! Collaborators sit behind traits: [`InterviewerDirectory`] for interviewer
//! lookups, [`InterviewRepository`] for interview records, and
//! [`NotificationChannel`] for outbound delivery. Scoring is pure; the only
//! shared mutable resource is each interviewer's calendar, which the scheduler
//! serializes with a per-interviewer lock.

pub mod availability;
pub mod clock;
pub mod directory;
pub mod domain;
pub mod format;
pub mod health;
pub mod matching;
pub mod memory;
pub mod reminders;
pub mod repository;
pub mod roster;
pub mod router;
pub mod scheduler;
pub mod service;
pub mod status;

#[cfg(test)]
mod tests;

pub use availability::{AvailabilityChecker, CalendarLocks};
pub use clock::{Clock, FixedClock, SystemClock};
pub use directory::{
    ContactChannels, DirectoryError, Interviewer, InterviewerDirectory, InterviewerId,
    InterviewerRole, StaticDirectory,
};
pub use domain::{
    AcademicLevel, ApplicantBackground, ApplicationId, Interview, InterviewFormat, InterviewId,
    InterviewType, RescheduleRequest, ScheduleRequest, SpiritualMaturity, TimeWindow,
};
pub use format::{
    AccessibilityNeed, FormatCriteria, FormatRecommendation, FormatSelector, FormatWeights,
    PreparationGuide, PreparationStage, TechSkillLevel, TechnologyAccess,
};
pub use health::{ComponentHealth, HealthReport, HealthStatus};
pub use matching::{
    InterviewerMatcher, MatchCriteria, MatchFactor, MatchResult, MatchWeights, MatchingError,
};
pub use memory::InMemoryInterviewStore;
pub use reminders::{
    ApplicantResponse, ChannelKind, ConfirmationRequest, DeliveryStatus, Notification,
    NotificationChannel, NotificationError, Reminder, ReminderError, ReminderKind,
    ReminderManager, ReminderPolicy, ReminderSchedule,
};
pub use repository::{InterviewRepository, RepositoryError};
pub use roster::{InterviewerRoster, RosterError};
pub use router::interview_router;
pub use scheduler::{InterviewScheduler, MeetingConfig, ScheduledInterview, SchedulingError};
pub use service::{
    ApplicantPreferences, CoordinationError, CoordinationOptions, CoordinationOutcome,
    CoordinationRequest, CoordinationService,
};
pub use status::{InterviewStatus, InvalidTransition, StatusChange};
