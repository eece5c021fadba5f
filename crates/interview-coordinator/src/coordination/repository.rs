use super::directory::InterviewerId;
use super::domain::{Interview, InterviewId, TimeWindow};
use super::reminders::ReminderSchedule;

/// Persistence store for interview records and their reminder plans.
///
/// Implementations must reject an `insert` or `update` that would leave two
/// calendar-blocking interviews for one interviewer overlapping, returning
/// [`RepositoryError::Conflict`].
///
/// `update` is a compare-and-swap on [`Interview::revision`]: it fails with
/// [`RepositoryError::Stale`] unless the stored revision equals the one the
/// caller read, and returns the stored copy with the revision bumped.
pub trait InterviewRepository: Send + Sync {
    fn insert(&self, interview: Interview) -> Result<Interview, RepositoryError>;
    fn update(&self, interview: Interview) -> Result<Interview, RepositoryError>;
    fn fetch(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError>;

    /// Calendar-blocking interviews for the interviewer overlapping `window`.
    fn bookings_for(
        &self,
        interviewer: &InterviewerId,
        window: &TimeWindow,
    ) -> Result<Vec<Interview>, RepositoryError>;

    fn save_reminders(&self, schedule: ReminderSchedule) -> Result<(), RepositoryError>;
    fn fetch_reminders(&self, id: &InterviewId)
        -> Result<Option<ReminderSchedule>, RepositoryError>;
}

/// Read-modify-write loops give up after this many `Stale` rejections.
pub(crate) const MAX_WRITE_ATTEMPTS: usize = 8;

#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record conflicts with an existing booking")]
    Conflict,
    #[error("record changed since it was read")]
    Stale,
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
