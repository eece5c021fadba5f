use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use super::directory::InterviewerId;
use super::domain::{Interview, InterviewId, TimeWindow};
use super::repository::{InterviewRepository, RepositoryError};

/// Answers "is this interviewer free for this window?" against the store.
pub struct AvailabilityChecker<R> {
    repository: Arc<R>,
}

impl<R> Clone for AvailabilityChecker<R> {
    fn clone(&self) -> Self {
        Self {
            repository: self.repository.clone(),
        }
    }
}

impl<R> AvailabilityChecker<R>
where
    R: InterviewRepository + 'static,
{
    pub fn new(repository: Arc<R>) -> Self {
        Self { repository }
    }

    /// Calendar-blocking bookings overlapping `window`, ignoring `exclude`
    /// (the interview being moved during a reschedule).
    pub fn conflicts(
        &self,
        interviewer: &InterviewerId,
        window: &TimeWindow,
        exclude: Option<&InterviewId>,
    ) -> Result<Vec<Interview>, RepositoryError> {
        let bookings = self.repository.bookings_for(interviewer, window)?;
        Ok(bookings
            .into_iter()
            .filter(|booking| Some(&booking.id) != exclude)
            .collect())
    }

    pub fn is_available(
        &self,
        interviewer: &InterviewerId,
        window: &TimeWindow,
        exclude: Option<&InterviewId>,
    ) -> Result<bool, RepositoryError> {
        Ok(self.conflicts(interviewer, window, exclude)?.is_empty())
    }
}

/// Registry of per-interviewer locks serializing check-and-commit on a calendar.
#[derive(Debug, Default)]
pub struct CalendarLocks {
    locks: Mutex<HashMap<InterviewerId, Arc<Mutex<()>>>>,
}

impl CalendarLocks {
    pub fn new() -> Self {
        Self::default()
    }

    /// Runs `f` while holding the interviewer's calendar lock.
    pub fn with_calendar<T>(&self, interviewer: &InterviewerId, f: impl FnOnce() -> T) -> T {
        let lock = {
            let mut registry = self.locks.lock().unwrap_or_else(PoisonError::into_inner);
            registry
                .entry(interviewer.clone())
                .or_insert_with(|| Arc::new(Mutex::new(())))
                .clone()
        };
        let _guard = lock.lock().unwrap_or_else(PoisonError::into_inner);
        f()
    }
}
