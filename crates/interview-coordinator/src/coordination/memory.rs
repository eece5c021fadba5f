use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use super::directory::InterviewerId;
use super::domain::{Interview, InterviewId, TimeWindow};
use super::reminders::ReminderSchedule;
use super::repository::{InterviewRepository, RepositoryError};

#[derive(Debug, Default)]
struct StoreState {
    interviews: HashMap<InterviewId, Interview>,
    reminders: HashMap<InterviewId, ReminderSchedule>,
}

impl StoreState {
    fn overlaps_existing(&self, candidate: &Interview) -> bool {
        if !candidate.blocks_calendar() {
            return false;
        }
        let window = candidate.window();
        self.interviews.values().any(|existing| {
            existing.id != candidate.id
                && existing.interviewer_id == candidate.interviewer_id
                && existing.blocks_calendar()
                && existing.window().overlaps(&window)
        })
    }
}

/// Process-local store enforcing the one-booking-per-window constraint the
/// way a unique index would.
#[derive(Debug, Default, Clone)]
pub struct InMemoryInterviewStore {
    state: Arc<Mutex<StoreState>>,
}

impl InMemoryInterviewStore {
    fn state(&self) -> MutexGuard<'_, StoreState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn len(&self) -> usize {
        self.state().interviews.len()
    }

    pub fn is_empty(&self) -> bool {
        self.state().interviews.is_empty()
    }

    pub fn all(&self) -> Vec<Interview> {
        let mut interviews: Vec<_> = self.state().interviews.values().cloned().collect();
        interviews.sort_by(|a, b| a.id.cmp(&b.id));
        interviews
    }
}

impl InterviewRepository for InMemoryInterviewStore {
    fn insert(&self, interview: Interview) -> Result<Interview, RepositoryError> {
        let mut state = self.state();
        if state.interviews.contains_key(&interview.id) || state.overlaps_existing(&interview) {
            return Err(RepositoryError::Conflict);
        }
        state
            .interviews
            .insert(interview.id.clone(), interview.clone());
        Ok(interview)
    }

    fn update(&self, mut interview: Interview) -> Result<Interview, RepositoryError> {
        let mut state = self.state();
        let stored = state
            .interviews
            .get(&interview.id)
            .ok_or(RepositoryError::NotFound)?;
        if stored.revision != interview.revision {
            return Err(RepositoryError::Stale);
        }
        if state.overlaps_existing(&interview) {
            return Err(RepositoryError::Conflict);
        }
        interview.revision += 1;
        state
            .interviews
            .insert(interview.id.clone(), interview.clone());
        Ok(interview)
    }

    fn fetch(&self, id: &InterviewId) -> Result<Option<Interview>, RepositoryError> {
        Ok(self.state().interviews.get(id).cloned())
    }

    fn bookings_for(
        &self,
        interviewer: &InterviewerId,
        window: &TimeWindow,
    ) -> Result<Vec<Interview>, RepositoryError> {
        Ok(self
            .state()
            .interviews
            .values()
            .filter(|interview| {
                &interview.interviewer_id == interviewer
                    && interview.blocks_calendar()
                    && interview.window().overlaps(window)
            })
            .cloned()
            .collect())
    }

    fn save_reminders(&self, schedule: ReminderSchedule) -> Result<(), RepositoryError> {
        let mut state = self.state();
        if !state.interviews.contains_key(&schedule.interview_id) {
            return Err(RepositoryError::NotFound);
        }
        state
            .reminders
            .insert(schedule.interview_id.clone(), schedule);
        Ok(())
    }

    fn fetch_reminders(
        &self,
        id: &InterviewId,
    ) -> Result<Option<ReminderSchedule>, RepositoryError> {
        Ok(self.state().reminders.get(id).cloned())
    }
}
