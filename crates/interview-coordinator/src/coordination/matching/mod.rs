mod rules;
mod weights;

pub use weights::{MatchFactor, MatchWeights};

use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use super::availability::AvailabilityChecker;
use super::directory::{DirectoryError, Interviewer, InterviewerDirectory, InterviewerId};
use super::domain::{ApplicantBackground, InterviewType, TimeWindow};
use super::repository::{InterviewRepository, RepositoryError};

/// What the matcher ranks interviewers against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchCriteria {
    pub interview_type: InterviewType,
    #[serde(default)]
    pub background: ApplicantBackground,
    /// When present, interviewers already booked over the window are excluded.
    #[serde(default)]
    pub scheduled_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
}

impl MatchCriteria {
    pub fn new(interview_type: InterviewType, background: ApplicantBackground) -> Self {
        Self {
            interview_type,
            background,
            scheduled_at: None,
            duration_minutes: None,
        }
    }

    fn window(&self) -> Option<TimeWindow> {
        let duration = self
            .duration_minutes
            .unwrap_or_else(|| self.interview_type.default_duration_minutes());
        self.scheduled_at
            .map(|start| TimeWindow::new(start, duration))
    }
}

/// Discrete contribution to a match score, kept for transparent audits.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchComponent {
    pub factor: MatchFactor,
    pub value: f32,
    pub weight: f32,
    pub contribution: f32,
    pub notes: String,
}

/// Ranked interviewer candidate. Computed on demand, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchResult {
    pub interviewer_id: InterviewerId,
    pub interviewer_name: String,
    pub score: f32,
    pub alignment: f32,
    pub reasons: Vec<String>,
    pub components: Vec<MatchComponent>,
}

#[derive(Debug, thiserror::Error)]
pub enum MatchingError {
    #[error("no eligible interviewers for {0}")]
    NoEligibleInterviewers(InterviewType),
    #[error("every eligible interviewer for {interview_type} is booked during {window}")]
    NoAvailableSlot {
        interview_type: InterviewType,
        window: TimeWindow,
    },
    #[error(transparent)]
    Directory(#[from] DirectoryError),
    #[error(transparent)]
    Repository(#[from] RepositoryError),
}

/// Scores and ranks eligible interviewers. Scoring itself is pure; only the
/// directory lookup and optional availability filter touch collaborators.
pub struct InterviewerMatcher<D, R> {
    directory: Arc<D>,
    availability: AvailabilityChecker<R>,
    weights: MatchWeights,
}

impl<D, R> InterviewerMatcher<D, R>
where
    D: InterviewerDirectory + 'static,
    R: InterviewRepository + 'static,
{
    pub fn new(directory: Arc<D>, repository: Arc<R>, weights: MatchWeights) -> Self {
        Self {
            directory,
            availability: AvailabilityChecker::new(repository),
            weights,
        }
    }

    pub fn weights(&self) -> &MatchWeights {
        &self.weights
    }

    /// Score one interviewer without consulting any collaborator.
    pub fn score(&self, interviewer: &Interviewer, criteria: &MatchCriteria) -> MatchResult {
        let scored = rules::score_interviewer(
            interviewer,
            criteria.interview_type,
            &criteria.background,
            &self.weights,
        );

        MatchResult {
            interviewer_id: interviewer.id.clone(),
            interviewer_name: interviewer.name.clone(),
            score: scored.score,
            alignment: interviewer.alignment_factor(),
            reasons: scored.reasons,
            components: scored.components,
        }
    }

    /// Every eligible (and, with a target time, available) interviewer in
    /// descending score order.
    pub fn rank(&self, criteria: &MatchCriteria) -> Result<Vec<MatchResult>, MatchingError> {
        let eligible: Vec<Interviewer> = self
            .directory
            .eligible_interviewers(criteria.interview_type)?
            .into_iter()
            .filter(|interviewer| interviewer.can_conduct(criteria.interview_type))
            .collect();

        if eligible.is_empty() {
            return Err(MatchingError::NoEligibleInterviewers(
                criteria.interview_type,
            ));
        }

        let candidates = match criteria.window() {
            Some(window) => {
                let mut free = Vec::with_capacity(eligible.len());
                for interviewer in eligible {
                    if self.availability.is_available(&interviewer.id, &window, None)? {
                        free.push(interviewer);
                    } else {
                        debug!(interviewer_id = %interviewer.id, %window, "interviewer booked, skipping");
                    }
                }
                if free.is_empty() {
                    return Err(MatchingError::NoAvailableSlot {
                        interview_type: criteria.interview_type,
                        window,
                    });
                }
                free
            }
            None => eligible,
        };

        let mut ranked: Vec<MatchResult> = candidates
            .iter()
            .map(|interviewer| self.score(interviewer, criteria))
            .collect();
        ranked.sort_by(compare_matches);
        Ok(ranked)
    }

    pub fn find_best_match(&self, criteria: &MatchCriteria) -> Result<MatchResult, MatchingError> {
        let mut ranked = self.rank(criteria)?;
        // rank never returns an empty list
        Ok(ranked.swap_remove(0))
    }

    /// Top `count` matches; asking for more than the pool returns the pool.
    pub fn find_multiple_matches(
        &self,
        criteria: &MatchCriteria,
        count: usize,
    ) -> Result<Vec<MatchResult>, MatchingError> {
        let mut ranked = self.rank(criteria)?;
        ranked.truncate(count);
        Ok(ranked)
    }
}

/// Descending score, then higher alignment, then interviewer id.
fn compare_matches(a: &MatchResult, b: &MatchResult) -> Ordering {
    b.score
        .total_cmp(&a.score)
        .then_with(|| b.alignment.total_cmp(&a.alignment))
        .then_with(|| a.interviewer_id.cmp(&b.interviewer_id))
}
