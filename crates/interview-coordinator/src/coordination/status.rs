use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Lifecycle of a booked interview.
///
/// `Rescheduled` is a transient marker: a reschedule passes through it and
/// settles back on `Scheduled` once the new slot is committed, leaving the
/// marker in the interview's status history.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewStatus {
    Scheduled,
    Rescheduled,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl InterviewStatus {
    pub const fn label(self) -> &'static str {
        match self {
            Self::Scheduled => "Scheduled",
            Self::Rescheduled => "Rescheduled",
            Self::InProgress => "In Progress",
            Self::Completed => "Completed",
            Self::Cancelled => "Cancelled",
            Self::NoShow => "No Show",
        }
    }

    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Completed | Self::Cancelled | Self::NoShow)
    }

    /// Non-terminal interviews hold their window on the interviewer's calendar.
    pub const fn blocks_calendar(self) -> bool {
        !self.is_terminal()
    }

    pub const fn can_transition_to(self, next: Self) -> bool {
        use InterviewStatus::*;

        match (self, next) {
            (Scheduled, Rescheduled | InProgress | Cancelled | NoShow) => true,
            (Rescheduled, Scheduled | InProgress | Cancelled | NoShow) => true,
            (InProgress, Completed | Cancelled | NoShow) => true,
            _ => false,
        }
    }

    /// The single transition function for interview status.
    pub fn transition(self, next: Self) -> Result<Self, InvalidTransition> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(InvalidTransition {
                from: self,
                to: next,
            })
        }
    }
}

impl fmt::Display for InterviewStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("illegal interview status transition from {from} to {to}")]
pub struct InvalidTransition {
    pub from: InterviewStatus,
    pub to: InterviewStatus,
}

/// Audit entry appended for every applied transition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChange {
    pub from: InterviewStatus,
    pub to: InterviewStatus,
    pub at: DateTime<Utc>,
    pub reason: String,
}
