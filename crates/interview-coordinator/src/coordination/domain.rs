use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use super::directory::{InterviewerId, InterviewerRole};
use super::status::{InterviewStatus, InvalidTransition, StatusChange};

/// Identifier wrapper for booked interviews.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterviewId(pub String);

impl fmt::Display for InterviewId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Reference to the admissions application the interview belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ApplicationId(pub String);

impl fmt::Display for ApplicationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewType {
    InitialScreening,
    AcademicAssessment,
    SpiritualEvaluation,
    CharacterInterview,
    FinalInterview,
    CommitteeInterview,
}

impl InterviewType {
    pub const fn ordered() -> [Self; 6] {
        [
            Self::InitialScreening,
            Self::AcademicAssessment,
            Self::SpiritualEvaluation,
            Self::CharacterInterview,
            Self::FinalInterview,
            Self::CommitteeInterview,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::InitialScreening => "Initial Screening",
            Self::AcademicAssessment => "Academic Assessment",
            Self::SpiritualEvaluation => "Spiritual Evaluation",
            Self::CharacterInterview => "Character Interview",
            Self::FinalInterview => "Final Interview",
            Self::CommitteeInterview => "Committee Interview",
        }
    }

    pub const fn default_duration_minutes(self) -> u32 {
        match self {
            Self::InitialScreening => 30,
            Self::AcademicAssessment => 60,
            Self::SpiritualEvaluation => 45,
            Self::CharacterInterview => 45,
            Self::FinalInterview => 60,
            Self::CommitteeInterview => 90,
        }
    }

    /// Final and committee interviews carry the admission decision.
    pub const fn is_decisive(self) -> bool {
        matches!(self, Self::FinalInterview | Self::CommitteeInterview)
    }

    /// Fitness of a role for this interview type; `None` means ineligible.
    pub fn role_fitness(self, role: InterviewerRole) -> Option<f32> {
        use InterviewerRole::*;

        let (primary, secondary): (&[InterviewerRole], &[InterviewerRole]) = match self {
            Self::InitialScreening => (&[AdmissionsOfficer], &[Administrator]),
            Self::AcademicAssessment => (&[Faculty], &[Dean]),
            Self::SpiritualEvaluation => (&[SpiritualAdvisor], &[Dean]),
            Self::CharacterInterview => (&[AdmissionsOfficer, SpiritualAdvisor], &[Faculty]),
            Self::FinalInterview => (&[Dean], &[Administrator]),
            Self::CommitteeInterview => (&[Dean, Faculty], &[SpiritualAdvisor, Administrator]),
        };

        if primary.contains(&role) {
            Some(1.0)
        } else if secondary.contains(&role) {
            Some(0.6)
        } else {
            None
        }
    }

    pub fn eligible_roles(self) -> Vec<InterviewerRole> {
        InterviewerRole::ordered()
            .into_iter()
            .filter(|role| self.role_fitness(*role).is_some())
            .collect()
    }

    pub const fn core_competencies(self) -> &'static [&'static str] {
        match self {
            Self::InitialScreening => &["admissions", "communication"],
            Self::AcademicAssessment => &["academic advising", "curriculum", "research"],
            Self::SpiritualEvaluation => &["pastoral care", "spiritual formation", "theology"],
            Self::CharacterInterview => &["mentoring", "character formation", "counseling"],
            Self::FinalInterview => &["leadership", "admissions", "vision casting"],
            Self::CommitteeInterview => &["leadership", "governance", "academic advising"],
        }
    }
}

impl fmt::Display for InterviewType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewFormat {
    VideoConference,
    PhoneCall,
    InPerson,
    AsynchronousVideo,
}

impl InterviewFormat {
    pub const fn ordered() -> [Self; 4] {
        [
            Self::VideoConference,
            Self::PhoneCall,
            Self::InPerson,
            Self::AsynchronousVideo,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::VideoConference => "Video Conference",
            Self::PhoneCall => "Phone Call",
            Self::InPerson => "In Person",
            Self::AsynchronousVideo => "Asynchronous Video",
        }
    }

    pub const fn requires_internet(self) -> bool {
        matches!(self, Self::VideoConference | Self::AsynchronousVideo)
    }

    pub const fn is_synchronous(self) -> bool {
        !matches!(self, Self::AsynchronousVideo)
    }
}

impl fmt::Display for InterviewFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Half-open `[start, end)` interval on the UTC timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl TimeWindow {
    /// Window of `duration_minutes` from `start`. The end saturates at the
    /// last representable instant; use [`TimeWindow::checked`] to reject that.
    pub fn new(start: DateTime<Utc>, duration_minutes: u32) -> Self {
        Self::checked(start, duration_minutes).unwrap_or(Self {
            start,
            end: DateTime::<Utc>::MAX_UTC,
        })
    }

    /// `None` when the end falls outside the representable timeline.
    pub fn checked(start: DateTime<Utc>, duration_minutes: u32) -> Option<Self> {
        start
            .checked_add_signed(Duration::minutes(i64::from(duration_minutes)))
            .map(|end| Self { start, end })
    }

    /// Windows that merely touch do not overlap.
    pub fn overlaps(&self, other: &TimeWindow) -> bool {
        self.start < other.end && other.start < self.end
    }
}

impl fmt::Display for TimeWindow {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} - {}", self.start.to_rfc3339(), self.end.to_rfc3339())
    }
}

/// Persisted interview record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interview {
    pub id: InterviewId,
    pub application_id: ApplicationId,
    pub interview_type: InterviewType,
    pub scheduled_at: DateTime<Utc>,
    pub time_zone: String,
    pub duration_minutes: u32,
    pub interviewer_id: InterviewerId,
    pub interviewer_name: String,
    pub format: InterviewFormat,
    pub platform: Option<String>,
    pub meeting_link: Option<String>,
    pub status: InterviewStatus,
    pub notes: Vec<String>,
    pub status_history: Vec<StatusChange>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Bumped by the repository on every committed update.
    #[serde(default)]
    pub revision: u64,
}

impl Interview {
    pub fn window(&self) -> TimeWindow {
        TimeWindow::new(self.scheduled_at, self.duration_minutes)
    }

    pub fn blocks_calendar(&self) -> bool {
        self.status.blocks_calendar()
    }

    /// Apply a status transition and record it in the history.
    pub fn apply_status(
        &mut self,
        next: InterviewStatus,
        at: DateTime<Utc>,
        reason: impl Into<String>,
    ) -> Result<(), InvalidTransition> {
        let from = self.status;
        self.status = from.transition(next)?;
        self.status_history.push(StatusChange {
            from,
            to: next,
            at,
            reason: reason.into(),
        });
        self.updated_at = at;
        Ok(())
    }

    /// Appends a note unless an identical one is already recorded.
    pub fn append_note(&mut self, note: impl Into<String>) -> bool {
        let note = note.into();
        if note.trim().is_empty() || self.notes.iter().any(|existing| existing == &note) {
            return false;
        }
        self.notes.push(note);
        true
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AcademicLevel {
    HighSchool,
    #[default]
    Undergraduate,
    Graduate,
    Doctoral,
}

impl AcademicLevel {
    pub const fn competency(self) -> &'static str {
        match self {
            Self::HighSchool => "college readiness",
            Self::Undergraduate => "undergraduate studies",
            Self::Graduate => "graduate studies",
            Self::Doctoral => "doctoral supervision",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpiritualMaturity {
    Exploring,
    #[default]
    Growing,
    Established,
    Mentoring,
}

impl SpiritualMaturity {
    pub const fn competency(self) -> &'static str {
        match self {
            Self::Exploring => "evangelism",
            Self::Growing => "discipleship",
            Self::Established => "spiritual formation",
            Self::Mentoring => "ministry leadership",
        }
    }
}

/// Applicant attributes considered when matching interviewers.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ApplicantBackground {
    #[serde(default)]
    pub academic_level: AcademicLevel,
    #[serde(default)]
    pub spiritual_maturity: SpiritualMaturity,
    #[serde(default)]
    pub cultural_background: Option<String>,
    #[serde(default)]
    pub language_preference: Option<String>,
    #[serde(default)]
    pub focus_areas: Vec<String>,
}

/// Input to the scheduler's slot search.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScheduleRequest {
    pub application_id: ApplicationId,
    pub interview_type: InterviewType,
    pub preferred_dates: Vec<DateTime<Utc>>,
    pub format: InterviewFormat,
    #[serde(default)]
    pub duration_minutes: Option<u32>,
    pub time_zone: String,
    #[serde(default)]
    pub background: ApplicantBackground,
    #[serde(default)]
    pub notes: Option<String>,
}

impl ScheduleRequest {
    pub fn duration(&self) -> u32 {
        self.duration_minutes
            .unwrap_or_else(|| self.interview_type.default_duration_minutes())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RescheduleRequest {
    pub interview_id: InterviewId,
    pub preferred_dates: Vec<DateTime<Utc>>,
    #[serde(default)]
    pub background: ApplicantBackground,
    #[serde(default)]
    pub reason: Option<String>,
}
