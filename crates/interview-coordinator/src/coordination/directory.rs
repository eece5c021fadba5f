use serde::{Deserialize, Serialize};
use std::fmt;

use super::domain::InterviewType;
use super::roster::InterviewerRoster;

/// Identifier wrapper for interviewers in the user directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct InterviewerId(pub String);

impl fmt::Display for InterviewerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InterviewerRole {
    AdmissionsOfficer,
    Faculty,
    SpiritualAdvisor,
    Dean,
    Administrator,
}

impl InterviewerRole {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::AdmissionsOfficer,
            Self::Faculty,
            Self::SpiritualAdvisor,
            Self::Dean,
            Self::Administrator,
        ]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::AdmissionsOfficer => "Admissions Officer",
            Self::Faculty => "Faculty",
            Self::SpiritualAdvisor => "Spiritual Advisor",
            Self::Dean => "Dean",
            Self::Administrator => "Administrator",
        }
    }

    /// Lenient parse used by roster imports ("Admissions Officer", "admissions_officer", ...).
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .map(|c| c.to_ascii_lowercase())
            .collect();

        match normalized.as_str() {
            "admissionsofficer" | "admissions" => Some(Self::AdmissionsOfficer),
            "faculty" | "professor" => Some(Self::Faculty),
            "spiritualadvisor" | "chaplain" => Some(Self::SpiritualAdvisor),
            "dean" => Some(Self::Dean),
            "administrator" | "admin" => Some(Self::Administrator),
            _ => None,
        }
    }
}

/// Contact channels the directory knows for a person.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ContactChannels {
    pub email: Option<String>,
    pub phone: Option<String>,
}

/// Read-only interviewer view served by the directory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interviewer {
    pub id: InterviewerId,
    pub name: String,
    pub role: InterviewerRole,
    #[serde(default)]
    pub contact: ContactChannels,
    #[serde(default)]
    pub competencies: Vec<String>,
    #[serde(default)]
    pub languages: Vec<String>,
    #[serde(default)]
    pub cultural_familiarity: Vec<String>,
    #[serde(default)]
    pub alignment: Option<f32>,
    #[serde(default = "default_active")]
    pub active: bool,
}

fn default_active() -> bool {
    true
}

const NEUTRAL_ALIGNMENT: f32 = 0.5;

impl Interviewer {
    /// Alignment clamped to `[0, 1]`; interviewers without one are treated as neutral.
    pub fn alignment_factor(&self) -> f32 {
        match self.alignment {
            Some(value) if value.is_finite() => value.clamp(0.0, 1.0),
            _ => NEUTRAL_ALIGNMENT,
        }
    }

    pub fn can_conduct(&self, interview_type: InterviewType) -> bool {
        self.active && interview_type.role_fitness(self.role).is_some()
    }
}

/// User directory lookup for interviewers.
pub trait InterviewerDirectory: Send + Sync {
    /// Interviewers whose role makes them eligible for the interview type.
    fn eligible_interviewers(
        &self,
        interview_type: InterviewType,
    ) -> Result<Vec<Interviewer>, DirectoryError>;

    fn interviewer(&self, id: &InterviewerId) -> Result<Option<Interviewer>, DirectoryError>;
}

#[derive(Debug, thiserror::Error)]
pub enum DirectoryError {
    #[error("interviewer directory unavailable: {0}")]
    Unavailable(String),
}

/// In-process directory backed by a fixed interviewer list.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    interviewers: Vec<Interviewer>,
}

impl StaticDirectory {
    pub fn new(interviewers: Vec<Interviewer>) -> Self {
        Self { interviewers }
    }

    pub fn from_roster(roster: InterviewerRoster) -> Self {
        Self::new(roster.into_interviewers())
    }

    pub fn interviewers(&self) -> &[Interviewer] {
        &self.interviewers
    }
}

impl InterviewerDirectory for StaticDirectory {
    fn eligible_interviewers(
        &self,
        interview_type: InterviewType,
    ) -> Result<Vec<Interviewer>, DirectoryError> {
        Ok(self
            .interviewers
            .iter()
            .filter(|interviewer| interviewer.can_conduct(interview_type))
            .cloned()
            .collect())
    }

    fn interviewer(&self, id: &InterviewerId) -> Result<Option<Interviewer>, DirectoryError> {
        Ok(self
            .interviewers
            .iter()
            .find(|interviewer| &interviewer.id == id)
            .cloned())
    }
}
