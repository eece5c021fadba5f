use serde::{Deserialize, Deserializer};
use std::io::Read;
use std::path::Path;

use super::directory::{ContactChannels, Interviewer, InterviewerId, InterviewerRole};

#[derive(Debug)]
pub enum RosterError {
    Io(std::io::Error),
    Csv(csv::Error),
    UnknownRole { row: usize, role: String },
    InvalidAlignment { row: usize, value: f32 },
    DuplicateInterviewer(String),
}

impl std::fmt::Display for RosterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RosterError::Io(err) => write!(f, "failed to read interviewer roster: {}", err),
            RosterError::Csv(err) => write!(f, "invalid interviewer roster CSV: {}", err),
            RosterError::UnknownRole { row, role } => {
                write!(f, "row {}: unknown interviewer role '{}'", row, role)
            }
            RosterError::InvalidAlignment { row, value } => {
                write!(f, "row {}: alignment {} must be within [0, 1]", row, value)
            }
            RosterError::DuplicateInterviewer(id) => {
                write!(f, "interviewer '{}' appears more than once", id)
            }
        }
    }
}

impl std::error::Error for RosterError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            RosterError::Io(err) => Some(err),
            RosterError::Csv(err) => Some(err),
            _ => None,
        }
    }
}

impl From<std::io::Error> for RosterError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<csv::Error> for RosterError {
    fn from(err: csv::Error) -> Self {
        Self::Csv(err)
    }
}

/// Interviewer list loaded from a CSV export of the user directory.
///
/// Expected header: `id,name,role,email,phone,competencies,languages,cultural_familiarity,alignment`
/// with an optional trailing `active` column. List cells are `;`-separated.
#[derive(Debug, Clone, Default)]
pub struct InterviewerRoster {
    interviewers: Vec<Interviewer>,
}

impl InterviewerRoster {
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, RosterError> {
        let file = std::fs::File::open(path)?;
        Self::from_reader(file)
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, RosterError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let mut interviewers: Vec<Interviewer> = Vec::new();

        for (index, record) in csv_reader.deserialize::<RosterRow>().enumerate() {
            let row = record?;
            let line = index + 2;

            let role = InterviewerRole::parse(&row.role).ok_or_else(|| RosterError::UnknownRole {
                row: line,
                role: row.role.clone(),
            })?;

            if let Some(value) = row.alignment {
                if !(0.0..=1.0).contains(&value) {
                    return Err(RosterError::InvalidAlignment { row: line, value });
                }
            }

            if interviewers.iter().any(|existing| existing.id.0 == row.id) {
                return Err(RosterError::DuplicateInterviewer(row.id));
            }

            interviewers.push(Interviewer {
                id: InterviewerId(row.id),
                name: row.name,
                role,
                contact: ContactChannels {
                    email: row.email,
                    phone: row.phone,
                },
                competencies: split_list(row.competencies.as_deref()),
                languages: split_list(row.languages.as_deref()),
                cultural_familiarity: split_list(row.cultural_familiarity.as_deref()),
                alignment: row.alignment,
                active: row.active.unwrap_or(true),
            });
        }

        Ok(Self { interviewers })
    }

    pub fn len(&self) -> usize {
        self.interviewers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.interviewers.is_empty()
    }

    pub fn interviewers(&self) -> &[Interviewer] {
        &self.interviewers
    }

    pub fn into_interviewers(self) -> Vec<Interviewer> {
        self.interviewers
    }
}

#[derive(Debug, Deserialize)]
struct RosterRow {
    id: String,
    name: String,
    role: String,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    email: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    phone: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    competencies: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    languages: Option<String>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    cultural_familiarity: Option<String>,
    #[serde(default)]
    alignment: Option<f32>,
    #[serde(default)]
    active: Option<bool>,
}

fn empty_string_as_none<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let opt = Option::<String>::deserialize(deserializer)?;
    Ok(opt.filter(|value| !value.trim().is_empty()))
}

fn split_list(raw: Option<&str>) -> Vec<String> {
    raw.map(|value| {
        value
            .split(';')
            .map(str::trim)
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect()
    })
    .unwrap_or_default()
}
