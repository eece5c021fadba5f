use serde::{Deserialize, Serialize};

use super::super::domain::{InterviewFormat, InterviewType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PreparationStage {
    Immediate,
    FortyEightHoursBefore,
    DayOf,
}

impl PreparationStage {
    pub const fn ordered() -> [Self; 3] {
        [Self::Immediate, Self::FortyEightHoursBefore, Self::DayOf]
    }

    pub const fn label(self) -> &'static str {
        match self {
            Self::Immediate => "Immediately",
            Self::FortyEightHoursBefore => "48 hours before",
            Self::DayOf => "Day of interview",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationPhase {
    pub stage: PreparationStage,
    pub label: String,
    pub tasks: Vec<String>,
}

/// Applicant-facing checklist for a format and interview type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreparationGuide {
    pub format: InterviewFormat,
    pub interview_type: InterviewType,
    pub timeline: Vec<PreparationPhase>,
    pub required_resources: Vec<String>,
    pub technical_requirements: Vec<String>,
    pub type_specific_content: Vec<String>,
}

pub(crate) fn build(format: InterviewFormat, interview_type: InterviewType) -> PreparationGuide {
    let timeline = PreparationStage::ordered()
        .into_iter()
        .map(|stage| PreparationPhase {
            stage,
            label: stage.label().to_string(),
            tasks: phase_tasks(stage, format),
        })
        .collect();

    PreparationGuide {
        format,
        interview_type,
        timeline,
        required_resources: required_resources(format, interview_type),
        technical_requirements: technical_requirements(format),
        type_specific_content: type_specific_content(interview_type),
    }
}

fn phase_tasks(stage: PreparationStage, format: InterviewFormat) -> Vec<String> {
    let mut tasks: Vec<&str> = match stage {
        PreparationStage::Immediate => vec![
            "Confirm the interview time from the confirmation request",
            "Add the interview to your calendar in your local time zone",
        ],
        PreparationStage::FortyEightHoursBefore => vec![
            "Review your application and personal statement",
            "Prepare two or three questions for the interviewer",
        ],
        PreparationStage::DayOf => vec![
            "Be ready ten minutes before the start time",
            "Keep your application reference number at hand",
        ],
    };

    match (stage, format) {
        (PreparationStage::Immediate, InterviewFormat::InPerson) => {
            tasks.push("Arrange travel and check campus visitor parking");
        }
        (PreparationStage::FortyEightHoursBefore, InterviewFormat::VideoConference) => {
            tasks.push("Run a test call with the meeting link");
        }
        (PreparationStage::FortyEightHoursBefore, InterviewFormat::AsynchronousVideo) => {
            tasks.push("Record a practice answer and review the playback");
        }
        (PreparationStage::DayOf, InterviewFormat::PhoneCall) => {
            tasks.push("Charge your phone and find a quiet room with good reception");
        }
        (PreparationStage::DayOf, InterviewFormat::VideoConference) => {
            tasks.push("Check lighting, camera framing, and audio");
        }
        (PreparationStage::DayOf, InterviewFormat::InPerson) => {
            tasks.push("Bring a photo ID for check-in at the admissions office");
        }
        (PreparationStage::DayOf, InterviewFormat::AsynchronousVideo) => {
            tasks.push("Submit all recorded responses before the deadline");
        }
        _ => {}
    }

    tasks.into_iter().map(str::to_string).collect()
}

fn required_resources(format: InterviewFormat, interview_type: InterviewType) -> Vec<String> {
    let mut resources = vec!["Copy of your submitted application".to_string()];
    match format {
        InterviewFormat::VideoConference | InterviewFormat::AsynchronousVideo => {
            resources.push("Quiet, well-lit space".to_string());
        }
        InterviewFormat::PhoneCall => resources.push("Quiet space with phone reception".to_string()),
        InterviewFormat::InPerson => resources.push("Photo identification".to_string()),
    }
    match interview_type {
        InterviewType::AcademicAssessment => {
            resources.push("Transcripts and a writing sample".to_string())
        }
        InterviewType::SpiritualEvaluation => {
            resources.push("Your testimony or faith journey summary".to_string())
        }
        InterviewType::CharacterInterview => {
            resources.push("Contact details for your references".to_string())
        }
        InterviewType::FinalInterview | InterviewType::CommitteeInterview => {
            resources.push("Notes from earlier interviews".to_string())
        }
        InterviewType::InitialScreening => {}
    }
    resources
}

fn technical_requirements(format: InterviewFormat) -> Vec<String> {
    let items: &[&str] = match format {
        InterviewFormat::VideoConference => &[
            "Broadband connection of at least 3 Mbps up and down",
            "Webcam and microphone, or a smartphone",
            "Current browser or the meeting platform app",
        ],
        InterviewFormat::PhoneCall => &["Phone able to receive calls at the scheduled time"],
        InterviewFormat::InPerson => &[],
        InterviewFormat::AsynchronousVideo => &[
            "Internet connection able to upload video files",
            "Webcam or smartphone camera",
            "Browser with camera and microphone permissions enabled",
        ],
    };
    items.iter().map(|item| item.to_string()).collect()
}

fn type_specific_content(interview_type: InterviewType) -> Vec<String> {
    let items: &[&str] = match interview_type {
        InterviewType::InitialScreening => &[
            "Why you are applying and what you hope to study",
            "Your timeline and availability to enroll",
        ],
        InterviewType::AcademicAssessment => &[
            "Your academic background and strongest subjects",
            "A topic you would like to research further",
        ],
        InterviewType::SpiritualEvaluation => &[
            "Your faith journey and current spiritual practices",
            "How you see your calling developing during study",
        ],
        InterviewType::CharacterInterview => &[
            "Examples of leadership, service, and handling conflict",
            "How others would describe you",
        ],
        InterviewType::FinalInterview => &[
            "Your goals after graduation",
            "Questions about community life and commitments",
        ],
        InterviewType::CommitteeInterview => &[
            "Expect questions from several panel members in turn",
            "Summarize your application in a short opening statement",
        ],
    };
    items.iter().map(|item| item.to_string()).collect()
}
