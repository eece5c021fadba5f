//! Per-format factor values. Every function returns a value in `[0, 1]`.

use super::super::domain::{InterviewFormat, InterviewType};
use super::{AccessibilityNeed, TechSkillLevel, TechnologyAccess};

const NEUTRAL_PREFERENCE: f32 = 0.5;

/// Technology readiness. Phone needs no internet, so it jumps to 1.0 when the
/// applicant's connection is unreliable while video drops to 0.
pub(crate) fn technology_fit(format: InterviewFormat, tech: &TechnologyAccess) -> f32 {
    let skill_bonus = match tech.skill_level {
        TechSkillLevel::Basic => 0.0,
        TechSkillLevel::Intermediate => 0.1,
        TechSkillLevel::Advanced => 0.2,
    };

    let value: f32 = match format {
        InterviewFormat::VideoConference => {
            if !tech.reliable_internet {
                0.0
            } else {
                let mut value = 0.4 + skill_bonus;
                if tech.webcam || tech.smartphone {
                    value += 0.25;
                }
                if tech.microphone || tech.smartphone {
                    value += 0.15;
                }
                value
            }
        }
        InterviewFormat::PhoneCall => {
            if tech.reliable_internet {
                0.7
            } else {
                1.0
            }
        }
        InterviewFormat::InPerson => 1.0,
        InterviewFormat::AsynchronousVideo => {
            if !tech.reliable_internet {
                if tech.smartphone {
                    0.3
                } else {
                    0.0
                }
            } else {
                let mut value = 0.3 + skill_bonus;
                if tech.webcam || tech.smartphone {
                    value += 0.3;
                }
                if tech.microphone || tech.smartphone {
                    value += 0.2;
                }
                value
            }
        }
    };
    value.clamp(0.0, 1.0)
}

/// Penalty a single accessibility need imposes on a format.
pub(crate) fn accessibility_penalty(format: InterviewFormat, need: &AccessibilityNeed) -> f32 {
    use InterviewFormat::*;

    match need {
        AccessibilityNeed::HearingImpairment => match format {
            PhoneCall => 0.6,
            VideoConference => 0.2,
            InPerson => 0.1,
            AsynchronousVideo => 0.1,
        },
        AccessibilityNeed::VisualImpairment => match format {
            VideoConference | AsynchronousVideo => 0.3,
            InPerson => 0.1,
            PhoneCall => 0.0,
        },
        AccessibilityNeed::MobilityLimitation => match format {
            InPerson => 0.6,
            _ => 0.0,
        },
        AccessibilityNeed::SpeechImpairment => match format {
            PhoneCall => 0.5,
            VideoConference => 0.3,
            InPerson => 0.2,
            AsynchronousVideo => 0.0,
        },
        AccessibilityNeed::CognitiveProcessing => match format {
            PhoneCall => 0.3,
            VideoConference => 0.2,
            InPerson => 0.1,
            AsynchronousVideo => 0.0,
        },
        AccessibilityNeed::Other(_) => 0.0,
    }
}

pub(crate) fn accessibility_fit(format: InterviewFormat, needs: &[AccessibilityNeed]) -> f32 {
    let penalty: f32 = needs
        .iter()
        .map(|need| accessibility_penalty(format, need))
        .sum();
    (1.0 - penalty).clamp(0.0, 1.0)
}

/// Decisive interviews lean in-person or synchronous video; screenings
/// tolerate asynchronous video.
pub(crate) fn interview_type_fit(interview_type: InterviewType, format: InterviewFormat) -> f32 {
    use InterviewFormat::*;
    use InterviewType::*;

    match (interview_type, format) {
        (InitialScreening, VideoConference) => 0.8,
        (InitialScreening, PhoneCall) => 0.8,
        (InitialScreening, InPerson) => 0.5,
        (InitialScreening, AsynchronousVideo) => 0.9,

        (AcademicAssessment, VideoConference) => 0.9,
        (AcademicAssessment, PhoneCall) => 0.5,
        (AcademicAssessment, InPerson) => 0.8,
        (AcademicAssessment, AsynchronousVideo) => 0.6,

        (SpiritualEvaluation, VideoConference) => 0.8,
        (SpiritualEvaluation, PhoneCall) => 0.6,
        (SpiritualEvaluation, InPerson) => 0.9,
        (SpiritualEvaluation, AsynchronousVideo) => 0.3,

        (CharacterInterview, VideoConference) => 0.8,
        (CharacterInterview, PhoneCall) => 0.6,
        (CharacterInterview, InPerson) => 0.9,
        (CharacterInterview, AsynchronousVideo) => 0.4,

        (FinalInterview, VideoConference) => 0.85,
        (FinalInterview, PhoneCall) => 0.3,
        (FinalInterview, InPerson) => 1.0,
        (FinalInterview, AsynchronousVideo) => 0.1,

        (CommitteeInterview, VideoConference) => 0.9,
        (CommitteeInterview, PhoneCall) => 0.2,
        (CommitteeInterview, InPerson) => 1.0,
        (CommitteeInterview, AsynchronousVideo) => 0.0,
    }
}

/// First stated preference scores 1.0, later ones 0.7, unlisted 0.
pub(crate) fn preference_fit(format: InterviewFormat, preferences: &[InterviewFormat]) -> f32 {
    if preferences.is_empty() {
        return NEUTRAL_PREFERENCE;
    }
    match preferences.iter().position(|preferred| *preferred == format) {
        Some(0) => 1.0,
        Some(_) => 0.7,
        None => 0.0,
    }
}
