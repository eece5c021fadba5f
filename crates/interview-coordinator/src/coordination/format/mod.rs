mod guide;
mod rules;

pub use guide::{PreparationGuide, PreparationPhase, PreparationStage};

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

use super::domain::{InterviewFormat, InterviewType};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TechSkillLevel {
    Basic,
    #[default]
    Intermediate,
    Advanced,
}

/// Applicant's access to the technology each format depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyAccess {
    pub reliable_internet: bool,
    pub webcam: bool,
    pub microphone: bool,
    pub smartphone: bool,
    #[serde(default)]
    pub skill_level: TechSkillLevel,
}

impl Default for TechnologyAccess {
    fn default() -> Self {
        Self {
            reliable_internet: true,
            webcam: true,
            microphone: true,
            smartphone: true,
            skill_level: TechSkillLevel::Intermediate,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccessibilityNeed {
    HearingImpairment,
    VisualImpairment,
    MobilityLimitation,
    SpeechImpairment,
    CognitiveProcessing,
    Other(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormatCriteria {
    pub interview_type: InterviewType,
    #[serde(default)]
    pub technology: TechnologyAccess,
    #[serde(default)]
    pub accessibility_needs: Vec<AccessibilityNeed>,
    /// Formats the applicant asked for, most preferred first.
    #[serde(default)]
    pub preferences: Vec<InterviewFormat>,
    #[serde(default = "default_can_attend")]
    pub can_attend_in_person: bool,
}

fn default_can_attend() -> bool {
    true
}

impl FormatCriteria {
    /// Criteria with no stated constraints, used when only the type is known.
    pub fn neutral(interview_type: InterviewType) -> Self {
        Self {
            interview_type,
            technology: TechnologyAccess::default(),
            accessibility_needs: Vec::new(),
            preferences: Vec::new(),
            can_attend_in_person: true,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FormatFactor {
    Technology,
    Accessibility,
    InterviewTypeFit,
    Preference,
}

/// Linear weights for the format score, normalized by their sum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatWeights {
    pub technology: f32,
    pub accessibility: f32,
    pub interview_type_fit: f32,
    pub preference: f32,
}

impl Default for FormatWeights {
    fn default() -> Self {
        Self {
            technology: 0.35,
            accessibility: 0.20,
            interview_type_fit: 0.30,
            preference: 0.15,
        }
    }
}

impl FormatWeights {
    pub fn weight(&self, factor: FormatFactor) -> f32 {
        let raw = match factor {
            FormatFactor::Technology => self.technology,
            FormatFactor::Accessibility => self.accessibility,
            FormatFactor::InterviewTypeFit => self.interview_type_fit,
            FormatFactor::Preference => self.preference,
        };
        if raw.is_finite() {
            raw.max(0.0)
        } else {
            0.0
        }
    }

    fn total(&self) -> f32 {
        [
            FormatFactor::Technology,
            FormatFactor::Accessibility,
            FormatFactor::InterviewTypeFit,
            FormatFactor::Preference,
        ]
        .into_iter()
        .map(|factor| self.weight(factor))
        .sum()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatComponent {
    pub factor: FormatFactor,
    pub value: f32,
    pub weight: f32,
}

/// Scored format with its trade-offs for this applicant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FormatRecommendation {
    pub format: InterviewFormat,
    pub score: f32,
    pub advantages: Vec<String>,
    pub disadvantages: Vec<String>,
    pub components: Vec<FormatComponent>,
}

const IN_PERSON_UNAVAILABLE_CAP: f32 = 0.2;

/// Scores the supported formats and writes preparation guides. Pure.
#[derive(Debug, Clone, Default)]
pub struct FormatSelector {
    weights: FormatWeights,
}

impl FormatSelector {
    pub fn new(weights: FormatWeights) -> Self {
        Self { weights }
    }

    /// One recommendation per supported format, best first.
    pub fn recommend_format(&self, criteria: &FormatCriteria) -> Vec<FormatRecommendation> {
        let mut recommendations: Vec<FormatRecommendation> = InterviewFormat::ordered()
            .into_iter()
            .map(|format| self.score_format(format, criteria))
            .collect();

        apply_hard_constraints(&mut recommendations, criteria);

        let offline = !criteria.technology.reliable_internet;
        recommendations.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| {
                    if offline {
                        a.format
                            .requires_internet()
                            .cmp(&b.format.requires_internet())
                    } else {
                        Ordering::Equal
                    }
                })
                .then_with(|| a.format.cmp(&b.format))
        });
        recommendations
    }

    pub fn generate_preparation_guide(
        &self,
        format: InterviewFormat,
        interview_type: InterviewType,
    ) -> PreparationGuide {
        guide::build(format, interview_type)
    }

    fn score_format(
        &self,
        format: InterviewFormat,
        criteria: &FormatCriteria,
    ) -> FormatRecommendation {
        let values = [
            (
                FormatFactor::Technology,
                rules::technology_fit(format, &criteria.technology),
            ),
            (
                FormatFactor::Accessibility,
                rules::accessibility_fit(format, &criteria.accessibility_needs),
            ),
            (
                FormatFactor::InterviewTypeFit,
                rules::interview_type_fit(criteria.interview_type, format),
            ),
            (
                FormatFactor::Preference,
                rules::preference_fit(format, &criteria.preferences),
            ),
        ];

        let components: Vec<FormatComponent> = values
            .into_iter()
            .map(|(factor, value)| FormatComponent {
                factor,
                value,
                weight: self.weights.weight(factor),
            })
            .collect();

        let total = self.weights.total();
        let score = if total > 0.0 {
            let weighted: f32 = components.iter().map(|c| c.value * c.weight).sum();
            (weighted / total).clamp(0.0, 1.0)
        } else {
            0.0
        };

        let (advantages, disadvantages) = trade_offs(format, criteria);

        FormatRecommendation {
            format,
            score,
            advantages,
            disadvantages,
            components,
        }
    }
}

fn apply_hard_constraints(recommendations: &mut [FormatRecommendation], criteria: &FormatCriteria) {
    if !criteria.technology.reliable_internet {
        let phone_score = recommendations
            .iter()
            .find(|rec| rec.format == InterviewFormat::PhoneCall)
            .map(|rec| rec.score)
            .unwrap_or(0.0);
        for rec in recommendations
            .iter_mut()
            .filter(|rec| rec.format.requires_internet())
        {
            rec.score = rec.score.min(phone_score);
        }
    }

    if !criteria.can_attend_in_person {
        for rec in recommendations
            .iter_mut()
            .filter(|rec| rec.format == InterviewFormat::InPerson)
        {
            rec.score = rec.score.min(IN_PERSON_UNAVAILABLE_CAP);
        }
    }
}

fn trade_offs(format: InterviewFormat, criteria: &FormatCriteria) -> (Vec<String>, Vec<String>) {
    let mut advantages: Vec<String> = Vec::new();
    let mut disadvantages: Vec<String> = Vec::new();

    match format {
        InterviewFormat::VideoConference => {
            advantages.push("Face-to-face conversation without travel".to_string());
            advantages.push("Screen sharing for documents and portfolios".to_string());
            disadvantages.push("Depends on a stable internet connection".to_string());
        }
        InterviewFormat::PhoneCall => {
            advantages.push("Works without internet access".to_string());
            advantages.push("Lowest technical barrier".to_string());
            disadvantages.push("No visual cues or shared materials".to_string());
        }
        InterviewFormat::InPerson => {
            advantages.push("Richest personal interaction".to_string());
            advantages.push("Campus visit alongside the interview".to_string());
            disadvantages.push("Requires travel and scheduling a visit".to_string());
        }
        InterviewFormat::AsynchronousVideo => {
            advantages.push("Applicant records answers on their own schedule".to_string());
            advantages.push("Reviewers can revisit responses".to_string());
            disadvantages.push("No live follow-up questions".to_string());
        }
    }

    if format.requires_internet() && !criteria.technology.reliable_internet {
        disadvantages.push("Applicant reports unreliable internet".to_string());
    }
    if format == InterviewFormat::VideoConference
        && !(criteria.technology.webcam || criteria.technology.smartphone)
    {
        disadvantages.push("Applicant has no camera-equipped device".to_string());
    }
    if format == InterviewFormat::InPerson && !criteria.can_attend_in_person {
        disadvantages.push("Applicant cannot attend in person".to_string());
    }
    if format == InterviewFormat::AsynchronousVideo && criteria.interview_type.is_decisive() {
        disadvantages.push(format!(
            "{} normally needs live discussion",
            criteria.interview_type.label()
        ));
    }
    for need in &criteria.accessibility_needs {
        if rules::accessibility_penalty(format, need) >= 0.5 {
            disadvantages.push(format!("Poor fit for {}", need_label(need)));
        }
    }
    if criteria.preferences.first() == Some(&format) {
        advantages.push("Applicant's preferred format".to_string());
    }

    (advantages, disadvantages)
}

fn need_label(need: &AccessibilityNeed) -> String {
    match need {
        AccessibilityNeed::HearingImpairment => "hearing impairment".to_string(),
        AccessibilityNeed::VisualImpairment => "visual impairment".to_string(),
        AccessibilityNeed::MobilityLimitation => "mobility limitation".to_string(),
        AccessibilityNeed::SpeechImpairment => "speech impairment".to_string(),
        AccessibilityNeed::CognitiveProcessing => "cognitive processing needs".to_string(),
        AccessibilityNeed::Other(detail) => detail.clone(),
    }
}
