use std::collections::BTreeSet;

use super::super::directory::Interviewer;
use super::super::domain::{ApplicantBackground, InterviewType};
use super::weights::{MatchFactor, MatchWeights};
use super::MatchComponent;

const NO_PREFERENCE: f32 = 0.5;

pub(crate) struct ScoredInterviewer {
    pub components: Vec<MatchComponent>,
    pub score: f32,
    pub reasons: Vec<String>,
}

pub(crate) fn score_interviewer(
    interviewer: &Interviewer,
    interview_type: InterviewType,
    background: &ApplicantBackground,
    weights: &MatchWeights,
) -> ScoredInterviewer {
    let mut components = Vec::with_capacity(MatchFactor::ordered().len());
    let mut reasons = Vec::new();

    let role_fitness = interview_type.role_fitness(interviewer.role).unwrap_or(0.0);
    let role_note = if role_fitness >= 1.0 {
        format!(
            "{} is a primary role for {}",
            interviewer.role.label(),
            interview_type.label()
        )
    } else if role_fitness > 0.0 {
        format!(
            "{} can conduct {} as a secondary role",
            interviewer.role.label(),
            interview_type.label()
        )
    } else {
        format!(
            "{} is not eligible for {}",
            interviewer.role.label(),
            interview_type.label()
        )
    };
    if role_fitness > 0.0 {
        reasons.push(role_note.clone());
    }
    components.push(component(
        MatchFactor::RoleFitness,
        role_fitness,
        weights,
        role_note,
    ));

    let wanted = wanted_competencies(interview_type, background);
    let held: BTreeSet<String> = interviewer
        .competencies
        .iter()
        .map(|competency| normalize(competency))
        .collect();
    let shared: Vec<&String> = wanted.intersection(&held).collect();
    let overlap = if wanted.is_empty() {
        0.0
    } else {
        shared.len() as f32 / wanted.len() as f32
    };
    let overlap_note = if shared.is_empty() {
        "no shared competencies".to_string()
    } else {
        let names: Vec<&str> = shared.iter().map(|name| name.as_str()).collect();
        format!(
            "shares {} of {} competencies: {}",
            shared.len(),
            wanted.len(),
            names.join(", ")
        )
    };
    if !shared.is_empty() {
        reasons.push(capitalize(&overlap_note));
    }
    components.push(component(
        MatchFactor::CompetencyOverlap,
        overlap,
        weights,
        overlap_note,
    ));

    let (language, language_note) = preference_match(
        background.language_preference.as_deref(),
        &interviewer.languages,
        "language",
    );
    if language >= 1.0 {
        reasons.push(capitalize(&language_note));
    }
    components.push(component(
        MatchFactor::Language,
        language,
        weights,
        language_note,
    ));

    let (cultural, cultural_note) = preference_match(
        background.cultural_background.as_deref(),
        &interviewer.cultural_familiarity,
        "cultural background",
    );
    if cultural >= 1.0 {
        reasons.push(capitalize(&cultural_note));
    }
    components.push(component(
        MatchFactor::CulturalFamiliarity,
        cultural,
        weights,
        cultural_note,
    ));

    let alignment = interviewer.alignment_factor();
    let alignment_note = format!("alignment factor {:.2}", alignment);
    if alignment >= 0.8 {
        reasons.push(format!("Strong mission alignment ({:.2})", alignment));
    }
    components.push(component(
        MatchFactor::Alignment,
        alignment,
        weights,
        alignment_note,
    ));

    let total_weight = weights.total();
    let weighted: f32 = components.iter().map(|c| c.contribution).sum();
    let score = if total_weight > 0.0 {
        (weighted / total_weight * 100.0).clamp(0.0, 100.0)
    } else {
        0.0
    };

    ScoredInterviewer {
        components,
        score,
        reasons,
    }
}

fn component(
    factor: MatchFactor,
    value: f32,
    weights: &MatchWeights,
    notes: String,
) -> MatchComponent {
    let value = value.clamp(0.0, 1.0);
    let weight = weights.weight(factor);
    MatchComponent {
        factor,
        value,
        weight,
        contribution: value * weight,
        notes,
    }
}

/// Competencies an ideal interviewer would hold for this applicant.
fn wanted_competencies(
    interview_type: InterviewType,
    background: &ApplicantBackground,
) -> BTreeSet<String> {
    let mut wanted: BTreeSet<String> = interview_type
        .core_competencies()
        .iter()
        .map(|competency| normalize(competency))
        .collect();

    match interview_type {
        InterviewType::AcademicAssessment => {
            wanted.insert(background.academic_level.competency().to_string());
        }
        InterviewType::SpiritualEvaluation => {
            wanted.insert(background.spiritual_maturity.competency().to_string());
        }
        _ => {}
    }

    wanted.extend(
        background
            .focus_areas
            .iter()
            .map(|area| normalize(area))
            .filter(|area| !area.is_empty()),
    );
    wanted
}

fn preference_match(preference: Option<&str>, offered: &[String], what: &str) -> (f32, String) {
    let Some(preference) = preference.map(normalize).filter(|p| !p.is_empty()) else {
        return (NO_PREFERENCE, format!("no {what} preference stated"));
    };

    if offered.iter().any(|item| normalize(item) == preference) {
        (1.0, format!("matches {what} '{preference}'"))
    } else {
        (0.0, format!("does not match {what} '{preference}'"))
    }
}

fn normalize(value: &str) -> String {
    value.trim().to_lowercase()
}

fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
