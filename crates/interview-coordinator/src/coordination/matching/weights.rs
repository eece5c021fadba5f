use serde::{Deserialize, Serialize};

/// Named inputs to the interviewer match score.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchFactor {
    RoleFitness,
    CompetencyOverlap,
    Language,
    CulturalFamiliarity,
    Alignment,
}

impl MatchFactor {
    pub const fn ordered() -> [Self; 5] {
        [
            Self::RoleFitness,
            Self::CompetencyOverlap,
            Self::Language,
            Self::CulturalFamiliarity,
            Self::Alignment,
        ]
    }
}

/// Linear weights for the match score. They are normalized by their sum, so
/// only their ratios matter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchWeights {
    pub role_fitness: f32,
    pub competency_overlap: f32,
    pub language: f32,
    pub cultural_familiarity: f32,
    pub alignment: f32,
}

impl Default for MatchWeights {
    fn default() -> Self {
        Self {
            role_fitness: 0.35,
            competency_overlap: 0.25,
            language: 0.15,
            cultural_familiarity: 0.10,
            alignment: 0.15,
        }
    }
}

impl MatchWeights {
    pub fn weight(&self, factor: MatchFactor) -> f32 {
        let raw = match factor {
            MatchFactor::RoleFitness => self.role_fitness,
            MatchFactor::CompetencyOverlap => self.competency_overlap,
            MatchFactor::Language => self.language,
            MatchFactor::CulturalFamiliarity => self.cultural_familiarity,
            MatchFactor::Alignment => self.alignment,
        };
        if raw.is_finite() {
            raw.max(0.0)
        } else {
            0.0
        }
    }

    pub fn total(&self) -> f32 {
        MatchFactor::ordered()
            .into_iter()
            .map(|factor| self.weight(factor))
            .sum()
    }
}
