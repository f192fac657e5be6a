//! Rubric definition: the fixed, weighted evaluation aspects
//!
//! Aspects are keyed by a stable enum identifier. The human-facing label is
//! display data only and never used as a key.

use serde::{Deserialize, Serialize};

/// Lowest score a curator can give an aspect
pub const MIN_SCORE: i32 = 1;

/// Highest score a curator can give an aspect
pub const MAX_SCORE: i32 = 4;

/// One weighted dimension of evaluation
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "rubric_aspect", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum RubricAspect {
    OriginalityInnovation,
    Functionality,
    TechnicalQuality,
    UsabilityDesign,
    ImpactBenefit,
    DocumentationPresentation,
}

impl RubricAspect {
    /// Stable identifier, identical to the serialized form
    pub fn id(&self) -> &'static str {
        match self {
            Self::OriginalityInnovation => "originality_innovation",
            Self::Functionality => "functionality",
            Self::TechnicalQuality => "technical_quality",
            Self::UsabilityDesign => "usability_design",
            Self::ImpactBenefit => "impact_benefit",
            Self::DocumentationPresentation => "documentation_presentation",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::OriginalityInnovation => "Originality & Innovation",
            Self::Functionality => "Functionality & Completeness",
            Self::TechnicalQuality => "Technical Quality",
            Self::UsabilityDesign => "Usability & Design",
            Self::ImpactBenefit => "Impact & Benefit",
            Self::DocumentationPresentation => "Documentation & Presentation",
        }
    }
}

impl std::fmt::Display for RubricAspect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.id())
    }
}

/// Human label for a rubric score; `None` means not yet scored
pub fn score_label(score: Option<i32>) -> &'static str {
    match score {
        None => "Not yet rated",
        Some(1) => "Poor",
        Some(2) => "Fair",
        Some(3) => "Good",
        Some(4) => "Very good",
        Some(_) => "Out of range",
    }
}

/// Ordered mapping of aspect → weight in percent.
///
/// Process-wide and read-only. Weights must sum to 100.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RubricDefinition {
    aspects: &'static [(RubricAspect, u32)],
}

static STANDARD_RUBRIC: RubricDefinition = RubricDefinition::new(&[
    (RubricAspect::OriginalityInnovation, 25),
    (RubricAspect::Functionality, 20),
    (RubricAspect::TechnicalQuality, 20),
    (RubricAspect::UsabilityDesign, 15),
    (RubricAspect::ImpactBenefit, 10),
    (RubricAspect::DocumentationPresentation, 10),
]);

impl RubricDefinition {
    pub const fn new(aspects: &'static [(RubricAspect, u32)]) -> Self {
        Self { aspects }
    }

    /// The rubric every curation is scored against
    pub fn standard() -> &'static RubricDefinition {
        &STANDARD_RUBRIC
    }

    /// Aspects in rubric order
    pub fn aspects(&self) -> impl Iterator<Item = RubricAspect> + '_ {
        self.aspects.iter().map(|(aspect, _)| *aspect)
    }

    /// (aspect, weight) pairs in rubric order
    pub fn weighted(&self) -> &'static [(RubricAspect, u32)] {
        self.aspects
    }

    pub fn weight(&self, aspect: RubricAspect) -> Option<u32> {
        self.aspects
            .iter()
            .find(|(a, _)| *a == aspect)
            .map(|(_, w)| *w)
    }

    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    pub fn total_weight(&self) -> u32 {
        self.aspects.iter().map(|(_, w)| *w).sum()
    }

    /// Check the structural invariants: non-empty, unique aspects, weights sum to 100
    pub fn validate(&self) -> Result<(), String> {
        if self.is_empty() {
            return Err("Rubric must contain at least one aspect".to_string());
        }

        for (i, (aspect, _)) in self.aspects.iter().enumerate() {
            if self.aspects[..i].iter().any(|(a, _)| a == aspect) {
                return Err(format!("Rubric lists aspect '{}' more than once", aspect));
            }
        }

        let total = self.total_weight();
        if total != 100 {
            return Err(format!("Rubric weights sum to {}, expected 100", total));
        }

        Ok(())
    }
}
