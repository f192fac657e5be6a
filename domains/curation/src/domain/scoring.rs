//! Scoring engine: weighted rubric score for one curator track

use std::collections::BTreeMap;

use gagasan_common::Error;
use rust_decimal::{Decimal, RoundingStrategy};
use thiserror::Error;

use super::rubric::{RubricAspect, RubricDefinition, MAX_SCORE, MIN_SCORE};

/// Per-aspect integer ratings submitted by one curator
pub type ScoreSheet = BTreeMap<RubricAspect, i32>;

/// Reasons a score sheet cannot be turned into a weighted score
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ScoringError {
    #[error("aspect '{0}' has no score")]
    MissingAspect(RubricAspect),

    #[error("aspect '{aspect}' scored {score}, expected 1..=4")]
    OutOfRange { aspect: RubricAspect, score: i32 },

    #[error("aspect '{0}' is not part of the rubric")]
    UnknownAspect(RubricAspect),
}

impl From<ScoringError> for Error {
    fn from(err: ScoringError) -> Self {
        Error::IncompleteScoring(err.to_string())
    }
}

/// Round half away from zero, always at scale 2
pub fn round_score(value: Decimal) -> Decimal {
    let mut rounded = value.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero);
    rounded.rescale(2);
    rounded
}

/// Pure, deterministic score computation shared by both tracks
pub struct ScoringEngine;

impl ScoringEngine {
    /// `sum(score * weight / 100)` over every rubric aspect, rounded to 2 dp
    pub fn compute(rubric: &RubricDefinition, scores: &ScoreSheet) -> Result<Decimal, ScoringError> {
        if let Some(unknown) = scores.keys().find(|a| rubric.weight(**a).is_none()) {
            return Err(ScoringError::UnknownAspect(*unknown));
        }

        // Accumulate in hundredths so the division by 100 is exact
        let mut hundredths: i64 = 0;
        for &(aspect, weight) in rubric.weighted() {
            let score = *scores
                .get(&aspect)
                .ok_or(ScoringError::MissingAspect(aspect))?;
            if !(MIN_SCORE..=MAX_SCORE).contains(&score) {
                return Err(ScoringError::OutOfRange { aspect, score });
            }
            hundredths += i64::from(score) * i64::from(weight);
        }

        Ok(round_score(Decimal::new(hundredths, 2)))
    }

    /// Mean of the two track scores, rounded to 2 dp
    pub fn combine(academic: Decimal, partner: Decimal) -> Decimal {
        round_score((academic + partner) / Decimal::TWO)
    }
}
