//! Decision policy: score thresholds and publication eligibility
//!
//! The threshold mapping is advisory. Only the business unit's explicit
//! decision is committed to the project.

use gagasan_common::CurationSettings;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::state::ProjectStatus;

/// Outcome category of a finished curation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "decision_category", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum DecisionCategory {
    ReadyForPublication,
    RevisionMinor,
    NeedsCoaching,
    Rejected,
}

impl DecisionCategory {
    /// Project status committed for this decision
    pub fn status(&self) -> ProjectStatus {
        match self {
            Self::ReadyForPublication => ProjectStatus::ReadyForPublication,
            Self::RevisionMinor => ProjectStatus::RevisionMinor,
            Self::NeedsCoaching => ProjectStatus::NeedsCoaching,
            Self::Rejected => ProjectStatus::Rejected,
        }
    }
}

impl std::fmt::Display for DecisionCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::ReadyForPublication => write!(f, "ready-for-publication"),
            Self::RevisionMinor => write!(f, "revision-minor"),
            Self::NeedsCoaching => write!(f, "needs-coaching"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Advisory outcome surfaced to the business unit
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DecisionSuggestion {
    pub combined_score: Decimal,
    pub category: DecisionCategory,
}

/// Fixed thresholds, inclusive lower bounds
pub struct DecisionPolicy;

impl DecisionPolicy {
    pub fn ready_threshold() -> Decimal {
        Decimal::new(350, 2)
    }

    pub fn minor_revision_threshold() -> Decimal {
        Decimal::new(275, 2)
    }

    pub fn coaching_threshold() -> Decimal {
        Decimal::new(200, 2)
    }

    /// Map a combined score to its suggested category
    pub fn categorize(score: Decimal) -> DecisionCategory {
        if score >= Self::ready_threshold() {
            DecisionCategory::ReadyForPublication
        } else if score >= Self::minor_revision_threshold() {
            DecisionCategory::RevisionMinor
        } else if score >= Self::coaching_threshold() {
            DecisionCategory::NeedsCoaching
        } else {
            DecisionCategory::Rejected
        }
    }

    pub fn suggest(combined_score: Decimal) -> DecisionSuggestion {
        DecisionSuggestion {
            combined_score,
            category: Self::categorize(combined_score),
        }
    }
}

/// Which decided projects may move on to publication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PublicationPolicy {
    pub publish_minor_revisions: bool,
}

impl Default for PublicationPolicy {
    fn default() -> Self {
        Self {
            publish_minor_revisions: true,
        }
    }
}

impl From<&CurationSettings> for PublicationPolicy {
    fn from(settings: &CurationSettings) -> Self {
        Self {
            publish_minor_revisions: settings.publish_minor_revisions,
        }
    }
}

impl PublicationPolicy {
    pub fn is_publishable(&self, status: ProjectStatus) -> bool {
        match status {
            ProjectStatus::ReadyForPublication => true,
            ProjectStatus::RevisionMinor => self.publish_minor_revisions,
            _ => false,
        }
    }
}
