//! Domain entities for the curation workflow
//!
//! Entities own their state transitions: every status change goes through the
//! matching state machine so an illegal move never reaches the store.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;

use gagasan_auth::Capability;
use gagasan_common::{Error, Result};

use super::decision::{DecisionCategory, DecisionPolicy, DecisionSuggestion, PublicationPolicy};
use super::rubric::{score_label, RubricAspect, RubricDefinition};
use super::scoring::ScoringEngine;
use super::state::{
    AccessRequestEvent, AccessRequestStateMachine, AccessRequestStatus, CurationEvent,
    CurationGuardContext, CurationStateMachine, CurationStatus, ProjectEvent,
    ProjectGuardContext, ProjectStateMachine, ProjectStatus,
};
use super::validation;

// ============================================================================
// Project
// ============================================================================

/// Reference to an uploaded poster image; the bytes live in external storage
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PosterImage {
    pub storage_key: String,
    pub content_type: String,
    pub size_bytes: i64,
}

/// Fields supplied by the owner when submitting a project
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct ProjectSubmission {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub demo_link: Option<String>,
    #[serde(default)]
    pub source_code_link: Option<String>,
    #[serde(default)]
    pub poster: Option<PosterImage>,
    #[serde(default)]
    pub categories: Vec<String>,
    /// Comma-separated tag input
    #[serde(default)]
    pub tags: String,
}

/// A submitted work item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Project {
    pub id: Uuid,
    pub owner_id: Uuid,
    pub title: String,
    pub description: String,
    pub demo_link: Option<String>,
    pub source_code_link: Option<String>,
    pub poster: Option<Json<PosterImage>>,
    pub categories: Vec<String>,
    pub tags: Vec<String>,
    pub curation_status: ProjectStatus,
    pub final_decision: Option<DecisionCategory>,
    pub decision_note: Option<String>,
    pub published: bool,
    /// Optimistic-concurrency token, bumped by the store on every write
    pub version: i64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Project {
    /// Create a new pending project with validation
    pub fn new(owner_id: Uuid, submission: ProjectSubmission) -> Result<Self> {
        validation::validate_title(&submission.title)?;
        if submission.description.trim().is_empty() {
            return Err(Error::Validation("Description must not be empty".to_string()));
        }

        let demo_link = non_blank(submission.demo_link);
        if let Some(link) = &demo_link {
            validation::validate_demo_link(link)?;
        }
        let source_code_link = non_blank(submission.source_code_link);
        if let Some(link) = &source_code_link {
            validation::validate_source_code_link(link)?;
        }
        if let Some(poster) = &submission.poster {
            validation::validate_poster(&poster.content_type, poster.size_bytes)?;
        }

        let categories = validation::normalize_categories(&submission.categories)?;
        let tags = validation::parse_tags(&submission.tags)?;

        let now = Utc::now();
        Ok(Project {
            id: Uuid::new_v4(),
            owner_id,
            title: submission.title.trim().to_string(),
            description: submission.description,
            demo_link,
            source_code_link,
            poster: submission.poster.map(Json),
            categories,
            tags,
            curation_status: ProjectStatus::Pending,
            final_decision: None,
            decision_note: None,
            published: false,
            version: 0,
            created_at: now,
            updated_at: now,
        })
    }

    /// `published` implies status `published`
    pub fn validate(&self) -> Result<()> {
        if self.published != (self.curation_status == ProjectStatus::Published) {
            return Err(Error::Internal(format!(
                "Project {} has published={} with status {}",
                self.id, self.published, self.curation_status
            )));
        }
        Ok(())
    }

    pub fn is_owned_by(&self, user_id: Uuid) -> bool {
        self.owner_id == user_id
    }

    pub fn select(&mut self) -> Result<()> {
        self.apply_transition(ProjectEvent::Select, None)
    }

    pub fn assign_curators(&mut self) -> Result<()> {
        self.apply_transition(ProjectEvent::AssignCurators, None)
    }

    /// Called when the curation record reaches `complete`
    pub fn complete_assessment(&mut self) -> Result<()> {
        self.apply_transition(ProjectEvent::CompleteAssessment, None)
    }

    /// Commit the business unit's decision; publication stays a separate step
    pub fn decide(&mut self, category: DecisionCategory, note: Option<String>) -> Result<()> {
        self.apply_transition(ProjectEvent::Decide(category), None)?;
        self.final_decision = Some(category);
        self.decision_note = note;
        self.published = false;
        Ok(())
    }

    pub fn publish(&mut self, policy: &PublicationPolicy) -> Result<()> {
        let context = ProjectGuardContext {
            publish_minor_revisions: policy.publish_minor_revisions,
            already_published: self.published,
        };
        self.apply_transition(ProjectEvent::Publish, Some(&context))?;
        self.published = true;
        Ok(())
    }

    fn apply_transition(
        &mut self,
        event: ProjectEvent,
        context: Option<&ProjectGuardContext>,
    ) -> Result<()> {
        let next = ProjectStateMachine::transition(self.curation_status, event, context)?;
        self.curation_status = next;
        self.updated_at = Utc::now();
        Ok(())
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

// ============================================================================
// Curation record
// ============================================================================

/// One of the two independent reviewer roles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "curator_track", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum CuratorTrack {
    Academic,
    Partner,
}

impl CuratorTrack {
    pub const ALL: [CuratorTrack; 2] = [CuratorTrack::Academic, CuratorTrack::Partner];

    /// Capability a user needs to score on this track
    pub fn capability(&self) -> Capability {
        match self {
            Self::Academic => Capability::CurateAcademic,
            Self::Partner => Capability::CuratePartner,
        }
    }

    fn submitted_event(&self) -> CurationEvent {
        match self {
            Self::Academic => CurationEvent::AcademicSubmitted,
            Self::Partner => CurationEvent::PartnerSubmitted,
        }
    }
}

impl std::fmt::Display for CuratorTrack {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Academic => write!(f, "academic"),
            Self::Partner => write!(f, "partner"),
        }
    }
}

/// Two-track review of one project
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct CurationRecord {
    pub id: Uuid,
    pub project_id: Uuid,
    pub academic_curator_id: Option<Uuid>,
    pub partner_curator_id: Option<Uuid>,
    pub assigned_at: Option<DateTime<Utc>>,
    pub academic_completed_at: Option<DateTime<Utc>>,
    pub partner_completed_at: Option<DateTime<Utc>>,
    pub academic_score: Option<Decimal>,
    pub partner_score: Option<Decimal>,
    pub final_score: Option<Decimal>,
    pub academic_note: Option<String>,
    pub partner_note: Option<String>,
    pub status: CurationStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl CurationRecord {
    pub fn new(project_id: Uuid) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            project_id,
            academic_curator_id: None,
            partner_curator_id: None,
            assigned_at: None,
            academic_completed_at: None,
            partner_completed_at: None,
            academic_score: None,
            partner_score: None,
            final_score: None,
            academic_note: None,
            partner_note: None,
            status: CurationStatus::AwaitingAssignment,
            created_at: now,
            updated_at: now,
        }
    }

    /// Set both curators and reset every per-track field
    pub fn assign(&mut self, academic_curator_id: Uuid, partner_curator_id: Uuid) -> Result<()> {
        let next = CurationStateMachine::transition(self.status, CurationEvent::Assign, None)?;

        let now = Utc::now();
        self.academic_curator_id = Some(academic_curator_id);
        self.partner_curator_id = Some(partner_curator_id);
        self.assigned_at = Some(now);
        self.academic_completed_at = None;
        self.partner_completed_at = None;
        self.academic_score = None;
        self.partner_score = None;
        self.final_score = None;
        self.academic_note = None;
        self.partner_note = None;
        self.status = next;
        self.updated_at = now;
        Ok(())
    }

    pub fn curator_for(&self, track: CuratorTrack) -> Option<Uuid> {
        match track {
            CuratorTrack::Academic => self.academic_curator_id,
            CuratorTrack::Partner => self.partner_curator_id,
        }
    }

    pub fn is_curator(&self, user_id: Uuid) -> bool {
        self.academic_curator_id == Some(user_id) || self.partner_curator_id == Some(user_id)
    }

    pub fn score_for(&self, track: CuratorTrack) -> Option<Decimal> {
        match track {
            CuratorTrack::Academic => self.academic_score,
            CuratorTrack::Partner => self.partner_score,
        }
    }

    pub fn completed_at(&self, track: CuratorTrack) -> Option<DateTime<Utc>> {
        match track {
            CuratorTrack::Academic => self.academic_completed_at,
            CuratorTrack::Partner => self.partner_completed_at,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.status == CurationStatus::Complete
    }

    /// Record a track's finished score. Once both tracks are in, the combined
    /// score is set and the record becomes `complete`.
    pub fn complete_track(
        &mut self,
        track: CuratorTrack,
        score: Decimal,
        note: Option<String>,
    ) -> Result<CurationStatus> {
        if self.completed_at(track).is_some() {
            return Err(Error::InvalidState(format!(
                "The {} track has already submitted its scores",
                track
            )));
        }

        let context = CurationGuardContext {
            academic_scored: track == CuratorTrack::Academic || self.academic_score.is_some(),
            partner_scored: track == CuratorTrack::Partner || self.partner_score.is_some(),
        };
        let next =
            CurationStateMachine::transition(self.status, track.submitted_event(), Some(&context))?;

        let now = Utc::now();
        match track {
            CuratorTrack::Academic => {
                self.academic_score = Some(score);
                self.academic_note = note;
                self.academic_completed_at = Some(now);
            }
            CuratorTrack::Partner => {
                self.partner_score = Some(score);
                self.partner_note = note;
                self.partner_completed_at = Some(now);
            }
        }

        if next == CurationStatus::Complete {
            if let (Some(academic), Some(partner)) = (self.academic_score, self.partner_score) {
                self.final_score = Some(ScoringEngine::combine(academic, partner));
            }
        }

        self.status = next;
        self.updated_at = now;
        Ok(next)
    }

    /// Advisory outcome; only available once the record is complete
    pub fn suggestion(&self) -> Option<DecisionSuggestion> {
        match (self.status, self.final_score) {
            (CurationStatus::Complete, Some(score)) => Some(DecisionPolicy::suggest(score)),
            _ => None,
        }
    }
}

/// A single rubric-aspect score from one curator track
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RubricEntry {
    pub id: Uuid,
    pub curation_id: Uuid,
    pub aspect: RubricAspect,
    pub track: CuratorTrack,
    pub score: Option<i32>,
}

impl RubricEntry {
    pub fn unscored(curation_id: Uuid, aspect: RubricAspect, track: CuratorTrack) -> Self {
        Self {
            id: Uuid::new_v4(),
            curation_id,
            aspect,
            track,
            score: None,
        }
    }

    /// One null-scored entry per aspect per track
    pub fn initial_set(curation_id: Uuid, rubric: &RubricDefinition) -> Vec<RubricEntry> {
        CuratorTrack::ALL
            .iter()
            .flat_map(|track| {
                rubric
                    .aspects()
                    .map(move |aspect| RubricEntry::unscored(curation_id, aspect, *track))
            })
            .collect()
    }
}

impl std::fmt::Display for RubricEntry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} ({}): {}",
            self.aspect.label(),
            self.track,
            score_label(self.score)
        )
    }
}

// ============================================================================
// Access request
// ============================================================================

/// Request by a non-owner for a project's restricted source material
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct AccessRequest {
    pub id: Uuid,
    pub project_id: Uuid,
    pub requester_id: Uuid,
    pub reviewer_id: Option<Uuid>,
    pub status: AccessRequestStatus,
    pub reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub reviewed_at: Option<DateTime<Utc>>,
}

impl AccessRequest {
    pub fn new(project_id: Uuid, requester_id: Uuid, reason: Option<String>) -> Result<Self> {
        if let Some(reason) = &reason {
            validation::validate_reason(reason)?;
        }

        Ok(Self {
            id: Uuid::new_v4(),
            project_id,
            requester_id,
            reviewer_id: None,
            status: AccessRequestStatus::Pending,
            reason,
            created_at: Utc::now(),
            reviewed_at: None,
        })
    }

    pub fn review(&mut self, reviewer_id: Uuid, approve: bool) -> Result<()> {
        let event = if approve {
            AccessRequestEvent::Approve
        } else {
            AccessRequestEvent::Reject
        };
        self.status = AccessRequestStateMachine::transition(self.status, event)?;
        self.reviewer_id = Some(reviewer_id);
        self.reviewed_at = Some(Utc::now());
        Ok(())
    }
}

// ============================================================================
// Read models
// ============================================================================

/// Curation record with its rubric and advisory suggestion
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurationDetails {
    pub curation: CurationRecord,
    pub rubric: Vec<RubricEntry>,
    pub suggestion: Option<DecisionSuggestion>,
}

/// Per-track progress for the monitoring dashboard
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurationProgress {
    pub curation: CurationRecord,
    pub project_title: String,
    pub academic_scored: usize,
    pub partner_scored: usize,
    pub aspects_per_track: usize,
}

impl CurationProgress {
    pub fn from_parts(
        curation: CurationRecord,
        project_title: String,
        rubric: &[RubricEntry],
    ) -> Self {
        let scored = |track: CuratorTrack| {
            rubric
                .iter()
                .filter(|e| e.track == track && e.score.is_some())
                .count()
        };
        Self {
            academic_scored: scored(CuratorTrack::Academic),
            partner_scored: scored(CuratorTrack::Partner),
            aspects_per_track: RubricDefinition::standard().len(),
            curation,
            project_title,
        }
    }
}

/// Complete record awaiting the business unit's decision
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReviewQueueItem {
    pub project: Project,
    pub curation: CurationRecord,
    pub suggestion: DecisionSuggestion,
}
