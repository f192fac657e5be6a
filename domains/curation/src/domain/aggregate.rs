//! The unit of atomic read-modify-write: one project with its curation record
//! and rubric entries
//!
//! Operations mutate the aggregate in place and leave it untouched on error,
//! so the service can run them against a fresh copy and commit only on success.

use rust_decimal::Decimal;
use serde::Serialize;
use uuid::Uuid;

use gagasan_auth::AuthContext;
use gagasan_common::{Error, Result};

use super::decision::{DecisionCategory, DecisionSuggestion, PublicationPolicy};
use super::entities::{CurationRecord, CuratorTrack, Project, RubricEntry};
use super::rubric::RubricDefinition;
use super::scoring::{ScoreSheet, ScoringEngine};
use super::state::{CurationStatus, ProjectStatus};

/// Project + curation record + rubric entries, versioned as one
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurationAggregate {
    pub project: Project,
    pub curation: Option<CurationRecord>,
    pub rubric: Vec<RubricEntry>,
}

/// What a successful score submission changed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TrackOutcome {
    pub track: CuratorTrack,
    pub track_score: Decimal,
    pub status: CurationStatus,
}

impl CurationAggregate {
    pub fn new(project: Project) -> Self {
        Self {
            project,
            curation: None,
            rubric: Vec::new(),
        }
    }

    /// Version the aggregate was read at
    pub fn version(&self) -> i64 {
        self.project.version
    }

    pub fn curation(&self) -> Result<&CurationRecord> {
        self.curation.as_ref().ok_or_else(|| {
            Error::InvalidState(format!(
                "Project {} has no curators assigned",
                self.project.id
            ))
        })
    }

    pub fn suggestion(&self) -> Option<DecisionSuggestion> {
        self.curation.as_ref().and_then(CurationRecord::suggestion)
    }

    /// `pending → selected`
    pub fn select(&mut self) -> Result<()> {
        self.project.select()
    }

    /// Assign or reassign both curators.
    ///
    /// The record keeps its id across reassignment; every prior score, note
    /// and completion timestamp is cleared and the rubric is regenerated
    /// null-scored for both tracks.
    pub fn assign_curators(
        &mut self,
        academic_curator_id: Uuid,
        partner_curator_id: Uuid,
        rubric: &RubricDefinition,
    ) -> Result<&CurationRecord> {
        if academic_curator_id == partner_curator_id {
            return Err(Error::Validation(
                "Academic and partner curators must be different users".to_string(),
            ));
        }

        let mut project = self.project.clone();
        project.assign_curators()?;

        let mut record = self
            .curation
            .clone()
            .unwrap_or_else(|| CurationRecord::new(project.id));
        record.assign(academic_curator_id, partner_curator_id)?;

        self.rubric = RubricEntry::initial_set(record.id, rubric);
        self.project = project;
        Ok(&*self.curation.insert(record))
    }

    /// Apply one curator's full score sheet to their track
    pub fn submit_score(
        &mut self,
        actor_id: Uuid,
        track: CuratorTrack,
        scores: &ScoreSheet,
        note: Option<String>,
        rubric: &RubricDefinition,
    ) -> Result<TrackOutcome> {
        let mut record = self.curation()?.clone();

        if record.curator_for(track) != Some(actor_id) {
            return Err(Error::Unauthorized(format!(
                "Only the assigned {} curator may score this track",
                track
            )));
        }
        if record.completed_at(track).is_some() {
            return Err(Error::InvalidState(format!(
                "The {} track has already submitted its scores",
                track
            )));
        }

        let track_score = ScoringEngine::compute(rubric, scores)?;
        let status = record.complete_track(track, track_score, note)?;

        let mut project = self.project.clone();
        if status == CurationStatus::Complete {
            project.complete_assessment()?;
        }

        let mut entries = self.rubric.clone();
        fill_track_scores(&mut entries, record.id, track, scores, rubric);

        self.curation = Some(record);
        self.rubric = entries;
        self.project = project;

        Ok(TrackOutcome {
            track,
            track_score,
            status,
        })
    }

    /// Commit the business unit's decision
    pub fn decide(&mut self, category: DecisionCategory, note: Option<String>) -> Result<()> {
        let record = self.curation()?;
        if !record.is_complete() || record.final_score.is_none() {
            return Err(Error::InvalidState(format!(
                "Curation {} is {}, a decision needs a complete record",
                record.id, record.status
            )));
        }
        if self.project.curation_status != ProjectStatus::AssessmentComplete {
            return Err(Error::InvalidState(format!(
                "Project {} is {}, expected assessment-complete",
                self.project.id, self.project.curation_status
            )));
        }

        self.project.decide(category, note)
    }

    pub fn publish(&mut self, policy: &PublicationPolicy) -> Result<()> {
        self.project.publish(policy)
    }

    /// Owner may delete while pending; business unit at any status
    pub fn authorize_delete(&self, actor: &AuthContext) -> Result<()> {
        if actor.is_business_unit() {
            return Ok(());
        }
        if !self.project.is_owned_by(actor.user_id()) {
            return Err(Error::Unauthorized(
                "Only the owner or the business unit may delete a project".to_string(),
            ));
        }
        if self.project.curation_status != ProjectStatus::Pending {
            return Err(Error::InvalidState(format!(
                "Project is {}, owners may only delete pending projects",
                self.project.curation_status
            )));
        }
        Ok(())
    }

    /// Owner, business unit and assigned curators see any project; everyone
    /// sees published ones
    pub fn is_visible_to(&self, actor: &AuthContext) -> bool {
        self.project.published
            || actor.is_business_unit()
            || self.project.is_owned_by(actor.user_id())
            || self
                .curation
                .as_ref()
                .is_some_and(|c| c.is_curator(actor.user_id()))
    }
}

fn fill_track_scores(
    entries: &mut Vec<RubricEntry>,
    curation_id: Uuid,
    track: CuratorTrack,
    scores: &ScoreSheet,
    rubric: &RubricDefinition,
) {
    for entry in entries.iter_mut().filter(|e| e.track == track) {
        entry.score = scores.get(&entry.aspect).copied();
    }

    // Entries absent for this track are created
    let missing: Vec<_> = rubric
        .aspects()
        .filter(|aspect| !entries.iter().any(|e| e.track == track && e.aspect == *aspect))
        .collect();
    for aspect in missing {
        let mut entry = RubricEntry::unscored(curation_id, aspect, track);
        entry.score = scores.get(&aspect).copied();
        entries.push(entry);
    }
}
