//! Curation workflow service
//!
//! Every operation checks the actor's capability through `AuthContext::requires`,
//! then runs as a read-modify-write cycle against the store. Mutations are
//! applied to a freshly loaded aggregate and committed with a version check;
//! on a concurrent write the cycle is re-run against the new state, up to
//! `CurationSettings::max_write_attempts` times.

use std::sync::Arc;

use uuid::Uuid;

use gagasan_auth::{AuthContext, Capability, IdentityProvider, UserRole};
use gagasan_common::{CurationSettings, Error, RepositoryError, Result};

use crate::domain::aggregate::CurationAggregate;
use crate::domain::decision::{DecisionCategory, PublicationPolicy};
use crate::domain::entities::{
    AccessRequest, CurationDetails, CurationProgress, CurationRecord, CuratorTrack, Project,
    ProjectSubmission, ReviewQueueItem,
};
use crate::domain::rubric::RubricDefinition;
use crate::domain::scoring::ScoreSheet;
use crate::domain::state::CurationStatus;
use crate::notify::{CurationNotification, CurationNotifier};
use crate::repository::{CatalogQuery, CurationFilter, CurationStore, ProjectFilter};

/// How an operation addresses its aggregate
#[derive(Debug, Clone, Copy)]
enum AggregateKey {
    Project(Uuid),
    Curation(Uuid),
}

impl std::fmt::Display for AggregateKey {
    #[mutants::skip] // Log and error text only
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Project(id) => write!(f, "Project {}", id),
            Self::Curation(id) => write!(f, "Curation {}", id),
        }
    }
}

#[derive(Clone)]
pub struct CurationService {
    store: Arc<dyn CurationStore>,
    identities: Arc<dyn IdentityProvider>,
    notifier: Arc<dyn CurationNotifier>,
    settings: CurationSettings,
    rubric: &'static RubricDefinition,
}

impl CurationService {
    pub fn new(
        store: Arc<dyn CurationStore>,
        identities: Arc<dyn IdentityProvider>,
        notifier: Arc<dyn CurationNotifier>,
        settings: CurationSettings,
    ) -> Self {
        Self {
            store,
            identities,
            notifier,
            settings,
            rubric: RubricDefinition::standard(),
        }
    }

    pub fn settings(&self) -> &CurationSettings {
        &self.settings
    }

    pub fn rubric(&self) -> &'static RubricDefinition {
        self.rubric
    }

    // ------------------------------------------------------------------------
    // Core operations
    // ------------------------------------------------------------------------

    /// Submit a new project; it starts `pending`
    pub async fn submit_project(
        &self,
        actor: &AuthContext,
        submission: ProjectSubmission,
    ) -> Result<Project> {
        actor.requires(Capability::SubmitProject)?;

        let project = Project::new(actor.user_id(), submission)?;
        self.store.insert_project(&project).await?;

        tracing::info!(
            project_id = %project.id,
            owner_id = %project.owner_id,
            "Project submitted"
        );
        Ok(project)
    }

    pub async fn select_for_curation(
        &self,
        project_id: Uuid,
        actor: &AuthContext,
    ) -> Result<Project> {
        actor.requires(Capability::ManageCuration)?;

        let (aggregate, ()) = self
            .mutate(AggregateKey::Project(project_id), |a| a.select())
            .await?;

        tracing::info!(
            project_id = %project_id,
            status = %aggregate.project.curation_status,
            "Project selected for curation"
        );
        self.emit(CurationNotification::ProjectSelected {
            project_id,
            owner_id: aggregate.project.owner_id,
        })
        .await;

        Ok(aggregate.project)
    }

    /// Assign (or reassign) the academic and partner curators
    pub async fn assign_curators(
        &self,
        project_id: Uuid,
        actor: &AuthContext,
        academic_curator_id: Uuid,
        partner_curator_id: Uuid,
    ) -> Result<CurationRecord> {
        actor.requires(Capability::ManageCuration)?;

        self.ensure_curator(academic_curator_id, CuratorTrack::Academic)
            .await?;
        self.ensure_curator(partner_curator_id, CuratorTrack::Partner)
            .await?;

        let rubric = self.rubric;
        let (aggregate, ()) = self
            .mutate(AggregateKey::Project(project_id), |a| {
                a.assign_curators(academic_curator_id, partner_curator_id, rubric)
                    .map(|_| ())
            })
            .await?;

        let record = aggregate.curation()?.clone();
        tracing::info!(
            project_id = %project_id,
            curation_id = %record.id,
            academic_curator_id = %academic_curator_id,
            partner_curator_id = %partner_curator_id,
            rubric_entries = aggregate.rubric.len(),
            "Curators assigned"
        );
        self.emit(CurationNotification::CuratorsAssigned {
            project_id,
            curation_id: record.id,
            academic_curator_id,
            partner_curator_id,
        })
        .await;

        Ok(record)
    }

    /// Record one curator's full score sheet for their track
    pub async fn submit_score(
        &self,
        curation_id: Uuid,
        actor: &AuthContext,
        track: CuratorTrack,
        scores: ScoreSheet,
        note: Option<String>,
    ) -> Result<CurationRecord> {
        actor.requires(track.capability())?;

        let rubric = self.rubric;
        let actor_id = actor.user_id();
        let (aggregate, outcome) = self
            .mutate(AggregateKey::Curation(curation_id), |a| {
                a.submit_score(actor_id, track, &scores, note.clone(), rubric)
            })
            .await?;

        let record = aggregate.curation()?.clone();
        let project_id = aggregate.project.id;
        tracing::info!(
            project_id = %project_id,
            curation_id = %curation_id,
            track = %track,
            score = %outcome.track_score,
            status = %outcome.status,
            "Track scored"
        );
        self.emit(CurationNotification::TrackScored {
            project_id,
            curation_id,
            track,
            score: outcome.track_score,
        })
        .await;

        if outcome.status == CurationStatus::Complete {
            if let Some(suggestion) = record.suggestion() {
                tracing::info!(
                    project_id = %project_id,
                    curation_id = %curation_id,
                    final_score = %suggestion.combined_score,
                    suggested = %suggestion.category,
                    "Assessment complete"
                );
                self.emit(CurationNotification::AssessmentComplete {
                    project_id,
                    curation_id,
                    final_score: suggestion.combined_score,
                    suggested: suggestion.category,
                })
                .await;
            }
        }

        Ok(record)
    }

    /// Commit the business unit's decision for a complete curation
    pub async fn decide(
        &self,
        curation_id: Uuid,
        actor: &AuthContext,
        decision: DecisionCategory,
        note: Option<String>,
    ) -> Result<Project> {
        actor.requires(Capability::ManageCuration)?;

        let (aggregate, ()) = self
            .mutate(AggregateKey::Curation(curation_id), |a| {
                a.decide(decision, note.clone())
            })
            .await?;

        let suggested = aggregate.suggestion().map(|s| s.category);
        if suggested.is_some_and(|s| s != decision) {
            tracing::info!(
                curation_id = %curation_id,
                decision = %decision,
                suggested = ?suggested,
                "Decision overrides suggested category"
            );
        }
        tracing::info!(
            project_id = %aggregate.project.id,
            curation_id = %curation_id,
            status = %aggregate.project.curation_status,
            "Decision issued"
        );
        self.emit(CurationNotification::DecisionIssued {
            project_id: aggregate.project.id,
            owner_id: aggregate.project.owner_id,
            decision,
        })
        .await;

        Ok(aggregate.project)
    }

    pub async fn publish(&self, project_id: Uuid, actor: &AuthContext) -> Result<Project> {
        actor.requires(Capability::ManageCuration)?;

        let policy = PublicationPolicy::from(&self.settings);
        let (aggregate, ()) = self
            .mutate(AggregateKey::Project(project_id), |a| a.publish(&policy))
            .await?;

        tracing::info!(project_id = %project_id, "Project published");
        self.emit(CurationNotification::ProjectPublished {
            project_id,
            owner_id: aggregate.project.owner_id,
        })
        .await;

        Ok(aggregate.project)
    }

    /// Owner deletes while pending; business unit at any status
    pub async fn delete_project(&self, project_id: Uuid, actor: &AuthContext) -> Result<()> {
        actor.requires(Capability::DeleteProject)?;

        let max_attempts = self.settings.max_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            let aggregate = self.load(AggregateKey::Project(project_id)).await?;
            aggregate.authorize_delete(actor)?;

            match self
                .store
                .delete_project(project_id, aggregate.version())
                .await
            {
                Ok(()) => {
                    tracing::info!(
                        project_id = %project_id,
                        actor_id = %actor.user_id(),
                        status = %aggregate.project.curation_status,
                        "Project deleted"
                    );
                    return Ok(());
                }
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(project_id = %project_id, attempt, error = %e, "Retrying delete after concurrent write");
                    attempt += 1;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }

    // ------------------------------------------------------------------------
    // Access requests
    // ------------------------------------------------------------------------

    /// Ask a published project's owner for its source material
    pub async fn request_access(
        &self,
        project_id: Uuid,
        actor: &AuthContext,
        reason: Option<String>,
    ) -> Result<AccessRequest> {
        actor.requires(Capability::RequestAccess)?;

        let aggregate = self.load(AggregateKey::Project(project_id)).await?;
        if aggregate.project.is_owned_by(actor.user_id()) {
            return Err(Error::Validation(
                "Owners cannot request access to their own project".to_string(),
            ));
        }
        if !aggregate.project.published {
            return Err(Error::InvalidState(format!(
                "Project {} is not published",
                project_id
            )));
        }

        let request = AccessRequest::new(project_id, actor.user_id(), reason)?;
        self.store
            .insert_access_request(&request)
            .await
            .map_err(|e| match e {
                RepositoryError::AlreadyExists => Error::Conflict(
                    "A pending access request for this project already exists".to_string(),
                ),
                other => other.into(),
            })?;

        tracing::info!(
            request_id = %request.id,
            project_id = %project_id,
            requester_id = %request.requester_id,
            "Access requested"
        );
        Ok(request)
    }

    /// Approve or reject a pending access request
    pub async fn review_access(
        &self,
        request_id: Uuid,
        actor: &AuthContext,
        approve: bool,
    ) -> Result<AccessRequest> {
        let mut request = self
            .store
            .find_access_request(request_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("Access request {} not found", request_id)))?;

        let aggregate = self.load(AggregateKey::Project(request.project_id)).await?;
        self.ensure_owner_or_business_unit(&aggregate, actor)?;

        request.review(actor.user_id(), approve)?;
        if !self.store.complete_access_review(&request).await? {
            return Err(Error::InvalidState(format!(
                "Access request {} has already been reviewed",
                request_id
            )));
        }

        tracing::info!(
            request_id = %request_id,
            project_id = %request.project_id,
            status = %request.status,
            "Access request reviewed"
        );
        self.emit(CurationNotification::AccessReviewed {
            request_id,
            project_id: request.project_id,
            requester_id: request.requester_id,
            status: request.status,
        })
        .await;

        Ok(request)
    }

    pub async fn access_requests(
        &self,
        project_id: Uuid,
        actor: &AuthContext,
    ) -> Result<Vec<AccessRequest>> {
        let aggregate = self.load(AggregateKey::Project(project_id)).await?;
        self.ensure_owner_or_business_unit(&aggregate, actor)?;
        Ok(self.store.list_access_requests(project_id).await?)
    }

    // ------------------------------------------------------------------------
    // Read operations
    // ------------------------------------------------------------------------

    /// Published projects matching the query
    pub async fn catalog(&self, query: &CatalogQuery) -> Result<Vec<Project>> {
        Ok(self.store.list_published(query).await?)
    }

    pub async fn project_details(&self, project_id: Uuid, actor: &AuthContext) -> Result<Project> {
        let aggregate = self.load(AggregateKey::Project(project_id)).await?;
        if !aggregate.is_visible_to(actor) {
            return Err(Error::Unauthorized(format!(
                "Project {} is not visible to this user",
                project_id
            )));
        }
        Ok(aggregate.project)
    }

    /// Record, rubric and advisory suggestion for a business unit or an assigned curator
    pub async fn curation_details(
        &self,
        curation_id: Uuid,
        actor: &AuthContext,
    ) -> Result<CurationDetails> {
        let aggregate = self.load(AggregateKey::Curation(curation_id)).await?;
        let curation = aggregate.curation()?.clone();
        if !actor.is_business_unit() && !curation.is_curator(actor.user_id()) {
            return Err(Error::Unauthorized(
                "Only the business unit and assigned curators may view a curation".to_string(),
            ));
        }
        Ok(CurationDetails {
            suggestion: curation.suggestion(),
            curation,
            rubric: aggregate.rubric,
        })
    }

    /// Curation records the actor curates
    pub async fn my_assignments(&self, actor: &AuthContext) -> Result<Vec<CurationDetails>> {
        let aggregates = self
            .store
            .list_curations(CurationFilter::Curator(actor.user_id()))
            .await?;
        Ok(aggregates.into_iter().filter_map(details).collect())
    }

    /// The actor's own submissions with their curation status
    pub async fn my_projects(&self, actor: &AuthContext) -> Result<Vec<Project>> {
        Ok(self
            .store
            .list_projects(ProjectFilter::Owner(actor.user_id()))
            .await?)
    }

    /// Decided projects the current policy lets the business unit publish
    pub async fn publication_queue(&self, actor: &AuthContext) -> Result<Vec<Project>> {
        actor.requires(Capability::ManageCuration)?;

        let filter = ProjectFilter::AwaitingPublication {
            include_minor_revisions: self.settings.publish_minor_revisions,
        };
        Ok(self.store.list_projects(filter).await?)
    }

    /// Complete curations awaiting a decision
    pub async fn review_queue(&self, actor: &AuthContext) -> Result<Vec<ReviewQueueItem>> {
        actor.requires(Capability::ManageCuration)?;

        let aggregates = self
            .store
            .list_curations(CurationFilter::AwaitingDecision)
            .await?;
        Ok(aggregates
            .into_iter()
            .filter_map(|a| {
                let suggestion = a.suggestion()?;
                let curation = a.curation?;
                Some(ReviewQueueItem {
                    project: a.project,
                    curation,
                    suggestion,
                })
            })
            .collect())
    }

    /// Per-track progress of every curation
    pub async fn monitoring(&self, actor: &AuthContext) -> Result<Vec<CurationProgress>> {
        actor.requires(Capability::ManageCuration)?;

        let aggregates = self.store.list_curations(CurationFilter::All).await?;
        Ok(aggregates
            .into_iter()
            .filter_map(|a| {
                let curation = a.curation?;
                Some(CurationProgress::from_parts(
                    curation,
                    a.project.title,
                    &a.rubric,
                ))
            })
            .collect())
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    async fn load(&self, key: AggregateKey) -> Result<CurationAggregate> {
        let aggregate = match key {
            AggregateKey::Project(id) => self.store.load(id).await?,
            AggregateKey::Curation(id) => self.store.load_by_curation(id).await?,
        };
        aggregate.ok_or_else(|| Error::NotFound(format!("{} not found", key)))
    }

    /// Load, apply `op` to a copy, commit with a version check; retry on conflict
    async fn mutate<T, F>(&self, key: AggregateKey, mut op: F) -> Result<(CurationAggregate, T)>
    where
        F: FnMut(&mut CurationAggregate) -> Result<T> + Send,
        T: Send,
    {
        let max_attempts = self.settings.max_write_attempts.max(1);
        let mut attempt = 1;
        loop {
            let mut aggregate = self.load(key).await?;

            let value = op(&mut aggregate).inspect_err(|e| {
                tracing::debug!(aggregate = %key, error = %e, "Operation rejected");
            })?;

            match self.store.save(&aggregate).await {
                Ok(committed) => return Ok((committed, value)),
                Err(e) if e.is_retryable() && attempt < max_attempts => {
                    tracing::warn!(
                        aggregate = %key,
                        attempt,
                        error = %e,
                        "Concurrent write detected, re-applying operation"
                    );
                    attempt += 1;
                }
                Err(e) => {
                    if e.is_retryable() {
                        tracing::warn!(aggregate = %key, attempts = attempt, "Write attempts exhausted");
                    }
                    return Err(e.into());
                }
            }
        }
    }

    /// Curators must exist, be enabled, and hold the track's role
    async fn ensure_curator(&self, user_id: Uuid, track: CuratorTrack) -> Result<()> {
        let identity = self
            .identities
            .find_identity(user_id)
            .await?
            .ok_or_else(|| Error::NotFound(format!("User {} not found", user_id)))?;

        let expected = match track {
            CuratorTrack::Academic => UserRole::Lecturer,
            CuratorTrack::Partner => UserRole::Partner,
        };
        if identity.role != expected {
            return Err(Error::Validation(format!(
                "User {} is a {}, the {} curator must be a {}",
                user_id, identity.role, track, expected
            )));
        }
        if !identity.is_enabled() {
            return Err(Error::Validation(format!(
                "User {} is not an approved, active account",
                user_id
            )));
        }
        Ok(())
    }

    fn ensure_owner_or_business_unit(
        &self,
        aggregate: &CurationAggregate,
        actor: &AuthContext,
    ) -> Result<()> {
        if actor.is_business_unit() || aggregate.project.is_owned_by(actor.user_id()) {
            Ok(())
        } else {
            Err(Error::Unauthorized(
                "Only the owner or the business unit may manage access requests".to_string(),
            ))
        }
    }

    /// Best-effort notification; failures are logged
    async fn emit(&self, notification: CurationNotification) {
        let name = notification.name();
        if let Err(e) = self.notifier.notify(notification).await {
            tracing::error!(error = %e, event = name, "Failed to send curation notification");
        }
    }
}

fn details(aggregate: CurationAggregate) -> Option<CurationDetails> {
    let suggestion = aggregate.suggestion();
    Some(CurationDetails {
        curation: aggregate.curation?,
        rubric: aggregate.rubric,
        suggestion,
    })
}
