//! In-memory store for tests and local development
//!
//! One `tokio::sync::Mutex` guards all state, so each call is trivially
//! atomic; the version check still runs so concurrent read-modify-write
//! cycles in the service conflict exactly as they do against PostgreSQL.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use gagasan_common::RepositoryError;
use tokio::sync::Mutex;
use uuid::Uuid;

use super::{CatalogQuery, CurationFilter, CurationStore, ProjectFilter};
use crate::domain::aggregate::CurationAggregate;
use crate::domain::entities::{AccessRequest, Project};
use crate::domain::state::{AccessRequestStatus, CurationStatus, ProjectStatus};

#[derive(Debug, Default)]
struct MemoryState {
    aggregates: HashMap<Uuid, CurationAggregate>,
    access_requests: HashMap<Uuid, AccessRequest>,
}

#[derive(Debug, Clone, Default)]
pub struct InMemoryCurationStore {
    state: Arc<Mutex<MemoryState>>,
}

impl InMemoryCurationStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn matches_filter(aggregate: &CurationAggregate, filter: CurationFilter) -> bool {
    let Some(curation) = &aggregate.curation else {
        return false;
    };
    match filter {
        CurationFilter::All => true,
        CurationFilter::Curator(user_id) => curation.is_curator(user_id),
        CurationFilter::AwaitingDecision => {
            curation.status == CurationStatus::Complete
                && aggregate.project.curation_status == ProjectStatus::AssessmentComplete
        }
    }
}

#[async_trait]
impl CurationStore for InMemoryCurationStore {
    async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        if state.aggregates.contains_key(&project.id) {
            return Err(RepositoryError::AlreadyExists);
        }
        state
            .aggregates
            .insert(project.id, CurationAggregate::new(project.clone()));
        Ok(())
    }

    async fn load(&self, project_id: Uuid) -> Result<Option<CurationAggregate>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.aggregates.get(&project_id).cloned())
    }

    async fn load_by_curation(
        &self,
        curation_id: Uuid,
    ) -> Result<Option<CurationAggregate>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state
            .aggregates
            .values()
            .find(|a| a.curation.as_ref().is_some_and(|c| c.id == curation_id))
            .cloned())
    }

    async fn save(
        &self,
        aggregate: &CurationAggregate,
    ) -> Result<CurationAggregate, RepositoryError> {
        let mut state = self.state.lock().await;
        let stored = state
            .aggregates
            .get_mut(&aggregate.project.id)
            .ok_or(RepositoryError::NotFound)?;

        if stored.version() != aggregate.version() {
            return Err(RepositoryError::VersionConflict {
                expected: aggregate.version(),
                found: stored.version(),
            });
        }

        let mut committed = aggregate.clone();
        committed.project.version += 1;
        committed.project.updated_at = Utc::now();
        *stored = committed.clone();
        Ok(committed)
    }

    async fn delete_project(
        &self,
        project_id: Uuid,
        expected_version: i64,
    ) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let found = state
            .aggregates
            .get(&project_id)
            .map(CurationAggregate::version)
            .ok_or(RepositoryError::NotFound)?;

        if found != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found,
            });
        }

        state.aggregates.remove(&project_id);
        state
            .access_requests
            .retain(|_, request| request.project_id != project_id);
        Ok(())
    }

    async fn list_published(&self, query: &CatalogQuery) -> Result<Vec<Project>, RepositoryError> {
        let state = self.state.lock().await;
        let mut projects: Vec<Project> = state
            .aggregates
            .values()
            .filter(|a| query.matches(&a.project))
            .map(|a| a.project.clone())
            .collect();
        projects.sort_by(|a, b| b.created_at.cmp(&a.created_at));

        Ok(projects
            .into_iter()
            .skip(query.pagination.offset() as usize)
            .take(query.pagination.limit() as usize)
            .collect())
    }

    async fn list_projects(&self, filter: ProjectFilter) -> Result<Vec<Project>, RepositoryError> {
        let state = self.state.lock().await;
        let mut projects: Vec<Project> = state
            .aggregates
            .values()
            .filter(|a| filter.matches(&a.project))
            .map(|a| a.project.clone())
            .collect();
        match filter {
            ProjectFilter::Owner(_) => projects.sort_by(|a, b| b.created_at.cmp(&a.created_at)),
            ProjectFilter::AwaitingPublication { .. } => projects.sort_by_key(|p| p.updated_at),
        }
        Ok(projects)
    }

    async fn list_curations(
        &self,
        filter: CurationFilter,
    ) -> Result<Vec<CurationAggregate>, RepositoryError> {
        let state = self.state.lock().await;
        let mut aggregates: Vec<CurationAggregate> = state
            .aggregates
            .values()
            .filter(|a| matches_filter(a, filter))
            .cloned()
            .collect();
        aggregates.sort_by_key(|a| a.curation.as_ref().and_then(|c| c.assigned_at));
        Ok(aggregates)
    }

    async fn insert_access_request(&self, request: &AccessRequest) -> Result<(), RepositoryError> {
        let mut state = self.state.lock().await;
        let duplicate = state.access_requests.values().any(|existing| {
            existing.project_id == request.project_id
                && existing.requester_id == request.requester_id
                && existing.status == AccessRequestStatus::Pending
        });
        if duplicate || state.access_requests.contains_key(&request.id) {
            return Err(RepositoryError::AlreadyExists);
        }
        state.access_requests.insert(request.id, request.clone());
        Ok(())
    }

    async fn find_access_request(
        &self,
        id: Uuid,
    ) -> Result<Option<AccessRequest>, RepositoryError> {
        let state = self.state.lock().await;
        Ok(state.access_requests.get(&id).cloned())
    }

    async fn complete_access_review(
        &self,
        request: &AccessRequest,
    ) -> Result<bool, RepositoryError> {
        let mut state = self.state.lock().await;
        let stored = state
            .access_requests
            .get_mut(&request.id)
            .ok_or(RepositoryError::NotFound)?;

        if stored.status != AccessRequestStatus::Pending {
            return Ok(false);
        }
        *stored = request.clone();
        Ok(true)
    }

    async fn list_access_requests(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<AccessRequest>, RepositoryError> {
        let state = self.state.lock().await;
        let mut requests: Vec<AccessRequest> = state
            .access_requests
            .values()
            .filter(|r| r.project_id == project_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }
}
