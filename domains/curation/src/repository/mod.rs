//! Persistence for the curation domain
//!
//! The store reads and writes whole `CurationAggregate`s. Writes are
//! compare-and-set on the aggregate's version: a save commits only if the
//! persisted version still equals the version the aggregate was read at,
//! and fails with `RepositoryError::VersionConflict` otherwise.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;
use gagasan_common::{Pagination, RepositoryError};
use uuid::Uuid;

use crate::domain::aggregate::CurationAggregate;
use crate::domain::entities::{AccessRequest, Project};
use crate::domain::state::ProjectStatus;

pub use memory::InMemoryCurationStore;
pub use postgres::PgCurationStore;

/// Catalog search parameters (published projects only)
#[derive(Debug, Clone, Default)]
pub struct CatalogQuery {
    /// Case-insensitive match on title or description
    pub search: Option<String>,
    /// Category slug the project must carry
    pub category: Option<String>,
    pub pagination: Pagination,
}

impl CatalogQuery {
    /// Search text trimmed, `None` when blank
    pub fn search_term(&self) -> Option<&str> {
        self.search
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    pub fn matches(&self, project: &Project) -> bool {
        if !project.published {
            return false;
        }
        if let Some(category) = &self.category {
            if !project.categories.contains(category) {
                return false;
            }
        }
        match self.search_term() {
            Some(term) => {
                let term = term.to_lowercase();
                project.title.to_lowercase().contains(&term)
                    || project.description.to_lowercase().contains(&term)
            }
            None => true,
        }
    }
}

/// Which projects to list, regardless of publication
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProjectFilter {
    /// Every project the user submitted, newest first
    Owner(Uuid),
    /// Decided projects still waiting for `publish`, oldest decision first
    AwaitingPublication { include_minor_revisions: bool },
}

impl ProjectFilter {
    pub fn matches(&self, project: &Project) -> bool {
        match *self {
            Self::Owner(owner_id) => project.is_owned_by(owner_id),
            Self::AwaitingPublication {
                include_minor_revisions,
            } => {
                !project.published
                    && match project.curation_status {
                        ProjectStatus::ReadyForPublication => true,
                        ProjectStatus::RevisionMinor => include_minor_revisions,
                        _ => false,
                    }
            }
        }
    }
}

/// Which curation aggregates to list
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CurationFilter {
    /// Every project that has a curation record
    All,
    /// Records where the user is the academic or partner curator
    Curator(Uuid),
    /// Complete records whose project awaits a decision
    AwaitingDecision,
}

/// Transactional aggregate store
#[async_trait]
pub trait CurationStore: Send + Sync {
    /// Persist a freshly submitted project
    async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError>;

    async fn load(&self, project_id: Uuid) -> Result<Option<CurationAggregate>, RepositoryError>;

    async fn load_by_curation(
        &self,
        curation_id: Uuid,
    ) -> Result<Option<CurationAggregate>, RepositoryError>;

    /// Compare-and-set write of the whole aggregate.
    ///
    /// Returns the committed aggregate carrying its new version.
    async fn save(
        &self,
        aggregate: &CurationAggregate,
    ) -> Result<CurationAggregate, RepositoryError>;

    /// Compare-and-set delete of the project and everything hanging off it
    async fn delete_project(
        &self,
        project_id: Uuid,
        expected_version: i64,
    ) -> Result<(), RepositoryError>;

    /// Published projects, newest first
    async fn list_published(&self, query: &CatalogQuery) -> Result<Vec<Project>, RepositoryError>;

    async fn list_projects(&self, filter: ProjectFilter) -> Result<Vec<Project>, RepositoryError>;

    async fn list_curations(
        &self,
        filter: CurationFilter,
    ) -> Result<Vec<CurationAggregate>, RepositoryError>;

    /// Fails with `AlreadyExists` while the requester has a pending request
    /// for the same project
    async fn insert_access_request(&self, request: &AccessRequest) -> Result<(), RepositoryError>;

    async fn find_access_request(&self, id: Uuid)
        -> Result<Option<AccessRequest>, RepositoryError>;

    /// Write a reviewed request only if it is still pending.
    ///
    /// Returns `false` when another reviewer got there first.
    async fn complete_access_review(
        &self,
        request: &AccessRequest,
    ) -> Result<bool, RepositoryError>;

    async fn list_access_requests(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<AccessRequest>, RepositoryError>;
}
