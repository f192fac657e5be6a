//! PostgreSQL store
//!
//! Every aggregate write runs in one transaction that locks the project row
//! (`SELECT ... FOR UPDATE`), checks its version, rewrites the project, the
//! curation record and the rubric entries, and bumps the version.

use async_trait::async_trait;
use gagasan_common::RepositoryError;
use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

use super::{CatalogQuery, CurationFilter, CurationStore, ProjectFilter};
use crate::domain::aggregate::CurationAggregate;
use crate::domain::entities::{AccessRequest, CurationRecord, Project, RubricEntry};

pub(crate) const PROJECT_COLUMNS: &str = "id, owner_id, title, description, demo_link, \
    source_code_link, poster, categories, tags, curation_status, final_decision, \
    decision_note, published, version, created_at, updated_at";

pub(crate) const CURATION_COLUMNS: &str = "id, project_id, academic_curator_id, \
    partner_curator_id, assigned_at, academic_completed_at, partner_completed_at, \
    academic_score, partner_score, final_score, academic_note, partner_note, status, \
    created_at, updated_at";

pub(crate) const RUBRIC_COLUMNS: &str = "id, curation_id, aspect, track, score";

pub(crate) const ACCESS_REQUEST_COLUMNS: &str =
    "id, project_id, requester_id, reviewer_id, status, reason, created_at, reviewed_at";

#[derive(Clone)]
pub struct PgCurationStore {
    pool: PgPool,
}

impl PgCurationStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Get a reference to the underlying database pool
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn load_parts(&self, project: Project) -> Result<CurationAggregate, RepositoryError> {
        let query = format!("SELECT {CURATION_COLUMNS} FROM curation_records WHERE project_id = $1");
        let curation = sqlx::query_as::<_, CurationRecord>(&query)
            .bind(project.id)
            .fetch_optional(&self.pool)
            .await?;

        let rubric = match &curation {
            Some(record) => {
                let query = format!(
                    "SELECT {RUBRIC_COLUMNS} FROM rubric_entries \
                     WHERE curation_id = $1 ORDER BY track, aspect"
                );
                sqlx::query_as::<_, RubricEntry>(&query)
                    .bind(record.id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => Vec::new(),
        };

        Ok(CurationAggregate {
            project,
            curation,
            rubric,
        })
    }
}

/// Lock the project row and return its current version
async fn lock_project_version_tx(
    tx: &mut Transaction<'_, Postgres>,
    project_id: Uuid,
) -> Result<Option<i64>, sqlx::Error> {
    sqlx::query_scalar::<_, i64>("SELECT version FROM projects WHERE id = $1 FOR UPDATE")
        .bind(project_id)
        .fetch_optional(&mut **tx)
        .await
}

async fn update_project_tx(
    tx: &mut Transaction<'_, Postgres>,
    project: &Project,
) -> Result<Project, sqlx::Error> {
    let query = format!(
        "UPDATE projects SET \
            title = $2, description = $3, demo_link = $4, source_code_link = $5, \
            poster = $6, categories = $7, tags = $8, curation_status = $9, \
            final_decision = $10, decision_note = $11, published = $12, \
            version = version + 1, updated_at = NOW() \
         WHERE id = $1 \
         RETURNING {PROJECT_COLUMNS}"
    );
    sqlx::query_as::<_, Project>(&query)
        .bind(project.id)
        .bind(&project.title)
        .bind(&project.description)
        .bind(&project.demo_link)
        .bind(&project.source_code_link)
        .bind(&project.poster)
        .bind(&project.categories)
        .bind(&project.tags)
        .bind(project.curation_status)
        .bind(project.final_decision)
        .bind(&project.decision_note)
        .bind(project.published)
        .fetch_one(&mut **tx)
        .await
}

async fn upsert_curation_tx(
    tx: &mut Transaction<'_, Postgres>,
    record: &CurationRecord,
) -> Result<CurationRecord, sqlx::Error> {
    let query = format!(
        "INSERT INTO curation_records ({CURATION_COLUMNS}) \
         VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, NOW()) \
         ON CONFLICT (id) DO UPDATE SET \
            academic_curator_id = EXCLUDED.academic_curator_id, \
            partner_curator_id = EXCLUDED.partner_curator_id, \
            assigned_at = EXCLUDED.assigned_at, \
            academic_completed_at = EXCLUDED.academic_completed_at, \
            partner_completed_at = EXCLUDED.partner_completed_at, \
            academic_score = EXCLUDED.academic_score, \
            partner_score = EXCLUDED.partner_score, \
            final_score = EXCLUDED.final_score, \
            academic_note = EXCLUDED.academic_note, \
            partner_note = EXCLUDED.partner_note, \
            status = EXCLUDED.status, \
            updated_at = NOW() \
         RETURNING {CURATION_COLUMNS}"
    );
    sqlx::query_as::<_, CurationRecord>(&query)
        .bind(record.id)
        .bind(record.project_id)
        .bind(record.academic_curator_id)
        .bind(record.partner_curator_id)
        .bind(record.assigned_at)
        .bind(record.academic_completed_at)
        .bind(record.partner_completed_at)
        .bind(record.academic_score)
        .bind(record.partner_score)
        .bind(record.final_score)
        .bind(&record.academic_note)
        .bind(&record.partner_note)
        .bind(record.status)
        .bind(record.created_at)
        .fetch_one(&mut **tx)
        .await
}

/// Replace the rubric entries of a record with the given set
async fn replace_rubric_tx(
    tx: &mut Transaction<'_, Postgres>,
    curation_id: Uuid,
    entries: &[RubricEntry],
) -> Result<(), sqlx::Error> {
    sqlx::query("DELETE FROM rubric_entries WHERE curation_id = $1")
        .bind(curation_id)
        .execute(&mut **tx)
        .await?;

    let query = format!("INSERT INTO rubric_entries ({RUBRIC_COLUMNS}) VALUES ($1, $2, $3, $4, $5)");
    for entry in entries {
        sqlx::query(&query)
            .bind(entry.id)
            .bind(entry.curation_id)
            .bind(entry.aspect)
            .bind(entry.track)
            .bind(entry.score)
            .execute(&mut **tx)
            .await?;
    }
    Ok(())
}

fn is_unique_violation(err: &sqlx::Error) -> bool {
    matches!(err, sqlx::Error::Database(db) if db.is_unique_violation())
}

#[async_trait]
impl CurationStore for PgCurationStore {
    async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError> {
        let query = format!(
            "INSERT INTO projects ({PROJECT_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16)"
        );
        sqlx::query(&query)
            .bind(project.id)
            .bind(project.owner_id)
            .bind(&project.title)
            .bind(&project.description)
            .bind(&project.demo_link)
            .bind(&project.source_code_link)
            .bind(&project.poster)
            .bind(&project.categories)
            .bind(&project.tags)
            .bind(project.curation_status)
            .bind(project.final_decision)
            .bind(&project.decision_note)
            .bind(project.published)
            .bind(project.version)
            .bind(project.created_at)
            .bind(project.updated_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::AlreadyExists
                } else {
                    RepositoryError::Connection(e)
                }
            })?;
        Ok(())
    }

    async fn load(&self, project_id: Uuid) -> Result<Option<CurationAggregate>, RepositoryError> {
        let query = format!("SELECT {PROJECT_COLUMNS} FROM projects WHERE id = $1");
        let project = sqlx::query_as::<_, Project>(&query)
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;

        match project {
            Some(project) => Ok(Some(self.load_parts(project).await?)),
            None => Ok(None),
        }
    }

    async fn load_by_curation(
        &self,
        curation_id: Uuid,
    ) -> Result<Option<CurationAggregate>, RepositoryError> {
        let project_id = sqlx::query_scalar::<_, Uuid>(
            "SELECT project_id FROM curation_records WHERE id = $1",
        )
        .bind(curation_id)
        .fetch_optional(&self.pool)
        .await?;

        match project_id {
            Some(project_id) => self.load(project_id).await,
            None => Ok(None),
        }
    }

    async fn save(
        &self,
        aggregate: &CurationAggregate,
    ) -> Result<CurationAggregate, RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let found = lock_project_version_tx(&mut tx, aggregate.project.id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        if found != aggregate.version() {
            return Err(RepositoryError::VersionConflict {
                expected: aggregate.version(),
                found,
            });
        }

        let project = update_project_tx(&mut tx, &aggregate.project).await?;

        let curation = match &aggregate.curation {
            Some(record) => {
                let saved = upsert_curation_tx(&mut tx, record).await?;
                replace_rubric_tx(&mut tx, saved.id, &aggregate.rubric).await?;
                Some(saved)
            }
            None => None,
        };

        tx.commit().await?;

        Ok(CurationAggregate {
            project,
            curation,
            rubric: aggregate.rubric.clone(),
        })
    }

    async fn delete_project(
        &self,
        project_id: Uuid,
        expected_version: i64,
    ) -> Result<(), RepositoryError> {
        let mut tx = self.pool.begin().await?;

        let found = lock_project_version_tx(&mut tx, project_id)
            .await?
            .ok_or(RepositoryError::NotFound)?;
        if found != expected_version {
            return Err(RepositoryError::VersionConflict {
                expected: expected_version,
                found,
            });
        }

        // Curation records, rubric entries and access requests cascade
        sqlx::query("DELETE FROM projects WHERE id = $1")
            .bind(project_id)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(())
    }

    async fn list_published(&self, query: &CatalogQuery) -> Result<Vec<Project>, RepositoryError> {
        let sql = format!(
            "SELECT {PROJECT_COLUMNS} FROM projects \
             WHERE published = TRUE \
               AND ($3::TEXT IS NULL \
                    OR strpos(lower(title), lower($3)) > 0 \
                    OR strpos(lower(description), lower($3)) > 0) \
               AND ($4::TEXT IS NULL OR $4 = ANY(categories)) \
             ORDER BY created_at DESC \
             LIMIT $1 OFFSET $2"
        );
        let rows = sqlx::query_as::<_, Project>(&sql)
            .bind(query.pagination.limit())
            .bind(query.pagination.offset())
            .bind(query.search_term())
            .bind(&query.category)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }

    async fn list_projects(&self, filter: ProjectFilter) -> Result<Vec<Project>, RepositoryError> {
        let rows = match filter {
            ProjectFilter::Owner(owner_id) => {
                let sql = format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects \
                     WHERE owner_id = $1 \
                     ORDER BY created_at DESC"
                );
                sqlx::query_as::<_, Project>(&sql)
                    .bind(owner_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            ProjectFilter::AwaitingPublication {
                include_minor_revisions,
            } => {
                let sql = format!(
                    "SELECT {PROJECT_COLUMNS} FROM projects \
                     WHERE published = FALSE \
                       AND (curation_status = 'ready-for-publication' \
                            OR ($1 AND curation_status = 'revision-minor')) \
                     ORDER BY updated_at"
                );
                sqlx::query_as::<_, Project>(&sql)
                    .bind(include_minor_revisions)
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        Ok(rows)
    }

    async fn list_curations(
        &self,
        filter: CurationFilter,
    ) -> Result<Vec<CurationAggregate>, RepositoryError> {
        let project_ids = match filter {
            CurationFilter::All => {
                sqlx::query_scalar::<_, Uuid>(
                    "SELECT project_id FROM curation_records ORDER BY assigned_at",
                )
                .fetch_all(&self.pool)
                .await?
            }
            CurationFilter::Curator(user_id) => {
                sqlx::query_scalar::<_, Uuid>(
                    "SELECT project_id FROM curation_records \
                     WHERE academic_curator_id = $1 OR partner_curator_id = $1 \
                     ORDER BY assigned_at",
                )
                .bind(user_id)
                .fetch_all(&self.pool)
                .await?
            }
            CurationFilter::AwaitingDecision => {
                sqlx::query_scalar::<_, Uuid>(
                    "SELECT c.project_id FROM curation_records c \
                     JOIN projects p ON p.id = c.project_id \
                     WHERE c.status = 'complete' AND p.curation_status = 'assessment-complete' \
                     ORDER BY c.updated_at",
                )
                .fetch_all(&self.pool)
                .await?
            }
        };

        let mut aggregates = Vec::with_capacity(project_ids.len());
        for project_id in project_ids {
            // A project deleted between the two reads is skipped
            if let Some(aggregate) = self.load(project_id).await? {
                aggregates.push(aggregate);
            }
        }
        Ok(aggregates)
    }

    async fn insert_access_request(&self, request: &AccessRequest) -> Result<(), RepositoryError> {
        let query = format!(
            "INSERT INTO access_requests ({ACCESS_REQUEST_COLUMNS}) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8)"
        );
        sqlx::query(&query)
            .bind(request.id)
            .bind(request.project_id)
            .bind(request.requester_id)
            .bind(request.reviewer_id)
            .bind(request.status)
            .bind(&request.reason)
            .bind(request.created_at)
            .bind(request.reviewed_at)
            .execute(&self.pool)
            .await
            .map_err(|e| {
                if is_unique_violation(&e) {
                    RepositoryError::AlreadyExists
                } else {
                    RepositoryError::Connection(e)
                }
            })?;
        Ok(())
    }

    async fn find_access_request(
        &self,
        id: Uuid,
    ) -> Result<Option<AccessRequest>, RepositoryError> {
        let query = format!("SELECT {ACCESS_REQUEST_COLUMNS} FROM access_requests WHERE id = $1");
        let row = sqlx::query_as::<_, AccessRequest>(&query)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row)
    }

    async fn complete_access_review(
        &self,
        request: &AccessRequest,
    ) -> Result<bool, RepositoryError> {
        let result = sqlx::query(
            "UPDATE access_requests \
             SET status = $2, reviewer_id = $3, reviewed_at = $4 \
             WHERE id = $1 AND status = 'pending'",
        )
        .bind(request.id)
        .bind(request.status)
        .bind(request.reviewer_id)
        .bind(request.reviewed_at)
        .execute(&self.pool)
        .await?;
        Ok(result.rows_affected() == 1)
    }

    async fn list_access_requests(
        &self,
        project_id: Uuid,
    ) -> Result<Vec<AccessRequest>, RepositoryError> {
        let query = format!(
            "SELECT {ACCESS_REQUEST_COLUMNS} FROM access_requests \
             WHERE project_id = $1 ORDER BY created_at DESC"
        );
        let rows = sqlx::query_as::<_, AccessRequest>(&query)
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        Ok(rows)
    }
}
