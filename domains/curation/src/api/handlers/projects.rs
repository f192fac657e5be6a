//! Project submission, catalog and lifecycle handlers

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use gagasan_common::{Pagination, Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::{AuthUser, CurationState};
use crate::domain::entities::{CurationRecord, PosterImage, Project, ProjectSubmission};
use crate::repository::CatalogQuery;

/// Request for submitting a project
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitProjectRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,

    #[validate(length(min = 1))]
    pub description: String,

    #[validate(length(max = 2048))]
    pub demo_link: Option<String>,

    #[validate(length(max = 2048))]
    pub source_code_link: Option<String>,

    pub poster: Option<PosterImage>,

    #[serde(default)]
    pub categories: Vec<String>,

    /// Comma-separated tags
    #[serde(default)]
    pub tags: String,
}

impl From<SubmitProjectRequest> for ProjectSubmission {
    fn from(request: SubmitProjectRequest) -> Self {
        Self {
            title: request.title,
            description: request.description,
            demo_link: request.demo_link,
            source_code_link: request.source_code_link,
            poster: request.poster,
            categories: request.categories,
            tags: request.tags,
        }
    }
}

/// Catalog query parameters
#[derive(Debug, Default, Deserialize)]
pub struct CatalogParams {
    pub search: Option<String>,
    pub category: Option<String>,
    pub offset: Option<i64>,
    pub limit: Option<i64>,
}

impl From<CatalogParams> for CatalogQuery {
    fn from(params: CatalogParams) -> Self {
        Self {
            search: params.search,
            category: params.category,
            pagination: Pagination {
                offset: params.offset,
                limit: params.limit,
            },
        }
    }
}

/// Request for assigning curators
#[derive(Debug, Deserialize, Validate)]
pub struct AssignCuratorsRequest {
    pub academic_curator_id: Uuid,
    pub partner_curator_id: Uuid,
}

/// Project response
#[derive(Debug, Serialize)]
pub struct ProjectResponse {
    #[serde(flatten)]
    pub project: Project,
    /// Whether the catalog lists it
    pub listed: bool,
}

impl From<Project> for ProjectResponse {
    fn from(project: Project) -> Self {
        let listed = project.published;
        Self { project, listed }
    }
}

/// Browse published projects
///
/// **GET /v1/projects**
///
/// Public; no authentication required.
pub async fn catalog(
    State(state): State<CurationState>,
    Query(params): Query<CatalogParams>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let projects = state.service.catalog(&params.into()).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// Submit a new project
///
/// **POST /v1/projects**
pub async fn submit_project(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    ValidatedJson(request): ValidatedJson<SubmitProjectRequest>,
) -> Result<(StatusCode, Json<ProjectResponse>)> {
    let project = state.service.submit_project(&ctx, request.into()).await?;
    Ok((StatusCode::CREATED, Json(project.into())))
}

/// List the caller's own submissions with their curation status
///
/// **GET /v1/projects/mine**
pub async fn my_projects(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let projects = state.service.my_projects(&ctx).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// Decided projects waiting to be published
///
/// **GET /v1/projects/publication-queue**
pub async fn publication_queue(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
) -> Result<Json<Vec<ProjectResponse>>> {
    let projects = state.service.publication_queue(&ctx).await?;
    Ok(Json(projects.into_iter().map(Into::into).collect()))
}

/// Get a project
///
/// **GET /v1/projects/{id}**
///
/// Published projects are visible to everyone signed in; unpublished ones
/// only to the owner, the business unit and assigned curators.
pub async fn get_project(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectResponse>> {
    let project = state.service.project_details(id, &ctx).await?;
    Ok(Json(project.into()))
}

/// Delete a project
///
/// **DELETE /v1/projects/{id}**
pub async fn delete_project(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode> {
    state.service.delete_project(id, &ctx).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// Select a pending project for curation
///
/// **POST /v1/projects/{id}/select**
pub async fn select_project(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectResponse>> {
    let project = state.service.select_for_curation(id, &ctx).await?;
    Ok(Json(project.into()))
}

/// Assign or reassign curators
///
/// **POST /v1/projects/{id}/curators**
pub async fn assign_curators(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<AssignCuratorsRequest>,
) -> Result<Json<CurationRecord>> {
    let record = state
        .service
        .assign_curators(
            id,
            &ctx,
            request.academic_curator_id,
            request.partner_curator_id,
        )
        .await?;
    Ok(Json(record))
}

/// Publish a decided project
///
/// **POST /v1/projects/{id}/publish**
pub async fn publish_project(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ProjectResponse>> {
    let project = state.service.publish(id, &ctx).await?;
    Ok(Json(project.into()))
}
