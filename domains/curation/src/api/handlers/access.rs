//! Source-material access request handlers

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use gagasan_common::{Result, ValidatedJson};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::{AuthUser, CurationState};
use crate::domain::entities::AccessRequest;

/// Request for asking access to a published project
#[derive(Debug, Default, Deserialize, Validate)]
pub struct RequestAccessRequest {
    #[validate(length(max = 1000))]
    pub reason: Option<String>,
}

/// Owner or business unit verdict on an access request
#[derive(Debug, Deserialize, Validate)]
pub struct ReviewAccessRequest {
    pub approve: bool,
}

/// Ask for access to a published project's source material
///
/// **POST /v1/projects/{id}/access-requests**
pub async fn request_access(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<RequestAccessRequest>,
) -> Result<(StatusCode, Json<AccessRequest>)> {
    let created = state
        .service
        .request_access(id, &ctx, request.reason)
        .await?;
    Ok((StatusCode::CREATED, Json(created)))
}

/// List a project's access requests
///
/// **GET /v1/projects/{id}/access-requests**
pub async fn list_access_requests(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Vec<AccessRequest>>> {
    Ok(Json(state.service.access_requests(id, &ctx).await?))
}

/// Approve or reject a pending request
///
/// **POST /v1/access-requests/{id}/review**
pub async fn review_access(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<ReviewAccessRequest>,
) -> Result<Json<AccessRequest>> {
    let reviewed = state
        .service
        .review_access(id, &ctx, request.approve)
        .await?;
    Ok(Json(reviewed))
}
