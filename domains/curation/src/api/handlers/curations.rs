//! Curation record handlers: scoring, decisions and read models

use axum::{
    extract::{Path, State},
    Json,
};
use gagasan_common::{Result, ValidatedJson};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::api::middleware::{AuthUser, CurationState};
use crate::domain::decision::DecisionCategory;
use crate::domain::entities::{
    CurationDetails, CurationProgress, CurationRecord, CuratorTrack, Project, ReviewQueueItem,
};
use crate::domain::scoring::ScoreSheet;

/// Request for submitting one track's scores
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitScoresRequest {
    pub track: CuratorTrack,

    /// Aspect id to score (1-4)
    pub scores: ScoreSheet,

    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

/// Request for issuing a decision
#[derive(Debug, Deserialize, Validate)]
pub struct DecisionRequest {
    pub decision: DecisionCategory,

    #[validate(length(max = 1000))]
    pub note: Option<String>,
}

/// Response for a decision
#[derive(Debug, Serialize)]
pub struct DecisionResponse {
    pub project: Project,
}

/// Get a curation record with its rubric
///
/// **GET /v1/curations/{id}**
pub async fn get_curation(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
) -> Result<Json<CurationDetails>> {
    Ok(Json(state.service.curation_details(id, &ctx).await?))
}

/// Submit a curator's full score sheet
///
/// **POST /v1/curations/{id}/scores**
pub async fn submit_scores(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<SubmitScoresRequest>,
) -> Result<Json<CurationRecord>> {
    let record = state
        .service
        .submit_score(id, &ctx, request.track, request.scores, request.note)
        .await?;
    Ok(Json(record))
}

/// Issue the final decision
///
/// **POST /v1/curations/{id}/decision**
pub async fn decide(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
    Path(id): Path<Uuid>,
    ValidatedJson(request): ValidatedJson<DecisionRequest>,
) -> Result<Json<DecisionResponse>> {
    let project = state
        .service
        .decide(id, &ctx, request.decision, request.note)
        .await?;
    Ok(Json(DecisionResponse { project }))
}

/// Curation records assigned to the caller
///
/// **GET /v1/curations/assigned**
pub async fn my_assignments(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
) -> Result<Json<Vec<CurationDetails>>> {
    Ok(Json(state.service.my_assignments(&ctx).await?))
}

/// Complete curations awaiting a decision
///
/// **GET /v1/curations/review-queue**
pub async fn review_queue(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
) -> Result<Json<Vec<ReviewQueueItem>>> {
    Ok(Json(state.service.review_queue(&ctx).await?))
}

/// Scoring progress of every curation
///
/// **GET /v1/curations/monitoring**
pub async fn monitoring(
    AuthUser(ctx): AuthUser,
    State(state): State<CurationState>,
) -> Result<Json<Vec<CurationProgress>>> {
    Ok(Json(state.service.monitoring(&ctx).await?))
}
