//! Route definitions for Curation domain API

use axum::{
    routing::{get, post},
    Router,
};

use super::handlers::{access, curations, projects};
use super::middleware::CurationState;

/// Project submission, catalog and lifecycle routes
fn project_routes() -> Router<CurationState> {
    Router::new()
        .route(
            "/v1/projects",
            get(projects::catalog).post(projects::submit_project),
        )
        .route("/v1/projects/mine", get(projects::my_projects))
        .route(
            "/v1/projects/publication-queue",
            get(projects::publication_queue),
        )
        .route(
            "/v1/projects/{id}",
            get(projects::get_project).delete(projects::delete_project),
        )
        .route("/v1/projects/{id}/select", post(projects::select_project))
        .route("/v1/projects/{id}/curators", post(projects::assign_curators))
        .route("/v1/projects/{id}/publish", post(projects::publish_project))
}

/// Curation record routes
fn curation_routes() -> Router<CurationState> {
    Router::new()
        .route("/v1/curations/assigned", get(curations::my_assignments))
        .route("/v1/curations/review-queue", get(curations::review_queue))
        .route("/v1/curations/monitoring", get(curations::monitoring))
        .route("/v1/curations/{id}", get(curations::get_curation))
        .route("/v1/curations/{id}/scores", post(curations::submit_scores))
        .route("/v1/curations/{id}/decision", post(curations::decide))
}

/// Access request routes
fn access_routes() -> Router<CurationState> {
    Router::new()
        .route(
            "/v1/projects/{id}/access-requests",
            get(access::list_access_requests).post(access::request_access),
        )
        .route(
            "/v1/access-requests/{id}/review",
            post(access::review_access),
        )
}

/// Create all Curation domain API routes
pub fn routes() -> Router<CurationState> {
    Router::new()
        .merge(project_routes())
        .merge(curation_routes())
        .merge(access_routes())
}
