//! HTTP API tests: the full router over the in-memory store

mod common;

use axum::http::{Method, StatusCode};
use serde_json::{json, Value};
use tower::ServiceExt;

use crate::common::{parse_body, request, sheet_json, Cast, TestApp};

/// Send one request through a fresh router over the app's shared state
async fn send(
    app: &TestApp,
    method: Method,
    uri: &str,
    jwt: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let resp = app
        .test_router()
        .oneshot(request(method, uri, jwt, body))
        .await
        .unwrap();
    let status = resp.status();
    (status, parse_body(resp).await)
}

mod test_infrastructure {
    use super::*;

    #[tokio::test]
    async fn test_health_check() {
        let app = TestApp::new();
        let resp = app
            .test_router()
            .oneshot(request(Method::GET, "/health", None, None))
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_catalog_is_public() {
        let app = TestApp::new();
        let (status, body) = send(&app, Method::GET, "/v1/projects", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, json!([]));
    }

    #[tokio::test]
    async fn test_submission_requires_token() {
        let app = TestApp::new();
        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/projects",
            None,
            Some(json!({ "title": "x", "description": "y" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);

        let (status, _) = send(
            &app,
            Method::POST,
            "/v1/projects",
            Some("not-a-jwt"),
            Some(json!({ "title": "x", "description": "y" })),
        )
        .await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }
}

mod test_workflow_over_http {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_full_lifecycle() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let student = app.token_for(&cast.student);
        let lecturer = app.token_for(&cast.lecturer);
        let partner = app.token_for(&cast.partner);
        let unit = app.token_for(&cast.business_unit);

        // Submit
        let (status, project) = send(
            &app,
            Method::POST,
            "/v1/projects",
            Some(&student),
            Some(json!({
                "title": "Smart Farming Monitor",
                "description": "Soil sensors with a dashboard",
                "source_code_link": "https://github.com/mhs/sfm",
                "categories": ["iot"],
                "tags": "iot, agriculture",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(project["curation_status"], "pending");
        assert_eq!(project["listed"], false);
        let project_id = project["id"].as_str().unwrap().to_string();

        // Only the business unit selects
        let select_uri = format!("/v1/projects/{}/select", project_id);
        let (status, body) = send(&app, Method::POST, &select_uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        assert_eq!(body["error"]["code"], "UNAUTHORIZED");

        let (status, body) = send(&app, Method::POST, &select_uri, Some(&unit), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["curation_status"], "selected");

        // Selecting twice is a state conflict
        let (status, body) = send(&app, Method::POST, &select_uri, Some(&unit), None).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"]["code"], "INVALID_STATE");

        // Assign
        let (status, record) = send(
            &app,
            Method::POST,
            &format!("/v1/projects/{}/curators", project_id),
            Some(&unit),
            Some(json!({
                "academic_curator_id": cast.lecturer.id(),
                "partner_curator_id": cast.partner.id(),
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(record["status"], "in-progress");
        let curation_id = record["id"].as_str().unwrap().to_string();
        let scores_uri = format!("/v1/curations/{}/scores", curation_id);

        let (status, assigned) =
            send(&app, Method::GET, "/v1/curations/assigned", Some(&lecturer), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(assigned.as_array().unwrap().len(), 1);

        // An incomplete sheet is refused
        let (status, body) = send(
            &app,
            Method::POST,
            &scores_uri,
            Some(&lecturer),
            Some(json!({ "track": "academic", "scores": { "functionality": 4 } })),
        )
        .await;
        assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(body["error"]["code"], "INCOMPLETE_SCORING");

        // Unknown aspect keys do not deserialize
        let (status, _) = send(
            &app,
            Method::POST,
            &scores_uri,
            Some(&lecturer),
            Some(json!({ "track": "academic", "scores": { "vibes": 4 } })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);

        let (status, body) = send(
            &app,
            Method::POST,
            &scores_uri,
            Some(&lecturer),
            Some(json!({ "track": "academic", "scores": sheet_json([4, 4, 4, 4, 3, 3]) })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "academic-done");
        assert_eq!(body["academic_score"], "3.80");

        let (status, body) = send(
            &app,
            Method::POST,
            &scores_uri,
            Some(&partner),
            Some(json!({
                "track": "partner",
                "scores": sheet_json([3, 3, 4, 3, 3, 3]),
                "note": "Ready for a field trial",
            })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["status"], "complete");
        assert_eq!(body["final_score"], "3.50");

        // Review queue and monitoring
        let (status, queue) =
            send(&app, Method::GET, "/v1/curations/review-queue", Some(&unit), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(queue[0]["suggestion"]["category"], "ready-for-publication");
        assert_eq!(queue[0]["suggestion"]["combined_score"], "3.50");

        let (status, _) =
            send(&app, Method::GET, "/v1/curations/monitoring", Some(&lecturer), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);

        let (status, details) = send(
            &app,
            Method::GET,
            &format!("/v1/curations/{}", curation_id),
            Some(&unit),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(details["rubric"].as_array().unwrap().len(), 12);

        // Decide and publish
        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/v1/curations/{}/decision", curation_id),
            Some(&unit),
            Some(json!({ "decision": "ready-for-publication" })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["project"]["curation_status"], "ready-for-publication");

        let (status, _) = send(
            &app,
            Method::GET,
            "/v1/projects/publication-queue",
            Some(&student),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::FORBIDDEN);
        let (status, awaiting) = send(
            &app,
            Method::GET,
            "/v1/projects/publication-queue",
            Some(&unit),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(awaiting.as_array().unwrap().len(), 1);
        assert_eq!(awaiting[0]["id"], project_id.as_str());

        let (status, body) = send(
            &app,
            Method::POST,
            &format!("/v1/projects/{}/publish", project_id),
            Some(&unit),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body["published"], true);
        assert_eq!(body["listed"], true);

        // The owner's dashboard
        let (status, mine) =
            send(&app, Method::GET, "/v1/projects/mine", Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine.as_array().unwrap().len(), 1);
        assert_eq!(mine[0]["curation_status"], "published");
        let (status, mine) =
            send(&app, Method::GET, "/v1/projects/mine", Some(&partner), None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(mine, json!([]));

        let (status, catalog) =
            send(&app, Method::GET, "/v1/projects?search=farming&category=iot", None, None).await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(catalog.as_array().unwrap().len(), 1);

        // Access request reviewed by the owner
        let (status, access) = send(
            &app,
            Method::POST,
            &format!("/v1/projects/{}/access-requests", project_id),
            Some(&partner),
            Some(json!({ "reason": "Pilot on our farm" })),
        )
        .await;
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(access["status"], "pending");

        let (status, reviewed) = send(
            &app,
            Method::POST,
            &format!("/v1/access-requests/{}/review", access["id"].as_str().unwrap()),
            Some(&student),
            Some(json!({ "approve": true })),
        )
        .await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(reviewed["status"], "approved");

        // Published projects cannot be deleted by their owner
        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/v1/projects/{}", project_id),
            Some(&student),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::CONFLICT);

        let (status, _) = send(
            &app,
            Method::DELETE,
            &format!("/v1/projects/{}", project_id),
            Some(&unit),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NO_CONTENT);

        let (status, _) = send(
            &app,
            Method::GET,
            &format!("/v1/projects/{}", project_id),
            Some(&unit),
            None,
        )
        .await;
        assert_eq!(status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_unpublished_project_hidden_from_strangers() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let student = app.token_for(&cast.student);
        let partner = app.token_for(&cast.partner);

        let (_, project) = send(
            &app,
            Method::POST,
            "/v1/projects",
            Some(&student),
            Some(json!({ "title": "Secret", "description": "Not yet" })),
        )
        .await;
        let uri = format!("/v1/projects/{}", project["id"].as_str().unwrap());

        let (status, _) = send(&app, Method::GET, &uri, Some(&student), None).await;
        assert_eq!(status, StatusCode::OK);
        let (status, _) = send(&app, Method::GET, &uri, Some(&partner), None).await;
        assert_eq!(status, StatusCode::FORBIDDEN);
    }

    #[tokio::test]
    async fn test_blank_title_is_a_validation_error() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let student = app.token_for(&cast.student);

        let (status, body) = send(
            &app,
            Method::POST,
            "/v1/projects",
            Some(&student),
            Some(json!({ "title": "", "description": "Something" })),
        )
        .await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }
}
