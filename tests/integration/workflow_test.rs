//! End-to-end curation workflow tests against the service layer
//!
//! Runs on the in-memory store; the PostgreSQL store is covered by
//! `postgres_store_test`.

mod common;

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use gagasan_common::{CurationSettings, Error, RepositoryError};
use gagasan_curation::repository::{CatalogQuery, CurationFilter, ProjectFilter};
use gagasan_curation::{
    AccessRequest, AccessRequestStatus, CurationAggregate, CurationRecord, CurationStatus,
    CurationStore, CuratorTrack, DecisionCategory, InMemoryCurationStore, Project, ProjectStatus,
};

use crate::common::{sheet, submission, Cast, TestApp};

/// Submit, select and assign; returns the project and its curation record
async fn assigned_project(app: &TestApp, cast: &Cast) -> (Project, CurationRecord) {
    let project = app
        .service
        .submit_project(&cast.student.ctx, submission("Smart Farming Monitor"))
        .await
        .unwrap();
    app.service
        .select_for_curation(project.id, &cast.business_unit.ctx)
        .await
        .unwrap();
    let record = app
        .service
        .assign_curators(
            project.id,
            &cast.business_unit.ctx,
            cast.lecturer.id(),
            cast.partner.id(),
        )
        .await
        .unwrap();
    (project, record)
}

/// Assign and have both curators score
async fn scored_project(
    app: &TestApp,
    cast: &Cast,
    academic: [i32; 6],
    partner: [i32; 6],
) -> (Project, CurationRecord) {
    let (project, record) = assigned_project(app, cast).await;
    app.service
        .submit_score(
            record.id,
            &cast.lecturer.ctx,
            CuratorTrack::Academic,
            sheet(academic),
            None,
        )
        .await
        .unwrap();
    let record = app
        .service
        .submit_score(
            record.id,
            &cast.partner.ctx,
            CuratorTrack::Partner,
            sheet(partner),
            None,
        )
        .await
        .unwrap();
    (project, record)
}

mod test_full_workflow {
    use super::*;

    #[test_log::test(tokio::test)]
    async fn test_submission_to_publication() {
        let app = TestApp::new();
        let cast = Cast::new(&app);

        let project = app
            .service
            .submit_project(&cast.student.ctx, submission("Smart Farming Monitor"))
            .await
            .unwrap();
        assert_eq!(project.curation_status, ProjectStatus::Pending);
        assert_eq!(project.tags, vec!["iot", "smart-city"]);

        app.service
            .select_for_curation(project.id, &cast.business_unit.ctx)
            .await
            .unwrap();
        let record = app
            .service
            .assign_curators(
                project.id,
                &cast.business_unit.ctx,
                cast.lecturer.id(),
                cast.partner.id(),
            )
            .await
            .unwrap();
        assert_eq!(record.status, CurationStatus::InProgress);
        assert!(record.assigned_at.is_some());

        let details = app
            .service
            .curation_details(record.id, &cast.business_unit.ctx)
            .await
            .unwrap();
        assert_eq!(details.rubric.len(), 12);
        assert!(details.rubric.iter().all(|e| e.score.is_none()));
        assert!(details.suggestion.is_none());
        let assigned = app
            .service
            .project_details(project.id, &cast.business_unit.ctx)
            .await
            .unwrap();
        assert_eq!(assigned.curation_status, ProjectStatus::CuratorsAssigned);

        let after_academic = app
            .service
            .submit_score(
                record.id,
                &cast.lecturer.ctx,
                CuratorTrack::Academic,
                sheet([4, 4, 4, 4, 3, 3]),
                Some("Solid engineering".to_string()),
            )
            .await
            .unwrap();
        assert_eq!(after_academic.status, CurationStatus::AcademicDone);
        assert_eq!(after_academic.academic_score, Some(Decimal::new(380, 2)));
        assert_eq!(after_academic.final_score, None);

        let complete = app
            .service
            .submit_score(
                record.id,
                &cast.partner.ctx,
                CuratorTrack::Partner,
                sheet([3, 3, 4, 3, 3, 3]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(complete.status, CurationStatus::Complete);
        assert_eq!(complete.partner_score, Some(Decimal::new(320, 2)));
        assert_eq!(complete.final_score, Some(Decimal::new(350, 2)));

        let queue = app
            .service
            .review_queue(&cast.business_unit.ctx)
            .await
            .unwrap();
        assert_eq!(queue.len(), 1);
        assert_eq!(
            queue[0].suggestion.category,
            DecisionCategory::ReadyForPublication
        );

        let decided = app
            .service
            .decide(
                record.id,
                &cast.business_unit.ctx,
                DecisionCategory::ReadyForPublication,
                None,
            )
            .await
            .unwrap();
        assert_eq!(decided.curation_status, ProjectStatus::ReadyForPublication);
        assert!(!decided.published);
        let awaiting = app
            .service
            .publication_queue(&cast.business_unit.ctx)
            .await
            .unwrap();
        assert_eq!(awaiting.len(), 1);
        assert_eq!(awaiting[0].id, project.id);
        assert!(app
            .service
            .review_queue(&cast.business_unit.ctx)
            .await
            .unwrap()
            .is_empty());

        let published = app
            .service
            .publish(project.id, &cast.business_unit.ctx)
            .await
            .unwrap();
        assert!(published.published);
        assert_eq!(published.curation_status, ProjectStatus::Published);
        assert!(app
            .service
            .publication_queue(&cast.business_unit.ctx)
            .await
            .unwrap()
            .is_empty());

        let dashboard = app.service.my_projects(&cast.student.ctx).await.unwrap();
        assert_eq!(dashboard.len(), 1);
        assert_eq!(dashboard[0].curation_status, ProjectStatus::Published);

        let catalog = app.service.catalog(&CatalogQuery::default()).await.unwrap();
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog[0].id, project.id);

        assert_eq!(
            app.notifier.recorded_names(),
            vec![
                "project_selected",
                "curators_assigned",
                "track_scored",
                "track_scored",
                "assessment_complete",
                "decision_issued",
                "project_published",
            ]
        );
    }

    #[tokio::test]
    async fn test_partner_may_score_first() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (_, record) = assigned_project(&app, &cast).await;

        let record = app
            .service
            .submit_score(
                record.id,
                &cast.partner.ctx,
                CuratorTrack::Partner,
                sheet([2; 6]),
                None,
            )
            .await
            .unwrap();
        assert_eq!(record.status, CurationStatus::PartnerDone);
    }

    #[tokio::test]
    async fn test_pending_projects_stay_out_of_catalog() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        scored_project(&app, &cast, [4; 6], [4; 6]).await;

        assert!(app
            .service
            .catalog(&CatalogQuery::default())
            .await
            .unwrap()
            .is_empty());
    }
}

mod test_scoring_rules {
    use super::*;

    #[tokio::test]
    async fn test_incomplete_sheet_is_rejected() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (_, record) = assigned_project(&app, &cast).await;

        let mut partial = sheet([3; 6]);
        partial.pop_last();
        let result = app
            .service
            .submit_score(
                record.id,
                &cast.lecturer.ctx,
                CuratorTrack::Academic,
                partial,
                None,
            )
            .await;
        assert!(matches!(result, Err(Error::IncompleteScoring(_))));

        let result = app
            .service
            .submit_score(
                record.id,
                &cast.lecturer.ctx,
                CuratorTrack::Academic,
                sheet([3, 3, 5, 3, 3, 3]),
                None,
            )
            .await;
        assert!(matches!(result, Err(Error::IncompleteScoring(_))));

        // Nothing was written
        let details = app
            .service
            .curation_details(record.id, &cast.business_unit.ctx)
            .await
            .unwrap();
        assert_eq!(details.curation.status, CurationStatus::InProgress);
        assert!(details.rubric.iter().all(|e| e.score.is_none()));
    }

    #[tokio::test]
    async fn test_only_assigned_curator_scores() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (_, record) = assigned_project(&app, &cast).await;
        let other_lecturer = app.create_user(gagasan_auth::UserRole::Lecturer);

        let result = app
            .service
            .submit_score(
                record.id,
                &other_lecturer.ctx,
                CuratorTrack::Academic,
                sheet([4; 6]),
                None,
            )
            .await;
        assert!(matches!(result, Err(Error::Unauthorized(_))));
    }

    #[tokio::test]
    async fn test_track_scores_only_once() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (_, record) = assigned_project(&app, &cast).await;

        app.service
            .submit_score(
                record.id,
                &cast.lecturer.ctx,
                CuratorTrack::Academic,
                sheet([3; 6]),
                None,
            )
            .await
            .unwrap();
        let again = app
            .service
            .submit_score(
                record.id,
                &cast.lecturer.ctx,
                CuratorTrack::Academic,
                sheet([4; 6]),
                None,
            )
            .await;
        assert!(matches!(again, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_reassignment_clears_partial_scores() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (project, record) = assigned_project(&app, &cast).await;

        app.service
            .submit_score(
                record.id,
                &cast.lecturer.ctx,
                CuratorTrack::Academic,
                sheet([3; 6]),
                None,
            )
            .await
            .unwrap();

        let new_lecturer = app.create_user(gagasan_auth::UserRole::Lecturer);
        let reassigned = app
            .service
            .assign_curators(
                project.id,
                &cast.business_unit.ctx,
                new_lecturer.id(),
                cast.partner.id(),
            )
            .await
            .unwrap();
        assert_eq!(reassigned.id, record.id);
        assert_eq!(reassigned.status, CurationStatus::InProgress);
        assert_eq!(reassigned.academic_score, None);
        assert_eq!(reassigned.academic_curator_id, Some(new_lecturer.id()));

        let details = app
            .service
            .curation_details(record.id, &new_lecturer.ctx)
            .await
            .unwrap();
        assert_eq!(details.rubric.len(), 12);
        assert!(details.rubric.iter().all(|e| e.score.is_none()));

        // The replaced curator lost access
        assert!(matches!(
            app.service
                .curation_details(record.id, &cast.lecturer.ctx)
                .await,
            Err(Error::Unauthorized(_))
        ));
    }

    #[tokio::test]
    async fn test_no_reassignment_after_completion() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (project, _) = scored_project(&app, &cast, [3; 6], [3; 6]).await;

        let result = app
            .service
            .assign_curators(
                project.id,
                &cast.business_unit.ctx,
                cast.lecturer.id(),
                cast.partner.id(),
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_same_user_cannot_hold_both_tracks() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let project = app
            .service
            .submit_project(&cast.student.ctx, submission("Dual"))
            .await
            .unwrap();
        app.service
            .select_for_curation(project.id, &cast.business_unit.ctx)
            .await
            .unwrap();

        let result = app
            .service
            .assign_curators(
                project.id,
                &cast.business_unit.ctx,
                cast.lecturer.id(),
                cast.lecturer.id(),
            )
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }

    #[tokio::test]
    async fn test_unapproved_curator_is_rejected() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let mut pending =
            gagasan_auth::AuthIdentity::new("dosen_baru", gagasan_auth::UserRole::Lecturer);
        pending.is_approved = false;
        app.identities.insert(pending.clone()).unwrap();

        let project = app
            .service
            .submit_project(&cast.student.ctx, submission("Waiting"))
            .await
            .unwrap();
        app.service
            .select_for_curation(project.id, &cast.business_unit.ctx)
            .await
            .unwrap();

        let result = app
            .service
            .assign_curators(
                project.id,
                &cast.business_unit.ctx,
                pending.id,
                cast.partner.id(),
            )
            .await;
        assert!(matches!(result, Err(Error::Validation(_))));
    }
}

mod test_decisions {
    use super::*;

    async fn suggested(academic: [i32; 6], partner: [i32; 6]) -> (Decimal, DecisionCategory) {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        scored_project(&app, &cast, academic, partner).await;
        let queue = app
            .service
            .review_queue(&cast.business_unit.ctx)
            .await
            .unwrap();
        (queue[0].suggestion.combined_score, queue[0].suggestion.category)
    }

    #[tokio::test]
    async fn test_suggestion_boundaries() {
        assert_eq!(
            suggested([4, 4, 4, 4, 3, 3], [3, 3, 4, 3, 3, 3]).await,
            (Decimal::new(350, 2), DecisionCategory::ReadyForPublication)
        );
        assert_eq!(
            suggested([3; 6], [3, 2, 2, 3, 3, 2]).await,
            (Decimal::new(275, 2), DecisionCategory::RevisionMinor)
        );
        assert_eq!(
            suggested([2; 6], [2; 6]).await,
            (Decimal::new(200, 2), DecisionCategory::NeedsCoaching)
        );
        assert_eq!(
            suggested([1; 6], [2, 2, 2, 2, 2, 1]).await,
            (Decimal::new(145, 2), DecisionCategory::Rejected)
        );
    }

    #[tokio::test]
    async fn test_decision_requires_complete_scoring() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (_, record) = assigned_project(&app, &cast).await;

        let result = app
            .service
            .decide(
                record.id,
                &cast.business_unit.ctx,
                DecisionCategory::Rejected,
                None,
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_terminal_decisions_cannot_publish() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (project, record) = scored_project(&app, &cast, [2; 6], [2; 6]).await;

        app.service
            .decide(
                record.id,
                &cast.business_unit.ctx,
                DecisionCategory::NeedsCoaching,
                Some("Needs a mentor".to_string()),
            )
            .await
            .unwrap();

        let result = app
            .service
            .publish(project.id, &cast.business_unit.ctx)
            .await;
        assert!(matches!(result, Err(Error::InvalidState(_))));

        let result = app
            .service
            .decide(
                record.id,
                &cast.business_unit.ctx,
                DecisionCategory::ReadyForPublication,
                None,
            )
            .await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }

    #[tokio::test]
    async fn test_minor_revisions_publish_by_default() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (project, record) = scored_project(&app, &cast, [3; 6], [3; 6]).await;
        app.service
            .decide(
                record.id,
                &cast.business_unit.ctx,
                DecisionCategory::RevisionMinor,
                None,
            )
            .await
            .unwrap();
        assert_eq!(
            app.service
                .publication_queue(&cast.business_unit.ctx)
                .await
                .unwrap()
                .len(),
            1
        );

        let published = app
            .service
            .publish(project.id, &cast.business_unit.ctx)
            .await
            .unwrap();
        assert!(published.published);
    }

    #[tokio::test]
    async fn test_minor_revisions_held_back_when_disabled() {
        let app = TestApp::with_settings(CurationSettings {
            publish_minor_revisions: false,
            ..CurationSettings::default()
        });
        let cast = Cast::new(&app);
        let (project, record) = scored_project(&app, &cast, [3; 6], [3; 6]).await;
        app.service
            .decide(
                record.id,
                &cast.business_unit.ctx,
                DecisionCategory::RevisionMinor,
                None,
            )
            .await
            .unwrap();

        assert!(app
            .service
            .publication_queue(&cast.business_unit.ctx)
            .await
            .unwrap()
            .is_empty());
        let result = app
            .service
            .publish(project.id, &cast.business_unit.ctx)
            .await;
        assert!(matches!(result, Err(Error::InvalidState(_))));
    }
}

mod test_dashboards {
    use super::*;

    #[tokio::test]
    async fn test_student_sees_every_submission_with_status() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (selected, _) = assigned_project(&app, &cast).await;
        let draft = app
            .service
            .submit_project(&cast.student.ctx, submission("Campus Map"))
            .await
            .unwrap();
        app.service
            .submit_project(&cast.lecturer.ctx, submission("Lecture Notes"))
            .await
            .unwrap();

        let mine = app.service.my_projects(&cast.student.ctx).await.unwrap();
        assert_eq!(mine.len(), 2);
        // Newest first
        assert_eq!(mine[0].id, draft.id);
        assert_eq!(mine[0].curation_status, ProjectStatus::Pending);
        assert_eq!(mine[1].id, selected.id);
        assert_eq!(mine[1].curation_status, ProjectStatus::CuratorsAssigned);
    }

    #[tokio::test]
    async fn test_publication_queue_is_business_unit_only() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        for ctx in [&cast.student.ctx, &cast.lecturer.ctx, &cast.partner.ctx] {
            assert!(matches!(
                app.service.publication_queue(ctx).await,
                Err(Error::Unauthorized(_))
            ));
        }
    }
}

mod test_deletion {
    use super::*;

    #[tokio::test]
    async fn test_owner_deletes_pending_project() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let project = app
            .service
            .submit_project(&cast.student.ctx, submission("Draft"))
            .await
            .unwrap();

        let stranger = app.create_user(gagasan_auth::UserRole::Student);
        assert!(matches!(
            app.service.delete_project(project.id, &stranger.ctx).await,
            Err(Error::Unauthorized(_))
        ));

        assert!(matches!(
            app.service
                .delete_project(project.id, &cast.partner.ctx)
                .await,
            Err(Error::Unauthorized(_))
        ));

        app.service
            .delete_project(project.id, &cast.student.ctx)
            .await
            .unwrap();
        assert!(matches!(
            app.service
                .project_details(project.id, &cast.student.ctx)
                .await,
            Err(Error::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_owner_cannot_delete_once_selected() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let (project, _) = assigned_project(&app, &cast).await;

        assert!(matches!(
            app.service
                .delete_project(project.id, &cast.student.ctx)
                .await,
            Err(Error::InvalidState(_))
        ));

        // The business unit may, and the curation record goes with it
        app.service
            .delete_project(project.id, &cast.business_unit.ctx)
            .await
            .unwrap();
        assert!(app
            .service
            .my_assignments(&cast.lecturer.ctx)
            .await
            .unwrap()
            .is_empty());
    }
}

mod test_access_requests {
    use super::*;

    async fn published_project(app: &TestApp, cast: &Cast) -> Project {
        let (project, record) = scored_project(app, cast, [4; 6], [4; 6]).await;
        app.service
            .decide(
                record.id,
                &cast.business_unit.ctx,
                DecisionCategory::ReadyForPublication,
                None,
            )
            .await
            .unwrap();
        app.service
            .publish(project.id, &cast.business_unit.ctx)
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn test_request_then_reject_then_request_again() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let project = published_project(&app, &cast).await;

        let request = app
            .service
            .request_access(project.id, &cast.partner.ctx, Some("Pilot".to_string()))
            .await
            .unwrap();
        assert_eq!(request.status, AccessRequestStatus::Pending);

        let rejected = app
            .service
            .review_access(request.id, &cast.business_unit.ctx, false)
            .await
            .unwrap();
        assert_eq!(rejected.status, AccessRequestStatus::Rejected);
        assert!(rejected.reviewed_at.is_some());

        let again = app
            .service
            .request_access(project.id, &cast.partner.ctx, None)
            .await
            .unwrap();
        assert_ne!(again.id, request.id);

        let listed = app
            .service
            .access_requests(project.id, &cast.student.ctx)
            .await
            .unwrap();
        assert_eq!(listed.len(), 2);
        assert!(app.notifier.recorded_names().contains(&"access_reviewed"));
    }

    #[tokio::test]
    async fn test_any_non_owner_may_request_access() {
        let app = TestApp::new();
        let cast = Cast::new(&app);
        let project = published_project(&app, &cast).await;
        let other_student = app.create_user(gagasan_auth::UserRole::Student);

        app.service
            .request_access(project.id, &other_student.ctx, None)
            .await
            .unwrap();
        assert!(matches!(
            app.service
                .request_access(project.id, &cast.student.ctx, None)
                .await,
            Err(Error::Validation(_))
        ));
        assert!(matches!(
            app.service
                .review_access(Uuid::new_v4(), &cast.student.ctx, true)
                .await,
            Err(Error::NotFound(_))
        ));
    }
}

mod test_concurrency {
    use super::*;

    #[test_log::test(tokio::test(flavor = "multi_thread", worker_threads = 4))]
    async fn test_concurrent_track_submissions_both_land() {
        for _ in 0..20 {
            let app = TestApp::new();
            let cast = Cast::new(&app);
            let (project, record) = assigned_project(&app, &cast).await;

            let academic = {
                let service = app.service.clone();
                let ctx = cast.lecturer.ctx.clone();
                tokio::spawn(async move {
                    service
                        .submit_score(
                            record.id,
                            &ctx,
                            CuratorTrack::Academic,
                            sheet([4, 4, 4, 4, 3, 3]),
                            None,
                        )
                        .await
                })
            };
            let partner = {
                let service = app.service.clone();
                let ctx = cast.partner.ctx.clone();
                tokio::spawn(async move {
                    service
                        .submit_score(
                            record.id,
                            &ctx,
                            CuratorTrack::Partner,
                            sheet([3, 3, 4, 3, 3, 3]),
                            None,
                        )
                        .await
                })
            };

            academic.await.unwrap().unwrap();
            partner.await.unwrap().unwrap();

            let details = app
                .service
                .curation_details(record.id, &cast.business_unit.ctx)
                .await
                .unwrap();
            assert_eq!(details.curation.status, CurationStatus::Complete);
            assert_eq!(details.curation.final_score, Some(Decimal::new(350, 2)));
            assert!(details.rubric.iter().all(|e| e.score.is_some()));

            let project = app
                .service
                .project_details(project.id, &cast.business_unit.ctx)
                .await
                .unwrap();
            assert_eq!(project.curation_status, ProjectStatus::AssessmentComplete);
        }
    }

    /// Store whose saves always lose the race
    struct AlwaysConflicting {
        inner: InMemoryCurationStore,
        saves: AtomicUsize,
    }

    #[async_trait]
    impl CurationStore for AlwaysConflicting {
        async fn insert_project(&self, project: &Project) -> Result<(), RepositoryError> {
            self.inner.insert_project(project).await
        }

        async fn load(&self, id: Uuid) -> Result<Option<CurationAggregate>, RepositoryError> {
            self.inner.load(id).await
        }

        async fn load_by_curation(
            &self,
            id: Uuid,
        ) -> Result<Option<CurationAggregate>, RepositoryError> {
            self.inner.load_by_curation(id).await
        }

        async fn save(
            &self,
            aggregate: &CurationAggregate,
        ) -> Result<CurationAggregate, RepositoryError> {
            self.saves.fetch_add(1, Ordering::SeqCst);
            Err(RepositoryError::VersionConflict {
                expected: aggregate.version(),
                found: aggregate.version() + 1,
            })
        }

        async fn delete_project(&self, id: Uuid, version: i64) -> Result<(), RepositoryError> {
            self.inner.delete_project(id, version).await
        }

        async fn list_published(
            &self,
            query: &CatalogQuery,
        ) -> Result<Vec<Project>, RepositoryError> {
            self.inner.list_published(query).await
        }

        async fn list_projects(
            &self,
            filter: ProjectFilter,
        ) -> Result<Vec<Project>, RepositoryError> {
            self.inner.list_projects(filter).await
        }

        async fn list_curations(
            &self,
            filter: CurationFilter,
        ) -> Result<Vec<CurationAggregate>, RepositoryError> {
            self.inner.list_curations(filter).await
        }

        async fn insert_access_request(
            &self,
            request: &AccessRequest,
        ) -> Result<(), RepositoryError> {
            self.inner.insert_access_request(request).await
        }

        async fn find_access_request(
            &self,
            id: Uuid,
        ) -> Result<Option<AccessRequest>, RepositoryError> {
            self.inner.find_access_request(id).await
        }

        async fn complete_access_review(
            &self,
            request: &AccessRequest,
        ) -> Result<bool, RepositoryError> {
            self.inner.complete_access_review(request).await
        }

        async fn list_access_requests(
            &self,
            project_id: Uuid,
        ) -> Result<Vec<AccessRequest>, RepositoryError> {
            self.inner.list_access_requests(project_id).await
        }
    }

    #[tokio::test]
    async fn test_retries_are_bounded() {
        let store = Arc::new(AlwaysConflicting {
            inner: InMemoryCurationStore::new(),
            saves: AtomicUsize::new(0),
        });
        let app = TestApp::with_store(
            CurationSettings {
                max_write_attempts: 4,
                ..CurationSettings::default()
            },
            store.clone(),
        );
        let cast = Cast::new(&app);
        let project = app
            .service
            .submit_project(&cast.student.ctx, submission("Contended"))
            .await
            .unwrap();

        let result = app
            .service
            .select_for_curation(project.id, &cast.business_unit.ctx)
            .await;
        assert!(matches!(result, Err(Error::Conflict(_))));
        assert_eq!(store.saves.load(Ordering::SeqCst), 4);
        assert!(app.notifier.recorded().is_empty());
    }
}
