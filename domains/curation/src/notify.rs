//! Notification hooks for curation events
//!
//! The service signals a notifier after each committed change. Delivery is
//! best-effort: a failing notifier is logged and never fails the operation.

use std::sync::{Arc, Mutex};

use rust_decimal::Decimal;
use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::domain::decision::DecisionCategory;
use crate::domain::entities::CuratorTrack;
use crate::domain::state::AccessRequestStatus;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifyError {
    #[error("Notification delivery failed: {0}")]
    Delivery(String),
}

/// A committed workflow change worth telling someone about
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum CurationNotification {
    ProjectSelected {
        project_id: Uuid,
        owner_id: Uuid,
    },
    CuratorsAssigned {
        project_id: Uuid,
        curation_id: Uuid,
        academic_curator_id: Uuid,
        partner_curator_id: Uuid,
    },
    TrackScored {
        project_id: Uuid,
        curation_id: Uuid,
        track: CuratorTrack,
        score: Decimal,
    },
    AssessmentComplete {
        project_id: Uuid,
        curation_id: Uuid,
        final_score: Decimal,
        suggested: DecisionCategory,
    },
    DecisionIssued {
        project_id: Uuid,
        owner_id: Uuid,
        decision: DecisionCategory,
    },
    ProjectPublished {
        project_id: Uuid,
        owner_id: Uuid,
    },
    AccessReviewed {
        request_id: Uuid,
        project_id: Uuid,
        requester_id: Uuid,
        status: AccessRequestStatus,
    },
}

impl CurationNotification {
    pub fn name(&self) -> &'static str {
        match self {
            Self::ProjectSelected { .. } => "project_selected",
            Self::CuratorsAssigned { .. } => "curators_assigned",
            Self::TrackScored { .. } => "track_scored",
            Self::AssessmentComplete { .. } => "assessment_complete",
            Self::DecisionIssued { .. } => "decision_issued",
            Self::ProjectPublished { .. } => "project_published",
            Self::AccessReviewed { .. } => "access_reviewed",
        }
    }
}

/// Notification sink
#[async_trait::async_trait]
pub trait CurationNotifier: Send + Sync {
    async fn notify(&self, notification: CurationNotification) -> Result<(), NotifyError>;
}

/// Emits each notification as a structured log line
#[derive(Debug, Clone, Default)]
pub struct TracingNotifier;

#[async_trait::async_trait]
impl CurationNotifier for TracingNotifier {
    async fn notify(&self, notification: CurationNotification) -> Result<(), NotifyError> {
        let payload = serde_json::to_string(&notification)
            .map_err(|e| NotifyError::Delivery(e.to_string()))?;
        tracing::info!(event = notification.name(), payload = %payload, "Curation notification");
        Ok(())
    }
}

/// Mock notifier that records notifications for test assertions
#[derive(Debug, Clone, Default)]
pub struct MockNotifier {
    sent: Arc<Mutex<Vec<CurationNotification>>>,
    failing: bool,
}

impl MockNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// A notifier whose every delivery fails
    pub fn failing() -> Self {
        Self {
            failing: true,
            ..Self::default()
        }
    }

    /// Return all recorded notifications
    pub fn recorded(&self) -> Vec<CurationNotification> {
        self.sent.lock().map(|sent| sent.clone()).unwrap_or_default()
    }

    /// Names of recorded notifications, in order
    pub fn recorded_names(&self) -> Vec<&'static str> {
        self.recorded().iter().map(CurationNotification::name).collect()
    }

    pub fn reset(&self) {
        if let Ok(mut sent) = self.sent.lock() {
            sent.clear();
        }
    }
}

#[async_trait::async_trait]
impl CurationNotifier for MockNotifier {
    async fn notify(&self, notification: CurationNotification) -> Result<(), NotifyError> {
        if self.failing {
            return Err(NotifyError::Delivery("mock notifier set to fail".to_string()));
        }
        tracing::debug!(event = notification.name(), "Mock notifier: recording notification");
        self.sent
            .lock()
            .map_err(|e| NotifyError::Delivery(format!("notification lock poisoned: {e}")))?
            .push(notification);
        Ok(())
    }
}
