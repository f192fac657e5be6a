//! Curation domain: projects, two-track rubric scoring, decisions, publication,
//! access requests

pub mod api;
pub mod domain;
pub mod notify;
pub mod repository;
pub mod service;

// Re-export domain types at the crate root for convenience
pub use domain::aggregate::CurationAggregate;
pub use domain::decision::{DecisionCategory, DecisionPolicy, DecisionSuggestion, PublicationPolicy};
pub use domain::entities::*;
pub use domain::rubric::{RubricAspect, RubricDefinition};
pub use domain::scoring::{ScoreSheet, ScoringEngine, ScoringError};
pub use domain::state::{
    AccessRequestEvent, AccessRequestStateMachine, AccessRequestStatus, CurationEvent,
    CurationStateMachine, CurationStatus, ProjectEvent, ProjectGuardContext, ProjectStateMachine,
    ProjectStatus, StateError,
};

// Re-export infrastructure types
pub use api::{routes, CurationState};
pub use notify::{CurationNotification, CurationNotifier, MockNotifier, TracingNotifier};
pub use repository::{CurationStore, InMemoryCurationStore, PgCurationStore};
pub use service::CurationService;
