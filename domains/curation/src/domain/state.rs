//! State machines for curation domain entities
//!
//! Each state machine defines:
//! - Valid states (persisted as PostgreSQL enums)
//! - Events that trigger transitions
//! - Guard conditions for transitions
//! - Terminal states

use serde::{Deserialize, Serialize};

use super::decision::DecisionCategory;

pub use gagasan_common::StateError;

// ============================================================================
// Project Lifecycle State Machine
// ============================================================================

/// Top-level curation status of a project
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "curation_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum ProjectStatus {
    Pending,
    Selected,
    CuratorsAssigned,
    AssessmentComplete,
    ReadyForPublication,
    RevisionMinor,
    NeedsCoaching,
    Rejected,
    Published,
}

impl ProjectStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::NeedsCoaching | Self::Rejected | Self::Published)
    }

    /// Get all valid next states from current state (ignoring guards)
    pub fn valid_transitions(&self) -> &'static [ProjectStatus] {
        match self {
            Self::Pending => &[Self::Selected],
            Self::Selected => &[Self::CuratorsAssigned],
            Self::CuratorsAssigned => &[Self::CuratorsAssigned, Self::AssessmentComplete],
            Self::AssessmentComplete => &[
                Self::ReadyForPublication,
                Self::RevisionMinor,
                Self::NeedsCoaching,
                Self::Rejected,
            ],
            Self::ReadyForPublication => &[Self::Published],
            Self::RevisionMinor => &[Self::Published],
            Self::NeedsCoaching => &[],
            Self::Rejected => &[],
            Self::Published => &[],
        }
    }

    /// Whether a decision has been committed
    pub fn is_decided(&self) -> bool {
        matches!(
            self,
            Self::ReadyForPublication
                | Self::RevisionMinor
                | Self::NeedsCoaching
                | Self::Rejected
                | Self::Published
        )
    }
}

impl std::fmt::Display for ProjectStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Selected => write!(f, "selected"),
            Self::CuratorsAssigned => write!(f, "curators-assigned"),
            Self::AssessmentComplete => write!(f, "assessment-complete"),
            Self::ReadyForPublication => write!(f, "ready-for-publication"),
            Self::RevisionMinor => write!(f, "revision-minor"),
            Self::NeedsCoaching => write!(f, "needs-coaching"),
            Self::Rejected => write!(f, "rejected"),
            Self::Published => write!(f, "published"),
        }
    }
}

/// Events that trigger project state transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ProjectEvent {
    /// Business unit selects the project for curation
    Select,
    /// Business unit assigns (or reassigns) both curators
    AssignCurators,
    /// Both curator tracks finished scoring
    CompleteAssessment,
    /// Business unit commits a decision
    Decide(DecisionCategory),
    /// Business unit publishes the project
    Publish,
}

impl std::fmt::Display for ProjectEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Select => write!(f, "select"),
            Self::AssignCurators => write!(f, "assign_curators"),
            Self::CompleteAssessment => write!(f, "complete_assessment"),
            Self::Decide(category) => write!(f, "decide({})", category),
            Self::Publish => write!(f, "publish"),
        }
    }
}

/// Guard context for project transitions
#[derive(Debug, Clone, Default)]
pub struct ProjectGuardContext {
    /// Whether `revision-minor` may be published directly
    pub publish_minor_revisions: bool,
    /// Current value of the project's `published` flag
    pub already_published: bool,
}

/// Project lifecycle state machine
pub struct ProjectStateMachine;

impl ProjectStateMachine {
    /// Attempt a state transition with guard conditions
    pub fn transition(
        current: ProjectStatus,
        event: ProjectEvent,
        context: Option<&ProjectGuardContext>,
    ) -> Result<ProjectStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (&current, &event) {
            (ProjectStatus::Pending, ProjectEvent::Select) => ProjectStatus::Selected,

            (ProjectStatus::Selected, ProjectEvent::AssignCurators)
            | (ProjectStatus::CuratorsAssigned, ProjectEvent::AssignCurators) => {
                ProjectStatus::CuratorsAssigned
            }

            (ProjectStatus::CuratorsAssigned, ProjectEvent::CompleteAssessment) => {
                ProjectStatus::AssessmentComplete
            }

            (ProjectStatus::AssessmentComplete, ProjectEvent::Decide(category)) => {
                category.status()
            }

            (ProjectStatus::ReadyForPublication, ProjectEvent::Publish)
            | (ProjectStatus::RevisionMinor, ProjectEvent::Publish) => {
                if let Some(ctx) = context {
                    // Guard: publication is a one-shot step
                    if ctx.already_published {
                        return Err(StateError::GuardFailed(
                            "Project is already published".to_string(),
                        ));
                    }
                    // Guard: minor revisions may need another review first
                    if current == ProjectStatus::RevisionMinor && !ctx.publish_minor_revisions {
                        return Err(StateError::GuardFailed(
                            "Projects needing minor revision cannot be published directly"
                                .to_string(),
                        ));
                    }
                }
                ProjectStatus::Published
            }

            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(
        current: ProjectStatus,
        event: &ProjectEvent,
        context: Option<&ProjectGuardContext>,
    ) -> bool {
        Self::transition(current, *event, context).is_ok()
    }
}

// ============================================================================
// Curation Record State Machine
// ============================================================================

/// Aggregate status of the two-track review
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "curation_record_status", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum CurationStatus {
    AwaitingAssignment,
    InProgress,
    AcademicDone,
    PartnerDone,
    Complete,
}

impl CurationStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [CurationStatus] {
        match self {
            Self::AwaitingAssignment => &[Self::InProgress],
            Self::InProgress => &[Self::InProgress, Self::AcademicDone, Self::PartnerDone],
            Self::AcademicDone => &[Self::InProgress, Self::Complete],
            Self::PartnerDone => &[Self::InProgress, Self::Complete],
            Self::Complete => &[],
        }
    }
}

impl std::fmt::Display for CurationStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::AwaitingAssignment => write!(f, "awaiting-assignment"),
            Self::InProgress => write!(f, "in-progress"),
            Self::AcademicDone => write!(f, "academic-done"),
            Self::PartnerDone => write!(f, "partner-done"),
            Self::Complete => write!(f, "complete"),
        }
    }
}

/// Events that trigger curation record transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CurationEvent {
    /// Curators assigned or reassigned; resets both tracks
    Assign,
    /// The academic curator submitted a full score sheet
    AcademicSubmitted,
    /// The partner curator submitted a full score sheet
    PartnerSubmitted,
}

impl std::fmt::Display for CurationEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Assign => write!(f, "assign"),
            Self::AcademicSubmitted => write!(f, "academic_submitted"),
            Self::PartnerSubmitted => write!(f, "partner_submitted"),
        }
    }
}

/// Guard context for curation record transitions
#[derive(Debug, Clone, Default)]
pub struct CurationGuardContext {
    /// Academic track score is present
    pub academic_scored: bool,
    /// Partner track score is present
    pub partner_scored: bool,
}

/// Curation record state machine
pub struct CurationStateMachine;

impl CurationStateMachine {
    /// Attempt a state transition with guard conditions
    pub fn transition(
        current: CurationStatus,
        event: CurationEvent,
        context: Option<&CurationGuardContext>,
    ) -> Result<CurationStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        let next = match (&current, &event) {
            (_, CurationEvent::Assign) => CurationStatus::InProgress,

            (CurationStatus::InProgress, CurationEvent::AcademicSubmitted) => {
                CurationStatus::AcademicDone
            }
            (CurationStatus::InProgress, CurationEvent::PartnerSubmitted) => {
                CurationStatus::PartnerDone
            }

            (CurationStatus::PartnerDone, CurationEvent::AcademicSubmitted)
            | (CurationStatus::AcademicDone, CurationEvent::PartnerSubmitted) => {
                // Guard: both track scores must be present to complete
                if let Some(ctx) = context {
                    if !(ctx.academic_scored && ctx.partner_scored) {
                        return Err(StateError::GuardFailed(
                            "Both track scores are required to complete curation".to_string(),
                        ));
                    }
                }
                CurationStatus::Complete
            }

            _ => {
                return Err(StateError::InvalidTransition {
                    from: current.to_string(),
                    event: event.to_string(),
                });
            }
        };

        Ok(next)
    }

    /// Check if a transition is valid without performing it
    pub fn can_transition(
        current: CurationStatus,
        event: &CurationEvent,
        context: Option<&CurationGuardContext>,
    ) -> bool {
        Self::transition(current, *event, context).is_ok()
    }
}

// ============================================================================
// Access Request State Machine
// ============================================================================

/// Status of a source-material access request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "access_request_status", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum AccessRequestStatus {
    Pending,
    Approved,
    Rejected,
}

impl AccessRequestStatus {
    /// Check if this is a terminal state
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Approved | Self::Rejected)
    }

    /// Get all valid next states from current state
    pub fn valid_transitions(&self) -> &'static [AccessRequestStatus] {
        match self {
            Self::Pending => &[Self::Approved, Self::Rejected],
            Self::Approved => &[],
            Self::Rejected => &[],
        }
    }
}

impl std::fmt::Display for AccessRequestStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Approved => write!(f, "approved"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Events that trigger access request transitions
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AccessRequestEvent {
    Approve,
    Reject,
}

impl std::fmt::Display for AccessRequestEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Approve => write!(f, "approve"),
            Self::Reject => write!(f, "reject"),
        }
    }
}

/// Access request state machine
pub struct AccessRequestStateMachine;

impl AccessRequestStateMachine {
    pub fn transition(
        current: AccessRequestStatus,
        event: AccessRequestEvent,
    ) -> Result<AccessRequestStatus, StateError> {
        if current.is_terminal() {
            return Err(StateError::TerminalState(current.to_string()));
        }

        match (current, event) {
            (AccessRequestStatus::Pending, AccessRequestEvent::Approve) => {
                Ok(AccessRequestStatus::Approved)
            }
            (AccessRequestStatus::Pending, AccessRequestEvent::Reject) => {
                Ok(AccessRequestStatus::Rejected)
            }
            _ => Err(StateError::InvalidTransition {
                from: current.to_string(),
                event: event.to_string(),
            }),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
