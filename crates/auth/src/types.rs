//! Identity read-model types and the role → capability mapping

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Lightweight identity for authenticated users.
///
/// Carries only what authorization needs: who the user is and which role
/// they hold. Profile data (study programme, organisation) stays with the
/// registration system.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
pub struct AuthIdentity {
    pub id: Uuid,
    pub username: String,
    pub email: Option<String>,
    pub role: UserRole,
    pub is_approved: bool,
    pub active: bool,
    pub created_at: DateTime<Utc>,
}

impl AuthIdentity {
    /// Create an approved, active identity
    pub fn new(username: impl Into<String>, role: UserRole) -> Self {
        Self {
            id: Uuid::new_v4(),
            username: username.into(),
            email: None,
            role,
            is_approved: true,
            active: true,
            created_at: Utc::now(),
        }
    }

    /// Approved and not deactivated by the business unit
    pub fn is_enabled(&self) -> bool {
        self.is_approved && self.active
    }
}

/// User role as registered
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "user_role", rename_all = "kebab-case")]
#[serde(rename_all = "kebab-case")]
pub enum UserRole {
    Student,
    Lecturer,
    Partner,
    BusinessUnit,
}

impl UserRole {
    /// Capabilities granted to this role
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            Self::Student => &[
                Capability::SubmitProject,
                Capability::DeleteProject,
                Capability::RequestAccess,
            ],
            Self::Lecturer => &[
                Capability::SubmitProject,
                Capability::DeleteProject,
                Capability::CurateAcademic,
                Capability::RequestAccess,
            ],
            Self::Partner => &[Capability::CuratePartner, Capability::RequestAccess],
            Self::BusinessUnit => &[
                Capability::ManageCuration,
                Capability::DeleteProject,
                Capability::RequestAccess,
            ],
        }
    }

    pub fn has(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl std::fmt::Display for UserRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Student => write!(f, "student"),
            Self::Lecturer => write!(f, "lecturer"),
            Self::Partner => write!(f, "partner"),
            Self::BusinessUnit => write!(f, "business-unit"),
        }
    }
}

impl std::str::FromStr for UserRole {
    type Err = gagasan_common::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "student" => Ok(Self::Student),
            "lecturer" => Ok(Self::Lecturer),
            "partner" => Ok(Self::Partner),
            "business-unit" => Ok(Self::BusinessUnit),
            other => Err(gagasan_common::Error::Validation(format!(
                "Unknown role: {}",
                other
            ))),
        }
    }
}

/// An action class gated by role
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    /// Submit a project to the repository
    SubmitProject,
    /// Delete a project (own pending ones, or any for the business unit)
    DeleteProject,
    /// Select, assign, decide, publish, delete at any status
    ManageCuration,
    /// Score on the academic track
    CurateAcademic,
    /// Score on the industry-partner track
    CuratePartner,
    /// Ask a project owner for source material
    RequestAccess,
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SubmitProject => write!(f, "submit-project"),
            Self::DeleteProject => write!(f, "delete-project"),
            Self::ManageCuration => write!(f, "manage-curation"),
            Self::CurateAcademic => write!(f, "curate-academic"),
            Self::CuratePartner => write!(f, "curate-partner"),
            Self::RequestAccess => write!(f, "request-access"),
        }
    }
}
