//! Authorization context for authenticated users

use gagasan_common::Error;
use uuid::Uuid;

use crate::types::{AuthIdentity, Capability, UserRole};

/// The actor behind a request: identity plus role-derived capabilities
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub user: AuthIdentity,
}

impl AuthContext {
    pub fn new(user: AuthIdentity) -> Self {
        Self { user }
    }

    pub fn user_id(&self) -> Uuid {
        self.user.id
    }

    pub fn role(&self) -> UserRole {
        self.user.role
    }

    pub fn is_business_unit(&self) -> bool {
        self.user.role == UserRole::BusinessUnit
    }

    pub fn has_capability(&self, capability: Capability) -> bool {
        self.user.role.has(capability)
    }

    /// Single capability gate used by every core operation
    pub fn requires(&self, capability: Capability) -> Result<(), Error> {
        if self.has_capability(capability) {
            Ok(())
        } else {
            tracing::debug!(
                user_id = %self.user.id,
                role = %self.user.role,
                capability = %capability,
                "Capability check failed"
            );
            Err(Error::Unauthorized(format!(
                "role '{}' lacks capability '{}'",
                self.user.role, capability
            )))
        }
    }
}
