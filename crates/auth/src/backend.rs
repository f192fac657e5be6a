//! Concrete authentication backend
//!
//! Wraps an identity provider + `AuthConfig` and turns bearer tokens into an
//! `AuthContext`.

use std::sync::Arc;

use uuid::Uuid;

use crate::config::AuthConfig;
use crate::context::AuthContext;
use crate::error::AuthError;
use crate::identity::IdentityProvider;
use crate::jwt::validate_jwt_token;
use crate::types::AuthIdentity;

/// Concrete authentication backend.
///
/// Domain states expose this via `FromRef`:
/// ```ignore
/// impl FromRef<MyDomainState> for AuthBackend {
///     fn from_ref(state: &MyDomainState) -> Self {
///         state.auth.clone()
///     }
/// }
/// ```
#[derive(Clone)]
pub struct AuthBackend {
    identities: Arc<dyn IdentityProvider>,
    config: AuthConfig,
}

impl AuthBackend {
    pub fn new(identities: Arc<dyn IdentityProvider>, config: AuthConfig) -> Self {
        Self { identities, config }
    }

    pub fn config(&self) -> &AuthConfig {
        &self.config
    }

    pub fn identities(&self) -> Arc<dyn IdentityProvider> {
        Arc::clone(&self.identities)
    }

    /// Validate a JWT and build the actor's context
    pub async fn authenticate_jwt(&self, token: &str) -> Result<AuthContext, AuthError> {
        let claims = validate_jwt_token(token, &self.config)?;

        let user_id = Uuid::parse_str(&claims.sub).map_err(|_| AuthError::InvalidUserId)?;

        let identity = self
            .identities
            .find_identity(user_id)
            .await?
            .ok_or(AuthError::UserNotFound)?;

        ensure_enabled(&identity)?;

        Ok(AuthContext::new(identity))
    }
}

fn ensure_enabled(identity: &AuthIdentity) -> Result<(), AuthError> {
    if !identity.is_approved {
        tracing::debug!(user_id = %identity.id, "Rejected unapproved account");
        return Err(AuthError::AccountNotApproved);
    }
    if !identity.active {
        tracing::debug!(user_id = %identity.id, "Rejected inactive account");
        return Err(AuthError::AccountInactive);
    }
    Ok(())
}
