//! Identity provider collaborator
//!
//! The workflow engine needs nothing from the user system except `{id, role}`
//! and whether the account is usable. Registration, approval and profile
//! management live elsewhere.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AuthError;
use crate::types::AuthIdentity;

/// Lookup of user identities by ID
#[async_trait::async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn find_identity(&self, id: Uuid) -> Result<Option<AuthIdentity>, AuthError>;
}

/// Identity provider backed by the `users` table
#[derive(Clone)]
pub struct PgIdentityProvider {
    pool: PgPool,
}

impl PgIdentityProvider {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait::async_trait]
impl IdentityProvider for PgIdentityProvider {
    async fn find_identity(&self, id: Uuid) -> Result<Option<AuthIdentity>, AuthError> {
        sqlx::query_as::<_, AuthIdentity>(
            r#"
            SELECT id, username, email, role, is_approved, active, created_at
            FROM users
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| {
            tracing::error!(error = %e, user_id = %id, "Failed to load user");
            AuthError::UserLoadError
        })
    }
}

/// In-memory identity provider for tests and local development
#[derive(Debug, Clone, Default)]
pub struct InMemoryIdentityProvider {
    users: Arc<RwLock<HashMap<Uuid, AuthIdentity>>>,
}

impl InMemoryIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register (or replace) an identity
    pub fn insert(&self, identity: AuthIdentity) -> Result<(), AuthError> {
        self.users
            .write()
            .map_err(|_| AuthError::UserLoadError)?
            .insert(identity.id, identity);
        Ok(())
    }
}

#[async_trait::async_trait]
impl IdentityProvider for InMemoryIdentityProvider {
    async fn find_identity(&self, id: Uuid) -> Result<Option<AuthIdentity>, AuthError> {
        let users = self.users.read().map_err(|_| AuthError::UserLoadError)?;
        Ok(users.get(&id).cloned())
    }
}
