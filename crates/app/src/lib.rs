//! Gagasan application composition root
//!
//! Picks the store and identity provider from configuration and composes the
//! curation router with the shared infrastructure routes.

use std::sync::Arc;

use axum::Router;
use gagasan_auth::{
    issue_token, AuthBackend, AuthConfig, AuthIdentity, IdentityProvider,
    InMemoryIdentityProvider, PgIdentityProvider, UserRole,
};
use gagasan_common::{Config, StoreProvider};
use gagasan_curation::{
    CurationNotifier, CurationService, CurationState, CurationStore, InMemoryCurationStore,
    PgCurationStore, TracingNotifier,
};
use sqlx::postgres::PgPoolOptions;

/// Lifetime of the tokens printed for seeded users
const SEED_TOKEN_TTL_SECONDS: i64 = 24 * 60 * 60;

/// Collaborators the application is assembled from
pub struct AppParts {
    pub store: Arc<dyn CurationStore>,
    pub identities: Arc<dyn IdentityProvider>,
    pub notifier: Arc<dyn CurationNotifier>,
}

impl AppParts {
    /// Connect to the configured store and run migrations when it is PostgreSQL
    pub async fn from_config(config: &Config) -> Result<Self, anyhow::Error> {
        let notifier: Arc<dyn CurationNotifier> = Arc::new(TracingNotifier);

        match config.store_provider {
            StoreProvider::Postgres => {
                let database_url = config
                    .database_url
                    .as_deref()
                    .ok_or_else(|| {
                        anyhow::anyhow!("DATABASE_URL is required for the postgres store")
                    })?;

                let pool = PgPoolOptions::new()
                    .max_connections(10)
                    .connect(database_url)
                    .await?;
                sqlx::migrate!("../../migrations").run(&pool).await?;
                tracing::info!("Database connection established and migrations applied");

                Ok(Self {
                    store: Arc::new(PgCurationStore::new(pool.clone())),
                    identities: Arc::new(PgIdentityProvider::new(pool)),
                    notifier,
                })
            }
            StoreProvider::Memory => {
                tracing::warn!("Using the in-memory store; all data is lost on shutdown");
                let identities = InMemoryIdentityProvider::new();
                let seeded = seed_identities(config, &identities)?;
                if seeded.is_empty() {
                    tracing::warn!(
                        "No MEMORY_SEED_USERS configured; every authenticated request will be rejected"
                    );
                }
                for (identity, token) in &seeded {
                    tracing::info!(
                        username = %identity.username,
                        role = %identity.role,
                        user_id = %identity.id,
                        token = %token,
                        "Seeded in-memory user"
                    );
                }

                Ok(Self {
                    store: Arc::new(InMemoryCurationStore::new()),
                    identities: Arc::new(identities),
                    notifier,
                })
            }
        }
    }
}

/// Register the configured seed users as approved, active accounts and
/// issue each a bearer token
pub fn seed_identities(
    config: &Config,
    identities: &InMemoryIdentityProvider,
) -> Result<Vec<(AuthIdentity, String)>, anyhow::Error> {
    let auth_config = AuthConfig::from_config(config);
    config
        .seed_users
        .iter()
        .map(|seed| -> Result<_, anyhow::Error> {
            let role: UserRole = seed.role.parse()?;
            let identity = AuthIdentity::new(seed.username.clone(), role);
            identities.insert(identity.clone())?;
            let token = issue_token(identity.id, &auth_config, SEED_TOKEN_TTL_SECONDS)?;
            Ok((identity, token))
        })
        .collect()
}

/// Build the router from already assembled collaborators
pub fn build_app(config: &Config, parts: AppParts) -> Router {
    let auth = AuthBackend::new(parts.identities.clone(), AuthConfig::from_config(config));
    let service = CurationService::new(
        parts.store,
        parts.identities,
        parts.notifier,
        config.curation,
    );

    Router::new()
        .route("/health", axum::routing::get(health_check))
        .route("/", axum::routing::get(|| async { "Gagasan API v0.1.0" }))
        .merge(gagasan_curation::routes().with_state(CurationState { service, auth }))
}

/// Create the main application router with all routes and middleware
pub async fn create_app(config: &Config) -> Result<Router, anyhow::Error> {
    let parts = AppParts::from_config(config).await?;
    Ok(build_app(config, parts))
}

/// Health check endpoint
async fn health_check() -> &'static str {
    "OK"
}
