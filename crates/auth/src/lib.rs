//! Authentication and authorization for the Gagasan workflow
//!
//! Provides JWT validation, the identity provider collaborator, the
//! role → capability mapping every core operation checks against, and an axum
//! extractor that works with any state implementing `FromRef<S>` for `AuthBackend`.

mod backend;
mod claims;
mod config;
mod context;
mod error;
mod extractors;
mod identity;
mod jwt;
mod types;

pub use backend::AuthBackend;
pub use claims::AccessClaims;
pub use config::AuthConfig;
pub use context::AuthContext;
pub use error::AuthError;
pub use extractors::AuthUser;
pub use identity::{IdentityProvider, InMemoryIdentityProvider, PgIdentityProvider};
pub use jwt::issue_token;
pub use types::{AuthIdentity, Capability, UserRole};
