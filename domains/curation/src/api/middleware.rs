//! Curation domain state and auth backend integration

use axum::extract::FromRef;
use gagasan_auth::AuthBackend;

use crate::service::CurationService;

pub use gagasan_auth::AuthUser;

/// Application state for the Curation domain
#[derive(Clone)]
pub struct CurationState {
    pub service: CurationService,
    pub auth: AuthBackend,
}

impl FromRef<CurationState> for AuthBackend {
    fn from_ref(state: &CurationState) -> Self {
        state.auth.clone()
    }
}
