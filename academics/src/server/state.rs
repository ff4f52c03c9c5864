//! Application state for the HTTP server.

use crate::access::{AccessContext, CredentialVerifier};
use crate::orchestrator::{Orchestrator, TransactionStore};
use crate::queries::RecordQueries;
use academic_gate_web::BearerToken;
use axum::extract::FromRef;
use std::sync::Arc;

/// State shared across all handlers. Cheap to clone.
#[derive(Clone)]
pub struct AppState {
    /// Transaction orchestrator (write side)
    pub orchestrator: Orchestrator,
    /// Record queries (read side)
    pub queries: RecordQueries,
    /// Resolves bearer credentials
    pub verifier: Arc<dyn CredentialVerifier>,
}

impl AppState {
    /// Create the application state
    #[must_use]
    pub fn new(
        orchestrator: Orchestrator,
        queries: RecordQueries,
        verifier: Arc<dyn CredentialVerifier>,
    ) -> Self {
        Self {
            orchestrator,
            queries,
            verifier,
        }
    }

    /// Resolve the caller of a request
    #[must_use]
    pub fn access(&self, token: &BearerToken) -> AccessContext {
        self.verifier.resolve(token.as_deref())
    }
}

impl FromRef<AppState> for Arc<TransactionStore> {
    fn from_ref(state: &AppState) -> Self {
        Arc::clone(state.orchestrator.store())
    }
}
