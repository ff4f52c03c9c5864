//! Health check endpoints.
//!
//! `GET /health` is pure liveness. `GET /health/ready` reports whether the
//! store is still accepting actions and how many effects are in flight.

use academic_gate_core::reducer::Reducer;
use academic_gate_runtime::Store;
use axum::{Json, extract::State, http::StatusCode};
use serde::Serialize;
use std::sync::Arc;

/// Readiness body.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct Readiness {
    /// `ready` or `draining`
    pub status: &'static str,
    /// Effects currently executing in the store
    pub pending_effects: usize,
}

/// Liveness: always 200 while the process serves requests.
#[allow(clippy::unused_async)]
pub async fn health_check() -> (StatusCode, &'static str) {
    (StatusCode::OK, "ok")
}

/// Readiness: 503 once the store has begun shutting down.
pub async fn readiness<S, A, E, R>(
    State(store): State<Arc<Store<S, A, E, R>>>,
) -> (StatusCode, Json<Readiness>)
where
    R: Reducer<State = S, Action = A, Environment = E> + Send + Sync + 'static,
    S: Send + Sync + 'static,
    A: Send + Clone + 'static,
    E: Send + Sync + 'static,
{
    let pending_effects = store.pending_effects();

    if store.is_shutting_down() {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(Readiness {
                status: "draining",
                pending_effects,
            }),
        )
    } else {
        (
            StatusCode::OK,
            Json(Readiness {
                status: "ready",
                pending_effects,
            }),
        )
    }
}
