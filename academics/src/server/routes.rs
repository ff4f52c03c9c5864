//! HTTP route configuration.

use super::state::AppState;
use crate::api::{admin, me, transactions};
use crate::orchestrator::{OrchestratorEnvironment, OrchestratorState, TransactionAction, TransactionReducer};
use academic_gate_web::correlation_id_layer;
use academic_gate_web::handlers::{health_check, readiness};
use axum::{
    Router,
    routing::{get, post, put},
};
use tower_http::trace::TraceLayer;

/// Build the application router.
///
/// ```text
/// GET  /health                               liveness
/// GET  /health/ready                         readiness
/// POST /api/exams                            register exam
/// POST /api/graduations                      register graduation
/// POST /api/course-loads                     submit course load
/// PUT  /api/admin/exams/:id/status           admin status update
/// PUT  /api/admin/graduations/:id/status     admin status update
/// PUT  /api/admin/course-loads/:id/status    admin status update
/// GET  /api/me/exams                         own exam registrations
/// GET  /api/me/graduations                   own graduation registrations
/// GET  /api/me/course-loads                  own course-load history
/// GET  /api/me/course-loads/:term            own course load for a term
/// ```
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        // Transactions
        .route("/exams", post(transactions::register_exam))
        .route("/graduations", post(transactions::register_graduation))
        .route("/course-loads", post(transactions::submit_course_load))
        // Administration
        .route("/admin/exams/:id/status", put(admin::update_exam_status))
        .route(
            "/admin/graduations/:id/status",
            put(admin::update_graduation_status),
        )
        .route(
            "/admin/course-loads/:id/status",
            put(admin::update_course_load_status),
        )
        // Own records
        .route("/me/exams", get(me::my_exams))
        .route("/me/graduations", get(me::my_graduations))
        .route("/me/course-loads", get(me::my_course_loads))
        .route("/me/course-loads/:term", get(me::my_course_load));

    Router::new()
        .route("/health", get(health_check))
        .route(
            "/health/ready",
            get(readiness::<
                OrchestratorState,
                TransactionAction,
                OrchestratorEnvironment,
                TransactionReducer,
            >),
        )
        .nest("/api", api_routes)
        .layer(axum::middleware::from_fn(correlation_id_layer))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
