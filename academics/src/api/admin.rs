//! Administrator status updates.
//!
//! `PUT /api/admin/{exams|graduations|course-loads}/:id/status` `{status}`.
//! No remote precondition is re-checked.

use super::{access_error, json_body, outcome_response};
use crate::server::AppState;
use crate::types::{self, RecordId, RecordKind};
use academic_gate_web::{BearerToken, CorrelationId, WebResult};
use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;
use uuid::Uuid;

/// Body of a status update
#[derive(Debug, Deserialize)]
pub struct UpdateStatusRequest {
    /// New status
    pub status: String,
}

async fn update_status(
    state: AppState,
    cid: Uuid,
    token: &BearerToken,
    kind: RecordKind,
    id: Uuid,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> WebResult<Response> {
    let access = state.access(token);
    access.require_admin().map_err(access_error)?;
    let request = json_body(payload)?;

    let outcome = state
        .orchestrator
        .update_status(
            types::CorrelationId::from_uuid(cid),
            access,
            kind,
            RecordId::from_uuid(id),
            request.status,
        )
        .await;
    outcome_response(outcome, StatusCode::OK)
}

/// Set the status of an exam registration.
///
/// # Errors
///
/// 401, 403 non-admin, 422 blank status, 404 unknown id.
pub async fn update_exam_status(
    State(state): State<AppState>,
    CorrelationId(cid): CorrelationId,
    token: BearerToken,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> WebResult<Response> {
    update_status(state, cid, &token, RecordKind::Exam, id, payload).await
}

/// Set the status of a graduation registration.
///
/// # Errors
///
/// 401, 403 non-admin, 422 unknown status, 404 unknown id.
pub async fn update_graduation_status(
    State(state): State<AppState>,
    CorrelationId(cid): CorrelationId,
    token: BearerToken,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> WebResult<Response> {
    update_status(state, cid, &token, RecordKind::Graduation, id, payload).await
}

/// Set the status of a course load.
///
/// # Errors
///
/// 401, 403 non-admin, 422 unknown status, 404 unknown id.
pub async fn update_course_load_status(
    State(state): State<AppState>,
    CorrelationId(cid): CorrelationId,
    token: BearerToken,
    Path(id): Path<Uuid>,
    payload: Result<Json<UpdateStatusRequest>, JsonRejection>,
) -> WebResult<Response> {
    update_status(state, cid, &token, RecordKind::CourseLoad, id, payload).await
}
