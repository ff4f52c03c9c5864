//! Student transactions.
//!
//! - `POST /api/exams` `{title}` - register for the final exam
//! - `POST /api/graduations` `{period}` - register for graduation
//! - `POST /api/course-loads` `{term, items}` - submit or replace a course load
//!
//! All three answer 201 with the stored record.

use super::{access_error, json_body, outcome_response};
use crate::server::AppState;
use crate::types::{self, CourseLoadDraftItem};
use academic_gate_web::{BearerToken, CorrelationId, WebResult};
use axum::{
    Json,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Response,
};
use serde::Deserialize;

/// Body of `POST /api/exams`
#[derive(Debug, Deserialize)]
pub struct RegisterExamRequest {
    /// Thesis title
    pub title: String,
}

/// Body of `POST /api/graduations`
#[derive(Debug, Deserialize)]
pub struct RegisterGraduationRequest {
    /// Graduation period, e.g. `2025/2026-Genap`
    pub period: String,
}

/// Body of `POST /api/course-loads`
#[derive(Debug, Deserialize)]
pub struct SubmitCourseLoadRequest {
    /// Academic term
    pub term: String,
    /// Courses
    #[serde(default)]
    pub items: Vec<CourseLoadDraftItem>,
}

/// Register the caller for the final exam.
///
/// # Errors
///
/// 401 anonymous, 422 blank title, 412 tuition or clearance denied,
/// 503 remote service unavailable.
pub async fn register_exam(
    State(state): State<AppState>,
    CorrelationId(cid): CorrelationId,
    token: BearerToken,
    payload: Result<Json<RegisterExamRequest>, JsonRejection>,
) -> WebResult<Response> {
    let access = state.access(&token);
    access.require_subject().map_err(access_error)?;
    let request = json_body(payload)?;

    let outcome = state
        .orchestrator
        .register_exam(types::CorrelationId::from_uuid(cid), access, request.title)
        .await;
    outcome_response(outcome, StatusCode::CREATED)
}

/// Register the caller for graduation.
///
/// # Errors
///
/// 401 anonymous, 422 blank period, 412 standing, tuition, clearance or exam
/// precedence denied, 409 already registered for the period, 503 remote
/// service unavailable.
pub async fn register_graduation(
    State(state): State<AppState>,
    CorrelationId(cid): CorrelationId,
    token: BearerToken,
    payload: Result<Json<RegisterGraduationRequest>, JsonRejection>,
) -> WebResult<Response> {
    let access = state.access(&token);
    access.require_subject().map_err(access_error)?;
    let request = json_body(payload)?;

    let outcome = state
        .orchestrator
        .register_graduation(
            types::CorrelationId::from_uuid(cid),
            access,
            request.period,
        )
        .await;
    outcome_response(outcome, StatusCode::CREATED)
}

/// Submit or replace the caller's course load for a term.
///
/// # Errors
///
/// 401 anonymous, 422 invalid items, 412 standing or tuition denied,
/// 409 concurrent submission, 503 remote service unavailable.
pub async fn submit_course_load(
    State(state): State<AppState>,
    CorrelationId(cid): CorrelationId,
    token: BearerToken,
    payload: Result<Json<SubmitCourseLoadRequest>, JsonRejection>,
) -> WebResult<Response> {
    let access = state.access(&token);
    access.require_subject().map_err(access_error)?;
    let request = json_body(payload)?;

    let outcome = state
        .orchestrator
        .submit_course_load(
            types::CorrelationId::from_uuid(cid),
            access,
            request.term,
            request.items,
        )
        .await;
    outcome_response(outcome, StatusCode::CREATED)
}
