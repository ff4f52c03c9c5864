//! The caller's own records.

use crate::server::AppState;
use crate::types::{CourseLoad, ExamRegistration, GraduationRegistration};
use academic_gate_web::{BearerToken, WebResult};
use axum::{
    Json,
    extract::{Path, State},
};

/// `GET /api/me/exams`
///
/// # Errors
///
/// 401 anonymous.
pub async fn my_exams(
    State(state): State<AppState>,
    token: BearerToken,
) -> WebResult<Json<Vec<ExamRegistration>>> {
    let access = state.access(&token);
    Ok(Json(state.queries.my_exams(&access).await?))
}

/// `GET /api/me/graduations`
///
/// # Errors
///
/// 401 anonymous.
pub async fn my_graduations(
    State(state): State<AppState>,
    token: BearerToken,
) -> WebResult<Json<Vec<GraduationRegistration>>> {
    let access = state.access(&token);
    Ok(Json(state.queries.my_graduations(&access).await?))
}

/// `GET /api/me/course-loads`, most recently written first
///
/// # Errors
///
/// 401 anonymous.
pub async fn my_course_loads(
    State(state): State<AppState>,
    token: BearerToken,
) -> WebResult<Json<Vec<CourseLoad>>> {
    let access = state.access(&token);
    Ok(Json(state.queries.my_course_load_history(&access).await?))
}

/// `GET /api/me/course-loads/:term`
///
/// # Errors
///
/// 401 anonymous, 404 nothing submitted for the term.
pub async fn my_course_load(
    State(state): State<AppState>,
    token: BearerToken,
    Path(term): Path<String>,
) -> WebResult<Json<CourseLoad>> {
    let access = state.access(&token);
    Ok(Json(state.queries.my_course_load(&access, &term).await?))
}
