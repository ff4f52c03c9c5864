//! HTTP handlers.
//!
//! Handlers resolve the caller, build one orchestrator command or query, and
//! map the result onto a response. Every denial and failure becomes an
//! [`AppError`] with a distinct code.

pub mod admin;
pub mod me;
pub mod transactions;

use crate::access::AccessDenied;
use crate::orchestrator::{Denial, Failure, Outcome};
use crate::queries::QueryRejection;
use crate::types::CommittedRecord;
use academic_gate_web::AppError;
use axum::{
    Json,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

/// Turn a failed access check into its response, ahead of body parsing.
pub(crate) fn access_error(denied: AccessDenied) -> AppError {
    denial_error(denied.into())
}

/// Unwrap a JSON body; malformed bodies are validation errors.
pub(crate) fn json_body<T>(payload: Result<Json<T>, JsonRejection>) -> Result<T, AppError> {
    payload
        .map(|Json(body)| body)
        .map_err(|rejection| AppError::validation(rejection.body_text()))
}

/// Response for a finished transaction.
///
/// # Errors
///
/// Any denial or failure, as an [`AppError`].
pub(crate) fn outcome_response(outcome: Outcome, success: StatusCode) -> Result<Response, AppError> {
    match outcome {
        Outcome::Succeeded(record) => Ok(record_response(success, record)),
        Outcome::Denied(denial) => Err(denial_error(denial)),
        Outcome::Failed(failure) => Err(failure_error(failure)),
    }
}

fn record_response(status: StatusCode, record: CommittedRecord) -> Response {
    match record {
        CommittedRecord::Exam(exam) => (status, Json(exam)).into_response(),
        CommittedRecord::Graduation(graduation) => (status, Json(graduation)).into_response(),
        CommittedRecord::CourseLoad(load) => (status, Json(load)).into_response(),
    }
}

fn denial_error(denial: Denial) -> AppError {
    let message = denial.to_string();
    match denial {
        Denial::Unauthenticated => AppError::unauthenticated(message),
        Denial::Forbidden => AppError::forbidden(message),
        Denial::Validation(_) => AppError::validation(message),
        Denial::Precondition(_) => AppError::precondition_denied(message),
        Denial::Conflict(_) => AppError::conflict(message),
        Denial::NotFound { .. } => AppError::not_found(message),
    }
}

fn failure_error(failure: Failure) -> AppError {
    let message = failure.to_string();
    match failure {
        Failure::DependencyUnavailable(_) | Failure::Unavailable(_) => {
            AppError::dependency_unavailable(message)
        },
        Failure::Storage(_) => {
            AppError::internal("An internal error occurred").with_source(anyhow::anyhow!(message))
        },
        Failure::Timeout => AppError::timeout(message),
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        let message = rejection.to_string();
        match rejection {
            QueryRejection::Unauthenticated => Self::unauthenticated(message),
            QueryRejection::NotFound(_) => Self::not_found(message),
            QueryRejection::Storage(_) => {
                Self::internal("An internal error occurred").with_source(anyhow::anyhow!(message))
            },
        }
    }
}
