//! Read-side operations on the caller's own records.
//!
//! Queries never touch remote services and never open a saga run; they read
//! the record store directly.

use crate::access::{AccessContext, AccessDenied};
use crate::records::{RecordError, RecordStore};
use crate::types::{CourseLoad, ExamRegistration, GraduationRegistration};
use std::sync::Arc;
use thiserror::Error;

/// Why a query returned no data
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QueryRejection {
    /// No identity
    #[error("authentication required")]
    Unauthenticated,

    /// Nothing stored under the requested key
    #[error("{0}")]
    NotFound(String),

    /// Storage failure
    #[error("storage failure: {0}")]
    Storage(String),
}

impl From<AccessDenied> for QueryRejection {
    fn from(_: AccessDenied) -> Self {
        Self::Unauthenticated
    }
}

impl From<RecordError> for QueryRejection {
    fn from(error: RecordError) -> Self {
        Self::Storage(error.to_string())
    }
}

/// Queries over the caller's records
#[derive(Clone)]
pub struct RecordQueries {
    records: Arc<dyn RecordStore>,
}

impl RecordQueries {
    /// Queries on `records`
    #[must_use]
    pub fn new(records: Arc<dyn RecordStore>) -> Self {
        Self { records }
    }

    /// Caller's exam registrations, most recent first.
    ///
    /// # Errors
    ///
    /// [`QueryRejection::Unauthenticated`] without identity, or a storage failure.
    pub async fn my_exams(
        &self,
        access: &AccessContext,
    ) -> Result<Vec<ExamRegistration>, QueryRejection> {
        let subject = access.require_subject()?;
        Ok(self.records.list_exams(subject).await?)
    }

    /// Caller's graduation registrations, most recent first.
    ///
    /// # Errors
    ///
    /// [`QueryRejection::Unauthenticated`] without identity, or a storage failure.
    pub async fn my_graduations(
        &self,
        access: &AccessContext,
    ) -> Result<Vec<GraduationRegistration>, QueryRejection> {
        let subject = access.require_subject()?;
        Ok(self.records.list_graduations(subject).await?)
    }

    /// Caller's course load for one term.
    ///
    /// # Errors
    ///
    /// [`QueryRejection::NotFound`] when nothing was submitted for `term`.
    pub async fn my_course_load(
        &self,
        access: &AccessContext,
        term: &str,
    ) -> Result<CourseLoad, QueryRejection> {
        let subject = access.require_subject()?;
        let term = term.trim();
        self.records
            .find_course_load(subject, term)
            .await?
            .ok_or_else(|| QueryRejection::NotFound(format!("no course load submitted for term {term}")))
    }

    /// Caller's course loads across terms, most recently written first.
    ///
    /// # Errors
    ///
    /// [`QueryRejection::Unauthenticated`] without identity, or a storage failure.
    pub async fn my_course_load_history(
        &self,
        access: &AccessContext,
    ) -> Result<Vec<CourseLoad>, QueryRejection> {
        let subject = access.require_subject()?;
        Ok(self.records.course_load_history(subject).await?)
    }
}

impl std::fmt::Debug for RecordQueries {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RecordQueries").finish_non_exhaustive()
    }
}
