//! Local academic records.
//!
//! The orchestrator writes here only after every gate passed. Uniqueness of
//! graduations per (subject, period) and of course loads per (subject, term)
//! is enforced by the store itself, so two concurrent transactions that both
//! passed their gates still cannot both commit.

use crate::types::{
    CourseLoad, CourseLoadStatus, CourseLoadSubmission, ExamRegistration, ExamStatus,
    GraduationRegistration, GraduationStatus, RecordId, SubjectId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

mod memory;
mod postgres;

pub use memory::InMemoryRecordStore;
pub use postgres::PostgresRecordStore;

/// Errors from record storage
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RecordError {
    /// A uniqueness rule or revision check refused the write
    #[error("{0}")]
    Conflict(String),

    /// The storage backend failed
    #[error("storage error: {0}")]
    Backend(String),
}

/// Result alias for record operations
pub type RecordResult<T> = Result<T, RecordError>;

/// Storage for exam registrations, graduation registrations and course loads.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Persist a new exam registration.
    async fn insert_exam(&self, exam: ExamRegistration) -> RecordResult<ExamRegistration>;

    /// Exam registrations of a subject, most recent first.
    async fn list_exams(&self, subject: &SubjectId) -> RecordResult<Vec<ExamRegistration>>;

    /// Overwrite an exam status. `None` when no such registration exists.
    async fn set_exam_status(
        &self,
        id: RecordId,
        status: ExamStatus,
    ) -> RecordResult<Option<ExamRegistration>>;

    /// Persist a new graduation registration.
    ///
    /// A second registration for the same (subject, period) is a
    /// [`RecordError::Conflict`].
    async fn create_graduation(
        &self,
        graduation: GraduationRegistration,
    ) -> RecordResult<GraduationRegistration>;

    /// Graduation registrations of a subject, most recent first.
    async fn list_graduations(
        &self,
        subject: &SubjectId,
    ) -> RecordResult<Vec<GraduationRegistration>>;

    /// Overwrite a graduation status. `None` when no such registration exists.
    async fn set_graduation_status(
        &self,
        id: RecordId,
        status: GraduationStatus,
    ) -> RecordResult<Option<GraduationRegistration>>;

    /// Course load of a subject for one term.
    async fn find_course_load(
        &self,
        subject: &SubjectId,
        term: &str,
    ) -> RecordResult<Option<CourseLoad>>;

    /// All course loads of a subject, most recently written first.
    async fn course_load_history(&self, subject: &SubjectId) -> RecordResult<Vec<CourseLoad>>;

    /// Create or replace the course load for (subject, term).
    ///
    /// `expected_revision` is the revision the caller read: `None` means the
    /// caller saw no record and expects to create one. Replacing resets the
    /// status to SUBMITTED and bumps the revision. Any mismatch is a
    /// [`RecordError::Conflict`].
    async fn upsert_course_load(
        &self,
        submission: CourseLoadSubmission,
        expected_revision: Option<i64>,
    ) -> RecordResult<CourseLoad>;

    /// Overwrite a course load status and stamp `updated_at`. `None` when no
    /// such course load exists.
    async fn set_course_load_status(
        &self,
        id: RecordId,
        status: CourseLoadStatus,
        updated_at: DateTime<Utc>,
    ) -> RecordResult<Option<CourseLoad>>;
}

pub(crate) fn graduation_conflict(period: &str) -> RecordError {
    RecordError::Conflict(format!(
        "a graduation registration already exists for period {period}"
    ))
}

pub(crate) fn course_load_conflict(term: &str) -> RecordError {
    RecordError::Conflict(format!(
        "course load for term {term} was modified concurrently; retry the submission"
    ))
}
