//! PostgreSQL-backed record store.
//!
//! Uniqueness is enforced by table constraints; a unique violation maps to
//! [`RecordError::Conflict`]. Course-load replacement is a conditional update
//! on the revision column.

use super::{
    RecordError, RecordResult, RecordStore, course_load_conflict, graduation_conflict,
};
use crate::types::{
    CourseLoad, CourseLoadItem, CourseLoadStatus, CourseLoadSubmission, ExamRegistration,
    ExamStatus, GraduationRegistration, GraduationStatus, RecordId, SubjectId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use sqlx::types::{Json, Uuid};

type ExamRow = (Uuid, String, String, String, DateTime<Utc>);
type GraduationRow = (Uuid, String, String, String, DateTime<Utc>);
type CourseLoadRow = (
    Uuid,
    String,
    String,
    Json<Vec<CourseLoadItem>>,
    i32,
    String,
    DateTime<Utc>,
    DateTime<Utc>,
    DateTime<Utc>,
    i64,
);

const EXAM_COLUMNS: &str = "id, subject_id, title, status, registered_at";
const GRADUATION_COLUMNS: &str = "id, subject_id, period, status, registered_at";
const COURSE_LOAD_COLUMNS: &str = "id, subject_id, term, items, total_credits, status, \
                                   submitted_at, created_at, updated_at, revision";

/// [`RecordStore`] on a PostgreSQL pool
#[derive(Clone, Debug)]
pub struct PostgresRecordStore {
    pool: PgPool,
}

impl PostgresRecordStore {
    /// Wrap an existing pool
    #[must_use]
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Run the embedded migrations.
    ///
    /// # Errors
    ///
    /// Returns error if a migration fails.
    pub async fn migrate(&self) -> RecordResult<()> {
        sqlx::migrate!("./migrations")
            .run(&self.pool)
            .await
            .map_err(|e| RecordError::Backend(format!("migration failed: {e}")))
    }

    /// Underlying pool
    #[must_use]
    pub const fn pool(&self) -> &PgPool {
        &self.pool
    }
}

fn backend(context: &str) -> impl FnOnce(sqlx::Error) -> RecordError + '_ {
    move |e| RecordError::Backend(format!("{context}: {e}"))
}

fn is_unique_violation(e: &sqlx::Error) -> bool {
    matches!(e, sqlx::Error::Database(db_err) if db_err.is_unique_violation())
}

fn exam_from_row((id, subject, title, status, registered_at): ExamRow) -> RecordResult<ExamRegistration> {
    Ok(ExamRegistration {
        id: RecordId::from_uuid(id),
        subject: SubjectId::new(subject),
        title,
        status: status
            .parse()
            .map_err(|e| RecordError::Backend(format!("stored exam status: {e}")))?,
        registered_at,
    })
}

fn graduation_from_row(
    (id, subject, period, status, registered_at): GraduationRow,
) -> RecordResult<GraduationRegistration> {
    Ok(GraduationRegistration {
        id: RecordId::from_uuid(id),
        subject: SubjectId::new(subject),
        period,
        status: status
            .parse()
            .map_err(|e| RecordError::Backend(format!("stored graduation status: {e}")))?,
        registered_at,
    })
}

fn course_load_from_row(row: CourseLoadRow) -> RecordResult<CourseLoad> {
    let (id, subject, term, Json(items), total, status, submitted_at, created_at, updated_at, revision) =
        row;
    Ok(CourseLoad {
        id: RecordId::from_uuid(id),
        subject: SubjectId::new(subject),
        term,
        items,
        total_credits: u32::try_from(total)
            .map_err(|_| RecordError::Backend(format!("stored total credits out of range: {total}")))?,
        status: status
            .parse()
            .map_err(|e| RecordError::Backend(format!("stored course load status: {e}")))?,
        submitted_at,
        created_at,
        updated_at,
        revision,
    })
}

fn credits_column(total: u32) -> RecordResult<i32> {
    i32::try_from(total).map_err(|_| RecordError::Backend(format!("total credits out of range: {total}")))
}

#[async_trait]
impl RecordStore for PostgresRecordStore {
    async fn insert_exam(&self, exam: ExamRegistration) -> RecordResult<ExamRegistration> {
        sqlx::query(
            "INSERT INTO exam_registrations (id, subject_id, title, status, registered_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(exam.id.as_uuid())
        .bind(exam.subject.as_str())
        .bind(&exam.title)
        .bind(exam.status.as_str())
        .bind(exam.registered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                RecordError::Conflict(format!("exam registration {} already exists", exam.id))
            } else {
                RecordError::Backend(format!("failed to insert exam registration: {e}"))
            }
        })?;

        Ok(exam)
    }

    async fn list_exams(&self, subject: &SubjectId) -> RecordResult<Vec<ExamRegistration>> {
        let rows: Vec<ExamRow> = sqlx::query_as(&format!(
            "SELECT {EXAM_COLUMNS} FROM exam_registrations
             WHERE subject_id = $1
             ORDER BY registered_at DESC"
        ))
        .bind(subject.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend("failed to list exam registrations"))?;

        rows.into_iter().map(exam_from_row).collect()
    }

    async fn set_exam_status(
        &self,
        id: RecordId,
        status: ExamStatus,
    ) -> RecordResult<Option<ExamRegistration>> {
        let row: Option<ExamRow> = sqlx::query_as(&format!(
            "UPDATE exam_registrations SET status = $2
             WHERE id = $1
             RETURNING {EXAM_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend("failed to update exam status"))?;

        row.map(exam_from_row).transpose()
    }

    async fn create_graduation(
        &self,
        graduation: GraduationRegistration,
    ) -> RecordResult<GraduationRegistration> {
        sqlx::query(
            "INSERT INTO graduation_registrations (id, subject_id, period, status, registered_at)
             VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(graduation.id.as_uuid())
        .bind(graduation.subject.as_str())
        .bind(&graduation.period)
        .bind(graduation.status.as_str())
        .bind(graduation.registered_at)
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                graduation_conflict(&graduation.period)
            } else {
                RecordError::Backend(format!("failed to insert graduation registration: {e}"))
            }
        })?;

        Ok(graduation)
    }

    async fn list_graduations(
        &self,
        subject: &SubjectId,
    ) -> RecordResult<Vec<GraduationRegistration>> {
        let rows: Vec<GraduationRow> = sqlx::query_as(&format!(
            "SELECT {GRADUATION_COLUMNS} FROM graduation_registrations
             WHERE subject_id = $1
             ORDER BY registered_at DESC"
        ))
        .bind(subject.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend("failed to list graduation registrations"))?;

        rows.into_iter().map(graduation_from_row).collect()
    }

    async fn set_graduation_status(
        &self,
        id: RecordId,
        status: GraduationStatus,
    ) -> RecordResult<Option<GraduationRegistration>> {
        let row: Option<GraduationRow> = sqlx::query_as(&format!(
            "UPDATE graduation_registrations SET status = $2
             WHERE id = $1
             RETURNING {GRADUATION_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await
        .map_err(backend("failed to update graduation status"))?;

        row.map(graduation_from_row).transpose()
    }

    async fn find_course_load(
        &self,
        subject: &SubjectId,
        term: &str,
    ) -> RecordResult<Option<CourseLoad>> {
        let row: Option<CourseLoadRow> = sqlx::query_as(&format!(
            "SELECT {COURSE_LOAD_COLUMNS} FROM course_loads
             WHERE subject_id = $1 AND term = $2"
        ))
        .bind(subject.as_str())
        .bind(term)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend("failed to load course load"))?;

        row.map(course_load_from_row).transpose()
    }

    async fn course_load_history(&self, subject: &SubjectId) -> RecordResult<Vec<CourseLoad>> {
        let rows: Vec<CourseLoadRow> = sqlx::query_as(&format!(
            "SELECT {COURSE_LOAD_COLUMNS} FROM course_loads
             WHERE subject_id = $1
             ORDER BY updated_at DESC, created_at DESC"
        ))
        .bind(subject.as_str())
        .fetch_all(&self.pool)
        .await
        .map_err(backend("failed to list course loads"))?;

        rows.into_iter().map(course_load_from_row).collect()
    }

    async fn upsert_course_load(
        &self,
        submission: CourseLoadSubmission,
        expected_revision: Option<i64>,
    ) -> RecordResult<CourseLoad> {
        let total = credits_column(submission.total_credits)?;
        let items = Json(&submission.items);

        let row: Option<CourseLoadRow> = match expected_revision {
            None => sqlx::query_as(&format!(
                "INSERT INTO course_loads
                     (id, subject_id, term, items, total_credits, status,
                      submitted_at, created_at, updated_at, revision)
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $7, $7, 1)
                 ON CONFLICT (subject_id, term) DO NOTHING
                 RETURNING {COURSE_LOAD_COLUMNS}"
            ))
            .bind(RecordId::new().as_uuid())
            .bind(submission.subject.as_str())
            .bind(&submission.term)
            .bind(items)
            .bind(total)
            .bind(CourseLoadStatus::Submitted.as_str())
            .bind(submission.submitted_at)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend("failed to insert course load"))?,
            Some(revision) => sqlx::query_as(&format!(
                "UPDATE course_loads
                 SET items = $3, total_credits = $4, status = $5,
                     submitted_at = $6, updated_at = $6, revision = revision + 1
                 WHERE subject_id = $1 AND term = $2 AND revision = $7
                 RETURNING {COURSE_LOAD_COLUMNS}"
            ))
            .bind(submission.subject.as_str())
            .bind(&submission.term)
            .bind(items)
            .bind(total)
            .bind(CourseLoadStatus::Submitted.as_str())
            .bind(submission.submitted_at)
            .bind(revision)
            .fetch_optional(&self.pool)
            .await
            .map_err(backend("failed to update course load"))?,
        };

        match row {
            Some(row) => course_load_from_row(row),
            None => Err(course_load_conflict(&submission.term)),
        }
    }

    async fn set_course_load_status(
        &self,
        id: RecordId,
        status: CourseLoadStatus,
        updated_at: DateTime<Utc>,
    ) -> RecordResult<Option<CourseLoad>> {
        let row: Option<CourseLoadRow> = sqlx::query_as(&format!(
            "UPDATE course_loads SET status = $2, updated_at = $3
             WHERE id = $1
             RETURNING {COURSE_LOAD_COLUMNS}"
        ))
        .bind(id.as_uuid())
        .bind(status.as_str())
        .bind(updated_at)
        .fetch_optional(&self.pool)
        .await
        .map_err(backend("failed to update course load status"))?;

        row.map(course_load_from_row).transpose()
    }
}
