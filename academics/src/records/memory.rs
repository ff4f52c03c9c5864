//! In-process record store for tests and local runs.

use super::{
    RecordError, RecordResult, RecordStore, course_load_conflict, graduation_conflict,
};
use crate::types::{
    CourseLoad, CourseLoadStatus, CourseLoadSubmission, ExamRegistration, ExamStatus,
    GraduationRegistration, GraduationStatus, RecordId, SubjectId,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

#[derive(Debug, Default)]
struct Tables {
    exams: Vec<ExamRegistration>,
    graduations: Vec<GraduationRegistration>,
    course_loads: HashMap<(SubjectId, String), CourseLoad>,
}

/// [`RecordStore`] kept in memory. Clones share the same tables.
#[derive(Clone, Debug, Default)]
pub struct InMemoryRecordStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryRecordStore {
    /// Empty store
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn read<T>(&self, f: impl FnOnce(&Tables) -> T) -> T {
        let guard = self.tables.read().unwrap_or_else(PoisonError::into_inner);
        f(&guard)
    }

    fn write<T>(&self, f: impl FnOnce(&mut Tables) -> T) -> T {
        let mut guard = self.tables.write().unwrap_or_else(PoisonError::into_inner);
        f(&mut guard)
    }
}

#[async_trait]
impl RecordStore for InMemoryRecordStore {
    async fn insert_exam(&self, exam: ExamRegistration) -> RecordResult<ExamRegistration> {
        self.write(|t| {
            if t.exams.iter().any(|e| e.id == exam.id) {
                return Err(RecordError::Conflict(format!(
                    "exam registration {} already exists",
                    exam.id
                )));
            }
            t.exams.push(exam.clone());
            Ok(exam)
        })
    }

    async fn list_exams(&self, subject: &SubjectId) -> RecordResult<Vec<ExamRegistration>> {
        let mut exams: Vec<_> = self.read(|t| {
            t.exams
                .iter()
                .filter(|e| &e.subject == subject)
                .cloned()
                .collect()
        });
        exams.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(exams)
    }

    async fn set_exam_status(
        &self,
        id: RecordId,
        status: ExamStatus,
    ) -> RecordResult<Option<ExamRegistration>> {
        Ok(self.write(|t| {
            t.exams.iter_mut().find(|e| e.id == id).map(|exam| {
                exam.status = status;
                exam.clone()
            })
        }))
    }

    async fn create_graduation(
        &self,
        graduation: GraduationRegistration,
    ) -> RecordResult<GraduationRegistration> {
        self.write(|t| {
            let taken = t
                .graduations
                .iter()
                .any(|g| g.subject == graduation.subject && g.period == graduation.period);
            if taken {
                return Err(graduation_conflict(&graduation.period));
            }
            t.graduations.push(graduation.clone());
            Ok(graduation)
        })
    }

    async fn list_graduations(
        &self,
        subject: &SubjectId,
    ) -> RecordResult<Vec<GraduationRegistration>> {
        let mut graduations: Vec<_> = self.read(|t| {
            t.graduations
                .iter()
                .filter(|g| &g.subject == subject)
                .cloned()
                .collect()
        });
        graduations.sort_by(|a, b| b.registered_at.cmp(&a.registered_at));
        Ok(graduations)
    }

    async fn set_graduation_status(
        &self,
        id: RecordId,
        status: GraduationStatus,
    ) -> RecordResult<Option<GraduationRegistration>> {
        Ok(self.write(|t| {
            t.graduations.iter_mut().find(|g| g.id == id).map(|graduation| {
                graduation.status = status;
                graduation.clone()
            })
        }))
    }

    async fn find_course_load(
        &self,
        subject: &SubjectId,
        term: &str,
    ) -> RecordResult<Option<CourseLoad>> {
        Ok(self.read(|t| {
            t.course_loads
                .get(&(subject.clone(), term.to_string()))
                .cloned()
        }))
    }

    async fn course_load_history(&self, subject: &SubjectId) -> RecordResult<Vec<CourseLoad>> {
        let mut loads: Vec<_> = self.read(|t| {
            t.course_loads
                .values()
                .filter(|c| &c.subject == subject)
                .cloned()
                .collect()
        });
        loads.sort_by(|a, b| {
            b.updated_at
                .cmp(&a.updated_at)
                .then_with(|| b.created_at.cmp(&a.created_at))
        });
        Ok(loads)
    }

    async fn upsert_course_load(
        &self,
        submission: CourseLoadSubmission,
        expected_revision: Option<i64>,
    ) -> RecordResult<CourseLoad> {
        self.write(|t| {
            let key = (submission.subject.clone(), submission.term.clone());
            let current = t.course_loads.get(&key).map(|c| c.revision);
            if current != expected_revision {
                return Err(course_load_conflict(&submission.term));
            }

            let load = match t.course_loads.get(&key) {
                Some(existing) => CourseLoad {
                    items: submission.items,
                    total_credits: submission.total_credits,
                    status: CourseLoadStatus::Submitted,
                    submitted_at: submission.submitted_at,
                    updated_at: submission.submitted_at,
                    revision: existing.revision + 1,
                    ..existing.clone()
                },
                None => CourseLoad {
                    id: RecordId::new(),
                    subject: submission.subject,
                    term: submission.term,
                    items: submission.items,
                    total_credits: submission.total_credits,
                    status: CourseLoadStatus::Submitted,
                    submitted_at: submission.submitted_at,
                    created_at: submission.submitted_at,
                    updated_at: submission.submitted_at,
                    revision: 1,
                },
            };

            t.course_loads.insert(key, load.clone());
            Ok(load)
        })
    }

    async fn set_course_load_status(
        &self,
        id: RecordId,
        status: CourseLoadStatus,
        updated_at: DateTime<Utc>,
    ) -> RecordResult<Option<CourseLoad>> {
        Ok(self.write(|t| {
            t.course_loads.values_mut().find(|c| c.id == id).map(|load| {
                load.status = status;
                load.updated_at = updated_at;
                load.clone()
            })
        }))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::CourseLoadItem;
    use chrono::Duration;

    fn graduation(subject: &str, period: &str) -> GraduationRegistration {
        GraduationRegistration {
            id: RecordId::new(),
            subject: SubjectId::new(subject),
            period: period.to_string(),
            status: GraduationStatus::Registered,
            registered_at: Utc::now(),
        }
    }

    fn submission(term: &str, credits: u32) -> CourseLoadSubmission {
        CourseLoadSubmission {
            subject: SubjectId::new("A"),
            term: term.to_string(),
            items: vec![CourseLoadItem {
                course_code: "IF101".to_string(),
                course_name: String::new(),
                credits,
            }],
            total_credits: credits,
            submitted_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn graduation_is_unique_per_subject_and_period() {
        let store = InMemoryRecordStore::new();
        store.create_graduation(graduation("A", "2025-1")).await.unwrap();
        store.create_graduation(graduation("B", "2025-1")).await.unwrap();
        store.create_graduation(graduation("A", "2025-2")).await.unwrap();

        let err = store
            .create_graduation(graduation("A", "2025-1"))
            .await
            .unwrap_err();
        assert!(matches!(err, RecordError::Conflict(_)));
        assert_eq!(store.list_graduations(&SubjectId::new("A")).await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn exams_are_listed_most_recent_first() {
        let store = InMemoryRecordStore::new();
        let t0 = Utc::now();
        for (offset, title) in [(0, "first"), (5, "second")] {
            store
                .insert_exam(ExamRegistration {
                    id: RecordId::new(),
                    subject: SubjectId::new("A"),
                    title: title.to_string(),
                    status: ExamStatus::registered(),
                    registered_at: t0 + Duration::minutes(offset),
                })
                .await
                .unwrap();
        }

        let exams = store.list_exams(&SubjectId::new("A")).await.unwrap();
        assert_eq!(exams[0].title, "second");
        assert!(store.list_exams(&SubjectId::new("B")).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn course_load_resubmission_keeps_identity() {
        let store = InMemoryRecordStore::new();
        let first = store.upsert_course_load(submission("T1", 3), None).await.unwrap();
        assert_eq!(first.revision, 1);

        store
            .set_course_load_status(first.id, CourseLoadStatus::Approved, Utc::now())
            .await
            .unwrap();

        let second = store
            .upsert_course_load(submission("T1", 4), Some(1))
            .await
            .unwrap();
        assert_eq!(second.id, first.id);
        assert_eq!(second.revision, 2);
        assert_eq!(second.total_credits, 4);
        assert_eq!(second.status, CourseLoadStatus::Submitted);
        assert_eq!(second.created_at, first.created_at);
    }

    #[tokio::test]
    async fn stale_revision_is_a_conflict() {
        let store = InMemoryRecordStore::new();
        store.upsert_course_load(submission("T1", 3), None).await.unwrap();

        assert!(matches!(
            store.upsert_course_load(submission("T1", 3), None).await,
            Err(RecordError::Conflict(_))
        ));
        assert!(matches!(
            store.upsert_course_load(submission("T1", 3), Some(7)).await,
            Err(RecordError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn course_load_status_write_stamps_updated_at() {
        let store = InMemoryRecordStore::new();
        let created = store.upsert_course_load(submission("T1", 3), None).await.unwrap();
        let reviewed_at = created.updated_at + Duration::hours(2);

        let reviewed = store
            .set_course_load_status(created.id, CourseLoadStatus::Rejected, reviewed_at)
            .await
            .unwrap()
            .unwrap();

        assert_eq!(reviewed.status, CourseLoadStatus::Rejected);
        assert_eq!(reviewed.updated_at, reviewed_at);
        assert_eq!(reviewed.created_at, created.created_at);
        assert_eq!(reviewed.revision, created.revision);
    }

    #[tokio::test]
    async fn status_update_on_missing_record_is_none() {
        let store = InMemoryRecordStore::new();
        assert!(store
            .set_graduation_status(RecordId::new(), GraduationStatus::Approved)
            .await
            .unwrap()
            .is_none());
    }
}
